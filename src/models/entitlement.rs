// src/models/entitlement.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::module::Module;

// ---
// 1. CompanyModule (habilitação por tenant)
// ---
// A linha pode existir com is_enabled = false (estado "desabilitado", não ausência).
// Ausência de linha também significa desabilitado.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyModule {
    pub company_id: Uuid,
    pub module_id: Uuid,
    pub is_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// CompanyModule com os dados do módulo do catálogo.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyModuleDetail {
    #[serde(flatten)]
    pub link: CompanyModule,
    pub module: Module,
}

// ---
// 2. UserModule (atribuição por usuário)
// ---
// Binário: existe ou não existe. Não há estado "desabilitado".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserModule {
    pub user_id: Uuid,
    pub module_id: Uuid,
    pub created_at: DateTime<Utc>,
}

// ---
// 3. Payloads
// ---
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToggleCompanyModulePayload {
    #[schema(example = true)]
    pub is_enabled: bool,
}

/// Conjunto de módulos (usado tanto em PUT/POST de company quanto de usuário).
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModuleIdsPayload {
    #[schema(example = json!(["7f8c1e9b-4d5a-4f7a-9b3f-0f1e2a3b4c5d"]))]
    pub module_ids: Vec<Uuid>,
}
