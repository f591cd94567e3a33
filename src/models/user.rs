// src/models/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub company_id: Uuid,

    #[schema(example = "admin")]
    pub username: String,

    #[schema(example = "admin@obrix.com")]
    pub email: String,

    #[schema(example = "Administrador Obrix")]
    pub full_name: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    #[schema(ignore)]
    pub password_hash: String,

    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserPayload {
    pub company_id: Uuid,

    #[validate(email(message = "O e-mail fornecido é inválido."))]
    #[schema(example = "admin@obrix.com")]
    pub email: String,

    #[validate(length(min = 2, max = 200, message = "O nome deve ter entre 2 e 200 caracteres."))]
    #[schema(example = "Administrador Obrix")]
    pub full_name: String,

    #[validate(length(min = 3, max = 50, message = "O username deve ter entre 3 e 50 caracteres."))]
    #[schema(example = "admin")]
    pub username: String,

    #[validate(length(min = 8, max = 100, message = "A senha deve ter entre 8 e 100 caracteres."))]
    #[schema(example = "Password123!")]
    pub password: String,

    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserPayload {
    pub company_id: Option<Uuid>,

    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,

    #[validate(length(min = 2, max = 200, message = "O nome deve ter entre 2 e 200 caracteres."))]
    pub full_name: Option<String>,

    #[validate(length(min = 3, max = 50, message = "O username deve ter entre 3 e 50 caracteres."))]
    pub username: Option<String>,

    #[validate(length(min = 8, max = 100, message = "A senha deve ter entre 8 e 100 caracteres."))]
    pub password: Option<String>,

    pub is_active: Option<bool>,
}
