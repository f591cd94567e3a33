// src/models/module.rs

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

// ---
// Module (o catálogo global)
// ---
// Gerido independente das companies. Desativar (is_active = false) não apaga
// vínculos existentes; apenas deixa de contar nos módulos efetivos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: Uuid,

    #[schema(example = "OBRAS")]
    pub key: String,

    #[schema(example = "Gestión de Obras")]
    pub name: String,

    #[schema(example = "Control de obras, avances y documentos")]
    pub description: Option<String>,

    #[schema(example = "building")]
    pub icon: String,

    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Linha do catálogo vista por uma company: o módulo + se está habilitado para ela.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModuleWithStatus {
    pub id: Uuid,
    pub key: String,
    pub name: String,
    pub icon: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub is_enabled: bool,
}

impl ModuleWithStatus {
    pub fn new(module: Module, is_enabled: bool) -> Self {
        Self {
            id: module.id,
            key: module.key,
            name: module.name,
            icon: module.icon,
            description: module.description,
            is_active: module.is_active,
            is_enabled,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateModulePayload {
    #[validate(
        length(min = 2, max = 50, message = "A key deve ter entre 2 e 50 caracteres."),
        custom(function = "validate_module_key")
    )]
    #[schema(example = "OBRAS")]
    pub key: String,

    #[validate(length(min = 2, max = 120, message = "O nome deve ter entre 2 e 120 caracteres."))]
    #[schema(example = "Gestión de Obras")]
    pub name: String,

    #[validate(length(max = 300, message = "A descrição deve ter no máximo 300 caracteres."))]
    pub description: Option<String>,

    #[validate(length(min = 1, max = 100, message = "O ícone deve ter entre 1 e 100 caracteres."))]
    #[schema(example = "building")]
    pub icon: String,

    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateModulePayload {
    #[validate(
        length(min = 2, max = 50, message = "A key deve ter entre 2 e 50 caracteres."),
        custom(function = "validate_module_key")
    )]
    pub key: Option<String>,

    #[validate(length(min = 2, max = 120, message = "O nome deve ter entre 2 e 120 caracteres."))]
    pub name: Option<String>,

    #[validate(length(max = 300, message = "A descrição deve ter no máximo 300 caracteres."))]
    pub description: Option<String>,

    #[validate(length(min = 1, max = 100, message = "O ícone deve ter entre 1 e 100 caracteres."))]
    pub icon: Option<String>,

    pub is_active: Option<bool>,
}

static MODULE_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9_]+$").expect("regex de key inválida"));

/// Keys do catálogo: apenas MAIÚSCULAS, dígitos e `_`.
pub fn validate_module_key(key: &str) -> Result<(), ValidationError> {
    if MODULE_KEY_RE.is_match(key) {
        return Ok(());
    }
    let mut err = ValidationError::new("module_key");
    err.message = Some("A key deve conter apenas MAIÚSCULAS, números ou _.".into());
    Err(err)
}
