use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Tipo de entidade referenciada num erro `NotFound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Company,
    Module,
    User,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Company => f.write_str("Company"),
            EntityKind::Module => f.write_str("Module"),
            EntityKind::User => f.write_str("User"),
        }
    }
}

/// Regra de negócio violada num erro `Conflict`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictRule {
    /// Existe no catálogo, mas is_active = false.
    ModuleInactive,
    /// Existe e está ativo, mas a company do usuário não o habilitou.
    ModuleNotEnabledForCompany,
}

impl fmt::Display for ConflictRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictRule::ModuleInactive => f.write_str("Módulos inativos no catálogo"),
            ConflictRule::ModuleNotEnabledForCompany => {
                f.write_str("Módulos não habilitados para a company")
            }
        }
    }
}

fn join_ids(ids: &[Uuid]) -> String {
    ids.iter().map(Uuid::to_string).collect::<Vec<_>>().join(", ")
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    /// Sempre carrega a lista COMPLETA de ids ausentes.
    #[error("{entity} não encontrado(s): {}", join_ids(.ids))]
    NotFound { entity: EntityKind, ids: Vec<Uuid> },

    /// Sempre carrega a lista COMPLETA de ids que violam a regra.
    #[error("{rule}: {}", join_ids(.ids))]
    Conflict { rule: ConflictRule, ids: Vec<Uuid> },

    #[error("{0}")]
    UniqueConstraintViolation(String),

    #[error("{0}")]
    ReferencedEntity(String),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn not_found(entity: EntityKind, id: Uuid) -> Self {
        AppError::NotFound { entity, ids: vec![id] }
    }

    /// Converte violações de constraint do Postgres nos erros de domínio.
    /// `unique_message` é o texto mostrado quando a chave única colide.
    pub fn from_db(e: sqlx::Error, unique_message: &str) -> Self {
        if let Some(db_err) = e.as_database_error() {
            if db_err.is_unique_violation() {
                return AppError::UniqueConstraintViolation(unique_message.to_string());
            }
            if db_err.is_foreign_key_violation() {
                return AppError::ReferencedEntity(
                    "O registro ainda é referenciado por outros registros.".to_string(),
                );
            }
        }
        AppError::DatabaseError(e)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict { .. }
            | AppError::UniqueConstraintViolation(_)
            | AppError::ReferencedEntity(_) => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            // Retorna todos os detalhes da validação.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                })
            }
            AppError::NotFound { entity, ids } => json!({
                "error": self.to_string(),
                "entity": entity,
                "ids": ids,
            }),
            AppError::Conflict { rule, ids } => json!({
                "error": self.to_string(),
                "rule": rule,
                "ids": ids,
            }),
            AppError::UniqueConstraintViolation(_)
            | AppError::ReferencedEntity(_)
            | AppError::InvalidCredentials
            | AppError::InvalidToken => json!({ "error": self.to_string() }),

            // Todo o resto vira 500. O `tracing` loga a mensagem detalhada.
            e => {
                tracing::error!(error = ?e, "Erro Interno do Servidor: {}", e);
                json!({ "error": "Ocorreu um erro inesperado." })
            }
        };

        (status, Json(body)).into_response()
    }
}
