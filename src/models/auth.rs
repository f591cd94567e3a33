// src/models/auth.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{company::CompanySummary, module::Module, user::User};

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(length(min = 3, max = 50, message = "O username deve ter entre 3 e 50 caracteres."))]
    #[schema(example = "admin")]
    pub username: String,

    #[validate(length(min = 8, max = 100, message = "A senha deve ter entre 8 e 100 caracteres."))]
    #[schema(example = "Password123!")]
    pub password: String,
}

// Resposta de autenticação: token + quem é + o que pode usar
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    pub user: User,
    pub company: CompanySummary,
    pub modules: Vec<Module>,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub sub: Uuid,        // Subject (ID do usuário)
    pub company_id: Uuid, // Tenant do usuário
    pub username: String,
    pub exp: usize, // Expiration time (quando o token expira)
    pub iat: usize, // Issued At (quando o token foi criado)
}
