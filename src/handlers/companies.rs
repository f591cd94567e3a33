// src/handlers/companies.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::{
        company::{Company, CreateCompanyPayload, UpdateCompanyPayload},
        user::User,
    },
};

#[utoipa::path(
    post,
    path = "/api/companies",
    tag = "Companies",
    request_body = CreateCompanyPayload,
    responses(
        (status = 201, description = "Company criada", body = Company),
        (status = 409, description = "RFC já existe")
    )
)]
pub async fn create_company(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateCompanyPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let company = app_state.company_service.create(payload).await?;

    tracing::info!(company_id = %company.id, "company criada");
    Ok((StatusCode::CREATED, Json(company)))
}

#[utoipa::path(
    get,
    path = "/api/companies",
    tag = "Companies",
    responses((status = 200, description = "Companies, da mais recente para a mais antiga", body = [Company]))
)]
pub async fn list_companies(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<Company>>, AppError> {
    Ok(Json(app_state.company_service.list().await?))
}

#[utoipa::path(
    get,
    path = "/api/companies/{company_id}",
    tag = "Companies",
    params(("company_id" = Uuid, Path, description = "ID da Company")),
    responses(
        (status = 200, description = "Company", body = Company),
        (status = 404, description = "Company não encontrada")
    )
)]
pub async fn get_company(
    State(app_state): State<AppState>,
    Path(company_id): Path<Uuid>,
) -> Result<Json<Company>, AppError> {
    Ok(Json(app_state.company_service.get(company_id).await?))
}

#[utoipa::path(
    patch,
    path = "/api/companies/{company_id}",
    tag = "Companies",
    request_body = UpdateCompanyPayload,
    params(("company_id" = Uuid, Path, description = "ID da Company")),
    responses(
        (status = 200, description = "Company atualizada", body = Company),
        (status = 404, description = "Company não encontrada"),
        (status = 409, description = "RFC já existe")
    )
)]
pub async fn update_company(
    State(app_state): State<AppState>,
    Path(company_id): Path<Uuid>,
    Json(payload): Json<UpdateCompanyPayload>,
) -> Result<Json<Company>, AppError> {
    payload.validate()?;

    let company = app_state.company_service.update(company_id, payload).await?;

    tracing::info!(company_id = %company.id, "company atualizada");
    Ok(Json(company))
}

#[utoipa::path(
    delete,
    path = "/api/companies/{company_id}",
    tag = "Companies",
    params(("company_id" = Uuid, Path, description = "ID da Company")),
    responses(
        (status = 200, description = "Company apagada", body = Company),
        (status = 404, description = "Company não encontrada"),
        (status = 409, description = "A company ainda possui usuários")
    )
)]
pub async fn delete_company(
    State(app_state): State<AppState>,
    Path(company_id): Path<Uuid>,
) -> Result<Json<Company>, AppError> {
    let company = app_state.company_service.delete(company_id).await?;

    tracing::info!(company_id = %company.id, "company apagada");
    Ok(Json(company))
}

#[utoipa::path(
    get,
    path = "/api/companies/{company_id}/users",
    tag = "Companies",
    params(("company_id" = Uuid, Path, description = "ID da Company")),
    responses(
        (status = 200, description = "Usuários da company", body = [User]),
        (status = 404, description = "Company não encontrada")
    )
)]
pub async fn list_company_users(
    State(app_state): State<AppState>,
    Path(company_id): Path<Uuid>,
) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(app_state.user_service.list_by_company(company_id).await?))
}
