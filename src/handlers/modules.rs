// src/handlers/modules.rs

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
    models::module::{CreateModulePayload, Module, UpdateModulePayload},
};

#[utoipa::path(
    post,
    path = "/api/modules",
    tag = "Modules",
    request_body = CreateModulePayload,
    responses(
        (status = 201, description = "Módulo criado no catálogo", body = Module),
        (status = 409, description = "Key já existe")
    )
)]
pub async fn create_module(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateModulePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let module = app_state.module_service.create(payload).await?;

    tracing::info!(module_id = %module.id, key = %module.key, "módulo criado");
    Ok((StatusCode::CREATED, Json(module)))
}

#[utoipa::path(
    get,
    path = "/api/modules",
    tag = "Modules",
    responses((status = 200, description = "Catálogo completo", body = [Module]))
)]
pub async fn list_modules(State(app_state): State<AppState>) -> Result<Json<Vec<Module>>, AppError> {
    Ok(Json(app_state.module_service.list().await?))
}

#[utoipa::path(
    get,
    path = "/api/modules/{module_id}",
    tag = "Modules",
    params(("module_id" = Uuid, Path, description = "ID do Módulo")),
    responses(
        (status = 200, description = "Módulo", body = Module),
        (status = 404, description = "Módulo não encontrado")
    )
)]
pub async fn get_module(
    State(app_state): State<AppState>,
    Path(module_id): Path<Uuid>,
) -> Result<Json<Module>, AppError> {
    Ok(Json(app_state.module_service.get(module_id).await?))
}

// isActive = false revoga o módulo de todo mundo sem apagar vínculos
#[utoipa::path(
    patch,
    path = "/api/modules/{module_id}",
    tag = "Modules",
    request_body = UpdateModulePayload,
    params(("module_id" = Uuid, Path, description = "ID do Módulo")),
    responses(
        (status = 200, description = "Módulo atualizado", body = Module),
        (status = 404, description = "Módulo não encontrado"),
        (status = 409, description = "Key já existe")
    )
)]
pub async fn update_module(
    State(app_state): State<AppState>,
    Path(module_id): Path<Uuid>,
    Json(payload): Json<UpdateModulePayload>,
) -> Result<Json<Module>, AppError> {
    payload.validate()?;

    let module = app_state.module_service.update(module_id, payload).await?;

    tracing::info!(module_id = %module.id, is_active = module.is_active, "módulo atualizado");
    Ok(Json(module))
}

#[utoipa::path(
    delete,
    path = "/api/modules/{module_id}",
    tag = "Modules",
    params(("module_id" = Uuid, Path, description = "ID do Módulo")),
    responses(
        (status = 200, description = "Módulo apagado (com os vínculos)", body = Module),
        (status = 404, description = "Módulo não encontrado")
    )
)]
pub async fn delete_module(
    State(app_state): State<AppState>,
    Path(module_id): Path<Uuid>,
) -> Result<Json<Module>, AppError> {
    let module = app_state.module_service.delete(module_id).await?;

    tracing::info!(module_id = %module.id, "módulo apagado");
    Ok(Json(module))
}
