// src/handlers/user_modules.rs

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    models::{entitlement::ModuleIdsPayload, module::Module},
};

// GET /api/users/{user_id}/modules
#[utoipa::path(
    get,
    path = "/api/users/{user_id}/modules",
    tag = "User Modules",
    params(("user_id" = Uuid, Path, description = "ID do Usuário")),
    responses(
        (status = 200, description = "Módulos efetivos (atribuídos ∩ habilitados ∩ ativos)", body = [Module]),
        (status = 404, description = "Usuário não encontrado")
    )
)]
pub async fn get_user_modules(
    State(app_state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<Module>>, AppError> {
    Ok(Json(app_state.entitlement_service.effective_modules(user_id).await?))
}

// POST /api/users/{user_id}/modules
#[utoipa::path(
    post,
    path = "/api/users/{user_id}/modules",
    tag = "User Modules",
    request_body = ModuleIdsPayload,
    params(("user_id" = Uuid, Path, description = "ID do Usuário")),
    responses(
        (status = 200, description = "Módulos acrescentados; devolve os efetivos", body = [Module]),
        (status = 404, description = "Usuário ou módulos não encontrados"),
        (status = 409, description = "Módulo inativo ou não habilitado para a company")
    )
)]
pub async fn assign_user_modules(
    State(app_state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<ModuleIdsPayload>,
) -> Result<Json<Vec<Module>>, AppError> {
    let modules = app_state
        .user_module_service
        .assign_modules(user_id, &payload.module_ids)
        .await?;

    tracing::info!(%user_id, requested = payload.module_ids.len(), effective = modules.len(), "módulos atribuídos");
    Ok(Json(modules))
}

// PUT /api/users/{user_id}/modules
#[utoipa::path(
    put,
    path = "/api/users/{user_id}/modules",
    tag = "User Modules",
    request_body = ModuleIdsPayload,
    params(("user_id" = Uuid, Path, description = "ID do Usuário")),
    responses(
        (status = 200, description = "Atribuição substituída; devolve os efetivos", body = [Module]),
        (status = 404, description = "Usuário ou módulos não encontrados"),
        (status = 409, description = "Módulo inativo ou não habilitado para a company")
    )
)]
pub async fn set_user_modules(
    State(app_state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<ModuleIdsPayload>,
) -> Result<Json<Vec<Module>>, AppError> {
    let modules = app_state
        .user_module_service
        .set_user_modules(user_id, &payload.module_ids)
        .await?;

    tracing::info!(%user_id, requested = payload.module_ids.len(), effective = modules.len(), "módulos do usuário substituídos");
    Ok(Json(modules))
}

// DELETE /api/users/{user_id}/modules
#[utoipa::path(
    delete,
    path = "/api/users/{user_id}/modules",
    tag = "User Modules",
    params(("user_id" = Uuid, Path, description = "ID do Usuário")),
    responses(
        (status = 200, description = "Todas as atribuições removidas", body = [Module]),
        (status = 404, description = "Usuário não encontrado")
    )
)]
pub async fn clear_user_modules(
    State(app_state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<Module>>, AppError> {
    let modules = app_state.user_module_service.clear_modules(user_id).await?;

    tracing::info!(%user_id, "módulos do usuário limpos");
    Ok(Json(modules))
}

// DELETE /api/users/{user_id}/modules/{module_id}
#[utoipa::path(
    delete,
    path = "/api/users/{user_id}/modules/{module_id}",
    tag = "User Modules",
    params(
        ("user_id" = Uuid, Path, description = "ID do Usuário"),
        ("module_id" = Uuid, Path, description = "ID do Módulo")
    ),
    responses(
        (status = 200, description = "Atribuição removida (idempotente); devolve os efetivos", body = [Module]),
        (status = 404, description = "Usuário não encontrado")
    )
)]
pub async fn remove_user_module(
    State(app_state): State<AppState>,
    Path((user_id, module_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Vec<Module>>, AppError> {
    let modules = app_state.user_module_service.remove_module(user_id, module_id).await?;

    tracing::info!(%user_id, %module_id, "módulo removido do usuário");
    Ok(Json(modules))
}

// GET /api/users/{user_id}/available-modules
#[utoipa::path(
    get,
    path = "/api/users/{user_id}/available-modules",
    tag = "User Modules",
    params(("user_id" = Uuid, Path, description = "ID do Usuário")),
    responses(
        (status = 200, description = "Módulos que podem ser atribuídos ao usuário", body = [Module]),
        (status = 404, description = "Usuário não encontrado")
    )
)]
pub async fn get_available_modules(
    State(app_state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<Module>>, AppError> {
    Ok(Json(app_state.entitlement_service.available_modules_for_user(user_id).await?))
}
