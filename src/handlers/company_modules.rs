// src/handlers/company_modules.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    models::{
        entitlement::{CompanyModuleDetail, ModuleIdsPayload, ToggleCompanyModulePayload},
        module::ModuleWithStatus,
    },
};

#[utoipa::path(
    get,
    path = "/api/company-modules/{company_id}",
    tag = "Company Modules",
    params(("company_id" = Uuid, Path, description = "ID da Company")),
    responses(
        (status = 200, description = "Todas as linhas de habilitação, com o módulo", body = [CompanyModuleDetail]),
        (status = 404, description = "Company não encontrada")
    )
)]
pub async fn list_company_modules(
    State(app_state): State<AppState>,
    Path(company_id): Path<Uuid>,
) -> Result<Json<Vec<CompanyModuleDetail>>, AppError> {
    Ok(Json(app_state.company_module_service.list_by_company(company_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/company-modules/{company_id}/enabled",
    tag = "Company Modules",
    params(("company_id" = Uuid, Path, description = "ID da Company")),
    responses(
        (status = 200, description = "Somente as linhas habilitadas", body = [CompanyModuleDetail]),
        (status = 404, description = "Company não encontrada")
    )
)]
pub async fn list_enabled_company_modules(
    State(app_state): State<AppState>,
    Path(company_id): Path<Uuid>,
) -> Result<Json<Vec<CompanyModuleDetail>>, AppError> {
    Ok(Json(app_state.company_module_service.list_enabled_by_company(company_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/company-modules/{company_id}/catalog",
    tag = "Company Modules",
    params(("company_id" = Uuid, Path, description = "ID da Company")),
    responses(
        (status = 200, description = "Catálogo inteiro com o status de habilitação da company", body = [ModuleWithStatus]),
        (status = 404, description = "Company não encontrada")
    )
)]
pub async fn get_catalog_with_status(
    State(app_state): State<AppState>,
    Path(company_id): Path<Uuid>,
) -> Result<Json<Vec<ModuleWithStatus>>, AppError> {
    Ok(Json(app_state.company_module_service.catalog_with_status(company_id).await?))
}

// Reconciliação em lote: o corpo é o conjunto final de módulos habilitados
#[utoipa::path(
    put,
    path = "/api/company-modules/{company_id}",
    tag = "Company Modules",
    request_body = ModuleIdsPayload,
    params(("company_id" = Uuid, Path, description = "ID da Company")),
    responses(
        (status = 200, description = "Estado após a reconciliação", body = [CompanyModuleDetail]),
        (status = 404, description = "Company ou módulos não encontrados")
    )
)]
pub async fn set_company_modules(
    State(app_state): State<AppState>,
    Path(company_id): Path<Uuid>,
    Json(payload): Json<ModuleIdsPayload>,
) -> Result<Json<Vec<CompanyModuleDetail>>, AppError> {
    let rows = app_state
        .company_module_service
        .set_company_modules(company_id, &payload.module_ids)
        .await?;

    let enabled = rows.iter().filter(|row| row.link.is_enabled).count();
    tracing::info!(%company_id, enabled, total = rows.len(), "módulos da company reconciliados");
    Ok(Json(rows))
}

#[utoipa::path(
    patch,
    path = "/api/company-modules/{company_id}/{module_id}",
    tag = "Company Modules",
    request_body = ToggleCompanyModulePayload,
    params(
        ("company_id" = Uuid, Path, description = "ID da Company"),
        ("module_id" = Uuid, Path, description = "ID do Módulo")
    ),
    responses(
        (status = 200, description = "Linha criada ou atualizada", body = CompanyModuleDetail),
        (status = 404, description = "Company ou módulo não encontrados")
    )
)]
pub async fn toggle_company_module(
    State(app_state): State<AppState>,
    Path((company_id, module_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<ToggleCompanyModulePayload>,
) -> Result<Json<CompanyModuleDetail>, AppError> {
    let row = app_state
        .company_module_service
        .toggle(company_id, module_id, payload.is_enabled)
        .await?;

    tracing::info!(%company_id, %module_id, is_enabled = row.link.is_enabled, "módulo da company alternado");
    Ok(Json(row))
}

#[utoipa::path(
    delete,
    path = "/api/company-modules/{company_id}/{module_id}",
    tag = "Company Modules",
    params(
        ("company_id" = Uuid, Path, description = "ID da Company"),
        ("module_id" = Uuid, Path, description = "ID do Módulo")
    ),
    responses(
        (status = 204, description = "Linha removida (idempotente)"),
        (status = 404, description = "Company não encontrada")
    )
)]
pub async fn remove_company_module(
    State(app_state): State<AppState>,
    Path((company_id, module_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    app_state.company_module_service.remove(company_id, module_id).await?;

    tracing::info!(%company_id, %module_id, "módulo removido da company");
    Ok(StatusCode::NO_CONTENT)
}
