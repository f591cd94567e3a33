//src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;
#[cfg(test)]
mod test_utils;

use crate::config::{AppState, Config};
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let config = Config::from_env()?;
    let app_state = AppState::new(&config).await?;

    let app = build_router(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn build_router(app_state: AppState) -> Router {
    // Rotas do próprio usuário (protegidas pelo middleware)
    let me_routes = Router::new()
        .route("/api/me", get(handlers::auth::get_me))
        .route("/api/me/modules", get(handlers::auth::get_my_modules))
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let company_routes = Router::new()
        .route("/"
               ,post(handlers::companies::create_company)
               .get(handlers::companies::list_companies)
        )
        .route("/{company_id}"
               ,get(handlers::companies::get_company)
               .patch(handlers::companies::update_company)
               .delete(handlers::companies::delete_company)
        )
        .route("/{company_id}/users"
               ,get(handlers::companies::list_company_users)
        );

    let module_routes = Router::new()
        .route("/"
               ,post(handlers::modules::create_module)
               .get(handlers::modules::list_modules)
        )
        .route("/{module_id}"
               ,get(handlers::modules::get_module)
               .patch(handlers::modules::update_module)
               .delete(handlers::modules::delete_module)
        );

    let user_routes = Router::new()
        .route("/"
               ,post(handlers::users::create_user)
               .get(handlers::users::list_users)
        )
        .route("/{user_id}"
               ,get(handlers::users::get_user)
               .patch(handlers::users::update_user)
               .delete(handlers::users::delete_user)
        )
        .route("/{user_id}/modules"
               ,get(handlers::user_modules::get_user_modules)
               .post(handlers::user_modules::assign_user_modules)
               .put(handlers::user_modules::set_user_modules)
               .delete(handlers::user_modules::clear_user_modules)
        )
        .route("/{user_id}/modules/{module_id}"
               ,axum::routing::delete(handlers::user_modules::remove_user_module)
        )
        .route("/{user_id}/available-modules"
               ,get(handlers::user_modules::get_available_modules)
        );

    let company_module_routes = Router::new()
        .route("/{company_id}"
               ,get(handlers::company_modules::list_company_modules)
               .put(handlers::company_modules::set_company_modules)
        )
        .route("/{company_id}/enabled"
               ,get(handlers::company_modules::list_enabled_company_modules)
        )
        .route("/{company_id}/catalog"
               ,get(handlers::company_modules::get_catalog_with_status)
        )
        .route("/{company_id}/{module_id}"
               ,patch(handlers::company_modules::toggle_company_module)
               .delete(handlers::company_modules::remove_company_module)
        );

    // Combina tudo no router principal
    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/auth/login", post(handlers::auth::login))
        .merge(me_routes)
        .nest("/api/companies", company_routes)
        .nest("/api/modules", module_routes)
        .nest("/api/users", user_routes)
        .nest("/api/company-modules", company_module_routes)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state)
}
