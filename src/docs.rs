// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,

        // --- Me ---
        handlers::auth::get_me,
        handlers::auth::get_my_modules,

        // --- Companies ---
        handlers::companies::create_company,
        handlers::companies::list_companies,
        handlers::companies::get_company,
        handlers::companies::update_company,
        handlers::companies::delete_company,
        handlers::companies::list_company_users,

        // --- Modules ---
        handlers::modules::create_module,
        handlers::modules::list_modules,
        handlers::modules::get_module,
        handlers::modules::update_module,
        handlers::modules::delete_module,

        // --- Users ---
        handlers::users::create_user,
        handlers::users::list_users,
        handlers::users::get_user,
        handlers::users::update_user,
        handlers::users::delete_user,

        // --- User Modules ---
        handlers::user_modules::get_user_modules,
        handlers::user_modules::assign_user_modules,
        handlers::user_modules::set_user_modules,
        handlers::user_modules::clear_user_modules,
        handlers::user_modules::remove_user_module,
        handlers::user_modules::get_available_modules,

        // --- Company Modules ---
        handlers::company_modules::list_company_modules,
        handlers::company_modules::list_enabled_company_modules,
        handlers::company_modules::get_catalog_with_status,
        handlers::company_modules::set_company_modules,
        handlers::company_modules::toggle_company_module,
        handlers::company_modules::remove_company_module,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- Companies ---
            models::company::Company,
            models::company::CompanySummary,
            models::company::CreateCompanyPayload,
            models::company::UpdateCompanyPayload,

            // --- Modules ---
            models::module::Module,
            models::module::ModuleWithStatus,
            models::module::CreateModulePayload,
            models::module::UpdateModulePayload,

            // --- Users ---
            models::user::User,
            models::user::CreateUserPayload,
            models::user::UpdateUserPayload,

            // --- Entitlements ---
            models::entitlement::CompanyModule,
            models::entitlement::CompanyModuleDetail,
            models::entitlement::UserModule,
            models::entitlement::ToggleCompanyModulePayload,
            models::entitlement::ModuleIdsPayload,
        )
    ),
    tags(
        (name = "Auth", description = "Login"),
        (name = "Me", description = "Dados e módulos do usuário autenticado"),
        (name = "Companies", description = "Gestão de Companies (tenants)"),
        (name = "Modules", description = "Catálogo global de módulos"),
        (name = "Users", description = "Gestão de Usuários"),
        (name = "User Modules", description = "Atribuição de módulos por usuário"),
        (name = "Company Modules", description = "Habilitação de módulos por company")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
