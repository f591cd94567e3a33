pub mod auth;
pub mod company_module_service;
pub mod company_service;
pub mod consistency;
pub mod entitlement_service;
pub mod module_service;
pub mod user_module_service;
pub mod user_service;
