pub mod auth;
pub mod companies;
pub mod company_modules;
pub mod modules;
pub mod user_modules;
pub mod users;
