pub mod auth;
pub mod company;
pub mod entitlement;
pub mod module;
pub mod user;
