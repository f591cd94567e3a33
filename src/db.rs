pub mod store;
pub use store::{
    CompanyModuleFilter, EntitlementStore, NewCompany, NewModule, NewUser, SharedStore, StoreTx,
    TxScope, UserModuleFilter, UserPatch,
};

pub mod memory_store;
pub use memory_store::MemoryStore;

pub mod pg_store;
pub use pg_store::PgStore;

pub mod company_repo;
pub mod company_module_repo;
pub mod module_repo;
pub mod user_module_repo;
pub mod user_repo;
