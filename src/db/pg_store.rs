// src/db/pg_store.rs

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        company_module_repo::CompanyModuleRepository,
        company_repo::CompanyRepository,
        module_repo::ModuleRepository,
        store::{
            CompanyModuleFilter, EntitlementStore, NewCompany, NewModule, NewUser, StoreTx,
            TxScope, UserModuleFilter, UserPatch,
        },
        user_module_repo::UserModuleRepository,
        user_repo::UserRepository,
    },
    models::{
        company::{Company, UpdateCompanyPayload},
        entitlement::{CompanyModule, UserModule},
        module::{Module, UpdateModulePayload},
        user::User,
    },
};

/// Store Postgres. Cada escopo com chave pega um advisory lock de transação,
/// liberado sozinho no COMMIT/ROLLBACK.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntitlementStore for PgStore {
    async fn begin(&self, scope: TxScope) -> Result<Box<dyn StoreTx>, AppError> {
        // 1. Inicia a transação
        let mut tx = self.pool.begin().await?;

        // 2. Leitura: uma única fotografia para todas as consultas
        if scope == TxScope::Snapshot {
            sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
                .execute(&mut *tx)
                .await?;
        }

        // 3. Escrita com escopo: serializa com quem tem a mesma chave
        if let Some(key) = scope.lock_key() {
            sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
                .bind(key)
                .execute(&mut *tx)
                .await?;
        }

        Ok(Box::new(PgTx {
            tx,
            companies: CompanyRepository,
            modules: ModuleRepository,
            users: UserRepository,
            company_modules: CompanyModuleRepository,
            user_modules: UserModuleRepository,
        }))
    }
}

struct PgTx {
    tx: Transaction<'static, Postgres>,
    companies: CompanyRepository,
    modules: ModuleRepository,
    users: UserRepository,
    company_modules: CompanyModuleRepository,
    user_modules: UserModuleRepository,
}

#[async_trait]
impl StoreTx for PgTx {
    async fn find_company(&mut self, id: Uuid) -> Result<Option<Company>, AppError> {
        self.companies.find_by_id(&mut *self.tx, id).await
    }

    async fn list_companies(&mut self) -> Result<Vec<Company>, AppError> {
        self.companies.list(&mut *self.tx).await
    }

    async fn insert_company(&mut self, new: NewCompany) -> Result<Company, AppError> {
        self.companies.create(&mut *self.tx, new).await
    }

    async fn update_company(
        &mut self,
        id: Uuid,
        patch: UpdateCompanyPayload,
    ) -> Result<Option<Company>, AppError> {
        self.companies.update(&mut *self.tx, id, patch).await
    }

    async fn delete_company(&mut self, id: Uuid) -> Result<u64, AppError> {
        self.companies.delete(&mut *self.tx, id).await
    }

    async fn find_modules(&mut self, ids: &[Uuid]) -> Result<Vec<Module>, AppError> {
        self.modules.find_many(&mut *self.tx, ids).await
    }

    async fn list_modules(&mut self) -> Result<Vec<Module>, AppError> {
        self.modules.list(&mut *self.tx).await
    }

    async fn insert_module(&mut self, new: NewModule) -> Result<Module, AppError> {
        self.modules.create(&mut *self.tx, new).await
    }

    async fn update_module(
        &mut self,
        id: Uuid,
        patch: UpdateModulePayload,
    ) -> Result<Option<Module>, AppError> {
        self.modules.update(&mut *self.tx, id, patch).await
    }

    async fn delete_module(&mut self, id: Uuid) -> Result<u64, AppError> {
        self.modules.delete(&mut *self.tx, id).await
    }

    async fn find_user(&mut self, id: Uuid) -> Result<Option<User>, AppError> {
        self.users.find_by_id(&mut *self.tx, id).await
    }

    async fn find_user_by_username(&mut self, username: &str) -> Result<Option<User>, AppError> {
        self.users.find_by_username(&mut *self.tx, username).await
    }

    async fn list_users(&mut self, company_id: Option<Uuid>) -> Result<Vec<User>, AppError> {
        self.users.list(&mut *self.tx, company_id).await
    }

    async fn insert_user(&mut self, new: NewUser) -> Result<User, AppError> {
        self.users.create(&mut *self.tx, new).await
    }

    async fn update_user(&mut self, id: Uuid, patch: UserPatch) -> Result<Option<User>, AppError> {
        self.users.update(&mut *self.tx, id, patch).await
    }

    async fn delete_user(&mut self, id: Uuid) -> Result<u64, AppError> {
        self.users.delete(&mut *self.tx, id).await
    }

    async fn find_company_modules(
        &mut self,
        filter: &CompanyModuleFilter,
    ) -> Result<Vec<CompanyModule>, AppError> {
        self.company_modules.find_many(&mut *self.tx, filter).await
    }

    async fn insert_company_modules(
        &mut self,
        company_id: Uuid,
        module_ids: &[Uuid],
        is_enabled: bool,
    ) -> Result<u64, AppError> {
        self.company_modules
            .create_many(&mut *self.tx, company_id, module_ids, is_enabled)
            .await
    }

    async fn update_company_modules(
        &mut self,
        filter: &CompanyModuleFilter,
        is_enabled: bool,
    ) -> Result<u64, AppError> {
        self.company_modules.update_many(&mut *self.tx, filter, is_enabled).await
    }

    async fn delete_company_modules(
        &mut self,
        filter: &CompanyModuleFilter,
    ) -> Result<u64, AppError> {
        self.company_modules.delete_many(&mut *self.tx, filter).await
    }

    async fn upsert_company_module(
        &mut self,
        company_id: Uuid,
        module_id: Uuid,
        is_enabled: bool,
    ) -> Result<CompanyModule, AppError> {
        self.company_modules
            .upsert(&mut *self.tx, company_id, module_id, is_enabled)
            .await
    }

    async fn find_user_modules(
        &mut self,
        filter: &UserModuleFilter,
    ) -> Result<Vec<UserModule>, AppError> {
        self.user_modules.find_many(&mut *self.tx, filter).await
    }

    async fn insert_user_modules(
        &mut self,
        user_id: Uuid,
        module_ids: &[Uuid],
    ) -> Result<u64, AppError> {
        self.user_modules.create_many(&mut *self.tx, user_id, module_ids).await
    }

    async fn delete_user_modules(&mut self, filter: &UserModuleFilter) -> Result<u64, AppError> {
        self.user_modules.delete_many(&mut *self.tx, filter).await
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        self.tx.commit().await?;
        Ok(())
    }
}
