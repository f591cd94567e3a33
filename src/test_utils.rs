// src/test_utils.rs

//! Semeadura do store para os testes (`MemoryStore` por padrão). Cada helper abre e confirma a
//! sua própria transação, então chamadas sucessivas têm instantes distintos.

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::{
        CompanyModuleFilter, MemoryStore, NewCompany, NewModule, NewUser, SharedStore, TxScope,
        UserModuleFilter,
    },
    db::store::UserPatch,
    models::{
        company::Company,
        entitlement::CompanyModule,
        module::{Module, UpdateModulePayload},
        user::User,
    },
    services::user_service::hash_password,
};

pub const TEST_PASSWORD: &str = "Password123!";

/// Custo mínimo aceito pelo bcrypt; mantém os testes rápidos.
pub const TEST_BCRYPT_COST: u32 = 4;

pub struct Fixture {
    pub store: SharedStore,
}

impl Fixture {
    pub async fn new() -> Self {
        Self { store: Arc::new(MemoryStore::new()) }
    }

    /// Mesmos helpers sobre outro store (o `PgStore` dos testes com banco).
    pub fn with_store(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn company(&self, name: &str) -> Company {
        let mut tx = self.store.begin(TxScope::Admin).await.unwrap();
        let company = tx
            .insert_company(NewCompany { name: name.into(), legal_name: None, rfc: None })
            .await
            .unwrap();
        tx.commit().await.unwrap();
        company
    }

    pub async fn module(&self, key: &str, is_active: bool) -> Module {
        let mut tx = self.store.begin(TxScope::Admin).await.unwrap();
        let module = tx
            .insert_module(NewModule {
                key: key.into(),
                name: format!("Módulo {key}"),
                description: None,
                icon: "box".into(),
                is_active,
            })
            .await
            .unwrap();
        tx.commit().await.unwrap();
        module
    }

    /// Usuário ativo com a senha `TEST_PASSWORD`.
    pub async fn user(&self, company_id: Uuid, username: &str) -> User {
        let password_hash = hash_password(TEST_PASSWORD.into(), TEST_BCRYPT_COST).await.unwrap();
        let mut tx = self.store.begin(TxScope::Admin).await.unwrap();
        let user = tx
            .insert_user(NewUser {
                company_id,
                username: username.into(),
                email: format!("{username}@obrix.com"),
                full_name: format!("Usuário {username}"),
                password_hash,
                is_active: true,
            })
            .await
            .unwrap();
        tx.commit().await.unwrap();
        user
    }

    /// Linhas habilitadas, todas na mesma transação.
    pub async fn enable(&self, company_id: Uuid, module_ids: &[Uuid]) {
        let mut tx = self.store.begin(TxScope::Admin).await.unwrap();
        tx.insert_company_modules(company_id, module_ids, true).await.unwrap();
        tx.commit().await.unwrap();
    }

    pub async fn link_company_module(&self, company_id: Uuid, module_id: Uuid, is_enabled: bool) {
        let mut tx = self.store.begin(TxScope::Admin).await.unwrap();
        tx.upsert_company_module(company_id, module_id, is_enabled).await.unwrap();
        tx.commit().await.unwrap();
    }

    /// Atribuição direta, sem as validações do sincronizador.
    pub async fn assign(&self, user_id: Uuid, module_ids: &[Uuid]) {
        let mut tx = self.store.begin(TxScope::Admin).await.unwrap();
        tx.insert_user_modules(user_id, module_ids).await.unwrap();
        tx.commit().await.unwrap();
    }

    pub async fn set_module_active(&self, module_id: Uuid, is_active: bool) {
        let mut tx = self.store.begin(TxScope::Admin).await.unwrap();
        let patch = UpdateModulePayload { is_active: Some(is_active), ..Default::default() };
        tx.update_module(module_id, patch).await.unwrap();
        tx.commit().await.unwrap();
    }

    pub async fn set_user_active(&self, user_id: Uuid, is_active: bool) {
        let mut tx = self.store.begin(TxScope::Admin).await.unwrap();
        let patch = UserPatch { is_active: Some(is_active), ..Default::default() };
        tx.update_user(user_id, patch).await.unwrap();
        tx.commit().await.unwrap();
    }

    /// Ids atribuídos, da atribuição mais recente para a mais antiga.
    pub async fn user_module_ids(&self, user_id: Uuid) -> Vec<Uuid> {
        let mut tx = self.store.begin(TxScope::Snapshot).await.unwrap();
        let rows = tx.find_user_modules(&UserModuleFilter::user(user_id)).await.unwrap();
        rows.into_iter().map(|row| row.module_id).collect()
    }

    pub async fn company_module_rows(&self, company_id: Uuid) -> Vec<CompanyModule> {
        let mut tx = self.store.begin(TxScope::Snapshot).await.unwrap();
        tx.find_company_modules(&CompanyModuleFilter::company(company_id)).await.unwrap()
    }
}
