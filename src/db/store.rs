// src/db/store.rs

//! O contrato de armazenamento consumido pelo motor de entitlements.
//!
//! Toda operação abre uma transação com um [`TxScope`]. Transações do mesmo
//! escopo (a mesma company, o mesmo usuário) são serializadas; escopos
//! diferentes correm em paralelo. Uma transação descartada sem `commit()`
//! é desfeita.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        company::{Company, UpdateCompanyPayload},
        entitlement::{CompanyModule, UserModule},
        module::{Module, UpdateModulePayload},
        user::User,
    },
};

pub type SharedStore = Arc<dyn EntitlementStore>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxScope {
    /// Somente leitura, uma única fotografia consistente.
    Snapshot,
    /// Read-modify-write sobre a habilitação de uma company.
    Company(Uuid),
    /// Read-modify-write sobre as atribuições de um usuário.
    User(Uuid),
    /// Escritas CRUD sem leitura-diff-escrita.
    Admin,
}

impl TxScope {
    /// Chave usada para o lock do escopo. `None` = sem lock.
    pub fn lock_key(&self) -> Option<String> {
        match self {
            TxScope::Company(id) => Some(format!("company:{id}")),
            TxScope::User(id) => Some(format!("user:{id}")),
            TxScope::Snapshot | TxScope::Admin => None,
        }
    }
}

/// Filtro de `findMany`/`updateMany`/`deleteMany` sobre company_modules.
#[derive(Debug, Clone, PartialEq)]
pub struct CompanyModuleFilter {
    pub company_id: Uuid,
    pub module_ids: Option<Vec<Uuid>>,
    pub is_enabled: Option<bool>,
}

impl CompanyModuleFilter {
    pub fn company(company_id: Uuid) -> Self {
        Self { company_id, module_ids: None, is_enabled: None }
    }

    pub fn enabled(company_id: Uuid) -> Self {
        Self { company_id, module_ids: None, is_enabled: Some(true) }
    }

    pub fn modules(company_id: Uuid, module_ids: Vec<Uuid>) -> Self {
        Self { company_id, module_ids: Some(module_ids), is_enabled: None }
    }

    pub fn matches(&self, row: &CompanyModule) -> bool {
        row.company_id == self.company_id
            && self.module_ids.as_ref().is_none_or(|ids| ids.contains(&row.module_id))
            && self.is_enabled.is_none_or(|flag| row.is_enabled == flag)
    }
}

/// Filtro sobre user_modules.
#[derive(Debug, Clone, PartialEq)]
pub struct UserModuleFilter {
    pub user_id: Uuid,
    pub module_ids: Option<Vec<Uuid>>,
}

impl UserModuleFilter {
    pub fn user(user_id: Uuid) -> Self {
        Self { user_id, module_ids: None }
    }

    pub fn modules(user_id: Uuid, module_ids: Vec<Uuid>) -> Self {
        Self { user_id, module_ids: Some(module_ids) }
    }

    pub fn matches(&self, row: &UserModule) -> bool {
        row.user_id == self.user_id
            && self.module_ids.as_ref().is_none_or(|ids| ids.contains(&row.module_id))
    }
}

#[derive(Debug, Clone)]
pub struct NewCompany {
    pub name: String,
    pub legal_name: Option<String>,
    pub rfc: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewModule {
    pub key: String,
    pub name: String,
    pub description: Option<String>,
    pub icon: String,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub company_id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub is_active: bool,
}

/// Patch de usuário já com a senha transformada em hash.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub company_id: Option<Uuid>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub password_hash: Option<String>,
    pub is_active: Option<bool>,
}

#[async_trait]
pub trait EntitlementStore: Send + Sync {
    async fn begin(&self, scope: TxScope) -> Result<Box<dyn StoreTx>, AppError>;
}

/// Uma transação aberta. Listagens vêm ordenadas por `created_at DESC`
/// (empates pelo id ascendente).
#[async_trait]
pub trait StoreTx: Send {
    // --- companies ---
    async fn find_company(&mut self, id: Uuid) -> Result<Option<Company>, AppError>;
    async fn list_companies(&mut self) -> Result<Vec<Company>, AppError>;
    async fn insert_company(&mut self, new: NewCompany) -> Result<Company, AppError>;
    async fn update_company(
        &mut self,
        id: Uuid,
        patch: UpdateCompanyPayload,
    ) -> Result<Option<Company>, AppError>;
    async fn delete_company(&mut self, id: Uuid) -> Result<u64, AppError>;

    // --- catálogo ---
    async fn find_modules(&mut self, ids: &[Uuid]) -> Result<Vec<Module>, AppError>;
    async fn list_modules(&mut self) -> Result<Vec<Module>, AppError>;
    async fn insert_module(&mut self, new: NewModule) -> Result<Module, AppError>;
    async fn update_module(
        &mut self,
        id: Uuid,
        patch: UpdateModulePayload,
    ) -> Result<Option<Module>, AppError>;
    async fn delete_module(&mut self, id: Uuid) -> Result<u64, AppError>;

    // --- usuários ---
    async fn find_user(&mut self, id: Uuid) -> Result<Option<User>, AppError>;
    async fn find_user_by_username(&mut self, username: &str) -> Result<Option<User>, AppError>;
    async fn list_users(&mut self, company_id: Option<Uuid>) -> Result<Vec<User>, AppError>;
    async fn insert_user(&mut self, new: NewUser) -> Result<User, AppError>;
    async fn update_user(&mut self, id: Uuid, patch: UserPatch) -> Result<Option<User>, AppError>;
    async fn delete_user(&mut self, id: Uuid) -> Result<u64, AppError>;

    // --- company_modules ---
    async fn find_company_modules(
        &mut self,
        filter: &CompanyModuleFilter,
    ) -> Result<Vec<CompanyModule>, AppError>;
    /// createMany com skipDuplicates: pares já existentes são ignorados.
    async fn insert_company_modules(
        &mut self,
        company_id: Uuid,
        module_ids: &[Uuid],
        is_enabled: bool,
    ) -> Result<u64, AppError>;
    async fn update_company_modules(
        &mut self,
        filter: &CompanyModuleFilter,
        is_enabled: bool,
    ) -> Result<u64, AppError>;
    async fn delete_company_modules(&mut self, filter: &CompanyModuleFilter)
    -> Result<u64, AppError>;
    /// Find-or-create-or-update pela chave composta (company_id, module_id).
    async fn upsert_company_module(
        &mut self,
        company_id: Uuid,
        module_id: Uuid,
        is_enabled: bool,
    ) -> Result<CompanyModule, AppError>;

    // --- user_modules ---
    async fn find_user_modules(
        &mut self,
        filter: &UserModuleFilter,
    ) -> Result<Vec<UserModule>, AppError>;
    /// createMany com skipDuplicates.
    async fn insert_user_modules(
        &mut self,
        user_id: Uuid,
        module_ids: &[Uuid],
    ) -> Result<u64, AppError>;
    async fn delete_user_modules(&mut self, filter: &UserModuleFilter) -> Result<u64, AppError>;

    async fn commit(self: Box<Self>) -> Result<(), AppError>;
}

/// Remove duplicados preservando a ordem em que os ids chegaram.
pub fn dedup_ids(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = std::collections::HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_keeps_first_occurrence_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(dedup_ids(&[b, a, b, a]), vec![b, a]);
        assert!(dedup_ids(&[]).is_empty());
    }

    #[test]
    fn scope_lock_keys() {
        let id = Uuid::new_v4();
        assert_eq!(TxScope::Company(id).lock_key(), Some(format!("company:{id}")));
        assert_ne!(TxScope::Company(id).lock_key(), TxScope::User(id).lock_key());
        assert_eq!(TxScope::Snapshot.lock_key(), None);
        assert_eq!(TxScope::Admin.lock_key(), None);
    }
}
