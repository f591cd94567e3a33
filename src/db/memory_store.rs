// src/db/memory_store.rs

//! Store em memória: usado quando não há `DATABASE_URL` e em todos os testes.
//!
//! Cada transação trabalha sobre uma cópia do estado confirmado e registra
//! as escritas num diário. No `commit()` o diário é reaplicado sobre o estado
//! confirmado mais recente, de uma vez, sob o lock de escrita. Chaves únicas e
//! referências são verificadas de novo nesse momento.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard, RwLock};
use uuid::Uuid;

use crate::{
    common::error::{AppError, EntityKind},
    db::store::{
        CompanyModuleFilter, EntitlementStore, NewCompany, NewModule, NewUser, StoreTx, TxScope,
        UserModuleFilter, UserPatch,
    },
    models::{
        company::{Company, UpdateCompanyPayload},
        entitlement::{CompanyModule, UserModule},
        module::{Module, UpdateModulePayload},
        user::User,
    },
};

#[derive(Debug, Clone, Default)]
struct Tables {
    companies: HashMap<Uuid, Company>,
    modules: HashMap<Uuid, Module>,
    users: HashMap<Uuid, User>,
    company_modules: HashMap<(Uuid, Uuid), CompanyModule>,
    user_modules: HashMap<(Uuid, Uuid), UserModule>,
}

#[derive(Debug, Clone)]
enum Write {
    InsertCompany(Company),
    UpdateCompany(Company),
    DeleteCompany(Uuid),
    InsertModule(Module),
    UpdateModule(Module),
    DeleteModule(Uuid),
    InsertUser(User),
    UpdateUser(User),
    DeleteUser(Uuid),
    InsertCompanyModules(Vec<CompanyModule>),
    UpdateCompanyModules {
        filter: CompanyModuleFilter,
        is_enabled: bool,
        at: DateTime<Utc>,
    },
    DeleteCompanyModules(CompanyModuleFilter),
    UpsertCompanyModule(CompanyModule),
    InsertUserModules(Vec<UserModule>),
    DeleteUserModules(UserModuleFilter),
}

impl Tables {
    fn check_company_unique(&self, row: &Company) -> Result<(), AppError> {
        let clash = row.rfc.as_ref().is_some_and(|rfc| {
            self.companies
                .values()
                .any(|c| c.id != row.id && c.rfc.as_deref() == Some(rfc.as_str()))
        });
        if clash {
            return Err(AppError::UniqueConstraintViolation("RFC já existe.".into()));
        }
        Ok(())
    }

    fn check_module_unique(&self, row: &Module) -> Result<(), AppError> {
        if self.modules.values().any(|m| m.id != row.id && m.key == row.key) {
            return Err(AppError::UniqueConstraintViolation("Key de módulo já existe.".into()));
        }
        Ok(())
    }

    fn check_user(&self, row: &User) -> Result<(), AppError> {
        if !self.companies.contains_key(&row.company_id) {
            return Err(AppError::not_found(EntityKind::Company, row.company_id));
        }
        let clash = self
            .users
            .values()
            .any(|u| u.id != row.id && (u.username == row.username || u.email == row.email));
        if clash {
            return Err(AppError::UniqueConstraintViolation(
                "E-mail ou username já existe.".into(),
            ));
        }
        Ok(())
    }

    fn check_link(&self, owner_exists: bool, module_id: Uuid) -> Result<(), AppError> {
        if !owner_exists || !self.modules.contains_key(&module_id) {
            return Err(AppError::ReferencedEntity(
                "O vínculo referencia um registro inexistente.".into(),
            ));
        }
        Ok(())
    }

    fn apply(&mut self, write: &Write) -> Result<u64, AppError> {
        match write {
            Write::InsertCompany(row) => {
                self.check_company_unique(row)?;
                self.companies.insert(row.id, row.clone());
                Ok(1)
            }
            Write::UpdateCompany(row) => {
                if !self.companies.contains_key(&row.id) {
                    return Ok(0);
                }
                self.check_company_unique(row)?;
                self.companies.insert(row.id, row.clone());
                Ok(1)
            }
            Write::DeleteCompany(id) => {
                if self.users.values().any(|u| u.company_id == *id) {
                    return Err(AppError::ReferencedEntity(
                        "A company ainda possui usuários.".into(),
                    ));
                }
                self.company_modules.retain(|(company_id, _), _| company_id != id);
                Ok(self.companies.remove(id).map_or(0, |_| 1))
            }
            Write::InsertModule(row) => {
                self.check_module_unique(row)?;
                self.modules.insert(row.id, row.clone());
                Ok(1)
            }
            Write::UpdateModule(row) => {
                if !self.modules.contains_key(&row.id) {
                    return Ok(0);
                }
                self.check_module_unique(row)?;
                self.modules.insert(row.id, row.clone());
                Ok(1)
            }
            Write::DeleteModule(id) => {
                self.company_modules.retain(|(_, module_id), _| module_id != id);
                self.user_modules.retain(|(_, module_id), _| module_id != id);
                Ok(self.modules.remove(id).map_or(0, |_| 1))
            }
            Write::InsertUser(row) => {
                self.check_user(row)?;
                self.users.insert(row.id, row.clone());
                Ok(1)
            }
            Write::UpdateUser(row) => {
                if !self.users.contains_key(&row.id) {
                    return Ok(0);
                }
                self.check_user(row)?;
                self.users.insert(row.id, row.clone());
                Ok(1)
            }
            Write::DeleteUser(id) => {
                self.user_modules.retain(|(user_id, _), _| user_id != id);
                Ok(self.users.remove(id).map_or(0, |_| 1))
            }
            Write::InsertCompanyModules(rows) => {
                let mut inserted = 0;
                for row in rows {
                    let key = (row.company_id, row.module_id);
                    if self.company_modules.contains_key(&key) {
                        continue;
                    }
                    self.check_link(self.companies.contains_key(&row.company_id), row.module_id)?;
                    self.company_modules.insert(key, row.clone());
                    inserted += 1;
                }
                Ok(inserted)
            }
            Write::UpdateCompanyModules { filter, is_enabled, at } => {
                let mut updated = 0;
                for row in self.company_modules.values_mut().filter(|r| filter.matches(r)) {
                    row.is_enabled = *is_enabled;
                    row.updated_at = *at;
                    updated += 1;
                }
                Ok(updated)
            }
            Write::DeleteCompanyModules(filter) => {
                let before = self.company_modules.len();
                self.company_modules.retain(|_, row| !filter.matches(row));
                Ok((before - self.company_modules.len()) as u64)
            }
            Write::UpsertCompanyModule(row) => {
                let key = (row.company_id, row.module_id);
                match self.company_modules.get_mut(&key) {
                    Some(existing) => {
                        existing.is_enabled = row.is_enabled;
                        existing.updated_at = row.updated_at;
                    }
                    None => {
                        self.check_link(
                            self.companies.contains_key(&row.company_id),
                            row.module_id,
                        )?;
                        self.company_modules.insert(key, row.clone());
                    }
                }
                Ok(1)
            }
            Write::InsertUserModules(rows) => {
                let mut inserted = 0;
                for row in rows {
                    let key = (row.user_id, row.module_id);
                    if self.user_modules.contains_key(&key) {
                        continue;
                    }
                    self.check_link(self.users.contains_key(&row.user_id), row.module_id)?;
                    self.user_modules.insert(key, row.clone());
                    inserted += 1;
                }
                Ok(inserted)
            }
            Write::DeleteUserModules(filter) => {
                let before = self.user_modules.len();
                self.user_modules.retain(|_, row| !filter.matches(row));
                Ok((before - self.user_modules.len()) as u64)
            }
        }
    }
}

fn newest_first<T, K: Ord>(
    mut rows: Vec<T>,
    created_at: impl Fn(&T) -> DateTime<Utc>,
    tie: impl Fn(&T) -> K,
) -> Vec<T> {
    rows.sort_by(|a, b| {
        created_at(b)
            .cmp(&created_at(a))
            .then_with(|| tie(a).cmp(&tie(b)))
    });
    rows
}

type ScopeLocks = Arc<DashMap<String, Arc<AsyncMutex<()>>>>;

#[derive(Clone, Default)]
pub struct MemoryStore {
    committed: Arc<RwLock<Tables>>,
    scope_locks: ScopeLocks,
    clock: Arc<Mutex<DateTime<Utc>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instante da transação: todas as linhas escritas nela compartilham o
    /// mesmo `created_at`, e transações sucessivas nunca repetem o instante.
    fn tick(&self) -> DateTime<Utc> {
        let mut last = self.clock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let now = Utc::now().max(*last + Duration::microseconds(1));
        *last = now;
        now
    }
}

#[async_trait]
impl EntitlementStore for MemoryStore {
    async fn begin(&self, scope: TxScope) -> Result<Box<dyn StoreTx>, AppError> {
        // O lock do escopo vem antes da cópia, para enxergar o commit do antecessor.
        let guard = match scope.lock_key() {
            Some(key) => Some(ScopeLock::acquire(self.scope_locks.clone(), key).await),
            None => None,
        };

        let view = self.committed.read().await.clone();

        Ok(Box::new(MemoryTx {
            committed: self.committed.clone(),
            view,
            journal: Vec::new(),
            now: self.tick(),
            read_only: scope == TxScope::Snapshot,
            _guard: guard,
        }))
    }
}

struct MemoryTx {
    committed: Arc<RwLock<Tables>>,
    view: Tables,
    journal: Vec<Write>,
    now: DateTime<Utc>,
    read_only: bool,
    _guard: Option<ScopeLock>,
}

/// Lock de um escopo. Ao ser solto, a entrada sai da tabela se ninguém mais
/// a segura ou espera por ela.
struct ScopeLock {
    key: String,
    locks: ScopeLocks,
    guard: Option<OwnedMutexGuard<()>>,
}

impl ScopeLock {
    async fn acquire(locks: ScopeLocks, key: String) -> Self {
        // O clone acontece sob o lock do shard, o mesmo que `remove_if` usa.
        let lock = locks.entry(key.clone()).or_default().clone();
        let guard = lock.lock_owned().await;
        Self { key, locks, guard: Some(guard) }
    }
}

impl Drop for ScopeLock {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks.remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl MemoryTx {
    fn record(&mut self, write: Write) -> Result<u64, AppError> {
        if self.read_only {
            return Err(AppError::InternalServerError(anyhow!(
                "escrita numa transação somente leitura"
            )));
        }
        let affected = self.view.apply(&write)?;
        self.journal.push(write);
        Ok(affected)
    }
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn find_company(&mut self, id: Uuid) -> Result<Option<Company>, AppError> {
        Ok(self.view.companies.get(&id).cloned())
    }

    async fn list_companies(&mut self) -> Result<Vec<Company>, AppError> {
        let rows = self.view.companies.values().cloned().collect();
        Ok(newest_first(rows, |c: &Company| c.created_at, |c| c.id))
    }

    async fn insert_company(&mut self, new: NewCompany) -> Result<Company, AppError> {
        let row = Company {
            id: Uuid::new_v4(),
            name: new.name,
            legal_name: new.legal_name,
            rfc: new.rfc,
            created_at: self.now,
            updated_at: self.now,
        };
        self.record(Write::InsertCompany(row.clone()))?;
        Ok(row)
    }

    async fn update_company(
        &mut self,
        id: Uuid,
        patch: UpdateCompanyPayload,
    ) -> Result<Option<Company>, AppError> {
        let Some(mut row) = self.view.companies.get(&id).cloned() else {
            return Ok(None);
        };
        if let Some(name) = patch.name {
            row.name = name;
        }
        if patch.legal_name.is_some() {
            row.legal_name = patch.legal_name;
        }
        if patch.rfc.is_some() {
            row.rfc = patch.rfc;
        }
        row.updated_at = self.now;
        self.record(Write::UpdateCompany(row.clone()))?;
        Ok(Some(row))
    }

    async fn delete_company(&mut self, id: Uuid) -> Result<u64, AppError> {
        self.record(Write::DeleteCompany(id))
    }

    async fn find_modules(&mut self, ids: &[Uuid]) -> Result<Vec<Module>, AppError> {
        let rows = ids
            .iter()
            .filter_map(|id| self.view.modules.get(id).cloned())
            .collect();
        Ok(newest_first(rows, |m: &Module| m.created_at, |m| m.id))
    }

    async fn list_modules(&mut self) -> Result<Vec<Module>, AppError> {
        let rows = self.view.modules.values().cloned().collect();
        Ok(newest_first(rows, |m: &Module| m.created_at, |m| m.id))
    }

    async fn insert_module(&mut self, new: NewModule) -> Result<Module, AppError> {
        let row = Module {
            id: Uuid::new_v4(),
            key: new.key,
            name: new.name,
            description: new.description,
            icon: new.icon,
            is_active: new.is_active,
            created_at: self.now,
            updated_at: self.now,
        };
        self.record(Write::InsertModule(row.clone()))?;
        Ok(row)
    }

    async fn update_module(
        &mut self,
        id: Uuid,
        patch: UpdateModulePayload,
    ) -> Result<Option<Module>, AppError> {
        let Some(mut row) = self.view.modules.get(&id).cloned() else {
            return Ok(None);
        };
        if let Some(key) = patch.key {
            row.key = key;
        }
        if let Some(name) = patch.name {
            row.name = name;
        }
        if patch.description.is_some() {
            row.description = patch.description;
        }
        if let Some(icon) = patch.icon {
            row.icon = icon;
        }
        if let Some(is_active) = patch.is_active {
            row.is_active = is_active;
        }
        row.updated_at = self.now;
        self.record(Write::UpdateModule(row.clone()))?;
        Ok(Some(row))
    }

    async fn delete_module(&mut self, id: Uuid) -> Result<u64, AppError> {
        self.record(Write::DeleteModule(id))
    }

    async fn find_user(&mut self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.view.users.get(&id).cloned())
    }

    async fn find_user_by_username(&mut self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self.view.users.values().find(|u| u.username == username).cloned())
    }

    async fn list_users(&mut self, company_id: Option<Uuid>) -> Result<Vec<User>, AppError> {
        let rows = self
            .view
            .users
            .values()
            .filter(|u| company_id.is_none_or(|c| u.company_id == c))
            .cloned()
            .collect();
        Ok(newest_first(rows, |u: &User| u.created_at, |u| u.id))
    }

    async fn insert_user(&mut self, new: NewUser) -> Result<User, AppError> {
        let row = User {
            id: Uuid::new_v4(),
            company_id: new.company_id,
            username: new.username,
            email: new.email,
            full_name: new.full_name,
            password_hash: new.password_hash,
            is_active: new.is_active,
            created_at: self.now,
            updated_at: self.now,
        };
        self.record(Write::InsertUser(row.clone()))?;
        Ok(row)
    }

    async fn update_user(&mut self, id: Uuid, patch: UserPatch) -> Result<Option<User>, AppError> {
        let Some(mut row) = self.view.users.get(&id).cloned() else {
            return Ok(None);
        };
        if let Some(company_id) = patch.company_id {
            row.company_id = company_id;
        }
        if let Some(username) = patch.username {
            row.username = username;
        }
        if let Some(email) = patch.email {
            row.email = email;
        }
        if let Some(full_name) = patch.full_name {
            row.full_name = full_name;
        }
        if let Some(password_hash) = patch.password_hash {
            row.password_hash = password_hash;
        }
        if let Some(is_active) = patch.is_active {
            row.is_active = is_active;
        }
        row.updated_at = self.now;
        self.record(Write::UpdateUser(row.clone()))?;
        Ok(Some(row))
    }

    async fn delete_user(&mut self, id: Uuid) -> Result<u64, AppError> {
        self.record(Write::DeleteUser(id))
    }

    async fn find_company_modules(
        &mut self,
        filter: &CompanyModuleFilter,
    ) -> Result<Vec<CompanyModule>, AppError> {
        let rows = self
            .view
            .company_modules
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        Ok(newest_first(rows, |r: &CompanyModule| r.created_at, |r| r.module_id))
    }

    async fn insert_company_modules(
        &mut self,
        company_id: Uuid,
        module_ids: &[Uuid],
        is_enabled: bool,
    ) -> Result<u64, AppError> {
        let rows = module_ids
            .iter()
            .map(|module_id| CompanyModule {
                company_id,
                module_id: *module_id,
                is_enabled,
                created_at: self.now,
                updated_at: self.now,
            })
            .collect();
        self.record(Write::InsertCompanyModules(rows))
    }

    async fn update_company_modules(
        &mut self,
        filter: &CompanyModuleFilter,
        is_enabled: bool,
    ) -> Result<u64, AppError> {
        self.record(Write::UpdateCompanyModules {
            filter: filter.clone(),
            is_enabled,
            at: self.now,
        })
    }

    async fn delete_company_modules(
        &mut self,
        filter: &CompanyModuleFilter,
    ) -> Result<u64, AppError> {
        self.record(Write::DeleteCompanyModules(filter.clone()))
    }

    async fn upsert_company_module(
        &mut self,
        company_id: Uuid,
        module_id: Uuid,
        is_enabled: bool,
    ) -> Result<CompanyModule, AppError> {
        let row = CompanyModule {
            company_id,
            module_id,
            is_enabled,
            created_at: self.now,
            updated_at: self.now,
        };
        self.record(Write::UpsertCompanyModule(row))?;

        self.view
            .company_modules
            .get(&(company_id, module_id))
            .cloned()
            .ok_or_else(|| AppError::InternalServerError(anyhow!("upsert sem linha resultante")))
    }

    async fn find_user_modules(
        &mut self,
        filter: &UserModuleFilter,
    ) -> Result<Vec<UserModule>, AppError> {
        let rows = self
            .view
            .user_modules
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        Ok(newest_first(rows, |r: &UserModule| r.created_at, |r| r.module_id))
    }

    async fn insert_user_modules(
        &mut self,
        user_id: Uuid,
        module_ids: &[Uuid],
    ) -> Result<u64, AppError> {
        let rows = module_ids
            .iter()
            .map(|module_id| UserModule { user_id, module_id: *module_id, created_at: self.now })
            .collect();
        self.record(Write::InsertUserModules(rows))
    }

    async fn delete_user_modules(&mut self, filter: &UserModuleFilter) -> Result<u64, AppError> {
        self.record(Write::DeleteUserModules(filter.clone()))
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let this = *self;
        if this.journal.is_empty() {
            return Ok(());
        }

        let mut committed = this.committed.write().await;
        let mut next = committed.clone();
        for write in &this.journal {
            next.apply(write)?;
        }
        *committed = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration as StdDuration;

    fn new_company(name: &str) -> NewCompany {
        NewCompany { name: name.into(), legal_name: None, rfc: None }
    }

    #[test_log::test(tokio::test)]
    async fn dropped_transaction_rolls_back() {
        let store = MemoryStore::new();

        let mut tx = store.begin(TxScope::Admin).await.unwrap();
        tx.insert_company(new_company("Obrix")).await.unwrap();
        drop(tx);

        let mut read = store.begin(TxScope::Snapshot).await.unwrap();
        assert!(read.list_companies().await.unwrap().is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn snapshot_does_not_see_later_commits() {
        let store = MemoryStore::new();
        let mut read = store.begin(TxScope::Snapshot).await.unwrap();

        let mut tx = store.begin(TxScope::Admin).await.unwrap();
        tx.insert_company(new_company("Obrix")).await.unwrap();
        tx.commit().await.unwrap();

        assert!(read.list_companies().await.unwrap().is_empty());
        let mut fresh = store.begin(TxScope::Snapshot).await.unwrap();
        assert_eq!(fresh.list_companies().await.unwrap().len(), 1);
    }

    #[test_log::test(tokio::test)]
    async fn snapshot_rejects_writes() {
        let store = MemoryStore::new();
        let mut read = store.begin(TxScope::Snapshot).await.unwrap();
        assert!(read.insert_company(new_company("Obrix")).await.is_err());
    }

    #[test_log::test(tokio::test)]
    async fn same_scope_waits_other_scopes_do_not() {
        let store = MemoryStore::new();
        let company = Uuid::new_v4();

        let holder = store.begin(TxScope::Company(company)).await.unwrap();

        let blocked = tokio::time::timeout(
            StdDuration::from_millis(50),
            store.begin(TxScope::Company(company)),
        )
        .await;
        assert!(blocked.is_err(), "mesmo escopo deveria esperar");

        let other = tokio::time::timeout(
            StdDuration::from_millis(50),
            store.begin(TxScope::Company(Uuid::new_v4())),
        )
        .await;
        assert!(other.is_ok(), "escopo diferente não deveria esperar");

        drop(holder);
        let after = tokio::time::timeout(
            StdDuration::from_millis(50),
            store.begin(TxScope::Company(company)),
        )
        .await;
        assert!(after.is_ok());
    }

    #[test_log::test(tokio::test)]
    async fn unique_keys_are_rechecked_at_commit() {
        let store = MemoryStore::new();
        let module = |key: &str| NewModule {
            key: key.into(),
            name: "Obras".into(),
            description: None,
            icon: "building".into(),
            is_active: true,
        };

        let mut first = store.begin(TxScope::Admin).await.unwrap();
        let mut second = store.begin(TxScope::Admin).await.unwrap();
        first.insert_module(module("OBRAS")).await.unwrap();
        second.insert_module(module("OBRAS")).await.unwrap();

        first.commit().await.unwrap();
        let err = second.commit().await.unwrap_err();
        assert!(matches!(err, AppError::UniqueConstraintViolation(_)));
    }

    #[test_log::test(tokio::test)]
    async fn rows_written_in_one_transaction_share_created_at() {
        let store = MemoryStore::new();
        let mut tx = store.begin(TxScope::Admin).await.unwrap();
        let company = tx.insert_company(new_company("Obrix")).await.unwrap();
        let mut ids = Vec::new();
        for key in ["A1", "B1", "C1"] {
            let m = tx
                .insert_module(NewModule {
                    key: key.into(),
                    name: key.into(),
                    description: None,
                    icon: "x".into(),
                    is_active: true,
                })
                .await
                .unwrap();
            ids.push(m.id);
        }
        tx.insert_company_modules(company.id, &ids, true).await.unwrap();
        tx.commit().await.unwrap();

        let mut read = store.begin(TxScope::Snapshot).await.unwrap();
        let rows = read
            .find_company_modules(&CompanyModuleFilter::company(company.id))
            .await
            .unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.created_at == rows[0].created_at));

        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(rows.iter().map(|r| r.module_id).collect::<Vec<_>>(), sorted);
    }

    async fn seed_company_and_module(store: &MemoryStore) -> (Company, Module) {
        let mut tx = store.begin(TxScope::Admin).await.unwrap();
        let company = tx.insert_company(new_company("Obrix")).await.unwrap();
        let module = tx
            .insert_module(NewModule {
                key: "OBRAS".into(),
                name: "Obras".into(),
                description: None,
                icon: "building".into(),
                is_active: true,
            })
            .await
            .unwrap();
        tx.commit().await.unwrap();
        (company, module)
    }

    #[test_log::test(tokio::test)]
    async fn pending_company_writes_are_invisible_to_snapshots() {
        let store = MemoryStore::new();
        let (company, module) = seed_company_and_module(&store).await;

        // Passo de criação do set-diff, ainda sem commit.
        let mut writer = store.begin(TxScope::Company(company.id)).await.unwrap();
        writer.insert_company_modules(company.id, &[module.id], true).await.unwrap();
        assert_eq!(
            writer
                .find_company_modules(&CompanyModuleFilter::company(company.id))
                .await
                .unwrap()
                .len(),
            1
        );

        let mut during = store.begin(TxScope::Snapshot).await.unwrap();
        assert!(
            during
                .find_company_modules(&CompanyModuleFilter::company(company.id))
                .await
                .unwrap()
                .is_empty()
        );

        writer.commit().await.unwrap();

        // A fotografia aberta antes do commit continua sem as linhas.
        assert!(
            during
                .find_company_modules(&CompanyModuleFilter::company(company.id))
                .await
                .unwrap()
                .is_empty()
        );
        let mut after = store.begin(TxScope::Snapshot).await.unwrap();
        let rows = after
            .find_company_modules(&CompanyModuleFilter::enabled(company.id))
            .await
            .unwrap();
        assert_eq!(rows.iter().map(|r| r.module_id).collect::<Vec<_>>(), vec![module.id]);
    }

    #[test_log::test(tokio::test)]
    async fn scope_lock_entries_are_released() {
        let store = MemoryStore::new();
        let company = Uuid::new_v4();
        let user = Uuid::new_v4();

        let tx = store.begin(TxScope::Company(company)).await.unwrap();
        assert_eq!(store.scope_locks.len(), 1);
        tx.commit().await.unwrap();
        assert!(store.scope_locks.is_empty());

        let tx = store.begin(TxScope::User(user)).await.unwrap();
        drop(tx);
        assert!(store.scope_locks.is_empty());

        // Com alguém esperando, a entrada fica até o último soltar.
        let holder = store.begin(TxScope::Company(company)).await.unwrap();
        let waiter = {
            let store = store.clone();
            tokio::spawn(async move { store.begin(TxScope::Company(company)).await.map(drop) })
        };
        tokio::time::sleep(StdDuration::from_millis(20)).await;
        drop(holder);
        assert!(waiter.await.unwrap().is_ok());
        assert!(store.scope_locks.is_empty());

        for _ in 0..100 {
            store.begin(TxScope::Company(Uuid::new_v4())).await.unwrap();
        }
        assert!(store.scope_locks.is_empty());
    }
}
