// src/services/user_module_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{store::dedup_ids, SharedStore, StoreTx, TxScope, UserModuleFilter},
    models::{module::Module, user::User},
    services::{consistency::ConsistencyValidator, entitlement_service::EntitlementService},
};

/// Atribuição de módulos por usuário, sempre limitada ao que a company habilitou.
///
/// Estados por célula (usuário, módulo): NotExists -> Assigned -> NotExists.
/// Todas as operações devolvem os módulos EFETIVOS após a escrita.
#[derive(Clone)]
pub struct UserModuleService {
    store: SharedStore,
}

impl UserModuleService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Acrescenta módulos (merge). Reatribuir um módulo já atribuído não é erro.
    pub async fn assign_modules(
        &self,
        user_id: Uuid,
        module_ids: &[Uuid],
    ) -> Result<Vec<Module>, AppError> {
        let module_ids = dedup_ids(module_ids);

        let mut tx = self.store.begin(TxScope::User(user_id)).await?;

        let user = ConsistencyValidator::ensure_user_exists(&mut *tx, user_id).await?;
        Self::ensure_assignable(&mut *tx, &user, &module_ids).await?;

        if !module_ids.is_empty() {
            tx.insert_user_modules(user.id, &module_ids).await?;
        }

        let effective = EntitlementService::effective_modules_for(&mut *tx, &user).await?;
        tx.commit().await?;
        Ok(effective)
    }

    /// Substitui TODAS as atribuições pelo conjunto pedido (last-write-wins).
    /// Conjunto vazio deixa o usuário sem módulos.
    pub async fn set_user_modules(
        &self,
        user_id: Uuid,
        module_ids: &[Uuid],
    ) -> Result<Vec<Module>, AppError> {
        let module_ids = dedup_ids(module_ids);

        let mut tx = self.store.begin(TxScope::User(user_id)).await?;

        let user = ConsistencyValidator::ensure_user_exists(&mut *tx, user_id).await?;
        Self::ensure_assignable(&mut *tx, &user, &module_ids).await?;

        tx.delete_user_modules(&UserModuleFilter::user(user.id)).await?;
        if !module_ids.is_empty() {
            tx.insert_user_modules(user.id, &module_ids).await?;
        }

        let effective = EntitlementService::effective_modules_for(&mut *tx, &user).await?;
        tx.commit().await?;
        Ok(effective)
    }

    /// Remove uma atribuição. Idempotente.
    pub async fn remove_module(
        &self,
        user_id: Uuid,
        module_id: Uuid,
    ) -> Result<Vec<Module>, AppError> {
        let mut tx = self.store.begin(TxScope::User(user_id)).await?;

        let user = ConsistencyValidator::ensure_user_exists(&mut *tx, user_id).await?;
        tx.delete_user_modules(&UserModuleFilter::modules(user.id, vec![module_id]))
            .await?;

        let effective = EntitlementService::effective_modules_for(&mut *tx, &user).await?;
        tx.commit().await?;
        Ok(effective)
    }

    /// Remove todas as atribuições. Idempotente.
    pub async fn clear_modules(&self, user_id: Uuid) -> Result<Vec<Module>, AppError> {
        let mut tx = self.store.begin(TxScope::User(user_id)).await?;

        let user = ConsistencyValidator::ensure_user_exists(&mut *tx, user_id).await?;
        tx.delete_user_modules(&UserModuleFilter::user(user.id)).await?;

        tx.commit().await?;
        Ok(Vec::new())
    }

    // Existem -> estão ativos -> estão habilitados na company, nessa ordem.
    // Cada etapa reporta todos os ids que falharam nela.
    async fn ensure_assignable(
        tx: &mut dyn StoreTx,
        user: &User,
        module_ids: &[Uuid],
    ) -> Result<(), AppError> {
        let modules = ConsistencyValidator::ensure_modules_exist(tx, module_ids).await?;
        ConsistencyValidator::ensure_modules_active(&modules)?;
        ConsistencyValidator::ensure_modules_enabled_for_company(tx, user.company_id, module_ids)
            .await
    }
}
