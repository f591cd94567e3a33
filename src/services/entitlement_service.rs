// src/services/entitlement_service.rs

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CompanyModuleFilter, SharedStore, StoreTx, TxScope, UserModuleFilter},
    models::{module::Module, user::User},
    services::consistency::ConsistencyValidator,
};

/// Caminho de leitura: o que um usuário pode usar de fato.
///
/// Efetivos = atribuídos ao usuário ∩ habilitados na company ∩ ativos no
/// catálogo. Nenhuma camada sozinha concede acesso.
#[derive(Clone)]
pub struct EntitlementService {
    store: SharedStore,
}

impl EntitlementService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Módulos efetivos, da atribuição mais recente para a mais antiga.
    pub async fn effective_modules(&self, user_id: Uuid) -> Result<Vec<Module>, AppError> {
        let mut tx = self.store.begin(TxScope::Snapshot).await?;

        let user = ConsistencyValidator::ensure_user_exists(&mut *tx, user_id).await?;
        let modules = Self::effective_modules_for(&mut *tx, &user).await?;

        tx.commit().await?;
        Ok(modules)
    }

    /// Candidatos para atribuição: habilitados na company e ativos no
    /// catálogo, da habilitação mais recente para a mais antiga. Não exige
    /// que o usuário já tenha o módulo.
    pub async fn available_modules_for_user(&self, user_id: Uuid) -> Result<Vec<Module>, AppError> {
        let mut tx = self.store.begin(TxScope::Snapshot).await?;

        let user = ConsistencyValidator::ensure_user_exists(&mut *tx, user_id).await?;

        let enabled_rows = tx
            .find_company_modules(&CompanyModuleFilter::enabled(user.company_id))
            .await?;
        let ids: Vec<Uuid> = enabled_rows.iter().map(|row| row.module_id).collect();
        let catalog = Self::active_catalog(&mut *tx, &ids).await?;

        tx.commit().await?;

        Ok(enabled_rows
            .into_iter()
            .filter_map(|row| catalog.get(&row.module_id).cloned())
            .collect())
    }

    /// Calcula os efetivos dentro de uma transação já aberta, para que os
    /// sincronizadores devolvam o estado que acabaram de escrever.
    pub(crate) async fn effective_modules_for(
        tx: &mut dyn StoreTx,
        user: &User,
    ) -> Result<Vec<Module>, AppError> {
        // 1. Habilitados para a company do usuário
        let enabled: HashSet<Uuid> = tx
            .find_company_modules(&CompanyModuleFilter::enabled(user.company_id))
            .await?
            .into_iter()
            .map(|row| row.module_id)
            .collect();

        // 2. Atribuídos ao usuário (já em ordem de atribuição decrescente)
        let assigned = tx.find_user_modules(&UserModuleFilter::user(user.id)).await?;
        let ids: Vec<Uuid> = assigned
            .iter()
            .map(|row| row.module_id)
            .filter(|id| enabled.contains(id))
            .collect();

        // 3. Catálogo ativo
        let catalog = Self::active_catalog(tx, &ids).await?;

        Ok(ids.into_iter().filter_map(|id| catalog.get(&id).cloned()).collect())
    }

    async fn active_catalog(
        tx: &mut dyn StoreTx,
        ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Module>, AppError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        Ok(tx
            .find_modules(ids)
            .await?
            .into_iter()
            .filter(|m| m.is_active)
            .map(|m| (m.id, m))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::EntityKind;
    use crate::test_utils::Fixture;

    fn ids(modules: &[Module]) -> Vec<Uuid> {
        modules.iter().map(|m| m.id).collect()
    }

    #[test_log::test(tokio::test)]
    async fn deactivating_a_module_revokes_lazily() {
        let fx = Fixture::new().await;
        let company = fx.company("C1").await;
        let m1 = fx.module("M1", true).await;
        let user = fx.user(company.id, "u1").await;
        fx.enable(company.id, &[m1.id]).await;
        fx.assign(user.id, &[m1.id]).await;

        let service = EntitlementService::new(fx.store.clone());
        assert_eq!(ids(&service.effective_modules(user.id).await.unwrap()), vec![m1.id]);

        fx.set_module_active(m1.id, false).await;
        assert!(service.effective_modules(user.id).await.unwrap().is_empty());

        // As linhas de vínculo continuam intactas.
        assert_eq!(fx.user_module_ids(user.id).await, vec![m1.id]);
        let rows = fx.company_module_rows(company.id).await;
        assert_eq!(rows.len(), 1);
        assert!(rows[0].is_enabled);
    }

    #[test_log::test(tokio::test)]
    async fn effective_is_subset_of_all_three_layers() {
        let fx = Fixture::new().await;
        let company = fx.company("C1").await;
        let user = fx.user(company.id, "u1").await;

        let full = fx.module("FULL", true).await; // atribuído, habilitado, ativo
        let not_enabled = fx.module("NOT_ENABLED", true).await; // atribuído, não habilitado
        let disabled = fx.module("DISABLED", true).await; // atribuído, linha desabilitada
        let inactive = fx.module("INACTIVE", true).await; // atribuído, habilitado, inativo
        let unassigned = fx.module("UNASSIGNED", true).await; // habilitado, não atribuído

        fx.enable(company.id, &[full.id, inactive.id, unassigned.id]).await;
        fx.link_company_module(company.id, disabled.id, false).await;
        fx.assign(user.id, &[full.id, not_enabled.id, disabled.id, inactive.id]).await;
        fx.set_module_active(inactive.id, false).await;

        let service = EntitlementService::new(fx.store.clone());
        assert_eq!(ids(&service.effective_modules(user.id).await.unwrap()), vec![full.id]);
    }

    #[test_log::test(tokio::test)]
    async fn most_recent_assignment_comes_first() {
        let fx = Fixture::new().await;
        let company = fx.company("C1").await;
        let user = fx.user(company.id, "u1").await;
        let first = fx.module("FIRST", true).await;
        let second = fx.module("SECOND", true).await;
        let third = fx.module("THIRD", true).await;
        fx.enable(company.id, &[first.id, second.id, third.id]).await;

        fx.assign(user.id, &[second.id]).await;
        fx.assign(user.id, &[first.id]).await;
        fx.assign(user.id, &[third.id]).await;

        let service = EntitlementService::new(fx.store.clone());
        let effective = service.effective_modules(user.id).await.unwrap();
        assert_eq!(ids(&effective), vec![third.id, first.id, second.id]);
        // Estável entre chamadas.
        assert_eq!(ids(&service.effective_modules(user.id).await.unwrap()), ids(&effective));
    }

    #[test_log::test(tokio::test)]
    async fn available_modules_ignore_assignment() {
        let fx = Fixture::new().await;
        let company = fx.company("C1").await;
        let other_company = fx.company("C2").await;
        let user = fx.user(company.id, "u1").await;
        let older = fx.module("OLDER", true).await;
        let newer = fx.module("NEWER", true).await;
        let inactive = fx.module("INACTIVE", false).await;
        let foreign = fx.module("FOREIGN", true).await;

        fx.enable(company.id, &[older.id]).await;
        fx.enable(company.id, &[newer.id, inactive.id]).await;
        fx.enable(other_company.id, &[foreign.id]).await;

        let service = EntitlementService::new(fx.store.clone());
        let available = service.available_modules_for_user(user.id).await.unwrap();
        assert_eq!(ids(&available), vec![newer.id, older.id]);
        assert!(service.effective_modules(user.id).await.unwrap().is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn unknown_user_is_not_found() {
        let fx = Fixture::new().await;
        let service = EntitlementService::new(fx.store.clone());

        let err = service.effective_modules(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { entity: EntityKind::User, .. }));
        let err = service.available_modules_for_user(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { entity: EntityKind::User, .. }));
    }
}
