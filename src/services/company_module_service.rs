// src/services/company_module_service.rs

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{store::dedup_ids, CompanyModuleFilter, SharedStore, StoreTx, TxScope},
    models::{
        entitlement::{CompanyModule, CompanyModuleDetail},
        module::ModuleWithStatus,
    },
    services::consistency::ConsistencyValidator,
};

/// Reconciliação da habilitação de módulos por company.
///
/// Estados por célula (company, módulo): NotExists -> Enabled <-> Disabled.
/// Desabilitar nunca apaga a linha; só `remove` volta para NotExists.
#[derive(Clone)]
pub struct CompanyModuleService {
    store: SharedStore,
}

impl CompanyModuleService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Liga/desliga um módulo para a company (cria a linha se não existir).
    pub async fn toggle(
        &self,
        company_id: Uuid,
        module_id: Uuid,
        is_enabled: bool,
    ) -> Result<CompanyModuleDetail, AppError> {
        let mut tx = self.store.begin(TxScope::Company(company_id)).await?;

        ConsistencyValidator::ensure_company_exists(&mut *tx, company_id).await?;
        let module = ConsistencyValidator::ensure_modules_exist(&mut *tx, &[module_id])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("módulo validado sumiu da consulta"))?;

        let link = tx.upsert_company_module(company_id, module_id, is_enabled).await?;

        tx.commit().await?;
        Ok(CompanyModuleDetail { link, module })
    }

    /// Deixa habilitados exatamente os módulos pedidos.
    ///
    /// Cria os que faltam, reabilita os desejados e desabilita (sem apagar) os
    /// que ficaram de fora. Tudo numa transação no escopo da company: duas
    /// reconciliações da mesma company nunca se intercalam.
    pub async fn set_company_modules(
        &self,
        company_id: Uuid,
        module_ids: &[Uuid],
    ) -> Result<Vec<CompanyModuleDetail>, AppError> {
        let desired = dedup_ids(module_ids);

        let mut tx = self.store.begin(TxScope::Company(company_id)).await?;

        // 1. Pré-condições (nenhuma escrita se falhar)
        ConsistencyValidator::ensure_company_exists(&mut *tx, company_id).await?;
        ConsistencyValidator::ensure_modules_exist(&mut *tx, &desired).await?;

        // 2. Estado atual
        let current = tx
            .find_company_modules(&CompanyModuleFilter::company(company_id))
            .await?;
        let current_ids: HashSet<Uuid> = current.iter().map(|row| row.module_id).collect();
        let desired_ids: HashSet<Uuid> = desired.iter().copied().collect();

        // 3. Diff
        let to_create: Vec<Uuid> = desired
            .iter()
            .copied()
            .filter(|id| !current_ids.contains(id))
            .collect();
        let to_enable: Vec<Uuid> = current
            .iter()
            .filter(|row| !row.is_enabled && desired_ids.contains(&row.module_id))
            .map(|row| row.module_id)
            .collect();
        let to_disable: Vec<Uuid> = current
            .iter()
            .filter(|row| row.is_enabled && !desired_ids.contains(&row.module_id))
            .map(|row| row.module_id)
            .collect();

        // 4. Aplica: criar, habilitar, desabilitar
        if !to_create.is_empty() {
            tx.insert_company_modules(company_id, &to_create, true).await?;
        }
        if !to_enable.is_empty() {
            tx.update_company_modules(&CompanyModuleFilter::modules(company_id, to_enable), true)
                .await?;
        }
        if !to_disable.is_empty() {
            tx.update_company_modules(&CompanyModuleFilter::modules(company_id, to_disable), false)
                .await?;
        }

        // 5. Lista completa já reconciliada
        let rows = tx
            .find_company_modules(&CompanyModuleFilter::company(company_id))
            .await?;
        let result = Self::with_modules(&mut *tx, rows).await?;

        tx.commit().await?;
        Ok(result)
    }

    /// Apaga o vínculo. Idempotente: não falha se a linha não existir.
    pub async fn remove(&self, company_id: Uuid, module_id: Uuid) -> Result<(), AppError> {
        let mut tx = self.store.begin(TxScope::Company(company_id)).await?;

        ConsistencyValidator::ensure_company_exists(&mut *tx, company_id).await?;
        tx.delete_company_modules(&CompanyModuleFilter::modules(company_id, vec![module_id]))
            .await?;

        tx.commit().await
    }

    /// Todas as linhas da company com o módulo junto, mais recentes primeiro.
    pub async fn list_by_company(
        &self,
        company_id: Uuid,
    ) -> Result<Vec<CompanyModuleDetail>, AppError> {
        self.list(CompanyModuleFilter::company(company_id)).await
    }

    /// Só as linhas habilitadas.
    pub async fn list_enabled_by_company(
        &self,
        company_id: Uuid,
    ) -> Result<Vec<CompanyModuleDetail>, AppError> {
        self.list(CompanyModuleFilter::enabled(company_id)).await
    }

    /// Catálogo inteiro com o status da company. Módulo sem linha aparece
    /// como desabilitado, nunca some nem gera erro.
    pub async fn catalog_with_status(
        &self,
        company_id: Uuid,
    ) -> Result<Vec<ModuleWithStatus>, AppError> {
        let mut tx = self.store.begin(TxScope::Snapshot).await?;

        ConsistencyValidator::ensure_company_exists(&mut *tx, company_id).await?;
        let catalog = tx.list_modules().await?;
        let rows = tx
            .find_company_modules(&CompanyModuleFilter::company(company_id))
            .await?;

        tx.commit().await?;

        let flags: HashMap<Uuid, bool> =
            rows.into_iter().map(|row| (row.module_id, row.is_enabled)).collect();

        Ok(catalog
            .into_iter()
            .map(|module| {
                let is_enabled = enablement_of(&flags, module.id);
                ModuleWithStatus::new(module, is_enabled)
            })
            .collect())
    }

    async fn list(&self, filter: CompanyModuleFilter) -> Result<Vec<CompanyModuleDetail>, AppError> {
        let mut tx = self.store.begin(TxScope::Snapshot).await?;

        ConsistencyValidator::ensure_company_exists(&mut *tx, filter.company_id).await?;
        let rows = tx.find_company_modules(&filter).await?;
        let result = Self::with_modules(&mut *tx, rows).await?;

        tx.commit().await?;
        Ok(result)
    }

    async fn with_modules(
        tx: &mut dyn StoreTx,
        rows: Vec<CompanyModule>,
    ) -> Result<Vec<CompanyModuleDetail>, AppError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = rows.iter().map(|row| row.module_id).collect();
        let mut catalog: HashMap<Uuid, _> =
            tx.find_modules(&ids).await?.into_iter().map(|m| (m.id, m)).collect();

        Ok(rows
            .into_iter()
            .filter_map(|link| {
                catalog
                    .remove(&link.module_id)
                    .map(|module| CompanyModuleDetail { link, module })
            })
            .collect())
    }
}

/// Ausência de linha = desabilitado.
fn enablement_of(flags: &HashMap<Uuid, bool>, module_id: Uuid) -> bool {
    match flags.get(&module_id) {
        Some(is_enabled) => *is_enabled,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::EntityKind;
    use crate::test_utils::Fixture;

    fn flags(rows: &[CompanyModule]) -> HashMap<Uuid, bool> {
        rows.iter().map(|r| (r.module_id, r.is_enabled)).collect()
    }

    #[test_log::test(tokio::test)]
    async fn set_diffs_instead_of_replacing() {
        let fx = Fixture::new().await;
        let company = fx.company("C1").await;
        let a = fx.module("A", true).await;
        let b = fx.module("B", true).await;
        let c = fx.module("C", true).await;
        fx.enable(company.id, &[a.id, b.id]).await;

        let service = CompanyModuleService::new(fx.store.clone());
        let result = service.set_company_modules(company.id, &[b.id, c.id]).await.unwrap();
        assert_eq!(result.len(), 3);

        let rows = fx.company_module_rows(company.id).await;
        let state = flags(&rows);
        assert_eq!(state.len(), 3, "A continua como linha desabilitada");
        assert!(!state[&a.id]);
        assert!(state[&b.id]);
        assert!(state[&c.id]);
    }

    #[test_log::test(tokio::test)]
    async fn set_twice_is_idempotent() {
        let fx = Fixture::new().await;
        let company = fx.company("C1").await;
        let a = fx.module("A", true).await;
        let b = fx.module("B", true).await;
        fx.enable(company.id, &[a.id]).await;

        let service = CompanyModuleService::new(fx.store.clone());
        service.set_company_modules(company.id, &[b.id, b.id]).await.unwrap();
        let first = fx.company_module_rows(company.id).await;

        service.set_company_modules(company.id, &[b.id]).await.unwrap();
        let second = fx.company_module_rows(company.id).await;

        assert_eq!(first, second);
        assert_eq!(second.len(), 2);
    }

    #[test_log::test(tokio::test)]
    async fn set_reenables_previously_disabled_rows() {
        let fx = Fixture::new().await;
        let company = fx.company("C1").await;
        let a = fx.module("A", true).await;
        fx.link_company_module(company.id, a.id, false).await;

        let service = CompanyModuleService::new(fx.store.clone());
        let result = service.set_company_modules(company.id, &[a.id]).await.unwrap();

        assert_eq!(result.len(), 1);
        assert!(result[0].link.is_enabled);
        assert_eq!(result[0].module.id, a.id);
    }

    #[test_log::test(tokio::test)]
    async fn set_with_empty_set_disables_everything() {
        let fx = Fixture::new().await;
        let company = fx.company("C1").await;
        let a = fx.module("A", true).await;
        let b = fx.module("B", true).await;
        fx.enable(company.id, &[a.id, b.id]).await;

        let service = CompanyModuleService::new(fx.store.clone());
        service.set_company_modules(company.id, &[]).await.unwrap();

        let rows = fx.company_module_rows(company.id).await;
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| !r.is_enabled));
    }

    #[test_log::test(tokio::test)]
    async fn set_with_missing_modules_writes_nothing() {
        let fx = Fixture::new().await;
        let company = fx.company("C1").await;
        let a = fx.module("A", true).await;
        let b = fx.module("B", true).await;
        fx.enable(company.id, &[a.id]).await;
        let before = fx.company_module_rows(company.id).await;

        let (x, y) = (Uuid::new_v4(), Uuid::new_v4());
        let service = CompanyModuleService::new(fx.store.clone());
        let err = service
            .set_company_modules(company.id, &[x, b.id, y])
            .await
            .unwrap_err();

        match err {
            AppError::NotFound { entity: EntityKind::Module, ids } => assert_eq!(ids, vec![x, y]),
            other => panic!("erro inesperado: {other:?}"),
        }
        assert_eq!(fx.company_module_rows(company.id).await, before);
    }

    #[test_log::test(tokio::test)]
    async fn toggle_creates_then_overwrites() {
        let fx = Fixture::new().await;
        let company = fx.company("C1").await;
        let a = fx.module("A", true).await;
        let service = CompanyModuleService::new(fx.store.clone());

        let created = service.toggle(company.id, a.id, true).await.unwrap();
        assert!(created.link.is_enabled);
        assert_eq!(created.module.id, a.id);

        let off = service.toggle(company.id, a.id, false).await.unwrap();
        assert!(!off.link.is_enabled);
        assert_eq!(off.link.created_at, created.link.created_at);

        service.toggle(company.id, a.id, false).await.unwrap();
        let rows = fx.company_module_rows(company.id).await;
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].is_enabled);
    }

    #[test_log::test(tokio::test)]
    async fn toggle_validates_company_and_module() {
        let fx = Fixture::new().await;
        let company = fx.company("C1").await;
        let a = fx.module("A", true).await;
        let service = CompanyModuleService::new(fx.store.clone());

        let err = service.toggle(Uuid::new_v4(), a.id, true).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { entity: EntityKind::Company, .. }));

        let err = service.toggle(company.id, Uuid::new_v4(), true).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { entity: EntityKind::Module, .. }));
        assert!(fx.company_module_rows(company.id).await.is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn remove_is_idempotent_hard_delete() {
        let fx = Fixture::new().await;
        let company = fx.company("C1").await;
        let a = fx.module("A", true).await;
        fx.enable(company.id, &[a.id]).await;
        let service = CompanyModuleService::new(fx.store.clone());

        service.remove(company.id, a.id).await.unwrap();
        assert!(fx.company_module_rows(company.id).await.is_empty());
        service.remove(company.id, a.id).await.unwrap();
    }

    #[test_log::test(tokio::test)]
    async fn catalog_defaults_to_disabled() {
        let fx = Fixture::new().await;
        let company = fx.company("C1").await;
        let enabled = fx.module("ENABLED", true).await;
        let disabled = fx.module("DISABLED", true).await;
        let never = fx.module("NEVER", true).await;
        fx.enable(company.id, &[enabled.id]).await;
        fx.link_company_module(company.id, disabled.id, false).await;

        let service = CompanyModuleService::new(fx.store.clone());
        let catalog = service.catalog_with_status(company.id).await.unwrap();
        assert_eq!(catalog.len(), 3);

        let status: HashMap<Uuid, bool> = catalog.iter().map(|m| (m.id, m.is_enabled)).collect();
        assert!(status[&enabled.id]);
        assert!(!status[&disabled.id]);
        assert!(!status[&never.id]);
    }

    #[test_log::test(tokio::test)]
    async fn listings_join_modules() {
        let fx = Fixture::new().await;
        let company = fx.company("C1").await;
        let a = fx.module("A", true).await;
        let b = fx.module("B", true).await;
        fx.enable(company.id, &[a.id]).await;
        fx.link_company_module(company.id, b.id, false).await;

        let service = CompanyModuleService::new(fx.store.clone());
        let all = service.list_by_company(company.id).await.unwrap();
        assert_eq!(all.iter().map(|d| d.module.id).collect::<Vec<_>>(), vec![b.id, a.id]);

        let enabled = service.list_enabled_by_company(company.id).await.unwrap();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].module.key, "A");
    }

    #[test_log::test(tokio::test)]
    async fn concurrent_reconciliations_serialize_per_company() {
        let fx = Fixture::new().await;
        let company = fx.company("C1").await;
        let a = fx.module("A", true).await;
        let b = fx.module("B", true).await;
        let c = fx.module("C", true).await;
        let service = CompanyModuleService::new(fx.store.clone());
        let company_id = company.id;

        let intents = [vec![a.id, b.id], vec![b.id, c.id], vec![c.id], vec![a.id]];
        let mut handles = Vec::new();
        for round in 0..8 {
            let service = service.clone();
            let intent = intents[round % intents.len()].clone();
            handles.push(tokio::spawn(async move {
                service.set_company_modules(company_id, &intent).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let enabled: HashSet<Uuid> = fx
            .company_module_rows(company.id)
            .await
            .into_iter()
            .filter(|r| r.is_enabled)
            .map(|r| r.module_id)
            .collect();
        let matches_some_intent = intents
            .iter()
            .any(|intent| intent.iter().copied().collect::<HashSet<_>>() == enabled);
        assert!(matches_some_intent, "estado final não corresponde a nenhuma intenção: {enabled:?}");
    }
}
