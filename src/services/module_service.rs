// src/services/module_service.rs

use uuid::Uuid;

use crate::{
    common::error::{AppError, EntityKind},
    db::{NewModule, SharedStore, TxScope},
    models::module::{CreateModulePayload, Module, UpdateModulePayload},
};

/// CRUD do catálogo global. Desativar um módulo não mexe em vínculos:
/// ele só deixa de aparecer nos módulos efetivos.
#[derive(Clone)]
pub struct ModuleService {
    store: SharedStore,
}

impl ModuleService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn create(&self, payload: CreateModulePayload) -> Result<Module, AppError> {
        let mut tx = self.store.begin(TxScope::Admin).await?;

        let module = tx
            .insert_module(NewModule {
                key: payload.key,
                name: payload.name,
                description: payload.description,
                icon: payload.icon,
                is_active: payload.is_active.unwrap_or(true),
            })
            .await?;

        tx.commit().await?;
        Ok(module)
    }

    pub async fn list(&self) -> Result<Vec<Module>, AppError> {
        let mut tx = self.store.begin(TxScope::Snapshot).await?;
        let modules = tx.list_modules().await?;
        tx.commit().await?;
        Ok(modules)
    }

    pub async fn get(&self, module_id: Uuid) -> Result<Module, AppError> {
        let mut tx = self.store.begin(TxScope::Snapshot).await?;
        let module = tx.find_modules(&[module_id]).await?.into_iter().next();
        tx.commit().await?;
        module.ok_or_else(|| AppError::not_found(EntityKind::Module, module_id))
    }

    pub async fn update(
        &self,
        module_id: Uuid,
        payload: UpdateModulePayload,
    ) -> Result<Module, AppError> {
        let mut tx = self.store.begin(TxScope::Admin).await?;
        let module = tx
            .update_module(module_id, payload)
            .await?
            .ok_or_else(|| AppError::not_found(EntityKind::Module, module_id))?;
        tx.commit().await?;
        Ok(module)
    }

    /// Apaga o módulo e todos os vínculos (company e usuário) que apontam para ele.
    pub async fn delete(&self, module_id: Uuid) -> Result<Module, AppError> {
        let mut tx = self.store.begin(TxScope::Admin).await?;
        let module = tx
            .find_modules(&[module_id])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::not_found(EntityKind::Module, module_id))?;
        tx.delete_module(module_id).await?;
        tx.commit().await?;
        Ok(module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::Fixture;

    fn payload(key: &str) -> CreateModulePayload {
        CreateModulePayload {
            key: key.into(),
            name: format!("Módulo {key}"),
            description: None,
            icon: "box".into(),
            is_active: None,
        }
    }

    #[test_log::test(tokio::test)]
    async fn create_defaults_to_active_and_keys_are_unique() {
        let fx = Fixture::new().await;
        let service = ModuleService::new(fx.store.clone());

        let module = service.create(payload("OBRAS")).await.unwrap();
        assert!(module.is_active);

        let err = service.create(payload("OBRAS")).await.unwrap_err();
        assert!(matches!(err, AppError::UniqueConstraintViolation(_)));
    }

    #[test_log::test(tokio::test)]
    async fn deactivation_keeps_links() {
        let fx = Fixture::new().await;
        let company = fx.company("C1").await;
        let user = fx.user(company.id, "u1").await;
        let module = fx.module("M1", true).await;
        fx.enable(company.id, &[module.id]).await;
        fx.assign(user.id, &[module.id]).await;

        let service = ModuleService::new(fx.store.clone());
        let updated = service
            .update(
                module.id,
                UpdateModulePayload { is_active: Some(false), ..Default::default() },
            )
            .await
            .unwrap();

        assert!(!updated.is_active);
        assert_eq!(updated.key, module.key);
        assert_eq!(fx.user_module_ids(user.id).await, vec![module.id]);
        assert_eq!(fx.company_module_rows(company.id).await.len(), 1);
    }

    #[test_log::test(tokio::test)]
    async fn delete_cascades_to_links() {
        let fx = Fixture::new().await;
        let company = fx.company("C1").await;
        let user = fx.user(company.id, "u1").await;
        let module = fx.module("M1", true).await;
        fx.enable(company.id, &[module.id]).await;
        fx.assign(user.id, &[module.id]).await;

        let service = ModuleService::new(fx.store.clone());
        assert_eq!(service.delete(module.id).await.unwrap().id, module.id);

        assert!(fx.user_module_ids(user.id).await.is_empty());
        assert!(fx.company_module_rows(company.id).await.is_empty());
        let err = service.get(module.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { entity: EntityKind::Module, .. }));
    }
}
