// src/services/consistency.rs

//! Verificações de existência/atividade feitas antes de qualquer escrita.
//! Todas coletam TODAS as violações antes de falhar, nunca param na primeira.

use std::collections::HashSet;

use uuid::Uuid;

use crate::{
    common::error::{AppError, ConflictRule, EntityKind},
    db::{CompanyModuleFilter, StoreTx},
    models::{company::Company, module::Module, user::User},
};

pub struct ConsistencyValidator;

impl ConsistencyValidator {
    pub async fn ensure_company_exists(
        tx: &mut dyn StoreTx,
        company_id: Uuid,
    ) -> Result<Company, AppError> {
        tx.find_company(company_id)
            .await?
            .ok_or_else(|| AppError::not_found(EntityKind::Company, company_id))
    }

    pub async fn ensure_user_exists(tx: &mut dyn StoreTx, user_id: Uuid) -> Result<User, AppError> {
        tx.find_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(EntityKind::User, user_id))
    }

    /// Devolve os módulos encontrados ou `NotFound` com a lista completa de
    /// ids ausentes, na ordem em que foram pedidos.
    pub async fn ensure_modules_exist(
        tx: &mut dyn StoreTx,
        module_ids: &[Uuid],
    ) -> Result<Vec<Module>, AppError> {
        if module_ids.is_empty() {
            return Ok(Vec::new());
        }

        let found = tx.find_modules(module_ids).await?;
        let found_ids: HashSet<Uuid> = found.iter().map(|m| m.id).collect();

        let missing: Vec<Uuid> = module_ids
            .iter()
            .copied()
            .filter(|id| !found_ids.contains(id))
            .collect();

        if !missing.is_empty() {
            return Err(AppError::NotFound { entity: EntityKind::Module, ids: missing });
        }
        Ok(found)
    }

    pub fn ensure_modules_active(modules: &[Module]) -> Result<(), AppError> {
        let inactive: Vec<Uuid> = modules.iter().filter(|m| !m.is_active).map(|m| m.id).collect();

        if !inactive.is_empty() {
            return Err(AppError::Conflict { rule: ConflictRule::ModuleInactive, ids: inactive });
        }
        Ok(())
    }

    pub async fn ensure_modules_enabled_for_company(
        tx: &mut dyn StoreTx,
        company_id: Uuid,
        module_ids: &[Uuid],
    ) -> Result<(), AppError> {
        if module_ids.is_empty() {
            return Ok(());
        }

        let enabled: HashSet<Uuid> = tx
            .find_company_modules(&CompanyModuleFilter::enabled(company_id))
            .await?
            .into_iter()
            .map(|row| row.module_id)
            .collect();

        let not_enabled: Vec<Uuid> = module_ids
            .iter()
            .copied()
            .filter(|id| !enabled.contains(id))
            .collect();

        if !not_enabled.is_empty() {
            return Err(AppError::Conflict {
                rule: ConflictRule::ModuleNotEnabledForCompany,
                ids: not_enabled,
            });
        }
        Ok(())
    }
}
