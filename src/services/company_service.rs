// src/services/company_service.rs

use uuid::Uuid;

use crate::{
    common::error::{AppError, EntityKind},
    db::{NewCompany, SharedStore, TxScope},
    models::company::{Company, CreateCompanyPayload, UpdateCompanyPayload},
    services::consistency::ConsistencyValidator,
};

#[derive(Clone)]
pub struct CompanyService {
    store: SharedStore,
}

impl CompanyService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn create(&self, payload: CreateCompanyPayload) -> Result<Company, AppError> {
        let mut tx = self.store.begin(TxScope::Admin).await?;

        let company = tx
            .insert_company(NewCompany {
                name: payload.name,
                legal_name: payload.legal_name,
                rfc: payload.rfc.map(|rfc| rfc.to_uppercase()),
            })
            .await?;

        tx.commit().await?;
        Ok(company)
    }

    pub async fn list(&self) -> Result<Vec<Company>, AppError> {
        let mut tx = self.store.begin(TxScope::Snapshot).await?;
        let companies = tx.list_companies().await?;
        tx.commit().await?;
        Ok(companies)
    }

    pub async fn get(&self, company_id: Uuid) -> Result<Company, AppError> {
        let mut tx = self.store.begin(TxScope::Snapshot).await?;
        let company = ConsistencyValidator::ensure_company_exists(&mut *tx, company_id).await?;
        tx.commit().await?;
        Ok(company)
    }

    pub async fn update(
        &self,
        company_id: Uuid,
        mut payload: UpdateCompanyPayload,
    ) -> Result<Company, AppError> {
        payload.rfc = payload.rfc.map(|rfc| rfc.to_uppercase());

        let mut tx = self.store.begin(TxScope::Admin).await?;
        let company = tx
            .update_company(company_id, payload)
            .await?
            .ok_or_else(|| AppError::not_found(EntityKind::Company, company_id))?;
        tx.commit().await?;
        Ok(company)
    }

    /// Apaga a company e a sua habilitação de módulos. Falha com
    /// `ReferencedEntity` se ainda houver usuários nela.
    pub async fn delete(&self, company_id: Uuid) -> Result<Company, AppError> {
        let mut tx = self.store.begin(TxScope::Company(company_id)).await?;
        let company = ConsistencyValidator::ensure_company_exists(&mut *tx, company_id).await?;
        tx.delete_company(company_id).await?;
        tx.commit().await?;
        Ok(company)
    }
}
