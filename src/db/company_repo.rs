// src/db/company_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::store::NewCompany,
    models::company::{Company, UpdateCompanyPayload},
};

const RFC_TAKEN: &str = "RFC já existe.";

// Acesso à tabela 'companies'
#[derive(Clone, Default)]
pub struct CompanyRepository;

impl CompanyRepository {
    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Company>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let company = sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(company)
    }

    pub async fn list<'e, E>(&self, executor: E) -> Result<Vec<Company>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let companies = sqlx::query_as::<_, Company>(
            "SELECT * FROM companies ORDER BY created_at DESC, id ASC",
        )
        .fetch_all(executor)
        .await?;
        Ok(companies)
    }

    pub async fn create<'e, E>(&self, executor: E, new: NewCompany) -> Result<Company, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Company>(
            r#"
            INSERT INTO companies (name, legal_name, rfc)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(new.name)
        .bind(new.legal_name)
        .bind(new.rfc)
        .fetch_one(executor)
        .await
        .map_err(|e| AppError::from_db(e, RFC_TAKEN))
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        patch: UpdateCompanyPayload,
    ) -> Result<Option<Company>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Company>(
            r#"
            UPDATE companies SET
                name = COALESCE($2, name),
                legal_name = COALESCE($3, legal_name),
                rfc = COALESCE($4, rfc),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(patch.name)
        .bind(patch.legal_name)
        .bind(patch.rfc)
        .fetch_optional(executor)
        .await
        .map_err(|e| AppError::from_db(e, RFC_TAKEN))
    }

    // users.company_id é ON DELETE RESTRICT: company com usuários não sai.
    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await
            .map_err(|e| AppError::from_db(e, RFC_TAKEN))?;
        Ok(result.rows_affected())
    }
}
