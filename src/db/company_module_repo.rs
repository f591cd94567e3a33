// src/db/company_module_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::store::CompanyModuleFilter,
    models::entitlement::CompanyModule,
};

const LINK_EXISTS: &str = "Vínculo company/módulo já existe.";

// Habilitação de módulos por company ('company_modules', PK composta)
#[derive(Clone, Default)]
pub struct CompanyModuleRepository;

impl CompanyModuleRepository {
    pub async fn find_many<'e, E>(
        &self,
        executor: E,
        filter: &CompanyModuleFilter,
    ) -> Result<Vec<CompanyModule>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, CompanyModule>(
            r#"
            SELECT * FROM company_modules
            WHERE company_id = $1
              AND ($2::uuid[] IS NULL OR module_id = ANY($2))
              AND ($3::bool IS NULL OR is_enabled = $3)
            ORDER BY created_at DESC, module_id ASC
            "#,
        )
        .bind(filter.company_id)
        .bind(filter.module_ids.clone())
        .bind(filter.is_enabled)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    // Inserção em massa usando UNNEST; pares existentes são ignorados
    pub async fn create_many<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        module_ids: &[Uuid],
        is_enabled: bool,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            INSERT INTO company_modules (company_id, module_id, is_enabled)
            SELECT $1, unnest($2::uuid[]), $3
            ON CONFLICT (company_id, module_id) DO NOTHING
            "#,
        )
        .bind(company_id)
        .bind(module_ids)
        .bind(is_enabled)
        .execute(executor)
        .await
        .map_err(|e| AppError::from_db(e, LINK_EXISTS))?;
        Ok(result.rows_affected())
    }

    pub async fn update_many<'e, E>(
        &self,
        executor: E,
        filter: &CompanyModuleFilter,
        is_enabled: bool,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE company_modules
            SET is_enabled = $4, updated_at = NOW()
            WHERE company_id = $1
              AND ($2::uuid[] IS NULL OR module_id = ANY($2))
              AND ($3::bool IS NULL OR is_enabled = $3)
            "#,
        )
        .bind(filter.company_id)
        .bind(filter.module_ids.clone())
        .bind(filter.is_enabled)
        .bind(is_enabled)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_many<'e, E>(
        &self,
        executor: E,
        filter: &CompanyModuleFilter,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            DELETE FROM company_modules
            WHERE company_id = $1
              AND ($2::uuid[] IS NULL OR module_id = ANY($2))
              AND ($3::bool IS NULL OR is_enabled = $3)
            "#,
        )
        .bind(filter.company_id)
        .bind(filter.module_ids.clone())
        .bind(filter.is_enabled)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    // UPSERT (Insert or Update) pela chave composta
    pub async fn upsert<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        module_id: Uuid,
        is_enabled: bool,
    ) -> Result<CompanyModule, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, CompanyModule>(
            r#"
            INSERT INTO company_modules (company_id, module_id, is_enabled)
            VALUES ($1, $2, $3)
            ON CONFLICT (company_id, module_id)
            DO UPDATE SET
                is_enabled = EXCLUDED.is_enabled,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(module_id)
        .bind(is_enabled)
        .fetch_one(executor)
        .await
        .map_err(|e| AppError::from_db(e, LINK_EXISTS))
    }
}
