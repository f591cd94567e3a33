// src/db/user_module_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::store::UserModuleFilter,
    models::entitlement::UserModule,
};

// Atribuição de módulos por usuário ('user_modules', PK composta)
#[derive(Clone, Default)]
pub struct UserModuleRepository;

impl UserModuleRepository {
    pub async fn find_many<'e, E>(
        &self,
        executor: E,
        filter: &UserModuleFilter,
    ) -> Result<Vec<UserModule>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, UserModule>(
            r#"
            SELECT * FROM user_modules
            WHERE user_id = $1
              AND ($2::uuid[] IS NULL OR module_id = ANY($2))
            ORDER BY created_at DESC, module_id ASC
            "#,
        )
        .bind(filter.user_id)
        .bind(filter.module_ids.clone())
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    pub async fn create_many<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        module_ids: &[Uuid],
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            INSERT INTO user_modules (user_id, module_id)
            SELECT $1, unnest($2::uuid[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(module_ids)
        .execute(executor)
        .await
        .map_err(|e| AppError::from_db(e, "Vínculo usuário/módulo já existe."))?;
        Ok(result.rows_affected())
    }

    pub async fn delete_many<'e, E>(
        &self,
        executor: E,
        filter: &UserModuleFilter,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            DELETE FROM user_modules
            WHERE user_id = $1
              AND ($2::uuid[] IS NULL OR module_id = ANY($2))
            "#,
        )
        .bind(filter.user_id)
        .bind(filter.module_ids.clone())
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }
}
