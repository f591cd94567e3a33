// src/db/module_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::store::NewModule,
    models::module::{Module, UpdateModulePayload},
};

const KEY_TAKEN: &str = "Key de módulo já existe.";

// Acesso ao catálogo global ('modules')
#[derive(Clone, Default)]
pub struct ModuleRepository;

impl ModuleRepository {
    pub async fn find_many<'e, E>(&self, executor: E, ids: &[Uuid]) -> Result<Vec<Module>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let modules = sqlx::query_as::<_, Module>(
            r#"
            SELECT * FROM modules
            WHERE id = ANY($1)
            ORDER BY created_at DESC, id ASC
            "#,
        )
        .bind(ids)
        .fetch_all(executor)
        .await?;
        Ok(modules)
    }

    pub async fn list<'e, E>(&self, executor: E) -> Result<Vec<Module>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let modules = sqlx::query_as::<_, Module>(
            "SELECT * FROM modules ORDER BY created_at DESC, id ASC",
        )
        .fetch_all(executor)
        .await?;
        Ok(modules)
    }

    pub async fn create<'e, E>(&self, executor: E, new: NewModule) -> Result<Module, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Module>(
            r#"
            INSERT INTO modules (key, name, description, icon, is_active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(new.key)
        .bind(new.name)
        .bind(new.description)
        .bind(new.icon)
        .bind(new.is_active)
        .fetch_one(executor)
        .await
        .map_err(|e| AppError::from_db(e, KEY_TAKEN))
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        patch: UpdateModulePayload,
    ) -> Result<Option<Module>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Module>(
            r#"
            UPDATE modules SET
                key = COALESCE($2, key),
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                icon = COALESCE($5, icon),
                is_active = COALESCE($6, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(patch.key)
        .bind(patch.name)
        .bind(patch.description)
        .bind(patch.icon)
        .bind(patch.is_active)
        .fetch_optional(executor)
        .await
        .map_err(|e| AppError::from_db(e, KEY_TAKEN))
    }

    // company_modules e user_modules caem junto (ON DELETE CASCADE).
    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM modules WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
