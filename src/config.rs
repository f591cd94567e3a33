// src/config.rs

use std::{env, str::FromStr, sync::Arc, time::Duration};

use anyhow::{anyhow, Context};
use sqlx::postgres::PgPoolOptions;

use crate::{
    db::{MemoryStore, PgStore, SharedStore},
    services::{
        auth::AuthService, company_module_service::CompanyModuleService,
        company_service::CompanyService, entitlement_service::EntitlementService,
        module_service::ModuleService, user_module_service::UserModuleService,
        user_service::UserService,
    },
};

/// Configuração lida do ambiente (e do `.env`, se existir).
#[derive(Debug, Clone)]
pub struct Config {
    /// Sem `DATABASE_URL` a aplicação sobe com o store em memória.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub bcrypt_cost: u32,
    pub bind_addr: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|secret| !secret.is_empty())
            .ok_or_else(|| anyhow!("JWT_SECRET deve ser definido"))?;

        Ok(Self {
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 5)?,
            jwt_secret,
            jwt_ttl_hours: parse_or(&lookup, "JWT_TTL_HOURS", 168)?,
            bcrypt_cost: parse_or(&lookup, "BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw.parse().with_context(|| format!("{key} inválido: {raw}")),
        None => Ok(default),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub company_service: CompanyService,
    pub module_service: ModuleService,
    pub user_service: UserService,
    pub entitlement_service: EntitlementService,
    pub company_module_service: CompanyModuleService,
    pub user_module_service: UserModuleService,
}

impl AppState {
    /// Escolhe o store (Postgres ou memória) e monta o grafo de dependências.
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let store: SharedStore = match &config.database_url {
            Some(database_url) => {
                let db_pool = PgPoolOptions::new()
                    .max_connections(config.db_max_connections)
                    .acquire_timeout(Duration::from_secs(3))
                    .connect(database_url)
                    .await?;

                tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

                sqlx::migrate!().run(&db_pool).await?;
                tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

                Arc::new(PgStore::new(db_pool))
            }
            None => {
                tracing::warn!("DATABASE_URL ausente: usando o store em memória (dados não persistem)");
                Arc::new(MemoryStore::new())
            }
        };

        Ok(Self::from_store(store, config))
    }

    pub fn from_store(store: SharedStore, config: &Config) -> Self {
        Self {
            auth_service: AuthService::new(
                store.clone(),
                config.jwt_secret.clone(),
                config.jwt_ttl_hours,
            ),
            company_service: CompanyService::new(store.clone()),
            module_service: ModuleService::new(store.clone()),
            user_service: UserService::new(store.clone(), config.bcrypt_cost),
            entitlement_service: EntitlementService::new(store.clone()),
            company_module_service: CompanyModuleService::new(store.clone()),
            user_module_service: UserModuleService::new(store),
        }
    }
}
