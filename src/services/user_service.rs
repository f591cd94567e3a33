// src/services/user_service.rs

use uuid::Uuid;

use crate::{
    common::error::{AppError, EntityKind},
    db::{NewUser, SharedStore, TxScope, UserPatch},
    models::user::{CreateUserPayload, UpdateUserPayload, User},
    services::consistency::ConsistencyValidator,
};

#[derive(Clone)]
pub struct UserService {
    store: SharedStore,
    bcrypt_cost: u32,
}

impl UserService {
    pub fn new(store: SharedStore, bcrypt_cost: u32) -> Self {
        Self { store, bcrypt_cost }
    }

    pub async fn create(&self, payload: CreateUserPayload) -> Result<User, AppError> {
        // 1. Hashing fora da transação (não toca no banco)
        let password_hash = hash_password(payload.password, self.bcrypt_cost).await?;

        let mut tx = self.store.begin(TxScope::Admin).await?;

        // 2. A company precisa existir
        ConsistencyValidator::ensure_company_exists(&mut *tx, payload.company_id).await?;

        // 3. Cria o usuário
        let user = tx
            .insert_user(NewUser {
                company_id: payload.company_id,
                username: payload.username,
                email: payload.email,
                full_name: payload.full_name,
                password_hash,
                is_active: payload.is_active.unwrap_or(true),
            })
            .await?;

        tx.commit().await?;
        Ok(user)
    }

    pub async fn list(&self) -> Result<Vec<User>, AppError> {
        let mut tx = self.store.begin(TxScope::Snapshot).await?;
        let users = tx.list_users(None).await?;
        tx.commit().await?;
        Ok(users)
    }

    pub async fn list_by_company(&self, company_id: Uuid) -> Result<Vec<User>, AppError> {
        let mut tx = self.store.begin(TxScope::Snapshot).await?;
        ConsistencyValidator::ensure_company_exists(&mut *tx, company_id).await?;
        let users = tx.list_users(Some(company_id)).await?;
        tx.commit().await?;
        Ok(users)
    }

    pub async fn get(&self, user_id: Uuid) -> Result<User, AppError> {
        let mut tx = self.store.begin(TxScope::Snapshot).await?;
        let user = ConsistencyValidator::ensure_user_exists(&mut *tx, user_id).await?;
        tx.commit().await?;
        Ok(user)
    }

    pub async fn update(&self, user_id: Uuid, payload: UpdateUserPayload) -> Result<User, AppError> {
        let password_hash = match payload.password {
            Some(password) => Some(hash_password(password, self.bcrypt_cost).await?),
            None => None,
        };

        let mut tx = self.store.begin(TxScope::User(user_id)).await?;

        ConsistencyValidator::ensure_user_exists(&mut *tx, user_id).await?;
        if let Some(company_id) = payload.company_id {
            ConsistencyValidator::ensure_company_exists(&mut *tx, company_id).await?;
        }

        let patch = UserPatch {
            company_id: payload.company_id,
            username: payload.username,
            email: payload.email,
            full_name: payload.full_name,
            password_hash,
            is_active: payload.is_active,
        };
        let user = tx
            .update_user(user_id, patch)
            .await?
            .ok_or_else(|| AppError::not_found(EntityKind::User, user_id))?;

        tx.commit().await?;
        Ok(user)
    }

    /// Apaga o usuário junto com as suas atribuições.
    pub async fn delete(&self, user_id: Uuid) -> Result<User, AppError> {
        let mut tx = self.store.begin(TxScope::User(user_id)).await?;
        let user = ConsistencyValidator::ensure_user_exists(&mut *tx, user_id).await?;
        tx.delete_user(user_id).await?;
        tx.commit().await?;
        Ok(user)
    }
}

/// Bcrypt é CPU-bound: roda num thread separado.
pub async fn hash_password(password: String, cost: u32) -> Result<String, AppError> {
    let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(&password, cost))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::Fixture;

    fn payload(company_id: Uuid, username: &str) -> CreateUserPayload {
        CreateUserPayload {
            company_id,
            email: format!("{username}@obrix.com"),
            full_name: "Usuário Teste".into(),
            username: username.into(),
            password: "Password123!".into(),
            is_active: None,
        }
    }

    #[test_log::test(tokio::test)]
    async fn create_hashes_password_and_defaults_active() {
        let fx = Fixture::new().await;
        let company = fx.company("C1").await;
        let service = UserService::new(fx.store.clone(), 4);

        let user = service.create(payload(company.id, "ana")).await.unwrap();
        assert!(user.is_active);
        assert_ne!(user.password_hash, "Password123!");
        assert!(bcrypt::verify("Password123!", &user.password_hash).unwrap());

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["companyId"], serde_json::json!(company.id));
    }

    #[test_log::test(tokio::test)]
    async fn create_requires_existing_company_and_unique_username() {
        let fx = Fixture::new().await;
        let company = fx.company("C1").await;
        let service = UserService::new(fx.store.clone(), 4);

        let err = service.create(payload(Uuid::new_v4(), "ana")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { entity: EntityKind::Company, .. }));

        service.create(payload(company.id, "ana")).await.unwrap();
        let mut clash = payload(company.id, "ana");
        clash.email = "outra@obrix.com".into();
        let err = service.create(clash).await.unwrap_err();
        assert!(matches!(err, AppError::UniqueConstraintViolation(_)));
    }

    #[test_log::test(tokio::test)]
    async fn update_rehashes_password_and_checks_new_company() {
        let fx = Fixture::new().await;
        let company = fx.company("C1").await;
        let other = fx.company("C2").await;
        let service = UserService::new(fx.store.clone(), 4);
        let user = service.create(payload(company.id, "ana")).await.unwrap();

        let updated = service
            .update(
                user.id,
                UpdateUserPayload {
                    company_id: Some(other.id),
                    password: Some("OutraSenha123".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.company_id, other.id);
        assert_eq!(updated.username, "ana");
        assert!(bcrypt::verify("OutraSenha123", &updated.password_hash).unwrap());

        let err = service
            .update(
                user.id,
                UpdateUserPayload { company_id: Some(Uuid::new_v4()), ..Default::default() },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { entity: EntityKind::Company, .. }));
    }

    #[test_log::test(tokio::test)]
    async fn list_by_company_filters_and_delete_cascades() {
        let fx = Fixture::new().await;
        let company = fx.company("C1").await;
        let other = fx.company("C2").await;
        let module = fx.module("M1", true).await;
        let ana = fx.user(company.id, "ana").await;
        let bia = fx.user(company.id, "bia").await;
        fx.user(other.id, "caio").await;
        fx.enable(company.id, &[module.id]).await;
        fx.assign(ana.id, &[module.id]).await;

        let service = UserService::new(fx.store.clone(), 4);
        let ids: Vec<Uuid> =
            service.list_by_company(company.id).await.unwrap().iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![bia.id, ana.id]);
        assert_eq!(service.list().await.unwrap().len(), 3);

        service.delete(ana.id).await.unwrap();
        assert!(fx.user_module_ids(ana.id).await.is_empty());
        let err = service.get(ana.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { entity: EntityKind::User, .. }));
    }
}
