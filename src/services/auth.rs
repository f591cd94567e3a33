// src/services/auth.rs

use bcrypt::verify;
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::{
    common::error::AppError,
    db::{SharedStore, TxScope},
    models::{
        auth::{AuthResponse, Claims},
        company::Company,
        module::Module,
        user::User,
    },
    services::{consistency::ConsistencyValidator, entitlement_service::EntitlementService},
};

#[derive(Clone)]
pub struct AuthService {
    store: SharedStore,
    jwt_secret: String,
    jwt_ttl_hours: i64,
}

impl AuthService {
    pub fn new(store: SharedStore, jwt_secret: String, jwt_ttl_hours: i64) -> Self {
        Self { store, jwt_secret, jwt_ttl_hours }
    }

    /// Usuário inexistente, inativo ou senha errada: sempre o mesmo erro.
    ///
    /// O bcrypt roda fora de qualquer transação. A sessão (company e
    /// módulos efetivos) é lida numa fotografia nova, depois da senha
    /// conferida.
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthResponse, AppError> {
        let user = self.find_active_user(username).await?;

        if !verify_password(password, &user.password_hash).await? {
            return Err(AppError::InvalidCredentials);
        }

        let (user, company, modules) = self.load_session(&user).await?;
        let access_token = self.create_token(&user)?;

        Ok(AuthResponse {
            access_token,
            token_type: "Bearer".to_string(),
            user,
            company: company.into(),
            modules,
        })
    }

    async fn find_active_user(&self, username: &str) -> Result<User, AppError> {
        let mut tx = self.store.begin(TxScope::Snapshot).await?;
        let user = tx.find_user_by_username(username).await?;
        tx.commit().await?;

        user.filter(|user| user.is_active).ok_or(AppError::InvalidCredentials)
    }

    /// Relê o usuário: ele pode ter sido desativado, apagado ou ter trocado
    /// de senha enquanto o hash era conferido.
    async fn load_session(&self, checked: &User) -> Result<(User, Company, Vec<Module>), AppError> {
        let mut tx = self.store.begin(TxScope::Snapshot).await?;

        let user = tx
            .find_user(checked.id)
            .await?
            .filter(|user| user.is_active && user.password_hash == checked.password_hash)
            .ok_or(AppError::InvalidCredentials)?;
        let company = ConsistencyValidator::ensure_company_exists(&mut *tx, user.company_id).await?;
        let modules = EntitlementService::effective_modules_for(&mut *tx, &user).await?;

        tx.commit().await?;
        Ok((user, company, modules))
    }

    /// Decodifica o token e recarrega o usuário. Usuário apagado ou
    /// desativado depois da emissão invalida o token.
    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        let mut tx = self.store.begin(TxScope::Snapshot).await?;
        let user = tx.find_user(token_data.claims.sub).await?;
        tx.commit().await?;

        user.filter(|user| user.is_active).ok_or(AppError::InvalidToken)
    }

    fn create_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::hours(self.jwt_ttl_hours);

        let claims = Claims {
            sub: user.id,
            company_id: user.company_id,
            username: user.username.clone(),
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

async fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let password_clone = password.to_owned();
    let password_hash_clone = password_hash.to_owned();

    // Executa a verificação em um thread separado
    let is_password_valid =
        tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

    Ok(is_password_valid)
}
