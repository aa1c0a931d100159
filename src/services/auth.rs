// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    client::{EmailMessage, EmailRelayClient},
    common::error::AppError,
    db::UserRepository,
    models::auth::{AuthResponse, Claims, TokenPurpose, User, UserRole},
};

const SESSION_TTL_DAYS: i64 = 7;
const RESET_TTL_HOURS: i64 = 1;

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
    email_client: EmailRelayClient,
    app_public_url: String,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        jwt_secret: String,
        email_client: EmailRelayClient,
        app_public_url: String,
    ) -> Self {
        Self { user_repo, jwt_secret, email_client, app_public_url }
    }

    async fn hash_password(password: &str) -> Result<String, AppError> {
        let password_clone = password.to_owned();
        let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
        Ok(hashed)
    }

    pub async fn register_user(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let email = email.trim().to_lowercase();
        let hashed_password = Self::hash_password(password).await?;

        // Todo cadastro público nasce como 'user'; administradores são promovidos no banco
        let new_user = self
            .user_repo
            .create_user(self.user_repo.pool(), &email, &hashed_password, UserRole::User)
            .await?;

        tracing::info!("✅ Usuário {} cadastrado", new_user.id);
        self.session_response(&new_user)
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let user = self
            .user_repo
            .find_by_email(&email.trim().to_lowercase())
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid =
            tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        self.session_response(&user)
    }

    /// Só aceita tokens de sessão; o usuário (e o papel) vem sempre do banco.
    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let claims = self.decode_token(token, TokenPurpose::Session)?;

        self.user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    /// Sempre responde igual, exista ou não o e-mail.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AppError> {
        let Some(user) = self.user_repo.find_by_email(&email.trim().to_lowercase()).await? else {
            tracing::info!("Pedido de redefinição para e-mail não cadastrado");
            return Ok(());
        };

        let token = self.create_token(user.id, TokenPurpose::Reset)?;
        let link = format!(
            "{}/update-password?token={}",
            self.app_public_url.trim_end_matches('/'),
            token
        );

        let message = EmailMessage {
            to: vec![user.email.clone()],
            subject: "Redefinição de senha - Bom Pastor Digital".to_string(),
            html: reset_email_html(&link),
            pdf_base64: None,
            pdf_filename: None,
        };

        if let Err(e) = self.email_client.send(&message).await {
            tracing::error!("Falha ao enviar e-mail de redefinição: {:?}", e);
        }
        Ok(())
    }

    pub async fn update_password(&self, token: &str, new_password: &str) -> Result<(), AppError> {
        let claims = self.decode_token(token, TokenPurpose::Reset)?;
        let hashed = Self::hash_password(new_password).await?;

        self.user_repo.update_password(claims.sub, &hashed).await?;
        tracing::info!("🔑 Senha redefinida para o usuário {}", claims.sub);
        Ok(())
    }

    fn session_response(&self, user: &User) -> Result<AuthResponse, AppError> {
        Ok(AuthResponse {
            token: self.create_token(user.id, TokenPurpose::Session)?,
            role: user.role,
        })
    }

    fn decode_token(&self, token: &str, expected: TokenPurpose) -> Result<Claims, AppError> {
        let validation = Validation::default();
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &validation,
        )
        .map_err(|_| AppError::InvalidToken)?;

        if token_data.claims.purpose != expected {
            return Err(AppError::InvalidToken);
        }
        Ok(token_data.claims)
    }

    fn create_token(&self, user_id: Uuid, purpose: TokenPurpose) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = match purpose {
            TokenPurpose::Session => now + chrono::Duration::days(SESSION_TTL_DAYS),
            TokenPurpose::Reset => now + chrono::Duration::hours(RESET_TTL_HOURS),
        };

        let claims = Claims {
            sub: user_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
            purpose,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

fn reset_email_html(link: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="pt-BR">
<body style="font-family: Arial, sans-serif; color: #333;">
    <h2 style="color: #2C3E50;">Redefinição de senha</h2>
    <p>Recebemos um pedido para redefinir a sua senha no Bom Pastor Digital.</p>
    <p><a href="{link}">Clique aqui para criar uma nova senha</a>. O link vale por 1 hora.</p>
    <p>Se você não fez este pedido, ignore este e-mail.</p>
</body>
</html>"#
    )
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use claims::{assert_err, assert_ok};
    use sqlx::postgres::PgPoolOptions;

    use super::*;

    fn service() -> AuthService {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/bom_pastor_test")
            .unwrap();
        let email_client = EmailRelayClient::new(
            "http://localhost:9/send",
            "token".into(),
            Duration::from_millis(100),
        )
        .unwrap();
        AuthService::new(
            UserRepository::new(pool),
            "segredo-de-teste".into(),
            email_client,
            "http://localhost:5173".into(),
        )
    }

    #[tokio::test]
    async fn session_token_roundtrips() {
        let service = service();
        let user_id = Uuid::new_v4();

        let token = service.create_token(user_id, TokenPurpose::Session).unwrap();
        let claims = service.decode_token(&token, TokenPurpose::Session).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.purpose, TokenPurpose::Session);
    }

    #[tokio::test]
    async fn reset_token_is_not_a_session() {
        let service = service();
        let token = service.create_token(Uuid::new_v4(), TokenPurpose::Reset).unwrap();

        assert_err!(service.decode_token(&token, TokenPurpose::Session));
        assert_ok!(service.decode_token(&token, TokenPurpose::Reset));
    }

    #[tokio::test]
    async fn session_token_cannot_reset_password() {
        let service = service();
        let token = service.create_token(Uuid::new_v4(), TokenPurpose::Session).unwrap();

        let err = service.update_password(&token, "nova-senha").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[tokio::test]
    async fn token_signed_with_other_secret_is_rejected() {
        let service = service();
        let mut other = service.clone();
        other.jwt_secret = "outro-segredo".into();

        let token = other.create_token(Uuid::new_v4(), TokenPurpose::Session).unwrap();
        assert_err!(service.decode_token(&token, TokenPurpose::Session));
    }

    #[test]
    fn reset_email_contains_link() {
        let html = reset_email_html("http://app/update-password?token=abc");
        assert!(html.contains("href=\"http://app/update-password?token=abc\""));
    }
}
