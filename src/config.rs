// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use rust_decimal::Decimal;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    client::EmailRelayClient,
    db::{
        DashboardRepository, DirectoryRepository, EventRepository, PaymentRepository,
        RegistrationRepository, UserRepository,
    },
    services::{
        admin_service::AdminService, auth::AuthService,
        confirmation_service::ConfirmationService, dashboard_service::DashboardService,
        directory_service::DirectoryService, document_service::DocumentService,
        payment_service::PaymentService, registration_service::RegistrationService,
        storage::LocalDiskStorage,
    },
};

/// Dados do PIX exibidos no comprovante e no e-mail de confirmação.
#[derive(Debug, Clone)]
pub struct PixSettings {
    pub key: String,
    pub key_type: String,
    pub beneficiary: String,
    pub whatsapp: String,
    pub amount: Decimal,
    pub copy_paste: Option<String>,
}

impl PixSettings {
    /// "R$ 100,00"
    pub fn amount_label(&self) -> String {
        format!("R$ {}", format!("{:.2}", self.amount).replace('.', ","))
    }
}

#[derive(Debug, Clone)]
pub struct PdfSettings {
    pub fonts_dir: String,
    pub font_name: String,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub app_public_url: String,
    pub storage_dir: String,
    pub storage_public_url: String,
    pub pdf: PdfSettings,
    pub email_relay_url: String,
    pub email_relay_token: String,
    pub email_timeout: Duration,
    pub pix: PixSettings,
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

// Valores sem padrão real: a aplicação sobe, mas avisa no log
fn var_or_placeholder(name: &str, placeholder: &str) -> String {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => {
            tracing::warn!("⚠️ {} não definida; usando valor provisório \"{}\"", name, placeholder);
            placeholder.to_string()
        }
    }
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let app_public_url = var_or("APP_PUBLIC_URL", "http://localhost:5173");
        let email_timeout_ms: u64 = var_or("EMAIL_TIMEOUT_MS", "10000")
            .parse()
            .context("EMAIL_TIMEOUT_MS deve ser um número")?;
        let amount: Decimal = var_or("PIX_AMOUNT", "100.00")
            .parse()
            .context("PIX_AMOUNT deve ser um valor decimal")?;

        Ok(Self {
            database_url,
            jwt_secret,
            server_addr: var_or("SERVER_ADDR", "0.0.0.0:3000"),
            storage_dir: var_or("STORAGE_DIR", "./storage/comprovantes"),
            storage_public_url: var_or("STORAGE_PUBLIC_URL", "http://localhost:3000/comprovantes"),
            pdf: PdfSettings {
                fonts_dir: var_or("FONTS_DIR", "./fonts"),
                font_name: var_or("FONT_NAME", "Roboto"),
            },
            email_relay_url: var_or_placeholder(
                "EMAIL_RELAY_URL",
                "http://localhost:54321/functions/v1/send-confirmation-email",
            ),
            email_relay_token: var_or_placeholder("EMAIL_RELAY_TOKEN", "dev-token"),
            email_timeout: Duration::from_millis(email_timeout_ms),
            pix: PixSettings {
                key: var_or_placeholder("PIX_KEY", "chave-pix-nao-configurada"),
                key_type: var_or("PIX_KEY_TYPE", "CNPJ"),
                beneficiary: var_or_placeholder("PIX_BENEFICIARY", "Bom Pastor Digital"),
                whatsapp: var_or_placeholder("PIX_WHATSAPP", "(00) 00000-0000"),
                amount,
                copy_paste: env::var("PIX_COPY_PASTE").ok().filter(|v| !v.trim().is_empty()),
            },
            app_public_url,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: AuthService,
    pub directory_service: DirectoryService,
    pub registration_service: RegistrationService,
    pub admin_service: AdminService,
    pub payment_service: PaymentService,
    pub document_service: DocumentService,
    pub confirmation_service: ConfirmationService,
    pub dashboard_service: DashboardService,
}

impl AppState {
    pub async fn new(settings: &Settings) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&settings.database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Self::with_pool(settings, db_pool)
    }

    // --- Monta o gráfico de dependências ---
    pub fn with_pool(settings: &Settings, db_pool: PgPool) -> anyhow::Result<Self> {
        let email_client = EmailRelayClient::new(
            &settings.email_relay_url,
            settings.email_relay_token.clone(),
            settings.email_timeout,
        )?;

        let user_repo = UserRepository::new(db_pool.clone());
        let directory_repo = DirectoryRepository::new(db_pool.clone());
        let event_repo = EventRepository::new(db_pool.clone());
        let registration_repo = RegistrationRepository::new(db_pool.clone(), directory_repo.clone());
        let payment_repo = PaymentRepository::new(db_pool.clone());

        let storage = LocalDiskStorage::new(&settings.storage_dir, &settings.storage_public_url);

        let auth_service = AuthService::new(
            user_repo,
            settings.jwt_secret.clone(),
            email_client.clone(),
            settings.app_public_url.clone(),
        );
        let directory_service = DirectoryService::new(directory_repo.clone());
        let registration_service = RegistrationService::new(Arc::new(registration_repo.clone()));
        let payment_service = PaymentService::new(Arc::new(payment_repo), Arc::new(storage));
        let admin_service = AdminService::new(
            directory_repo,
            event_repo.clone(),
            registration_repo.clone(),
            payment_service.clone(),
        );
        let document_service = DocumentService::new(settings.pdf.clone(), settings.pix.clone());
        let confirmation_service = ConfirmationService::new(
            registration_repo,
            event_repo,
            document_service.clone(),
            email_client,
        );
        let dashboard_service = DashboardService::new(db_pool.clone(), DashboardRepository::new());

        Ok(Self {
            db_pool,
            auth_service,
            directory_service,
            registration_service,
            admin_service,
            payment_service,
            document_service,
            confirmation_service,
            dashboard_service,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_label_uses_brazilian_decimal_comma() {
        let pix = PixSettings {
            key: "k".into(),
            key_type: "CNPJ".into(),
            beneficiary: "b".into(),
            whatsapp: "w".into(),
            amount: Decimal::new(10000, 2),
            copy_paste: None,
        };
        assert_eq!(pix.amount_label(), "R$ 100,00");

        let pix = PixSettings { amount: Decimal::new(755, 1), ..pix };
        assert_eq!(pix.amount_label(), "R$ 75,50");
    }
}
