//src/main.rs

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, patch, post, put},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod client;
mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppState, Settings};
use crate::docs::ApiDoc;
use crate::middleware::{auth::auth_guard, rbac::admin_guard};

// Folga sobre o limite de 5MB do comprovante para o envelope multipart
const UPLOAD_BODY_LIMIT: usize = 6 * 1024 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let settings = Settings::from_env()?;
    let app_state = AppState::new(&settings)
        .await
        .context("Falha ao inicializar o estado da aplicação.")?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .context("Falha ao rodar as migrações do banco de dados.")?;

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let app = app(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(&settings.server_addr)
        .await
        .with_context(|| format!("Falha ao iniciar o listener TCP em {}", settings.server_addr))?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("Erro no servidor Axum")?;
    Ok(())
}

fn app(app_state: AppState) -> Router {
    // Rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/password-reset", post(handlers::auth::request_password_reset))
        .route("/password-update", post(handlers::auth::update_password));

    let directory_routes = Router::new()
        .route("/", get(handlers::directory::search_municipalities))
        .route("/{code}", get(handlers::directory::get_municipality))
        .route("/{code}/diocese", get(handlers::directory::resolve_diocese));

    // Formulário público: validação das etapas não exige login
    let public_registration_routes = Router::new()
        .route("/api/events/open", get(handlers::events::list_open_events))
        .route(
            "/api/registrations/steps/{step}/validate",
            post(handlers::registrations::validate_step),
        );

    // Rotas do participante (protegidas pelo middleware)
    let user_routes = Router::new()
        .route("/api/users/me", get(handlers::auth::get_me))
        .route("/api/registrations", post(handlers::registrations::create_registration))
        .route(
            "/api/registrations/availability",
            post(handlers::registrations::check_availability),
        )
        .route("/api/registrations/mine", get(handlers::registrations::list_my_registrations))
        .route(
            "/api/registrations/{id}/confirmation.pdf",
            get(handlers::registrations::confirmation_pdf),
        )
        .route(
            "/api/registrations/{id}/confirmation/email",
            post(handlers::registrations::send_confirmation_email),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // O admin_guard roda depois do auth_guard (a última camada é a primeira a executar)
    let admin_routes = Router::new()
        .route("/dashboard", get(handlers::dashboard::get_summary))
        .route(
            "/dioceses",
            get(handlers::admin::list_dioceses).post(handlers::admin::create_diocese),
        )
        .route(
            "/dioceses/{id}",
            put(handlers::admin::update_diocese).delete(handlers::admin::delete_diocese),
        )
        .route(
            "/events",
            get(handlers::admin::list_events).post(handlers::admin::create_event),
        )
        .route(
            "/events/{id}",
            get(handlers::admin::get_event)
                .put(handlers::admin::update_event)
                .delete(handlers::admin::delete_event),
        )
        .route("/registrations", get(handlers::admin::list_registrations))
        .route(
            "/registrations/{id}",
            get(handlers::admin::get_registration)
                .put(handlers::admin::update_registration)
                .delete(handlers::admin::delete_registration),
        )
        .route(
            "/registrations/{id}/status",
            patch(handlers::admin::update_registration_status),
        )
        .route(
            "/registrations/{id}/proofs",
            post(handlers::payments::upload_proof)
                .get(handlers::payments::list_proofs)
                .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/proofs/{proof_id}",
            get(handlers::payments::download_proof).delete(handlers::payments::delete_proof),
        )
        .route(
            "/reports/events/{id}/spreadsheet",
            get(handlers::documents::export_spreadsheet),
        )
        .route("/reports/events/{id}/fichas", get(handlers::documents::export_fichas))
        .route(
            "/reports/events/{id}/roll-call",
            get(handlers::documents::export_roll_call),
        )
        .layer(axum_middleware::from_fn(admin_guard))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api/municipalities", directory_routes)
        .nest("/api/admin", admin_routes)
        .merge(public_registration_routes)
        .merge(user_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use rust_decimal::Decimal;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::config::{PdfSettings, PixSettings};

    fn settings() -> Settings {
        Settings {
            database_url: "postgres://localhost/bom_pastor_test".into(),
            jwt_secret: "segredo-de-teste".into(),
            server_addr: "127.0.0.1:0".into(),
            app_public_url: "http://localhost:5173".into(),
            storage_dir: "./storage/teste".into(),
            storage_public_url: "http://localhost:3000/comprovantes".into(),
            pdf: PdfSettings { fonts_dir: "./fonts".into(), font_name: "Roboto".into() },
            email_relay_url: "http://localhost:9/send".into(),
            email_relay_token: "token".into(),
            email_timeout: Duration::from_millis(100),
            pix: PixSettings {
                key: "pix@bompastor.org".into(),
                key_type: "E-mail".into(),
                beneficiary: "Paróquia Bom Pastor".into(),
                whatsapp: "(63) 99999-0000".into(),
                amount: Decimal::new(10000, 2),
                copy_paste: None,
            },
        }
    }

    // Pool preguiçoso: as rotas testadas aqui respondem antes de tocar o banco
    fn test_app() -> Router {
        let settings = settings();
        let pool = PgPoolOptions::new().connect_lazy(&settings.database_url).unwrap();
        app(AppState::with_pool(&settings, pool).unwrap())
    }

    async fn post_json(uri: &str, token: Option<&str>, body: serde_json::Value) -> StatusCode {
        let mut request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = request.body(Body::from(body.to_string())).unwrap();
        test_app().oneshot(request).await.unwrap().status()
    }

    fn availability_body() -> serde_json::Value {
        serde_json::json!({
            "eventId": 1,
            "husbandCpf": "111.222.333-44",
            "wifeCpf": "555.666.777-88"
        })
    }

    #[tokio::test]
    async fn availability_requires_a_session() {
        let status = post_json("/api/registrations/availability", None, availability_body()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn availability_rejects_a_forged_token() {
        let status = post_json(
            "/api/registrations/availability",
            Some("nao-e-um-jwt"),
            availability_body(),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn step_validation_stays_public() {
        let status = post_json(
            "/api/registrations/steps/event-selection/validate",
            None,
            serde_json::json!({ "eventId": 1 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
}
