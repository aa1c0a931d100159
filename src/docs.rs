// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bom Pastor Digital",
        description = "Inscrições para encontros de casais: eventos, dioceses, pagamentos e relatórios."
    ),
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::request_password_reset,
        handlers::auth::update_password,

        // --- Users ---
        handlers::auth::get_me,

        // --- Directory ---
        handlers::directory::search_municipalities,
        handlers::directory::get_municipality,
        handlers::directory::resolve_diocese,

        // --- Events ---
        handlers::events::list_open_events,

        // --- Registrations ---
        handlers::registrations::check_availability,
        handlers::registrations::validate_step,
        handlers::registrations::create_registration,
        handlers::registrations::list_my_registrations,
        handlers::registrations::confirmation_pdf,
        handlers::registrations::send_confirmation_email,

        // --- Admin ---
        handlers::admin::list_dioceses,
        handlers::admin::create_diocese,
        handlers::admin::update_diocese,
        handlers::admin::delete_diocese,
        handlers::admin::list_events,
        handlers::admin::get_event,
        handlers::admin::create_event,
        handlers::admin::update_event,
        handlers::admin::delete_event,
        handlers::admin::list_registrations,
        handlers::admin::get_registration,
        handlers::admin::update_registration,
        handlers::admin::update_registration_status,
        handlers::admin::delete_registration,

        // --- Payments ---
        handlers::payments::upload_proof,
        handlers::payments::list_proofs,
        handlers::payments::download_proof,
        handlers::payments::delete_proof,

        // --- Reports ---
        handlers::documents::export_spreadsheet,
        handlers::documents::export_fichas,
        handlers::documents::export_roll_call,

        // --- Dashboard ---
        handlers::dashboard::get_summary,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::UserRole,
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::PasswordResetRequestPayload,
            models::auth::PasswordUpdatePayload,
            models::auth::AuthResponse,

            // --- Directory ---
            models::directory::Municipality,
            models::directory::Diocese,
            models::directory::DiocesePayload,
            handlers::directory::DioceseLookup,

            // --- Events ---
            models::event::EventStatus,
            models::event::Event,
            models::event::EventPayload,

            // --- Registrations ---
            models::registration::Spouse,
            models::registration::RegistrationStatus,
            models::registration::PersonInput,
            models::registration::WeddingData,
            models::registration::JointData,
            models::registration::RegistrationDraft,
            models::registration::Person,
            models::registration::Registration,
            models::registration::RegistrationDetail,
            models::registration::AvailabilityRequest,
            models::registration::Availability,
            models::registration::RegistrationCreated,
            models::registration::StatusUpdatePayload,
            models::registration::PersonUpdate,
            models::registration::RegistrationUpdatePayload,
            services::registration_wizard::WizardStep,
            services::registration_wizard::StepNavigation,

            // --- Payments ---
            models::payment::PaymentProof,
            handlers::payments::ProofUploadForm,

            // --- Dashboard ---
            models::dashboard::DashboardSummary,
            models::dashboard::RecentEventEntry,
        )
    ),
    tags(
        (name = "Auth", description = "Cadastro, login e redefinição de senha"),
        (name = "Users", description = "Dados do usuário autenticado"),
        (name = "Directory", description = "Municípios e diocese correspondente"),
        (name = "Events", description = "Eventos abertos para inscrição"),
        (name = "Registrations", description = "Inscrição do casal e comprovante"),
        (name = "Admin - Dioceses", description = "Cadastro de dioceses"),
        (name = "Admin - Eventos", description = "Cadastro de eventos"),
        (name = "Admin - Inscrições", description = "Gestão das inscrições"),
        (name = "Admin - Pagamentos", description = "Comprovantes de pagamento"),
        (name = "Admin - Relatórios", description = "Planilha, fichas e lista de presença"),
        (name = "Dashboard", description = "Indicadores gerais")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_admin_route_requires_the_bearer_scheme() {
        let doc = ApiDoc::openapi();

        for (path, item) in doc.paths.paths.iter().filter(|(p, _)| p.starts_with("/api/admin")) {
            let operations = [&item.get, &item.post, &item.put, &item.patch, &item.delete];
            for operation in operations.into_iter().flatten() {
                assert!(operation.security.is_some(), "{} sem segurança", path);
            }
        }
    }

    #[test]
    fn availability_check_is_documented_as_authenticated() {
        let doc = ApiDoc::openapi();

        let item = &doc.paths.paths["/api/registrations/availability"];
        let operation = item.post.as_ref().unwrap();
        assert!(operation.security.is_some());
    }
}
