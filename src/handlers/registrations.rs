// src/handlers/registrations.rs

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::registration::{
        Availability, AvailabilityRequest, RegistrationCreated, RegistrationDetail,
        RegistrationDraft,
    },
    services::registration_wizard::{RegistrationWizard, StepNavigation, UserSubmission, WizardStep},
};

// Consulta somente leitura: nunca devolve erro, só `available: false` com a mensagem.
// Exige sessão para não expor quem está inscrito a partir de CPFs avulsos.
#[utoipa::path(
    post,
    path = "/api/registrations/availability",
    tag = "Registrations",
    request_body = AvailabilityRequest,
    responses(
        (status = 200, description = "Resultado da verificação dos CPFs no evento", body = Availability),
        (status = 401, description = "Sessão ausente ou inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn check_availability(
    State(app_state): State<AppState>,
    Json(payload): Json<AvailabilityRequest>,
) -> Json<Availability> {
    let availability = app_state
        .registration_service
        .check_availability(payload.event_id, &payload.husband_cpf, &payload.wife_cpf)
        .await;
    Json(availability)
}

#[utoipa::path(
    post,
    path = "/api/registrations/steps/{step}/validate",
    tag = "Registrations",
    params(("step" = WizardStep, Path, description = "Etapa do formulário")),
    request_body = RegistrationDraft,
    responses(
        (status = 200, description = "Etapa válida, com a próxima e a anterior", body = StepNavigation),
        (status = 400, description = "Campos inválidos, com detalhes por campo")
    )
)]
pub async fn validate_step(
    Path(step): Path<WizardStep>,
    Json(draft): Json<RegistrationDraft>,
) -> Result<Json<StepNavigation>, AppError> {
    step.validate(&draft)?;
    Ok(Json(step.navigation()))
}

#[utoipa::path(
    post,
    path = "/api/registrations",
    tag = "Registrations",
    request_body = RegistrationDraft,
    responses(
        (status = 201, description = "Inscrição criada como pendente", body = RegistrationCreated),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "Casal já inscrito neste evento")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_registration(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(draft): Json<RegistrationDraft>,
) -> Result<impl IntoResponse, AppError> {
    let submission = UserSubmission {
        service: &app_state.registration_service,
        user_id: user.id,
    };
    let id = RegistrationWizard::with_draft(draft).complete(&submission).await?;

    let body = RegistrationCreated {
        id,
        message: "Inscrição realizada com sucesso!".to_string(),
    };
    Ok((StatusCode::CREATED, Json(body)))
}

#[utoipa::path(
    get,
    path = "/api/registrations/mine",
    tag = "Registrations",
    responses(
        (status = 200, description = "Inscrições feitas pelo usuário, mais recentes primeiro", body = Vec<RegistrationDetail>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_my_registrations(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<RegistrationDetail>>, AppError> {
    let registrations = app_state.admin_service.list_user_registrations(user.id).await?;
    Ok(Json(registrations))
}

#[utoipa::path(
    get,
    path = "/api/registrations/{id}/confirmation.pdf",
    tag = "Registrations",
    params(("id" = i64, Path, description = "ID da inscrição")),
    responses(
        (status = 200, description = "Comprovante de inscrição com os dados do PIX"),
        (status = 403, description = "A inscrição pertence a outro usuário"),
        (status = 404, description = "Inscrição não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn confirmation_pdf(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let pdf_bytes = app_state.confirmation_service.confirmation_pdf(id, &user).await?;

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"inscricao-{}.pdf\"", id),
        ),
    ];
    Ok((headers, pdf_bytes).into_response())
}

#[utoipa::path(
    post,
    path = "/api/registrations/{id}/confirmation/email",
    tag = "Registrations",
    params(("id" = i64, Path, description = "ID da inscrição")),
    responses(
        (status = 202, description = "E-mail entregue ao relay"),
        (status = 403, description = "A inscrição pertence a outro usuário"),
        (status = 502, description = "O relay de e-mail recusou ou não respondeu")
    ),
    security(("api_jwt" = []))
)]
pub async fn send_confirmation_email(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    app_state.confirmation_service.send_confirmation(id, &user).await?;
    Ok(StatusCode::ACCEPTED)
}
