// src/handlers/admin.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::AppError,
    config::AppState,
    models::{
        directory::{Diocese, DiocesePayload},
        event::{Event, EventPayload},
        registration::{
            RegistrationDetail, RegistrationFilter, RegistrationUpdatePayload, StatusUpdatePayload,
        },
    },
};

// =============================================================================
//  DIOCESES
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/admin/dioceses",
    tag = "Admin - Dioceses",
    responses((status = 200, description = "Dioceses em ordem alfabética", body = Vec<Diocese>)),
    security(("api_jwt" = []))
)]
pub async fn list_dioceses(State(app_state): State<AppState>) -> Result<Json<Vec<Diocese>>, AppError> {
    Ok(Json(app_state.admin_service.list_dioceses().await?))
}

#[utoipa::path(
    post,
    path = "/api/admin/dioceses",
    tag = "Admin - Dioceses",
    request_body = DiocesePayload,
    responses(
        (status = 201, body = Diocese),
        (status = 400, description = "Nome e UF são obrigatórios")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_diocese(
    State(app_state): State<AppState>,
    Json(payload): Json<DiocesePayload>,
) -> Result<impl IntoResponse, AppError> {
    let diocese = app_state.admin_service.create_diocese(payload).await?;
    Ok((StatusCode::CREATED, Json(diocese)))
}

#[utoipa::path(
    put,
    path = "/api/admin/dioceses/{id}",
    tag = "Admin - Dioceses",
    params(("id" = i64, Path)),
    request_body = DiocesePayload,
    responses((status = 200, body = Diocese), (status = 404, description = "Diocese não encontrada")),
    security(("api_jwt" = []))
)]
pub async fn update_diocese(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<DiocesePayload>,
) -> Result<Json<Diocese>, AppError> {
    Ok(Json(app_state.admin_service.update_diocese(id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/admin/dioceses/{id}",
    tag = "Admin - Dioceses",
    params(("id" = i64, Path)),
    responses(
        (status = 204, description = "Diocese excluída"),
        (status = 409, description = "Diocese vinculada a inscrições")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_diocese(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    app_state.admin_service.delete_diocese(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  EVENTOS
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/admin/events",
    tag = "Admin - Eventos",
    responses((status = 200, description = "Todos os eventos, mais recentes primeiro", body = Vec<Event>)),
    security(("api_jwt" = []))
)]
pub async fn list_events(State(app_state): State<AppState>) -> Result<Json<Vec<Event>>, AppError> {
    Ok(Json(app_state.admin_service.list_events().await?))
}

#[utoipa::path(
    get,
    path = "/api/admin/events/{id}",
    tag = "Admin - Eventos",
    params(("id" = i64, Path)),
    responses((status = 200, body = Event), (status = 404, description = "Evento não encontrado")),
    security(("api_jwt" = []))
)]
pub async fn get_event(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Event>, AppError> {
    Ok(Json(app_state.admin_service.get_event(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/admin/events",
    tag = "Admin - Eventos",
    request_body = EventPayload,
    responses(
        (status = 201, body = Event),
        (status = 400, description = "Datas ou campos obrigatórios inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_event(
    State(app_state): State<AppState>,
    Json(payload): Json<EventPayload>,
) -> Result<impl IntoResponse, AppError> {
    let event = app_state.admin_service.create_event(payload).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

#[utoipa::path(
    put,
    path = "/api/admin/events/{id}",
    tag = "Admin - Eventos",
    params(("id" = i64, Path)),
    request_body = EventPayload,
    responses((status = 200, body = Event), (status = 404, description = "Evento não encontrado")),
    security(("api_jwt" = []))
)]
pub async fn update_event(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<EventPayload>,
) -> Result<Json<Event>, AppError> {
    Ok(Json(app_state.admin_service.update_event(id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/admin/events/{id}",
    tag = "Admin - Eventos",
    params(("id" = i64, Path)),
    responses(
        (status = 204, description = "Evento excluído"),
        (status = 409, description = "Evento possui inscrições")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_event(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    app_state.admin_service.delete_event(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  INSCRIÇÕES
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/admin/registrations",
    tag = "Admin - Inscrições",
    params(("eventId" = Option<i64>, Query, description = "Filtra por evento")),
    responses((status = 200, body = Vec<RegistrationDetail>)),
    security(("api_jwt" = []))
)]
pub async fn list_registrations(
    State(app_state): State<AppState>,
    Query(filter): Query<RegistrationFilter>,
) -> Result<Json<Vec<RegistrationDetail>>, AppError> {
    Ok(Json(app_state.admin_service.list_registrations(filter.event_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/admin/registrations/{id}",
    tag = "Admin - Inscrições",
    params(("id" = i64, Path)),
    responses((status = 200, body = RegistrationDetail), (status = 404, description = "Inscrição não encontrada")),
    security(("api_jwt" = []))
)]
pub async fn get_registration(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<RegistrationDetail>, AppError> {
    Ok(Json(app_state.admin_service.get_registration(id).await?))
}

#[utoipa::path(
    put,
    path = "/api/admin/registrations/{id}",
    tag = "Admin - Inscrições",
    params(("id" = i64, Path)),
    request_body = RegistrationUpdatePayload,
    responses(
        (status = 200, body = RegistrationDetail),
        (status = 409, description = "O casal já está inscrito no evento de destino")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_registration(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<RegistrationUpdatePayload>,
) -> Result<Json<RegistrationDetail>, AppError> {
    Ok(Json(app_state.admin_service.update_registration(id, payload).await?))
}

#[utoipa::path(
    patch,
    path = "/api/admin/registrations/{id}/status",
    tag = "Admin - Inscrições",
    params(("id" = i64, Path)),
    request_body = StatusUpdatePayload,
    responses((status = 204, description = "Status alterado")),
    security(("api_jwt" = []))
)]
pub async fn update_registration_status(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<StatusUpdatePayload>,
) -> Result<StatusCode, AppError> {
    app_state.admin_service.set_registration_status(id, payload.status).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/api/admin/registrations/{id}",
    tag = "Admin - Inscrições",
    params(("id" = i64, Path)),
    responses((status = 204, description = "Inscrição e comprovantes excluídos")),
    security(("api_jwt" = []))
)]
pub async fn delete_registration(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    app_state.admin_service.delete_registration(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
