// src/handlers/events.rs

use axum::{extract::State, Json};

use crate::{common::error::AppError, config::AppState, models::event::Event};

// Eventos abertos para inscrição (primeira etapa do formulário)
#[utoipa::path(
    get,
    path = "/api/events/open",
    tag = "Events",
    responses(
        (status = 200, description = "Eventos com status aberto, do mais próximo ao mais distante", body = Vec<Event>)
    )
)]
pub async fn list_open_events(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<Event>>, AppError> {
    let events = app_state.admin_service.list_open_events().await?;
    Ok(Json(events))
}
