// src/handlers/dashboard.rs

use axum::{extract::State, Json};

use crate::{common::error::AppError, config::AppState, models::dashboard::DashboardSummary};

// GET /api/admin/dashboard
#[utoipa::path(
    get,
    path = "/api/admin/dashboard",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Contadores gerais e últimos eventos", body = DashboardSummary),
        (status = 401, description = "Não autorizado"),
        (status = 403, description = "Apenas administradores")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_summary(
    State(app_state): State<AppState>,
) -> Result<Json<DashboardSummary>, AppError> {
    let summary = app_state.dashboard_service.summary().await?;
    Ok(Json(summary))
}
