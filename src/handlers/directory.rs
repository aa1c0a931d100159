// src/handlers/directory.rs

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    common::error::AppError,
    config::AppState,
    models::directory::{Municipality, MunicipalitySearch},
};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DioceseLookup {
    pub diocese_id: Option<i64>,
}

// GET /api/municipalities?q=
#[utoipa::path(
    get,
    path = "/api/municipalities",
    tag = "Directory",
    params(
        ("q" = String, Query, description = "Parte do nome ou a UF (mínimo 2 caracteres)")
    ),
    responses(
        (status = 200, description = "Até 50 municípios, em ordem alfabética", body = Vec<Municipality>)
    )
)]
pub async fn search_municipalities(
    State(app_state): State<AppState>,
    Query(search): Query<MunicipalitySearch>,
) -> Result<Json<Vec<Municipality>>, AppError> {
    let municipalities = app_state
        .directory_service
        .search_municipalities(&search.q)
        .await?;
    Ok(Json(municipalities))
}

#[utoipa::path(
    get,
    path = "/api/municipalities/{code}",
    tag = "Directory",
    params(("code" = i32, Path, description = "Código do município")),
    responses(
        (status = 200, body = Municipality),
        (status = 404, description = "Município não encontrado")
    )
)]
pub async fn get_municipality(
    State(app_state): State<AppState>,
    Path(code): Path<i32>,
) -> Result<Json<Municipality>, AppError> {
    let municipality = app_state.directory_service.get_municipality(code).await?;
    Ok(Json(municipality))
}

// Sem diocese vinculada a resposta é `null`, nunca 404
#[utoipa::path(
    get,
    path = "/api/municipalities/{code}/diocese",
    tag = "Directory",
    params(("code" = i32, Path, description = "Código do município")),
    responses((status = 200, body = DioceseLookup))
)]
pub async fn resolve_diocese(
    State(app_state): State<AppState>,
    Path(code): Path<i32>,
) -> Json<DioceseLookup> {
    let diocese_id = app_state.directory_service.resolve_diocese(code).await;
    Json(DioceseLookup { diocese_id })
}
