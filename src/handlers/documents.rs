// src/handlers/documents.rs

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};

use crate::{common::error::AppError, config::AppState, services::export_service};

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

// Configura os headers para o navegador baixar o arquivo
fn attachment(content_type: &str, file_name: String, bytes: Vec<u8>) -> Response {
    let headers = [
        (header::CONTENT_TYPE, content_type.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file_name),
        ),
    ];
    (headers, bytes).into_response()
}

#[utoipa::path(
    get,
    path = "/api/admin/reports/events/{id}/spreadsheet",
    tag = "Admin - Relatórios",
    params(("id" = i64, Path, description = "ID do evento")),
    responses(
        (status = 200, description = "Planilha .xlsx com uma linha por inscrição"),
        (status = 404, description = "Evento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn export_spreadsheet(
    State(app_state): State<AppState>,
    Path(event_id): Path<i64>,
) -> Result<Response, AppError> {
    let (_, records) = app_state.admin_service.report_records(event_id).await?;
    let bytes = export_service::build_spreadsheet(&records)?;

    Ok(attachment(XLSX_MIME, format!("inscritos_evento_{}.xlsx", event_id), bytes))
}

#[utoipa::path(
    get,
    path = "/api/admin/reports/events/{id}/fichas",
    tag = "Admin - Relatórios",
    params(("id" = i64, Path, description = "ID do evento")),
    responses(
        (status = 200, description = "PDF com uma ficha por página"),
        (status = 404, description = "Evento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn export_fichas(
    State(app_state): State<AppState>,
    Path(event_id): Path<i64>,
) -> Result<Response, AppError> {
    let (event, records) = app_state.admin_service.report_records(event_id).await?;
    let bytes = app_state.document_service.render_fichas(&records, &event.name)?;

    Ok(attachment("application/pdf", format!("fichas_evento_{}.pdf", event_id), bytes))
}

#[utoipa::path(
    get,
    path = "/api/admin/reports/events/{id}/roll-call",
    tag = "Admin - Relatórios",
    params(("id" = i64, Path, description = "ID do evento")),
    responses(
        (status = 200, description = "PDF da lista de presença"),
        (status = 404, description = "Evento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn export_roll_call(
    State(app_state): State<AppState>,
    Path(event_id): Path<i64>,
) -> Result<Response, AppError> {
    let (event, records) = app_state.admin_service.report_records(event_id).await?;
    let bytes = app_state.document_service.render_roll_call(&records, &event.name)?;

    Ok(attachment("application/pdf", format!("lista_presenca_evento_{}.pdf", event_id), bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachment_sets_download_headers() {
        let response = attachment("application/pdf", "fichas_evento_7.pdf".into(), b"%PDF".to_vec());

        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"fichas_evento_7.pdf\""
        );
    }
}
