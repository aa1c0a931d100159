// src/handlers/payments.rs

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::payment::{PaymentProof, ProofUpload},
};

// Campo esperado no formulário multipart
const FILE_FIELD: &str = "file";

/// Formato do upload, só para a documentação.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct ProofUploadForm {
    /// PDF, JPG ou PNG até 5MB
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
}

async fn read_upload(mut multipart: Multipart) -> Result<ProofUpload, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::warn!("Multipart inválido: {}", e);
        AppError::InvalidUpload("Não foi possível ler o arquivo enviado.".into())
    })? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let mime_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(|e| {
            tracing::warn!("Falha ao ler o arquivo: {}", e);
            AppError::InvalidUpload("Não foi possível ler o arquivo enviado.".into())
        })?;

        return Ok(ProofUpload { file_name, mime_type, bytes: bytes.to_vec() });
    }

    Err(AppError::InvalidUpload("Nenhum arquivo fornecido.".into()))
}

#[utoipa::path(
    post,
    path = "/api/admin/registrations/{id}/proofs",
    tag = "Admin - Pagamentos",
    params(("id" = i64, Path, description = "ID da inscrição")),
    request_body(content = ProofUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Comprovante anexado; inscrição pendente passa a confirmada", body = PaymentProof),
        (status = 400, description = "Formato ou tamanho inválido"),
        (status = 404, description = "Inscrição não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn upload_proof(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(registration_id): Path<i64>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let upload = read_upload(multipart).await?;
    let proof = app_state
        .payment_service
        .upload(registration_id, upload, Some(user.id))
        .await?;
    Ok((StatusCode::CREATED, Json(proof)))
}

#[utoipa::path(
    get,
    path = "/api/admin/registrations/{id}/proofs",
    tag = "Admin - Pagamentos",
    params(("id" = i64, Path, description = "ID da inscrição")),
    responses((status = 200, description = "Comprovantes, mais recentes primeiro", body = Vec<PaymentProof>)),
    security(("api_jwt" = []))
)]
pub async fn list_proofs(
    State(app_state): State<AppState>,
    Path(registration_id): Path<i64>,
) -> Result<Json<Vec<PaymentProof>>, AppError> {
    Ok(Json(app_state.payment_service.list(registration_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/admin/proofs/{proof_id}",
    tag = "Admin - Pagamentos",
    params(("proof_id" = Uuid, Path)),
    responses(
        (status = 200, description = "Arquivo do comprovante"),
        (status = 404, description = "Comprovante não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn download_proof(
    State(app_state): State<AppState>,
    Path(proof_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let (proof, bytes) = app_state.payment_service.download(proof_id).await?;

    let headers = [
        (header::CONTENT_TYPE, proof.mime_type.clone()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", proof.storage_path),
        ),
    ];
    Ok((headers, bytes).into_response())
}

#[utoipa::path(
    delete,
    path = "/api/admin/proofs/{proof_id}",
    tag = "Admin - Pagamentos",
    params(("proof_id" = Uuid, Path)),
    responses((status = 204, description = "Comprovante excluído; o status da inscrição não muda")),
    security(("api_jwt" = []))
)]
pub async fn delete_proof(
    State(app_state): State<AppState>,
    Path(proof_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    app_state.payment_service.delete(proof_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
