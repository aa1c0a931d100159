// src/models/payment.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Tipos aceitos para o comprovante de pagamento.
pub const ALLOWED_PROOF_MIME_TYPES: [&str; 4] =
    ["application/pdf", "image/jpeg", "image/jpg", "image/png"];

/// Tamanho máximo do comprovante (5 MiB).
pub const MAX_PROOF_SIZE: usize = 5 * 1024 * 1024;

// Metadados do comprovante; o arquivo em si fica no storage de objetos
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentProof {
    pub id: Uuid,
    pub registration_id: i64,
    #[schema(example = "inscricao_42_1760000000000_k3j9x2.pdf")]
    pub storage_path: String,
    pub public_url: String,
    #[schema(example = "application/pdf")]
    pub mime_type: String,
    pub uploaded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Arquivo recebido no upload, antes de qualquer gravação.
#[derive(Debug, Clone)]
pub struct ProofUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ProofUpload {
    /// Extensão gravada no storage. Vem do MIME já validado, nunca do nome enviado.
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "application/pdf" => "pdf",
            "image/png" => "png",
            _ => "jpg",
        }
    }
}
