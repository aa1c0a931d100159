use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::registration::Spouse;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Acesso restrito a administradores")]
    Forbidden,

    #[error("Recurso não encontrado: {0}")]
    ResourceNotFound(String),

    // Regra de negócio violada (datas, vagas, status...)
    #[error("{0}")]
    BusinessRule(String),

    // Resultado negativo da verificação de disponibilidade
    #[error("{0}")]
    CoupleUnavailable(String),

    #[error("Casal já inscrito neste evento")]
    CoupleAlreadyRegistered,

    #[error("Falha ao gravar dados do {0:?}")]
    PersonWriteFailed(Spouse),

    #[error("Registro em uso: {0}")]
    ResourceInUse(String),

    #[error("Arquivo inválido: {0}")]
    InvalidUpload(String),

    #[error("Erro de armazenamento: {0}")]
    StorageError(String),

    #[error("Falha no envio de e-mail: {0}")]
    EmailDeliveryFailed(String),

    #[error("Fonte não encontrada: {0}")]
    FontNotFound(String),

    #[error("Erro ao gerar PDF: {0}")]
    PdfError(String),

    #[error("Erro ao gerar planilha: {0}")]
    SpreadsheetError(#[from] rust_xlsxwriter::XlsxError),

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    /// Mensagem exibida ao usuário para erros de regra de negócio.
    pub fn user_message(&self) -> String {
        match self {
            AppError::CoupleUnavailable(msg) | AppError::BusinessRule(msg) => msg.clone(),
            AppError::CoupleAlreadyRegistered => {
                "Já existe uma inscrição para este casal neste evento.".to_string()
            }
            AppError::PersonWriteFailed(spouse) => match spouse {
                Spouse::Husband => "Erro ao cadastrar dados do esposo.".to_string(),
                Spouse::Wife => "Erro ao cadastrar dados da esposa.".to_string(),
            },
            AppError::ResourceNotFound(what) => format!("{} não encontrado(a).", what),
            AppError::ResourceInUse(what) => {
                format!("{} está em uso e não pode ser excluído(a).", what)
            }
            AppError::InvalidUpload(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": validation_details(&errors),
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::EmailAlreadyExists => {
                (StatusCode::CONFLICT, "Este e-mail já está em uso.".to_string())
            }
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "E-mail ou senha inválidos.".to_string())
            }
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "Token de autenticação inválido ou ausente.".to_string(),
            ),
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "Usuário não encontrado.".to_string()),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "Você não tem permissão para realizar esta ação.".to_string(),
            ),
            ref e @ AppError::ResourceNotFound(_) => (StatusCode::NOT_FOUND, e.user_message()),
            ref e @ (AppError::BusinessRule(_) | AppError::InvalidUpload(_)) => {
                (StatusCode::BAD_REQUEST, e.user_message())
            }
            ref e @ (AppError::CoupleUnavailable(_)
            | AppError::CoupleAlreadyRegistered
            | AppError::ResourceInUse(_)) => (StatusCode::CONFLICT, e.user_message()),
            ref e @ AppError::PersonWriteFailed(_) => {
                tracing::error!("Falha ao gravar pessoa: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.user_message())
            }
            ref e @ AppError::EmailDeliveryFailed(_) => {
                tracing::error!("Relay de e-mail: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "Não foi possível enviar o e-mail. Tente novamente.".to_string(),
                )
            }

            // Todos os outros erros (DatabaseError, InternalServerError...) viram 500.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Ocorreu um erro inesperado. Tente novamente.".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

/// Agrupa as mensagens de validação por campo (inclusive campos aninhados, ex: `husband.cpf`).
pub fn validation_details(
    errors: &validator::ValidationErrors,
) -> std::collections::BTreeMap<String, Vec<String>> {
    let mut details = std::collections::BTreeMap::new();
    collect_details("", errors, &mut details);
    details
}

fn collect_details(
    prefix: &str,
    errors: &validator::ValidationErrors,
    out: &mut std::collections::BTreeMap<String, Vec<String>>,
) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let key = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let messages = field_errors
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                out.insert(key, messages);
            }
            ValidationErrorsKind::Struct(nested) => collect_details(&key, nested, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_details(&format!("{}[{}]", key, index), nested, out);
                }
            }
        }
    }
}

/// Converte violações de chave estrangeira/única em erros de domínio.
pub fn map_constraint_error(e: sqlx::Error, what: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_foreign_key_violation() {
            return AppError::ResourceInUse(what.to_string());
        }
        if db_err.is_unique_violation() {
            return AppError::BusinessRule(format!("{} duplicado(a).", what));
        }
    }
    e.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn response_parts(error: AppError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn duplicate_couple_is_a_conflict_with_portuguese_message() {
        let (status, body) = response_parts(AppError::CoupleAlreadyRegistered).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "Já existe uma inscrição para este casal neste evento.");
    }

    #[tokio::test]
    async fn spouse_write_failures_name_the_spouse() {
        let (status, body) = response_parts(AppError::PersonWriteFailed(Spouse::Husband)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Erro ao cadastrar dados do esposo.");

        let (status, body) = response_parts(AppError::PersonWriteFailed(Spouse::Wife)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Erro ao cadastrar dados da esposa.");
    }

    #[tokio::test]
    async fn database_errors_do_not_leak_details() {
        let (status, body) = response_parts(AppError::DatabaseError(sqlx::Error::RowNotFound)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Ocorreu um erro inesperado. Tente novamente.");
    }
}
