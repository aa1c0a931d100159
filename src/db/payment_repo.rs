// src/db/payment_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{payment::PaymentProof, registration::RegistrationStatus},
    services::payment_service::{status_after_first_proof, NewProof, ProofStore},
};

const PROOF_COLUMNS: &str =
    "id, registration_id, storage_path, public_url, mime_type, uploaded_by, created_at";

#[derive(Clone)]
pub struct PaymentRepository {
    pool: PgPool,
}

impl PaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProofStore for PaymentRepository {
    async fn registration_status(&self, registration_id: i64) -> Result<Option<RegistrationStatus>, AppError> {
        let status = sqlx::query_scalar::<_, RegistrationStatus>(
            "SELECT status FROM registrations WHERE id = $1",
        )
        .bind(registration_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(status)
    }

    // Grava o comprovante e aplica a transição de status na mesma transação
    async fn record_proof(&self, proof: &NewProof) -> Result<PaymentProof, AppError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_scalar::<_, RegistrationStatus>(
            "SELECT status FROM registrations WHERE id = $1 FOR UPDATE",
        )
        .bind(proof.registration_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::ResourceNotFound("Inscrição".into()))?;

        let sql = format!(
            r#"
            INSERT INTO payment_proofs (registration_id, storage_path, public_url, mime_type, uploaded_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            PROOF_COLUMNS
        );
        let stored = sqlx::query_as::<_, PaymentProof>(&sql)
            .bind(proof.registration_id)
            .bind(&proof.storage_path)
            .bind(&proof.public_url)
            .bind(&proof.mime_type)
            .bind(proof.uploaded_by)
            .fetch_one(&mut *tx)
            .await?;

        let next = status_after_first_proof(current);
        if next != current {
            sqlx::query("UPDATE registrations SET status = $2 WHERE id = $1")
                .bind(proof.registration_id)
                .bind(next)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(stored)
    }

    async fn list_proofs(&self, registration_id: i64) -> Result<Vec<PaymentProof>, AppError> {
        let sql = format!(
            "SELECT {} FROM payment_proofs WHERE registration_id = $1 ORDER BY created_at DESC",
            PROOF_COLUMNS
        );
        let rows = sqlx::query_as::<_, PaymentProof>(&sql)
            .bind(registration_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn find_proof(&self, id: Uuid) -> Result<Option<PaymentProof>, AppError> {
        let sql = format!("SELECT {} FROM payment_proofs WHERE id = $1", PROOF_COLUMNS);
        let row = sqlx::query_as::<_, PaymentProof>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn delete_proof(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM payment_proofs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
