// src/db/directory_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::{map_constraint_error, AppError},
    models::directory::{Diocese, DiocesePayload, Municipality},
};

/// Municípios (somente leitura) e dioceses.
#[derive(Clone)]
pub struct DirectoryRepository {
    pool: PgPool,
}

impl DirectoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // =========================================================================
    //  MUNICÍPIOS
    // =========================================================================

    /// Busca por trecho do nome OU da UF, sem diferenciar maiúsculas.
    pub async fn search_municipalities(
        &self,
        term: &str,
        limit: i64,
    ) -> Result<Vec<Municipality>, AppError> {
        let pattern = format!("%{}%", term);
        let rows = sqlx::query_as::<_, Municipality>(
            r#"
            SELECT code, name, state, diocese_id
            FROM municipalities
            WHERE name ILIKE $1 OR state ILIKE $1
            ORDER BY name ASC
            LIMIT $2
            "#,
        )
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn find_municipality(&self, code: i32) -> Result<Option<Municipality>, AppError> {
        let row = sqlx::query_as::<_, Municipality>(
            "SELECT code, name, state, diocese_id FROM municipalities WHERE code = $1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Diocese vinculada ao município (pode ser nula).
    pub async fn diocese_for_municipality<'e, E>(
        &self,
        executor: E,
        code: i32,
    ) -> Result<Option<i64>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let diocese_id = sqlx::query_scalar::<_, Option<i64>>(
            "SELECT diocese_id FROM municipalities WHERE code = $1",
        )
        .bind(code)
        .fetch_optional(executor)
        .await?;
        Ok(diocese_id.flatten())
    }

    // =========================================================================
    //  DIOCESES
    // =========================================================================

    pub async fn list_dioceses(&self) -> Result<Vec<Diocese>, AppError> {
        let rows = sqlx::query_as::<_, Diocese>(
            "SELECT id, name, bishop, state, created_at FROM dioceses ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn create_diocese(&self, payload: &DiocesePayload) -> Result<Diocese, AppError> {
        sqlx::query_as::<_, Diocese>(
            r#"
            INSERT INTO dioceses (name, bishop, state)
            VALUES ($1, $2, $3)
            RETURNING id, name, bishop, state, created_at
            "#,
        )
        .bind(&payload.name)
        .bind(&payload.bishop)
        .bind(&payload.state)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_constraint_error(e, "Diocese"))
    }

    pub async fn update_diocese(
        &self,
        id: i64,
        payload: &DiocesePayload,
    ) -> Result<Diocese, AppError> {
        sqlx::query_as::<_, Diocese>(
            r#"
            UPDATE dioceses SET name = $2, bishop = $3, state = $4
            WHERE id = $1
            RETURNING id, name, bishop, state, created_at
            "#,
        )
        .bind(id)
        .bind(&payload.name)
        .bind(&payload.bishop)
        .bind(&payload.state)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_constraint_error(e, "Diocese"))?
        .ok_or_else(|| AppError::ResourceNotFound("Diocese".into()))
    }

    pub async fn delete_diocese(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM dioceses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_constraint_error(e, "Diocese"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound("Diocese".into()));
        }
        Ok(())
    }
}
