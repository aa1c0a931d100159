// src/db/event_repo.rs

use sqlx::PgPool;

use crate::{
    common::error::{map_constraint_error, AppError},
    models::event::{Event, EventPayload, EventStatus},
};

const EVENT_COLUMNS: &str = r#"
    e.id, e.name, e.start_date, e.end_date, e.start_time, e.end_time,
    e.municipality_code, m.name AS municipality_name, m.state AS municipality_state,
    e.capacity, e.status, e.created_at
"#;

#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Todos os eventos, mais recentes primeiro (tela administrativa).
    pub async fn list_all(&self) -> Result<Vec<Event>, AppError> {
        let sql = format!(
            "SELECT {} FROM events e LEFT JOIN municipalities m ON m.code = e.municipality_code \
             ORDER BY e.start_date DESC",
            EVENT_COLUMNS
        );
        let rows = sqlx::query_as::<_, Event>(&sql).fetch_all(&self.pool).await?;
        Ok(rows)
    }

    /// Eventos com inscrições abertas, na ordem em que acontecem.
    pub async fn list_open(&self) -> Result<Vec<Event>, AppError> {
        let sql = format!(
            "SELECT {} FROM events e LEFT JOIN municipalities m ON m.code = e.municipality_code \
             WHERE e.status = $1 ORDER BY e.start_date ASC",
            EVENT_COLUMNS
        );
        let rows = sqlx::query_as::<_, Event>(&sql)
            .bind(EventStatus::Open)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Event>, AppError> {
        let sql = format!(
            "SELECT {} FROM events e LEFT JOIN municipalities m ON m.code = e.municipality_code \
             WHERE e.id = $1",
            EVENT_COLUMNS
        );
        let row = sqlx::query_as::<_, Event>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn create(&self, payload: &EventPayload) -> Result<Event, AppError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO events (
                name, start_date, end_date, start_time, end_time,
                municipality_code, capacity, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(payload.name.trim())
        .bind(payload.start_date)
        .bind(payload.end_date)
        .bind(payload.start_time)
        .bind(payload.end_time)
        .bind(payload.municipality_code)
        .bind(payload.capacity)
        .bind(payload.status)
        .fetch_one(&self.pool)
        .await
        .map_err(map_municipality_error)?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Evento".into()))
    }

    pub async fn update(&self, id: i64, payload: &EventPayload) -> Result<Event, AppError> {
        let updated = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE events SET
                name = $2, start_date = $3, end_date = $4, start_time = $5, end_time = $6,
                municipality_code = $7, capacity = $8, status = $9
            WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(payload.name.trim())
        .bind(payload.start_date)
        .bind(payload.end_date)
        .bind(payload.start_time)
        .bind(payload.end_time)
        .bind(payload.municipality_code)
        .bind(payload.capacity)
        .bind(payload.status)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_municipality_error)?;

        if updated.is_none() {
            return Err(AppError::ResourceNotFound("Evento".into()));
        }
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Evento".into()))
    }

    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_constraint_error(e, "Evento"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound("Evento".into()));
        }
        Ok(())
    }
}

// Na escrita, a única FK do evento é o município
fn map_municipality_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_foreign_key_violation() {
            return AppError::ResourceNotFound("Município".into());
        }
    }
    e.into()
}
