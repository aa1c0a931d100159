// src/db/dashboard_repo.rs

use sqlx::{Acquire, Postgres};

use crate::{
    common::error::AppError,
    models::{
        dashboard::{DashboardSummary, RecentEventEntry},
        event::EventStatus,
    },
};

#[derive(Clone, Default)]
pub struct DashboardRepository;

impl DashboardRepository {
    pub fn new() -> Self {
        Self
    }

    // Contadores e últimos eventos, lidos do mesmo snapshot (REPEATABLE READ)
    pub async fn get_summary<'e, A>(&self, conn: A) -> Result<DashboardSummary, AppError>
    where
        A: Acquire<'e, Database = Postgres>,
    {
        let mut tx = conn.begin().await?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let dioceses = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM dioceses")
            .fetch_one(&mut *tx)
            .await?;

        let events = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM events")
            .fetch_one(&mut *tx)
            .await?;

        let registrations = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM registrations")
            .fetch_one(&mut *tx)
            .await?;

        let open_events =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM events WHERE status = $1")
                .bind(EventStatus::Open)
                .fetch_one(&mut *tx)
                .await?;

        let recent_events = sqlx::query_as::<_, RecentEventEntry>(
            r#"
            SELECT
                e.id, e.name, e.start_date, e.status, e.capacity,
                (SELECT COUNT(*) FROM registrations r WHERE r.event_id = e.id) AS registrations
            FROM events e
            ORDER BY e.start_date DESC, e.id DESC
            LIMIT 5
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(DashboardSummary {
            dioceses,
            events,
            registrations,
            open_events,
            recent_events,
        })
    }
}

#[cfg(test)]
mod tests {
    use sqlx::PgPool;

    use super::*;

    async fn seed_event(pool: &PgPool, name: &str, start: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(
            "INSERT INTO events (name, start_date, end_date, municipality_code, capacity) \
             VALUES ($1, $2, $2, 9999, 50) RETURNING id",
        )
        .bind(name)
        .bind(start.parse::<chrono::NaiveDate>().unwrap())
        .fetch_one(pool)
        .await
        .unwrap()
    }

    #[sqlx::test]
    #[ignore = "requer PostgreSQL (DATABASE_URL)"]
    async fn recent_events_follow_start_date(pool: PgPool) {
        sqlx::query("INSERT INTO municipalities (code, name, state) VALUES (9999, 'Palmas', 'TO')")
            .execute(&pool)
            .await
            .unwrap();
        // Criados fora da ordem das datas
        seed_event(&pool, "Março", "2030-03-01").await;
        seed_event(&pool, "Janeiro", "2030-01-01").await;
        seed_event(&pool, "Fevereiro", "2030-02-01").await;

        let summary = DashboardRepository::new().get_summary(&pool).await.unwrap();

        let names: Vec<_> = summary.recent_events.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Março", "Fevereiro", "Janeiro"]);
        assert_eq!(summary.events, 3);
        assert_eq!(summary.open_events, 3);
    }
}
