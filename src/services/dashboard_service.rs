// src/services/dashboard_service.rs

use sqlx::PgPool;

use crate::{common::error::AppError, db::DashboardRepository, models::dashboard::DashboardSummary};

#[derive(Clone)]
pub struct DashboardService {
    pool: PgPool,
    repo: DashboardRepository,
}

impl DashboardService {
    pub fn new(pool: PgPool, repo: DashboardRepository) -> Self {
        Self { pool, repo }
    }

    pub async fn summary(&self) -> Result<DashboardSummary, AppError> {
        self.repo.get_summary(&self.pool).await
    }
}
