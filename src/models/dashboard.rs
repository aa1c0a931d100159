// src/models/dashboard.rs

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::models::event::EventStatus;

// 1. Contadores (os cards do topo)
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub dioceses: i64,
    pub events: i64,
    pub registrations: i64,
    pub open_events: i64,
    pub recent_events: Vec<RecentEventEntry>,
}

// 2. Últimos eventos criados, com a contagem de inscrições (vagas são só informativas)
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecentEventEntry {
    pub id: i64,
    pub name: String,
    #[schema(value_type = String, format = Date)]
    pub start_date: NaiveDate,
    pub status: EventStatus,
    pub capacity: i32,
    pub registrations: i64,
}
