// src/models/event.rs

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::common::error::AppError;

// Mapeia o CREATE TYPE event_status do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "event_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Open,
    InProgress,
    Concluded,
    Canceled,
}

impl EventStatus {
    pub fn label(&self) -> &'static str {
        match self {
            EventStatus::Open => "Aberto",
            EventStatus::InProgress => "Em Andamento",
            EventStatus::Concluded => "Concluído",
            EventStatus::Canceled => "Cancelado",
        }
    }
}

// Evento já com o nome do município (JOIN)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: i64,
    #[schema(example = "Encontro de Casais 2026")]
    pub name: String,
    #[schema(value_type = String, format = Date, example = "2026-11-20")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = Date, example = "2026-11-22")]
    pub end_date: NaiveDate,
    #[schema(value_type = Option<String>, example = "08:00:00")]
    pub start_time: Option<NaiveTime>,
    #[schema(value_type = Option<String>, example = "18:00:00")]
    pub end_time: Option<NaiveTime>,
    pub municipality_code: i32,
    pub municipality_name: Option<String>,
    pub municipality_state: Option<String>,
    // Vagas: apenas informativo, não é conferido na gravação das inscrições
    #[schema(example = 50)]
    pub capacity: i32,
    pub status: EventStatus,
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// "Palmas - TO", ou o código quando o município não foi encontrado.
    pub fn location_label(&self) -> String {
        match (&self.municipality_name, &self.municipality_state) {
            (Some(name), Some(state)) => format!("{} - {}", name, state),
            (Some(name), None) => name.clone(),
            _ => format!("Município {}", self.municipality_code),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    #[validate(length(min = 1, message = "O nome do evento é obrigatório."))]
    pub name: String,

    #[schema(value_type = String, format = Date, example = "2026-11-20")]
    pub start_date: NaiveDate,

    #[schema(value_type = String, format = Date, example = "2026-11-22")]
    pub end_date: NaiveDate,

    #[schema(value_type = Option<String>, example = "08:00:00")]
    pub start_time: Option<NaiveTime>,

    #[schema(value_type = Option<String>, example = "18:00:00")]
    pub end_time: Option<NaiveTime>,

    #[validate(range(min = 1, message = "O município é obrigatório."))]
    pub municipality_code: i32,

    #[validate(range(min = 1, message = "Número de vagas deve ser maior que zero."))]
    #[serde(default = "default_capacity")]
    pub capacity: i32,

    #[serde(default = "default_status")]
    pub status: EventStatus,
}

fn default_capacity() -> i32 {
    50
}

fn default_status() -> EventStatus {
    EventStatus::Open
}

impl EventPayload {
    /// Regras de calendário que dependem do dia corrente.
    pub fn validate_schedule(&self, today: NaiveDate) -> Result<(), AppError> {
        if self.start_date < today {
            return Err(AppError::BusinessRule(
                "A data de início não pode ser anterior a hoje.".to_string(),
            ));
        }
        if self.end_date < self.start_date {
            return Err(AppError::BusinessRule(
                "A data de término não pode ser anterior à data de início.".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claims::{assert_err, assert_ok};

    fn payload(start: &str, end: &str) -> EventPayload {
        EventPayload {
            name: "Encontro".into(),
            start_date: start.parse().unwrap(),
            end_date: end.parse().unwrap(),
            start_time: None,
            end_time: None,
            municipality_code: 350010,
            capacity: 50,
            status: EventStatus::Open,
        }
    }

    #[test]
    fn schedule_accepts_future_range() {
        let today = "2026-10-18".parse().unwrap();
        assert_ok!(payload("2026-11-20", "2026-11-22").validate_schedule(today));
    }

    #[test]
    fn schedule_accepts_single_day_event_today() {
        let today = "2026-10-18".parse().unwrap();
        assert_ok!(payload("2026-10-18", "2026-10-18").validate_schedule(today));
    }

    #[test]
    fn schedule_rejects_start_in_the_past() {
        let today = "2026-10-18".parse().unwrap();
        assert_err!(payload("2026-10-17", "2026-11-22").validate_schedule(today));
    }

    #[test]
    fn schedule_rejects_end_before_start() {
        let today = "2026-10-18".parse().unwrap();
        assert_err!(payload("2026-11-22", "2026-11-20").validate_schedule(today));
    }

    #[test]
    fn capacity_must_be_positive() {
        let mut p = payload("2026-11-20", "2026-11-22");
        p.capacity = 0;
        assert_err!(p.validate());
    }

    #[test]
    fn status_uses_snake_case_on_the_wire() {
        let json = serde_json::to_string(&EventStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }
}
