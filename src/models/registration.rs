// src/models/registration.rs

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::common::error::AppError;

/// Versão atual do formato de `joint_data` gravado no JSONB.
pub const JOINT_DATA_VERSION: u16 = 1;

static NON_DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\D").unwrap());

// =============================================================================
//  ENUMS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Spouse {
    Husband,
    Wife,
}

impl Spouse {
    pub fn label(&self) -> &'static str {
        match self {
            Spouse::Husband => "esposo",
            Spouse::Wife => "esposa",
        }
    }
}

// Mapeia o CREATE TYPE registration_status do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "registration_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Pending,
    Confirmed,
    Canceled,
}

impl RegistrationStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RegistrationStatus::Pending => "Pendente",
            RegistrationStatus::Confirmed => "Confirmada",
            RegistrationStatus::Canceled => "Cancelada",
        }
    }
}

// =============================================================================
//  NORMALIZAÇÃO E VALIDADORES
// =============================================================================

/// Remove tudo que não for dígito (máscaras de CPF e telefone).
pub fn digits_only(value: &str) -> String {
    NON_DIGITS.replace_all(value, "").into_owned()
}

/// CPF válido para o sistema: exatamente 11 dígitos depois de remover a máscara.
pub fn is_valid_cpf(value: &str) -> bool {
    digits_only(value).len() == 11
}

/// Aceita `DD/MM/AAAA` (máscara do formulário) ou `AAAA-MM-DD`.
pub fn parse_birth_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y-%m-%d"))
        .ok()
}

fn validate_cpf(value: &str) -> Result<(), ValidationError> {
    if is_valid_cpf(value) {
        return Ok(());
    }
    let mut err = ValidationError::new("cpf");
    err.message = Some("CPF inválido.".into());
    Err(err)
}

fn validate_phone(value: &str) -> Result<(), ValidationError> {
    let len = digits_only(value).len();
    if (10..=11).contains(&len) {
        return Ok(());
    }
    let mut err = ValidationError::new("phone");
    err.message = Some("Telefone inválido.".into());
    Err(err)
}

fn validate_birth_date(value: &str) -> Result<(), ValidationError> {
    if parse_birth_date(value).is_some() {
        return Ok(());
    }
    let mut err = ValidationError::new("birth_date");
    err.message = Some("Data obrigatória.".into());
    Err(err)
}

// =============================================================================
//  ENTRADA DO FORMULÁRIO (WIZARD)
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonInput {
    #[validate(length(min = 3, message = "Nome obrigatório."))]
    #[schema(example = "João Silva")]
    pub name: String,

    #[validate(custom(function = "validate_cpf"))]
    #[schema(example = "111.222.333-44")]
    pub cpf: String,

    #[validate(custom(function = "validate_birth_date"))]
    #[schema(example = "01/01/1990")]
    pub birth_date: String,

    #[validate(email(message = "E-mail inválido."))]
    #[schema(example = "joao@x.com")]
    pub email: String,

    #[validate(custom(function = "validate_phone"))]
    #[schema(example = "(11) 99999-0000")]
    pub phone: String,
}

impl PersonInput {
    /// Converte para o formato gravado (dígitos, data ISO, e-mail minúsculo).
    pub fn to_new_person(&self) -> Result<NewPerson, AppError> {
        let birth_date = parse_birth_date(&self.birth_date).ok_or_else(|| {
            AppError::BusinessRule(format!("Data de nascimento inválida: {}", self.birth_date))
        })?;
        Ok(NewPerson {
            cpf: digits_only(&self.cpf),
            name: self.name.trim().to_string(),
            birth_date,
            email: self.email.trim().to_lowercase(),
            phone: digits_only(&self.phone),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WeddingData {
    #[schema(value_type = Option<String>, format = Date)]
    pub date: Option<NaiveDate>,
    pub church: Option<String>,
}

// Dados conjuntos do casal: registro versionado, gravado como JSONB.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct JointData {
    #[serde(default = "current_joint_data_version")]
    pub version: u16,

    #[validate(length(min = 3, message = "Paróquia obrigatória."))]
    #[schema(example = "Paróquia São José")]
    pub parish: String,

    #[validate(length(min = 3, message = "Nome do pároco obrigatório."))]
    #[schema(example = "Pe. Antônio")]
    pub priest: String,

    #[validate(length(min = 10, message = "Endereço obrigatório."))]
    #[schema(example = "Rua das Flores, 123")]
    pub address: String,

    pub neighborhood: Option<String>,
    pub new_union: bool,
    pub pasfam_member: bool,

    #[schema(example = json!(["Batismo", "Liturgia"]))]
    pub pastoral_groups: Vec<String>,

    pub needs_lodging: bool,
    pub dietary_restrictions: Option<String>,
    pub notes: Option<String>,
    pub wedding: Option<WeddingData>,
}

fn current_joint_data_version() -> u16 {
    JOINT_DATA_VERSION
}

impl Default for JointData {
    fn default() -> Self {
        Self {
            version: JOINT_DATA_VERSION,
            parish: String::new(),
            priest: String::new(),
            address: String::new(),
            neighborhood: None,
            new_union: false,
            pasfam_member: false,
            pastoral_groups: Vec::new(),
            needs_lodging: false,
            dietary_restrictions: None,
            notes: None,
            wedding: None,
        }
    }
}

impl JointData {
    /// Campos de texto opcionais vazios viram `None`; a versão é sempre a atual.
    pub fn normalized(mut self) -> Self {
        fn blank_to_none(value: Option<String>) -> Option<String> {
            value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
        }
        self.version = JOINT_DATA_VERSION;
        self.parish = self.parish.trim().to_string();
        self.priest = self.priest.trim().to_string();
        self.address = self.address.trim().to_string();
        self.neighborhood = blank_to_none(self.neighborhood);
        self.dietary_restrictions = blank_to_none(self.dietary_restrictions);
        self.notes = blank_to_none(self.notes);
        self
    }
}

/// Tudo o que o wizard coleta antes de enviar a inscrição.
/// Campos ausentes no JSON ficam vazios e são barrados pela validação da etapa.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationDraft {
    #[validate(range(min = 1, message = "Selecione um evento."))]
    pub event_id: i64,

    #[validate(nested)]
    pub husband: PersonInput,

    #[validate(nested)]
    pub wife: PersonInput,

    #[validate(range(min = 1, message = "Município obrigatório."))]
    #[schema(example = 350010)]
    pub municipality_code: i32,

    #[validate(nested)]
    pub joint_data: JointData,
}

// =============================================================================
//  PERSISTÊNCIA
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPerson {
    pub cpf: String,
    pub name: String,
    pub birth_date: NaiveDate,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub event_id: i64,
    pub husband: NewPerson,
    pub wife: NewPerson,
    pub municipality_code: i32,
    pub user_id: Option<Uuid>,
    pub joint_data: JointData,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: i64,
    #[schema(example = "11122233344")]
    pub cpf: String,
    pub name: String,
    #[schema(value_type = String, format = Date)]
    pub birth_date: NaiveDate,
    pub email: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub id: i64,
    pub event_id: i64,
    pub husband_id: i64,
    pub wife_id: i64,
    pub diocese_id: Option<i64>,
    pub municipality_code: Option<i32>,
    pub user_id: Option<Uuid>,
    pub status: RegistrationStatus,
    #[schema(value_type = JointData)]
    pub joint_data: Json<JointData>,
    pub created_at: DateTime<Utc>,
}

/// Inscrição com evento, casal, diocese e município já resolvidos.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationDetail {
    #[serde(flatten)]
    pub registration: Registration,
    pub event_name: String,
    #[schema(value_type = String, format = Date)]
    pub event_start_date: NaiveDate,
    pub husband: Person,
    pub wife: Person,
    pub diocese_name: Option<String>,
    pub municipality_name: Option<String>,
    pub municipality_state: Option<String>,
}

// =============================================================================
//  PAYLOADS / RESPOSTAS
// =============================================================================

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRequest {
    pub event_id: i64,
    #[schema(example = "111.222.333-44")]
    pub husband_cpf: String,
    #[schema(example = "555.666.777-88")]
    pub wife_cpf: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Availability {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Availability {
    pub fn available() -> Self {
        Self { available: true, message: None }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self { available: false, message: Some(message.into()) }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegistrationCreated {
    pub id: i64,
    #[schema(example = "Inscrição realizada com sucesso!")]
    pub message: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StatusUpdatePayload {
    pub status: RegistrationStatus,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PersonUpdate {
    #[validate(length(min = 3, message = "Nome obrigatório."))]
    pub name: String,
    #[validate(custom(function = "validate_birth_date"))]
    pub birth_date: String,
    #[validate(email(message = "E-mail inválido."))]
    pub email: String,
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
}

// Edição completa feita pelo administrador
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationUpdatePayload {
    #[validate(range(min = 1, message = "Selecione um evento."))]
    pub event_id: i64,

    pub municipality_code: Option<i32>,

    #[validate(nested)]
    pub husband: PersonUpdate,

    #[validate(nested)]
    pub wife: PersonUpdate,

    #[validate(nested)]
    pub joint_data: JointData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationFilter {
    pub event_id: Option<i64>,
}
