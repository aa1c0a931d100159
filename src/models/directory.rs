// src/models/directory.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

// Município (código TOM). Tabela de referência, somente leitura para a aplicação.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Municipality {
    #[schema(example = 350010)]
    pub code: i32,
    #[schema(example = "Palmas")]
    pub name: String,
    #[schema(example = "TO")]
    pub state: String,
    pub diocese_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Diocese {
    pub id: i64,
    #[schema(example = "Arquidiocese de Palmas")]
    pub name: String,
    #[schema(example = "Dom Pedro Brito Guimarães")]
    pub bishop: Option<String>,
    #[schema(example = "TO")]
    pub state: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiocesePayload {
    #[validate(length(min = 1, message = "Nome da diocese é obrigatório."))]
    pub name: String,

    pub bishop: Option<String>,

    #[validate(length(equal = 2, message = "UF deve ter 2 letras."))]
    pub state: String,
}

impl DiocesePayload {
    /// Remove espaços e normaliza a UF para maiúsculas.
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            bishop: self
                .bishop
                .map(|b| b.trim().to_string())
                .filter(|b| !b.is_empty()),
            state: self.state.trim().to_uppercase(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MunicipalitySearch {
    #[serde(default)]
    pub q: String,
}
