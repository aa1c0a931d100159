// src/services/directory_service.rs

use crate::{
    common::error::AppError,
    db::DirectoryRepository,
    models::directory::Municipality,
};

pub const MIN_SEARCH_LEN: usize = 2;
pub const MAX_SEARCH_RESULTS: i64 = 50;

/// Termo de busca utilizável, ou `None` quando curto demais para consultar.
pub fn search_term(q: &str) -> Option<&str> {
    let term = q.trim();
    (term.chars().count() >= MIN_SEARCH_LEN).then_some(term)
}

#[derive(Clone)]
pub struct DirectoryService {
    repo: DirectoryRepository,
}

impl DirectoryService {
    pub fn new(repo: DirectoryRepository) -> Self {
        Self { repo }
    }

    pub async fn search_municipalities(&self, q: &str) -> Result<Vec<Municipality>, AppError> {
        match search_term(q) {
            Some(term) => self.repo.search_municipalities(term, MAX_SEARCH_RESULTS).await,
            None => Ok(Vec::new()),
        }
    }

    pub async fn get_municipality(&self, code: i32) -> Result<Municipality, AppError> {
        self.repo
            .find_municipality(code)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Município".into()))
    }

    /// Melhor esforço: município sem diocese (ou erro de consulta) resulta em `None`.
    pub async fn resolve_diocese(&self, municipality_code: i32) -> Option<i64> {
        match self
            .repo
            .diocese_for_municipality(self.repo.pool(), municipality_code)
            .await
        {
            Ok(diocese_id) => diocese_id,
            Err(e) => {
                tracing::warn!("Diocese do município {} não resolvida: {:?}", municipality_code, e);
                None
            }
        }
    }
}
