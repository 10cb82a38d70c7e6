// src/api/specialties.rs

//! Specialty resource service.

use async_trait::async_trait;

use crate::api::{ApiClient, SpecialtyApi, require_id};
use crate::error::ApiError;
use crate::models::{Specialty, SpecialtyDraft, SpecialtyListParams};
use crate::utils::non_blank;

const RESOURCE: &str = "specialties";

/// HTTP-backed specialty operations under `/specialties`.
#[derive(Debug, Clone)]
pub struct SpecialtyService {
    client: ApiClient,
}

impl SpecialtyService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SpecialtyApi for SpecialtyService {
    async fn list(&self, params: &SpecialtyListParams) -> Result<Vec<Specialty>, ApiError> {
        self.client.get_with(&[RESOURCE, ""], params).await
    }

    async fn get(&self, id: &str) -> Result<Specialty, ApiError> {
        let id = require_id("specialty", id)?;
        self.client.get(&[RESOURCE, id]).await
    }

    async fn search(&self, query: &str) -> Result<Vec<Specialty>, ApiError> {
        let Some(query) = non_blank(query) else {
            log::debug!("Blank specialty search, returning no results");
            return Ok(Vec::new());
        };
        self.client
            .get_with(&[RESOURCE, "search"], &[("query", query)])
            .await
    }

    async fn create(&self, draft: &SpecialtyDraft) -> Result<Specialty, ApiError> {
        self.client.post(&[RESOURCE, ""], draft).await
    }

    async fn update(&self, id: &str, draft: &SpecialtyDraft) -> Result<Specialty, ApiError> {
        let id = require_id("specialty", id)?;
        self.client.put(&[RESOURCE, id], draft).await
    }

    async fn delete(&self, id: &str) -> Result<(), ApiError> {
        let id = require_id("specialty", id)?;
        self.client.delete(&[RESOURCE, id]).await
    }
}
