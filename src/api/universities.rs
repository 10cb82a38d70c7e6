// src/api/universities.rs

//! University resource service.

use async_trait::async_trait;

use crate::api::{ApiClient, UniversityApi, require_id};
use crate::error::ApiError;
use crate::models::{
    AddSpecialtyRequest, PaginatedResponse, University, UniversityDraft, UniversityListParams,
};
use crate::utils::non_blank;

const RESOURCE: &str = "universities";

/// HTTP-backed university operations under `/universities`.
#[derive(Debug, Clone)]
pub struct UniversityService {
    client: ApiClient,
}

impl UniversityService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl UniversityApi for UniversityService {
    async fn list(
        &self,
        params: &UniversityListParams,
    ) -> Result<PaginatedResponse<University>, ApiError> {
        let page: PaginatedResponse<University> =
            self.client.get_with(&[RESOURCE, ""], params).await?;
        if !page.is_consistent() {
            log::warn!(
                "Inconsistent page from backend: {} items, total {}, page_size {}, total_pages {}",
                page.items.len(),
                page.total,
                page.page_size,
                page.total_pages
            );
        }
        Ok(page)
    }

    async fn get(&self, id: &str) -> Result<University, ApiError> {
        let id = require_id("university", id)?;
        self.client.get(&[RESOURCE, id]).await
    }

    async fn search(&self, query: &str) -> Result<Vec<University>, ApiError> {
        let Some(query) = non_blank(query) else {
            log::debug!("Blank university search, returning no results");
            return Ok(Vec::new());
        };
        self.client
            .get_with(&[RESOURCE, "search"], &[("query", query)])
            .await
    }

    async fn create(&self, draft: &UniversityDraft) -> Result<University, ApiError> {
        self.client.post(&[RESOURCE, ""], draft).await
    }

    async fn update(&self, id: &str, draft: &UniversityDraft) -> Result<University, ApiError> {
        let id = require_id("university", id)?;
        self.client.put(&[RESOURCE, id], draft).await
    }

    async fn delete(&self, id: &str) -> Result<(), ApiError> {
        let id = require_id("university", id)?;
        self.client.delete(&[RESOURCE, id]).await
    }

    async fn add_specialty(
        &self,
        id: &str,
        request: &AddSpecialtyRequest,
    ) -> Result<University, ApiError> {
        let id = require_id("university", id)?;
        require_id("specialty", &request.specialty_id)?;
        self.client
            .post(&[RESOURCE, id, "specialties"], request)
            .await
    }

    async fn remove_specialty(
        &self,
        id: &str,
        specialty_id: &str,
    ) -> Result<University, ApiError> {
        let id = require_id("university", id)?;
        let specialty_id = require_id("specialty", specialty_id)?;
        self.client
            .delete_json(&[RESOURCE, id, "specialties", specialty_id])
            .await
    }
}
