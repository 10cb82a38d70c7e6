// src/api/mod.rs

//! Backend access layer.
//!
//! - [`ApiClient`]: HTTP transport with error normalization
//! - [`UniversityService`], [`SpecialtyService`], [`AssistantService`]:
//!   typed pass-through operations per resource
//!
//! The services sit behind the [`UniversityApi`], [`SpecialtyApi`] and
//! [`AssistantApi`] traits so the query layer can hold any backend.

mod ai;
mod client;
mod specialties;
mod universities;

use async_trait::async_trait;

use crate::error::ApiError;
use crate::models::{
    AddSpecialtyRequest, AiHealth, ComparisonRequest, ComparisonResponse, PaginatedResponse,
    RecommendationRequest, RecommendationResponse, Specialty, SpecialtyDraft,
    SpecialtyListParams, University, UniversityDraft, UniversityListParams,
};
use crate::utils::non_blank;

pub use ai::AssistantService;
pub use client::ApiClient;
pub use specialties::SpecialtyService;
pub use universities::UniversityService;

/// University resource operations.
#[async_trait]
pub trait UniversityApi: Send + Sync {
    /// One page of universities matching the server-side filter.
    async fn list(
        &self,
        params: &UniversityListParams,
    ) -> Result<PaginatedResponse<University>, ApiError>;

    async fn get(&self, id: &str) -> Result<University, ApiError>;

    /// Free-text search over name, description and city. Never pages.
    async fn search(&self, query: &str) -> Result<Vec<University>, ApiError>;

    async fn create(&self, draft: &UniversityDraft) -> Result<University, ApiError>;

    async fn update(&self, id: &str, draft: &UniversityDraft) -> Result<University, ApiError>;

    async fn delete(&self, id: &str) -> Result<(), ApiError>;

    /// Attach a specialty and its requirement to a university.
    async fn add_specialty(
        &self,
        id: &str,
        request: &AddSpecialtyRequest,
    ) -> Result<University, ApiError>;

    /// Detach a specialty (and its requirement) from a university.
    async fn remove_specialty(&self, id: &str, specialty_id: &str)
    -> Result<University, ApiError>;
}

/// Specialty resource operations.
#[async_trait]
pub trait SpecialtyApi: Send + Sync {
    async fn list(&self, params: &SpecialtyListParams) -> Result<Vec<Specialty>, ApiError>;

    async fn get(&self, id: &str) -> Result<Specialty, ApiError>;

    async fn search(&self, query: &str) -> Result<Vec<Specialty>, ApiError>;

    async fn create(&self, draft: &SpecialtyDraft) -> Result<Specialty, ApiError>;

    async fn update(&self, id: &str, draft: &SpecialtyDraft) -> Result<Specialty, ApiError>;

    async fn delete(&self, id: &str) -> Result<(), ApiError>;
}

/// AI assistant operations.
#[async_trait]
pub trait AssistantApi: Send + Sync {
    async fn recommend(
        &self,
        request: &RecommendationRequest,
    ) -> Result<RecommendationResponse, ApiError>;

    async fn compare(&self, request: &ComparisonRequest) -> Result<ComparisonResponse, ApiError>;

    async fn health(&self) -> Result<AiHealth, ApiError>;
}

/// Reject blank identifiers before any request is built.
pub(crate) fn require_id<'a>(what: &str, id: &'a str) -> Result<&'a str, ApiError> {
    non_blank(id).ok_or_else(|| {
        let err = ApiError::request(format!("{what} id must not be empty"));
        log::error!("API error: {err}");
        err
    })
}
