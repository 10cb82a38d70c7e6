// src/api/ai.rs

//! AI assistant service.
//!
//! The assistant answers over the same backend; its reasoning is opaque to
//! this crate. A `success: false` body is a valid response, not an error.

use async_trait::async_trait;

use crate::api::{ApiClient, AssistantApi};
use crate::error::ApiError;
use crate::models::{
    AiHealth, ComparisonRequest, ComparisonResponse, RecommendationRequest,
    RecommendationResponse,
};

const RESOURCE: &str = "ai";

/// HTTP-backed assistant operations under `/ai`.
#[derive(Debug, Clone)]
pub struct AssistantService {
    client: ApiClient,
}

impl AssistantService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AssistantApi for AssistantService {
    async fn recommend(
        &self,
        request: &RecommendationRequest,
    ) -> Result<RecommendationResponse, ApiError> {
        let response: RecommendationResponse =
            self.client.post(&[RESOURCE, "recommend"], request).await?;
        if !response.success {
            log::warn!(
                "Recommendation for session {} failed: {}",
                response.session_id,
                response.error.as_deref().unwrap_or("unknown error")
            );
        }
        Ok(response)
    }

    async fn compare(&self, request: &ComparisonRequest) -> Result<ComparisonResponse, ApiError> {
        let response: ComparisonResponse =
            self.client.post(&[RESOURCE, "compare"], request).await?;
        if !response.success {
            log::warn!(
                "Comparison of {} universities failed: {}",
                request.university_names.len(),
                response.error.as_deref().unwrap_or("unknown error")
            );
        }
        Ok(response)
    }

    async fn health(&self) -> Result<AiHealth, ApiError> {
        self.client.get(&[RESOURCE, "health"]).await
    }
}
