// src/models/ai.rs

//! Request/response contracts for the AI assistant endpoints.
//!
//! The assistant is an opaque remote service; these types only describe
//! what goes over the wire.

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Conversation identifier the backend uses to thread context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A fresh `session_<unix millis>` identifier.
    pub fn generate() -> Self {
        Self(format!("session_{}", Utc::now().timestamp_millis()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ask the assistant for university recommendations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationRequest {
    pub session_id: SessionId,
    pub query: String,
    /// SAT-or-equivalent score
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_specialty: Option<String>,
}

impl RecommendationRequest {
    pub fn new(session_id: SessionId, query: impl Into<String>) -> Self {
        Self {
            session_id,
            query: query.into(),
            user_score: None,
            preferred_country: None,
            preferred_specialty: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationResponse {
    pub success: bool,
    #[serde(default)]
    pub recommendations: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    pub session_id: SessionId,
}

/// Ask the assistant to compare named universities.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComparisonRequest {
    pub session_id: SessionId,
    pub university_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison_criteria: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComparisonResponse {
    pub success: bool,
    #[serde(default)]
    pub comparison: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Assistant availability report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AiHealth {
    pub status: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub context7_enabled: bool,
    #[serde(default)]
    pub anthropic_configured: bool,
    #[serde(default)]
    pub model: Option<String>,
}

impl AiHealth {
    pub fn is_operational(&self) -> bool {
        self.status == "operational"
    }
}
