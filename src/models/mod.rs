// src/models/mod.rs

//! Domain models for the catalog client.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod ai;
mod config;
mod pagination;
mod specialty;
mod university;

// Re-export all public types
pub use ai::{
    AiHealth, ComparisonRequest, ComparisonResponse, RecommendationRequest,
    RecommendationResponse, SessionId,
};
pub use config::{ApiConfig, CacheConfig, Config, ENV_BASE_URL, ENV_TIMEOUT, LoggingConfig};
pub use pagination::{
    PaginatedResponse, SortBy, SortOrder, SpecialtyListParams, UniversityListParams, page_count,
};
pub use specialty::{Specialty, SpecialtyDraft};
pub use university::{AddSpecialtyRequest, Requirement, University, UniversityDraft};
