// src/models/specialty.rs

//! Specialty (field of study) records.

use serde::{Deserialize, Serialize};

/// A field of study, referenced by id from universities.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Specialty {
    #[serde(alias = "_id")]
    pub id: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Broad grouping (e.g., "Engineering", "Medicine")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Partial specialty used as a create/update body.
#[derive(Debug, Clone, Serialize, Default, PartialEq, Eq)]
pub struct SpecialtyDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}
