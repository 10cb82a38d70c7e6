// src/models/university.rs

//! University and per-specialty requirement records.

use serde::{Deserialize, Deserializer, Serialize};

/// A university as served by the catalog backend.
///
/// The backend stores documents keyed by `_id`; both spellings are accepted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct University {
    #[serde(alias = "_id")]
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub country: String,

    #[serde(default)]
    pub city: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Official website URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,

    /// Logo image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,

    /// World ranking, 1 is best
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ranking: Option<u32>,

    /// Annual tuition in USD
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tuition_fee_usd: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_count: Option<u64>,

    /// Acceptance rate exactly as reported by the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acceptance_rate: Option<f64>,

    /// Specialty identifiers
    #[serde(default, deserialize_with = "null_as_default")]
    pub specialties: Vec<String>,

    /// Specialty display names
    #[serde(default, deserialize_with = "null_as_default")]
    pub specialty_names: Vec<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub requirements: Vec<Requirement>,
}

impl University {
    /// Description text, empty when the backend has none.
    pub fn description_text(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    /// Whether the university offers a specialty with this display name.
    pub fn offers(&self, specialty_name: &str) -> bool {
        self.specialty_names.iter().any(|n| n == specialty_name)
    }

    /// Requirement entry for the given specialty id, if any.
    pub fn requirement_for(&self, specialty_id: &str) -> Option<&Requirement> {
        self.requirements
            .iter()
            .find(|r| r.specialty_id == specialty_id)
    }

    /// Pairs of (specialty id, display name) in the order supplied.
    ///
    /// Extra entries on either side are dropped rather than guessed.
    pub fn specialty_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.specialties
            .iter()
            .zip(&self.specialty_names)
            .map(|(id, name)| (id.as_str(), name.as_str()))
    }
}

/// Admission requirement for one specialty at one university.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Requirement {
    pub specialty_id: String,

    pub specialty_name: String,

    /// Minimum SAT-or-equivalent score
    pub minimum_score: f64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub exams: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_requirements: Option<String>,
}

/// Partial university used as a create/update body.
///
/// Unset fields are left out of the JSON entirely.
#[derive(Debug, Clone, Serialize, Default, PartialEq)]
pub struct UniversityDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ranking: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tuition_fee_usd: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acceptance_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialties: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialty_names: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements: Option<Vec<Requirement>>,
}

/// Body for attaching a specialty (with its requirement) to a university.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AddSpecialtyRequest {
    pub specialty_id: String,
    pub specialty_name: String,
    pub minimum_score: f64,
    #[serde(default)]
    pub exams: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_requirements: Option<String>,
}

/// Treat an explicit JSON `null` like a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
