// src/models/pagination.rs

//! Paged responses and list query parameters.

use serde::{Deserialize, Serialize};

/// One page of a server-side list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

impl<T> PaginatedResponse<T> {
    /// Transform every item while keeping the paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResponse<U> {
        PaginatedResponse {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
            total_pages: self.total_pages,
        }
    }

    /// Whether a page after this one exists.
    pub fn has_next_page(&self) -> bool {
        self.page < self.total_pages
    }

    /// Check `items <= page_size` and `total_pages == ceil(total / page_size)`.
    pub fn is_consistent(&self) -> bool {
        self.items.len() as u64 <= u64::from(self.page_size)
            && u64::from(self.total_pages) == page_count(self.total, self.page_size)
    }
}

impl<T> AsRef<[T]> for PaginatedResponse<T> {
    fn as_ref(&self) -> &[T] {
        &self.items
    }
}

/// Number of pages needed for `total` items at `page_size` per page.
pub fn page_count(total: u64, page_size: u32) -> u64 {
    match page_size {
        0 => 0,
        size => total.div_ceil(u64::from(size)),
    }
}

/// Sort field accepted by the university list endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    Name,
    Ranking,
    TuitionFee,
    AcceptanceRate,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Server-side filter for listing universities.
///
/// Every field is optional; unset fields are not sent, so the backend
/// applies its own defaults (page 1, 20 per page, sorted by name ascending).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UniversityListParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<SortBy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
}

impl UniversityListParams {
    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn specialty(mut self, specialty: impl Into<String>) -> Self {
        self.specialty = Some(specialty.into());
        self
    }

    pub fn min_score(mut self, min_score: f64) -> Self {
        self.min_score = Some(min_score);
        self
    }

    pub fn sort(mut self, by: SortBy, order: SortOrder) -> Self {
        self.sort_by = Some(by);
        self.sort_order = Some(order);
        self
    }
}

/// Offset/limit window for listing specialties.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialtyListParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}
