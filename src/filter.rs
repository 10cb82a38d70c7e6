// src/filter.rs

//! Client-side filtering of a loaded university list.
//!
//! Filtering keeps the input order and never fails; an empty result is a
//! normal outcome. [`MemoizedFilter`] avoids rescanning when neither the
//! list nor the selection changed.

use std::sync::Arc;

use crate::models::University;

/// Country/specialty selection held by the consumer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FilterSelection {
    /// Exact, case-sensitive country match
    pub country: Option<String>,
    /// Membership in the university's specialty display names
    pub specialty: Option<String>,
}

impl FilterSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn specialty(mut self, specialty: impl Into<String>) -> Self {
        self.specialty = Some(specialty.into());
        self
    }

    pub fn clear_country(&mut self) {
        self.country = None;
    }

    pub fn clear_specialty(&mut self) {
        self.specialty = None;
    }

    /// No active filter.
    pub fn is_empty(&self) -> bool {
        self.country.is_none() && self.specialty.is_none()
    }

    /// Whether a university passes both predicates.
    pub fn matches(&self, university: &University) -> bool {
        let country_ok = self
            .country
            .as_deref()
            .is_none_or(|c| university.country == c);
        let specialty_ok = self
            .specialty
            .as_deref()
            .is_none_or(|s| university.offers(s));
        country_ok && specialty_ok
    }
}

/// Order-preserving subsequence of `universities` that pass `selection`.
pub fn filter_universities(
    universities: &[University],
    selection: &FilterSelection,
) -> Vec<University> {
    universities
        .iter()
        .filter(|u| selection.matches(u))
        .cloned()
        .collect()
}

/// Filter that recomputes only when its inputs change.
///
/// `L` is whatever the query cache stores for a list: a
/// `PaginatedResponse<University>` page or a plain `Vec<University>`. The
/// list is compared by `Arc` identity, the selection by value. The cache
/// returns the same `Arc` for a key until the data is refetched, so feeding
/// cached reads straight in costs no scan while nothing changed.
#[derive(Debug)]
pub struct MemoizedFilter<L = Vec<University>> {
    last: Option<Memo<L>>,
    recomputes: usize,
}

#[derive(Debug)]
struct Memo<L> {
    input: Arc<L>,
    selection: FilterSelection,
    output: Arc<Vec<University>>,
}

impl<L> Default for MemoizedFilter<L> {
    fn default() -> Self {
        Self {
            last: None,
            recomputes: 0,
        }
    }
}

impl<L: AsRef<[University]>> MemoizedFilter<L> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filtered view of `universities` for `selection`.
    pub fn apply(
        &mut self,
        universities: &Arc<L>,
        selection: &FilterSelection,
    ) -> Arc<Vec<University>> {
        if let Some(memo) = &self.last {
            if Arc::ptr_eq(&memo.input, universities) && &memo.selection == selection {
                return Arc::clone(&memo.output);
            }
        }

        self.recomputes += 1;
        let output = Arc::new(filter_universities((**universities).as_ref(), selection));
        self.last = Some(Memo {
            input: Arc::clone(universities),
            selection: selection.clone(),
            output: Arc::clone(&output),
        });
        output
    }

    /// How many times the list has actually been scanned.
    pub fn recompute_count(&self) -> usize {
        self.recomputes
    }
}
