// src/mappers.rs

//! Normalization of backend records and derived filter option sets.
//!
//! Absent values stay absent: blank text collapses to `None`, numbers are
//! never coerced, so a reported `0` is still distinguishable from "not
//! provided". Missing collections are already `[]` once decoded.

use std::collections::BTreeSet;

use crate::models::{PaginatedResponse, Requirement, University};

/// Normalize a university record. Idempotent.
pub fn normalize(mut university: University) -> University {
    university.description = blank_to_none(university.description);
    university.website = blank_to_none(university.website);
    university.logo = blank_to_none(university.logo);
    university.requirements = university
        .requirements
        .into_iter()
        .map(normalize_requirement)
        .collect();
    university
}

fn normalize_requirement(mut requirement: Requirement) -> Requirement {
    requirement.additional_requirements = blank_to_none(requirement.additional_requirements);
    requirement
}

/// Normalize every item of a page.
pub fn normalize_page(page: PaginatedResponse<University>) -> PaginatedResponse<University> {
    page.map(normalize)
}

/// Sorted, distinct, non-empty countries.
pub fn extract_countries(universities: &[University]) -> Vec<String> {
    universities
        .iter()
        .map(|u| u.country.as_str())
        .filter(|c| !c.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Sorted, distinct, non-empty specialty display names across all records.
pub fn extract_specialty_names(universities: &[University]) -> Vec<String> {
    universities
        .iter()
        .flat_map(|u| u.specialty_names.iter())
        .map(String::as_str)
        .filter(|n| !n.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare(id: &str, country: &str, specialties: &[&str]) -> University {
        University {
            id: id.into(),
            name: format!("University {id}"),
            country: country.into(),
            city: String::new(),
            description: None,
            website: None,
            logo: None,
            ranking: None,
            tuition_fee_usd: None,
            student_count: None,
            acceptance_rate: None,
            specialties: Vec::new(),
            specialty_names: specialties.iter().map(|s| s.to_string()).collect(),
            requirements: Vec::new(),
        }
    }

    #[test]
    fn test_missing_optionals_stay_absent() {
        let raw: University =
            serde_json::from_str(r#"{"id":"1","name":"A","country":"UK","city":"York"}"#)
                .unwrap();
        let uni = normalize(raw);
        assert_eq!(uni.description, None);
        assert_eq!(uni.website, None);
        assert_eq!(uni.logo, None);
        assert_eq!(uni.ranking, None);
        assert_eq!(uni.tuition_fee_usd, None);
        assert_eq!(uni.student_count, None);
        assert_eq!(uni.acceptance_rate, None);
        assert!(uni.specialties.is_empty());
        assert!(uni.specialty_names.is_empty());
        assert!(uni.requirements.is_empty());
        assert_eq!(uni.description_text(), "");
    }

    #[test]
    fn test_blank_text_becomes_absent_but_zero_is_kept() {
        let mut uni = bare("1", "UK", &[]);
        uni.description = Some("   ".into());
        uni.website = Some(String::new());
        uni.tuition_fee_usd = Some(0.0);
        uni.student_count = Some(0);
        uni.requirements = vec![Requirement {
            specialty_id: "law".into(),
            specialty_name: "Law".into(),
            minimum_score: 0.0,
            exams: Vec::new(),
            additional_requirements: Some(String::new()),
        }];

        let uni = normalize(uni);
        assert_eq!(uni.description, None);
        assert_eq!(uni.website, None);
        assert_eq!(uni.tuition_fee_usd, Some(0.0));
        assert_eq!(uni.student_count, Some(0));
        assert_eq!(uni.requirements[0].additional_requirements, None);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let mut uni = bare("1", "France", &["Physics"]);
        uni.description = Some("".into());
        uni.logo = Some("https://cdn.example.com/logo.png".into());
        uni.ranking = Some(40);

        let once = normalize(uni);
        let twice = normalize(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_normalize_page_keeps_metadata() {
        let mut uni = bare("1", "Japan", &[]);
        uni.website = Some(" ".into());
        let page = PaginatedResponse {
            items: vec![uni],
            total: 1,
            page: 1,
            page_size: 20,
            total_pages: 1,
        };
        let page = normalize_page(page);
        assert_eq!(page.items[0].website, None);
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn test_countries_are_sorted_distinct_non_empty() {
        let unis = vec![
            bare("1", "USA", &[]),
            bare("2", "Canada", &[]),
            bare("3", "", &[]),
            bare("4", "USA", &[]),
            bare("5", "Australia", &[]),
        ];
        assert_eq!(extract_countries(&unis), vec!["Australia", "Canada", "USA"]);

        let mut reversed = unis.clone();
        reversed.reverse();
        assert_eq!(extract_countries(&reversed), extract_countries(&unis));
        assert!(extract_countries(&[]).is_empty());
    }

    #[test]
    fn test_specialty_names_are_flattened() {
        let unis = vec![
            bare("1", "USA", &["Medicine", "Computer Science"]),
            bare("2", "UK", &["Computer Science", ""]),
            bare("3", "UK", &[]),
        ];
        assert_eq!(
            extract_specialty_names(&unis),
            vec!["Computer Science", "Medicine"]
        );
    }

    #[test]
    fn test_extraction_is_case_sensitive_lexicographic() {
        let unis = vec![bare("1", "usa", &[]), bare("2", "USA", &[])];
        assert_eq!(extract_countries(&unis), vec!["USA", "usa"]);
    }
}
