// src/query/hooks.rs

//! Cached catalog reads and cache-invalidating writes.
//!
//! [`CatalogQueries`] binds each service operation to its cache key and
//! options. Reads normalize university records before they are cached;
//! writes go through [`QueryCache::mutate`] and invalidate the affected key
//! hierarchy on success.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::api::{
    ApiClient, AssistantApi, AssistantService, SpecialtyApi, SpecialtyService, UniversityApi,
    UniversityService,
};
use crate::error::ApiError;
use crate::mappers::{normalize, normalize_page};
use crate::models::{
    AddSpecialtyRequest, AiHealth, ComparisonRequest, ComparisonResponse, Config,
    PaginatedResponse, RecommendationRequest, RecommendationResponse, Specialty, SpecialtyDraft,
    SpecialtyListParams, University, UniversityDraft, UniversityListParams,
};
use crate::query::cache::{FetchPolicy, QueryCache, QueryOptions, QueryResult};
use crate::query::keys;
use crate::utils::non_blank;

/// Specialties change rarely and are cached longer than universities.
pub const SPECIALTY_STALE_TIME: Duration = Duration::from_secs(10 * 60);

/// Query and mutation entry points for the catalog.
#[derive(Clone)]
pub struct CatalogQueries {
    cache: QueryCache,
    universities: Arc<dyn UniversityApi>,
    specialties: Arc<dyn SpecialtyApi>,
    assistant: Arc<dyn AssistantApi>,
    options: QueryOptions,
    specialty_options: QueryOptions,
}

impl fmt::Debug for CatalogQueries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogQueries")
            .field("cache", &self.cache)
            .field("options", &self.options)
            .field("specialty_options", &self.specialty_options)
            .finish_non_exhaustive()
    }
}

impl CatalogQueries {
    /// Bind the given backends to `cache`, using the cache's default options.
    pub fn new(
        cache: QueryCache,
        universities: Arc<dyn UniversityApi>,
        specialties: Arc<dyn SpecialtyApi>,
        assistant: Arc<dyn AssistantApi>,
    ) -> Self {
        let options = cache.defaults().clone();
        let specialty_options = options.clone().stale_time(SPECIALTY_STALE_TIME);
        Self {
            cache,
            universities,
            specialties,
            assistant,
            options,
            specialty_options,
        }
    }

    /// HTTP-backed queries built from configuration.
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        let client = ApiClient::new(&config.api)?;
        let cache = QueryCache::new(QueryOptions::from_config(&config.cache));
        log::info!("Catalog backend: {}", client.base_url());

        Ok(Self::new(
            cache,
            Arc::new(UniversityService::new(client.clone())),
            Arc::new(SpecialtyService::new(client.clone())),
            Arc::new(AssistantService::new(client)),
        )
        .with_specialty_stale_time(Duration::from_secs(
            config.cache.specialties_stale_time_secs,
        )))
    }

    pub fn with_specialty_stale_time(mut self, stale_time: Duration) -> Self {
        self.specialty_options.stale_time = stale_time;
        self
    }

    /// Same queries with a different fetch policy for every read.
    pub fn with_policy(&self, policy: FetchPolicy) -> Self {
        let mut queries = self.clone();
        queries.options.policy = policy;
        queries.specialty_options.policy = policy;
        queries
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    // ---- universities ----

    /// One normalized page of universities.
    pub async fn universities(
        &self,
        params: &UniversityListParams,
    ) -> Result<QueryResult<PaginatedResponse<University>>, ApiError> {
        let key = keys::universities::list(params);
        let api = Arc::clone(&self.universities);
        let params = params.clone();
        self.cache
            .fetch_query(key, &self.options, move || {
                let api = Arc::clone(&api);
                let params = params.clone();
                async move { api.list(&params).await.map(normalize_page) }
            })
            .await
    }

    /// A single university. `None` without a request when `id` is blank.
    pub async fn university(&self, id: &str) -> Result<Option<QueryResult<University>>, ApiError> {
        let Some(id) = non_blank(id) else {
            return Ok(None);
        };
        let api = Arc::clone(&self.universities);
        let id = id.to_string();
        self.cache
            .fetch_query(keys::universities::detail(&id), &self.options, move || {
                let api = Arc::clone(&api);
                let id = id.clone();
                async move { api.get(&id).await.map(normalize) }
            })
            .await
            .map(Some)
    }

    pub async fn search_universities(
        &self,
        query: &str,
    ) -> Result<QueryResult<Vec<University>>, ApiError> {
        let api = Arc::clone(&self.universities);
        let query = query.trim().to_string();
        self.cache
            .fetch_query(keys::universities::search(&query), &self.options, move || {
                let api = Arc::clone(&api);
                let query = query.clone();
                async move {
                    let found = api.search(&query).await?;
                    Ok::<_, ApiError>(found.into_iter().map(normalize).collect::<Vec<_>>())
                }
            })
            .await
    }

    pub async fn create_university(&self, draft: &UniversityDraft) -> Result<University, ApiError> {
        self.cache
            .mutate(
                async { self.universities.create(draft).await.map(normalize) },
                &[keys::universities::all()],
            )
            .await
    }

    pub async fn update_university(
        &self,
        id: &str,
        draft: &UniversityDraft,
    ) -> Result<University, ApiError> {
        self.cache
            .mutate(
                async { self.universities.update(id, draft).await.map(normalize) },
                &[keys::universities::all()],
            )
            .await
    }

    pub async fn delete_university(&self, id: &str) -> Result<(), ApiError> {
        self.cache
            .mutate(self.universities.delete(id), &[keys::universities::all()])
            .await?;
        self.cache.remove_queries(&keys::universities::detail(id.trim()));
        Ok(())
    }

    pub async fn add_university_specialty(
        &self,
        id: &str,
        request: &AddSpecialtyRequest,
    ) -> Result<University, ApiError> {
        self.cache
            .mutate(
                async { self.universities.add_specialty(id, request).await.map(normalize) },
                &[keys::universities::all()],
            )
            .await
    }

    pub async fn remove_university_specialty(
        &self,
        id: &str,
        specialty_id: &str,
    ) -> Result<University, ApiError> {
        self.cache
            .mutate(
                async {
                    self.universities
                        .remove_specialty(id, specialty_id)
                        .await
                        .map(normalize)
                },
                &[keys::universities::all()],
            )
            .await
    }

    // ---- specialties ----

    pub async fn specialties(
        &self,
        params: &SpecialtyListParams,
    ) -> Result<QueryResult<Vec<Specialty>>, ApiError> {
        let api = Arc::clone(&self.specialties);
        let params = *params;
        self.cache
            .fetch_query(
                keys::specialties::list(&params),
                &self.specialty_options,
                move || {
                    let api = Arc::clone(&api);
                    async move { api.list(&params).await }
                },
            )
            .await
    }

    /// A single specialty. `None` without a request when `id` is blank.
    pub async fn specialty(&self, id: &str) -> Result<Option<QueryResult<Specialty>>, ApiError> {
        let Some(id) = non_blank(id) else {
            return Ok(None);
        };
        let api = Arc::clone(&self.specialties);
        let id = id.to_string();
        self.cache
            .fetch_query(
                keys::specialties::detail(&id),
                &self.specialty_options,
                move || {
                    let api = Arc::clone(&api);
                    let id = id.clone();
                    async move { api.get(&id).await }
                },
            )
            .await
            .map(Some)
    }

    pub async fn search_specialties(
        &self,
        query: &str,
    ) -> Result<QueryResult<Vec<Specialty>>, ApiError> {
        let api = Arc::clone(&self.specialties);
        let query = query.trim().to_string();
        self.cache
            .fetch_query(
                keys::specialties::search(&query),
                &self.specialty_options,
                move || {
                    let api = Arc::clone(&api);
                    let query = query.clone();
                    async move { api.search(&query).await }
                },
            )
            .await
    }

    pub async fn create_specialty(&self, draft: &SpecialtyDraft) -> Result<Specialty, ApiError> {
        self.cache
            .mutate(self.specialties.create(draft), &[keys::specialties::all()])
            .await
    }

    pub async fn update_specialty(
        &self,
        id: &str,
        draft: &SpecialtyDraft,
    ) -> Result<Specialty, ApiError> {
        self.cache
            .mutate(self.specialties.update(id, draft), &[keys::specialties::all()])
            .await
    }

    pub async fn delete_specialty(&self, id: &str) -> Result<(), ApiError> {
        self.cache
            .mutate(self.specialties.delete(id), &[keys::specialties::all()])
            .await?;
        self.cache.remove_queries(&keys::specialties::detail(id.trim()));
        Ok(())
    }

    // ---- assistant ----

    /// Ask for recommendations. Not cached and never retried.
    pub async fn recommend(
        &self,
        request: &RecommendationRequest,
    ) -> Result<RecommendationResponse, ApiError> {
        self.cache.mutate(self.assistant.recommend(request), &[]).await
    }

    /// Compare universities by name. Not cached and never retried.
    pub async fn compare(
        &self,
        request: &ComparisonRequest,
    ) -> Result<ComparisonResponse, ApiError> {
        self.cache.mutate(self.assistant.compare(request), &[]).await
    }

    pub async fn ai_health(&self) -> Result<QueryResult<AiHealth>, ApiError> {
        let api = Arc::clone(&self.assistant);
        self.cache
            .fetch_query(keys::ai::health(), &self.options, move || {
                let api = Arc::clone(&api);
                async move { api.health().await }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::models::SessionId;
    use crate::query::cache::DataSource;
    use crate::query::clock::ManualClock;

    const MINUTE: Duration = Duration::from_secs(60);

    fn record(id: &str, name: &str) -> University {
        University {
            id: id.into(),
            name: name.into(),
            country: "UK".into(),
            city: "Oxford".into(),
            description: Some("  ".into()),
            website: None,
            logo: None,
            ranking: Some(1),
            tuition_fee_usd: Some(0.0),
            student_count: None,
            acceptance_rate: None,
            specialties: Vec::new(),
            specialty_names: Vec::new(),
            requirements: Vec::new(),
        }
    }

    #[derive(Default)]
    struct FakeUniversities {
        records: Mutex<Vec<University>>,
        list_calls: AtomicUsize,
        get_calls: AtomicUsize,
        write_calls: AtomicUsize,
        /// Remaining reads that fail with a connectivity error
        failing_reads: AtomicUsize,
        fail_writes: bool,
        list_delay: Option<Duration>,
    }

    impl FakeUniversities {
        fn with(records: Vec<University>) -> Self {
            Self {
                records: Mutex::new(records),
                ..Self::default()
            }
        }

        fn read_failure(&self) -> Result<(), ApiError> {
            let left = self.failing_reads.load(Ordering::SeqCst);
            if left > 0 {
                self.failing_reads.store(left - 1, Ordering::SeqCst);
                return Err(ApiError::connectivity());
            }
            Ok(())
        }

        fn write(&self) -> Result<(), ApiError> {
            self.write_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_writes {
                return Err(ApiError::server(422, br#"{"detail":"invalid"}"#));
            }
            Ok(())
        }

        fn find(&self, id: &str) -> Result<University, ApiError> {
            self.records
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.id == id)
                .cloned()
                .ok_or_else(|| ApiError::server(404, br#"{"detail":"University not found"}"#))
        }

        fn edit(&self, id: &str, f: impl FnOnce(&mut University)) -> Result<University, ApiError> {
            let mut records = self.records.lock().unwrap();
            let uni = records
                .iter_mut()
                .find(|u| u.id == id)
                .ok_or_else(|| ApiError::server(404, b""))?;
            f(uni);
            Ok(uni.clone())
        }
    }

    #[async_trait]
    impl UniversityApi for FakeUniversities {
        async fn list(
            &self,
            _params: &UniversityListParams,
        ) -> Result<PaginatedResponse<University>, ApiError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.list_delay {
                tokio::time::sleep(delay).await;
            }
            self.read_failure()?;
            let items = self.records.lock().unwrap().clone();
            Ok(PaginatedResponse {
                total: items.len() as u64,
                page: 1,
                page_size: 20,
                total_pages: 1,
                items,
            })
        }

        async fn get(&self, id: &str) -> Result<University, ApiError> {
            self.get_calls.fetch_add(1, Ordering::SeqCst);
            self.read_failure()?;
            self.find(id)
        }

        async fn search(&self, query: &str) -> Result<Vec<University>, ApiError> {
            let records = self.records.lock().unwrap();
            Ok(records
                .iter()
                .filter(|u| u.name.contains(query))
                .cloned()
                .collect())
        }

        async fn create(&self, draft: &UniversityDraft) -> Result<University, ApiError> {
            self.write()?;
            let mut records = self.records.lock().unwrap();
            let id = format!("u{}", records.len() + 1);
            let uni = record(&id, draft.name.as_deref().unwrap_or_default());
            records.push(uni.clone());
            Ok(uni)
        }

        async fn update(&self, id: &str, draft: &UniversityDraft) -> Result<University, ApiError> {
            self.write()?;
            self.edit(id, |u| {
                if let Some(name) = &draft.name {
                    u.name = name.clone();
                }
            })
        }

        async fn delete(&self, id: &str) -> Result<(), ApiError> {
            self.write()?;
            self.records.lock().unwrap().retain(|u| u.id != id);
            Ok(())
        }

        async fn add_specialty(
            &self,
            id: &str,
            request: &AddSpecialtyRequest,
        ) -> Result<University, ApiError> {
            self.write()?;
            self.edit(id, |u| {
                u.specialties.push(request.specialty_id.clone());
                u.specialty_names.push(request.specialty_name.clone());
            })
        }

        async fn remove_specialty(
            &self,
            id: &str,
            specialty_id: &str,
        ) -> Result<University, ApiError> {
            self.write()?;
            self.edit(id, |u| {
                if let Some(pos) = u.specialties.iter().position(|s| s == specialty_id) {
                    u.specialties.remove(pos);
                    if pos < u.specialty_names.len() {
                        u.specialty_names.remove(pos);
                    }
                }
            })
        }
    }

    #[derive(Default)]
    struct FakeSpecialties {
        list_calls: AtomicUsize,
    }

    #[async_trait]
    impl SpecialtyApi for FakeSpecialties {
        async fn list(&self, _params: &SpecialtyListParams) -> Result<Vec<Specialty>, ApiError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![specialty("cs", "Computer Science")])
        }

        async fn get(&self, id: &str) -> Result<Specialty, ApiError> {
            Ok(specialty(id, "Law"))
        }

        async fn search(&self, _query: &str) -> Result<Vec<Specialty>, ApiError> {
            Ok(Vec::new())
        }

        async fn create(&self, draft: &SpecialtyDraft) -> Result<Specialty, ApiError> {
            Ok(specialty("new", draft.name.as_deref().unwrap_or_default()))
        }

        async fn update(&self, id: &str, draft: &SpecialtyDraft) -> Result<Specialty, ApiError> {
            Ok(specialty(id, draft.name.as_deref().unwrap_or_default()))
        }

        async fn delete(&self, _id: &str) -> Result<(), ApiError> {
            Ok(())
        }
    }

    fn specialty(id: &str, name: &str) -> Specialty {
        Specialty {
            id: id.into(),
            name: name.into(),
            description: None,
            category: None,
        }
    }

    #[derive(Default)]
    struct FakeAssistant {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AssistantApi for FakeAssistant {
        async fn recommend(
            &self,
            request: &RecommendationRequest,
        ) -> Result<RecommendationResponse, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(RecommendationResponse {
                success: true,
                recommendations: Some(format!("for: {}", request.query)),
                error: None,
                session_id: request.session_id.clone(),
            })
        }

        async fn compare(
            &self,
            _request: &ComparisonRequest,
        ) -> Result<ComparisonResponse, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ApiError::connectivity())
        }

        async fn health(&self) -> Result<AiHealth, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(AiHealth {
                status: "operational".into(),
                capabilities: Vec::new(),
                context7_enabled: false,
                anthropic_configured: true,
                model: None,
            })
        }
    }

    struct Harness {
        queries: CatalogQueries,
        clock: ManualClock,
        universities: Arc<FakeUniversities>,
        specialties: Arc<FakeSpecialties>,
        assistant: Arc<FakeAssistant>,
    }

    fn harness(universities: FakeUniversities) -> Harness {
        let clock = ManualClock::new();
        let options = QueryOptions::default()
            .retry_delay(Duration::ZERO)
            .policy(FetchPolicy::CacheFirst);
        let cache = QueryCache::with_clock(options, Arc::new(clock.clone()));
        let universities = Arc::new(universities);
        let specialties = Arc::new(FakeSpecialties::default());
        let assistant = Arc::new(FakeAssistant::default());
        let queries = CatalogQueries::new(
            cache,
            universities.clone(),
            specialties.clone(),
            assistant.clone(),
        );
        Harness {
            queries,
            clock,
            universities,
            specialties,
            assistant,
        }
    }

    #[tokio::test]
    async fn test_list_is_normalized_and_cached() {
        let h = harness(FakeUniversities::with(vec![record("1", "Oxford")]));
        let params = UniversityListParams::default().page(1);

        let first = h.queries.universities(&params).await.unwrap();
        assert_eq!(first.source, DataSource::Network);
        assert_eq!(first.data.items[0].description, None);
        assert_eq!(first.data.items[0].tuition_fee_usd, Some(0.0));

        let second = h.queries.universities(&params).await.unwrap();
        assert_eq!(second.source, DataSource::Cache);
        assert_eq!(h.universities.list_calls.load(Ordering::SeqCst), 1);

        h.queries
            .universities(&UniversityListParams::default().page(2))
            .await
            .unwrap();
        assert_eq!(h.universities.list_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_blank_detail_id_is_disabled() {
        let h = harness(FakeUniversities::default());
        assert!(h.queries.university("").await.unwrap().is_none());
        assert!(h.queries.university("  ").await.unwrap().is_none());
        assert!(h.queries.specialty("").await.unwrap().is_none());
        assert_eq!(h.universities.get_calls.load(Ordering::SeqCst), 0);
        assert!(h.queries.cache().is_empty());
    }

    #[tokio::test]
    async fn test_detail_is_normalized() {
        let h = harness(FakeUniversities::with(vec![record("1", "Oxford")]));
        let result = h.queries.university("1").await.unwrap().unwrap();
        assert_eq!(result.data.name, "Oxford");
        assert_eq!(result.data.description, None);
    }

    #[tokio::test]
    async fn test_missing_detail_is_not_found() {
        let h = harness(FakeUniversities::default());
        let err = h.queries.university("nope").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.message, "University not found");
        assert_eq!(h.universities.get_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_read_is_retried_once_then_succeeds() {
        let fake = FakeUniversities::with(vec![record("1", "Oxford")]);
        fake.failing_reads.store(1, Ordering::SeqCst);
        let h = harness(fake);

        let result = h.queries.university("1").await.unwrap().unwrap();
        assert_eq!(result.data.id, "1");
        assert_eq!(h.universities.get_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_identical_lists_fetch_once() {
        let h = harness(FakeUniversities {
            list_delay: Some(Duration::from_millis(50)),
            ..FakeUniversities::with(vec![record("1", "Oxford")])
        });
        let params = UniversityListParams::default().country("UK");

        let (a, b) = tokio::join!(
            h.queries.universities(&params),
            h.queries.universities(&params)
        );
        assert!(Arc::ptr_eq(&a.unwrap().data, &b.unwrap().data));
        assert_eq!(h.universities.list_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_create_invalidates_lists() {
        let h = harness(FakeUniversities::with(vec![record("1", "Oxford")]));
        let params = UniversityListParams::default();
        h.queries.universities(&params).await.unwrap();

        let draft = UniversityDraft {
            name: Some("Cambridge".into()),
            ..UniversityDraft::default()
        };
        let created = h.queries.create_university(&draft).await.unwrap();
        assert_eq!(created.name, "Cambridge");

        let list = h.queries.universities(&params).await.unwrap();
        assert_eq!(list.source, DataSource::Network);
        assert_eq!(list.data.items.len(), 2);
        assert_eq!(h.universities.list_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_update_refreshes_detail() {
        let h = harness(FakeUniversities::with(vec![record("1", "Oxford")]));
        h.queries.university("1").await.unwrap();

        let draft = UniversityDraft {
            name: Some("University of Oxford".into()),
            ..UniversityDraft::default()
        };
        h.queries.update_university("1", &draft).await.unwrap();

        let detail = h.queries.university("1").await.unwrap().unwrap();
        assert_eq!(detail.data.name, "University of Oxford");
    }

    #[tokio::test]
    async fn test_delete_drops_detail() {
        let h = harness(FakeUniversities::with(vec![record("1", "Oxford")]));
        h.queries.university("1").await.unwrap();
        h.queries.delete_university("1").await.unwrap();

        let key = keys::universities::detail("1");
        assert!(h.queries.cache().get_query_data::<University>(&key).is_none());
    }

    #[tokio::test]
    async fn test_failed_write_is_not_retried_and_keeps_cache() {
        let h = harness(FakeUniversities {
            fail_writes: true,
            ..FakeUniversities::with(vec![record("1", "Oxford")])
        });
        let params = UniversityListParams::default();
        h.queries.universities(&params).await.unwrap();

        let err = h.queries.delete_university("1").await.unwrap_err();
        assert_eq!(err.status, 422);
        assert_eq!(h.universities.write_calls.load(Ordering::SeqCst), 1);

        let list = h.queries.universities(&params).await.unwrap();
        assert_eq!(list.source, DataSource::Cache);
    }

    #[tokio::test]
    async fn test_specialty_association_invalidates_universities() {
        let h = harness(FakeUniversities::with(vec![record("1", "Oxford")]));
        h.queries.university("1").await.unwrap();

        let request = AddSpecialtyRequest {
            specialty_id: "law".into(),
            specialty_name: "Law".into(),
            minimum_score: 80.0,
            exams: Vec::new(),
            additional_requirements: None,
        };
        let updated = h.queries.add_university_specialty("1", &request).await.unwrap();
        assert!(updated.offers("Law"));

        let detail = h.queries.university("1").await.unwrap().unwrap();
        assert_eq!(detail.source, DataSource::Network);
        assert!(detail.data.offers("Law"));

        let updated = h.queries.remove_university_specialty("1", "law").await.unwrap();
        assert!(!updated.offers("Law"));
    }

    #[tokio::test]
    async fn test_specialties_stay_fresh_longer() {
        let h = harness(FakeUniversities::with(vec![record("1", "Oxford")]));
        let params = SpecialtyListParams::default();
        h.queries.specialties(&params).await.unwrap();
        h.queries.universities(&UniversityListParams::default()).await.unwrap();

        h.clock.advance(7 * MINUTE);
        let specialties = h.queries.specialties(&params).await.unwrap();
        assert_eq!(specialties.source, DataSource::Cache);
        let universities = h.queries.universities(&UniversityListParams::default()).await.unwrap();
        assert_eq!(universities.source, DataSource::Network);

        h.clock.advance(4 * MINUTE);
        let specialties = h.queries.specialties(&params).await.unwrap();
        assert_eq!(specialties.source, DataSource::Network);
        assert_eq!(h.specialties.list_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_assistant_calls_are_not_cached() {
        let h = harness(FakeUniversities::default());
        let request = RecommendationRequest::new(SessionId::new("s"), "medicine in Canada");

        h.queries.recommend(&request).await.unwrap();
        let response = h.queries.recommend(&request).await.unwrap();
        assert_eq!(response.recommendations.as_deref(), Some("for: medicine in Canada"));
        assert_eq!(h.assistant.calls.load(Ordering::SeqCst), 2);

        let compare = ComparisonRequest {
            session_id: SessionId::new("s"),
            university_names: vec!["MIT".into()],
            comparison_criteria: None,
        };
        assert!(h.queries.compare(&compare).await.unwrap_err().is_connectivity());
        assert_eq!(h.assistant.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_health_is_cached() {
        let h = harness(FakeUniversities::default());
        assert!(h.queries.ai_health().await.unwrap().data.is_operational());
        h.queries.ai_health().await.unwrap();
        assert_eq!(h.assistant.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_network_only_policy_bypasses_cache() {
        let h = harness(FakeUniversities::with(vec![record("1", "Oxford")]));
        let params = UniversityListParams::default();
        h.queries.universities(&params).await.unwrap();

        let fresh = h
            .queries
            .with_policy(FetchPolicy::NetworkOnly)
            .universities(&params)
            .await
            .unwrap();
        assert_eq!(fresh.source, DataSource::Network);
        assert_eq!(h.universities.list_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_reads_hit_backend_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/universities/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({
                        "items": [{"id": "1", "name": "MIT", "country": "USA", "city": "Cambridge"}],
                        "total": 1,
                        "page": 1,
                        "page_size": 20,
                        "total_pages": 1
                    }))
                    .set_delay(Duration::from_millis(200)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut config = Config::default();
        config.api.base_url = format!("{}/api", server.uri());
        let queries = CatalogQueries::from_config(&config).unwrap();
        let params = UniversityListParams::default();

        let (a, b) = tokio::join!(queries.universities(&params), queries.universities(&params));
        assert_eq!(a.unwrap().data.items[0].name, "MIT");
        assert_eq!(b.unwrap().data.total, 1);
    }
}
