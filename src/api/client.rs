// src/api/client.rs

//! HTTP transport for the catalog backend.
//!
//! Owns the base URL, timeout and JSON headers, and reduces every failure to
//! an [`ApiError`]. Each error is logged here before it is returned; nothing
//! is retried at this layer.

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method};
use serde::Serialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use url::Url;

use crate::error::ApiError;
use crate::models::ApiConfig;
use crate::utils::{endpoint, parse_base};

/// Configured JSON client for one backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a client from API settings.
    ///
    /// A malformed base URL is a request construction error.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let base_url = parse_base(&config.base_url)
            .map_err(|e| ApiError::request(format!("invalid base URL {:?}: {e}", config.base_url)))
            .inspect_err(|e| log::error!("API error: {e}"))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::from_transport(&e))
            .inspect_err(|e| log::error!("API error: {e}"))?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// GET and decode a JSON body.
    pub async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        self.request::<T, (), ()>(Method::GET, segments, None, None)
            .await
    }

    /// GET with query parameters and decode a JSON body.
    pub async fn get_with<T, Q>(&self, segments: &[&str], query: &Q) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.request::<T, Q, ()>(Method::GET, segments, Some(query), None)
            .await
    }

    /// POST a JSON body and decode the response.
    pub async fn post<T, B>(&self, segments: &[&str], body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request::<T, (), B>(Method::POST, segments, None, Some(body))
            .await
    }

    /// PUT a JSON body and decode the response.
    pub async fn put<T, B>(&self, segments: &[&str], body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request::<T, (), B>(Method::PUT, segments, None, Some(body))
            .await
    }

    /// DELETE, ignoring whatever body comes back.
    pub async fn delete(&self, segments: &[&str]) -> Result<(), ApiError> {
        self.request::<IgnoredAny, (), ()>(Method::DELETE, segments, None, None)
            .await
            .map(|_| ())
    }

    /// DELETE and decode the JSON body the server returns.
    pub async fn delete_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        self.request::<T, (), ()>(Method::DELETE, segments, None, None)
            .await
    }

    async fn request<T, Q, B>(
        &self,
        method: Method,
        segments: &[&str],
        query: Option<&Q>,
        body: Option<&B>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
        B: Serialize + ?Sized,
    {
        let label = format!("{method} /{}", segments.join("/"));
        let result = match self.execute(method, segments, query, body).await {
            Ok(bytes) => decode(&bytes),
            Err(e) => Err(e),
        };
        result.inspect_err(|e| log::error!("API error on {label}: {e}"))
    }

    async fn execute<Q, B>(
        &self,
        method: Method,
        segments: &[&str],
        query: Option<&Q>,
        body: Option<&B>,
    ) -> Result<Vec<u8>, ApiError>
    where
        Q: Serialize + ?Sized,
        B: Serialize + ?Sized,
    {
        let url = endpoint(&self.base_url, segments).map_err(ApiError::request)?;
        log::debug!("{method} {url}");

        let mut request = self.http.request(method, url);
        if let Some(query) = query {
            request = request.query(query);
        }
        if let Some(body) = body {
            let bytes = serde_json::to_vec(body)
                .map_err(|e| ApiError::request(format!("failed to encode request body: {e}")))?;
            request = request.body(bytes);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::from_transport(&e))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::from_transport(&e))?;

        if !status.is_success() {
            return Err(ApiError::server(status.as_u16(), &bytes));
        }
        Ok(bytes.to_vec())
    }
}

/// Decode a success body; an empty body decodes like JSON `null`.
fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
    let result = if bytes.iter().all(u8::is_ascii_whitespace) {
        serde_json::from_slice(b"null")
    } else {
        serde_json::from_slice(bytes)
    };
    result.map_err(|e| ApiError::request(format!("invalid response body: {e}")))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::error::{ApiErrorKind, CONNECTIVITY_MESSAGE};

    fn client_for(base_url: &str, timeout_ms: u64) -> ApiClient {
        ApiClient::new(&ApiConfig {
            base_url: base_url.to_string(),
            timeout_ms,
            ..ApiConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_get_sends_json_headers_and_decodes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/ai/health"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&format!("{}/api", server.uri()), 1_000);
        let body: serde_json::Value = client.get(&["ai", "health"]).await.unwrap();
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_query_parameters_are_encoded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/universities/search"))
            .and(query_param("query", "São Paulo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&format!("{}/api", server.uri()), 1_000);
        let body: Vec<serde_json::Value> = client
            .get_with(&["universities", "search"], &[("query", "São Paulo")])
            .await
            .unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_non_success_status_becomes_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"detail": "University not found"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&format!("{}/api", server.uri()), 1_000);
        let err = client
            .get::<serde_json::Value>(&["universities", "nope"])
            .await
            .unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::Server);
        assert_eq!(err.status, 404);
        assert_eq!(err.message, "University not found");
    }

    #[tokio::test]
    async fn test_refused_connection_is_connectivity_error() {
        // Port 1 is reserved and nothing listens on it in test environments.
        let client = client_for("http://127.0.0.1:1/api", 1_000);
        let err = client
            .get::<serde_json::Value>(&["universities", ""])
            .await
            .unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::Connectivity);
        assert_eq!(err.status, 0);
        assert_eq!(err.message, CONNECTIVITY_MESSAGE);
    }

    #[tokio::test]
    async fn test_timeout_is_connectivity_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let client = client_for(&format!("{}/api", server.uri()), 100);
        let err = client
            .get::<serde_json::Value>(&["ai", "health"])
            .await
            .unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::Connectivity);
        assert_eq!(err.status, 0);
    }

    #[test]
    fn test_malformed_base_url_is_construction_error() {
        let err = ApiClient::new(&ApiConfig {
            base_url: "::not a url::".to_string(),
            ..ApiConfig::default()
        })
        .unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::RequestConstruction);
        assert_eq!(err.status, 0);
        assert!(err.message.contains("invalid base URL"));
    }

    #[tokio::test]
    async fn test_base_without_path_support_is_construction_error() {
        let client = client_for("mailto:admin@example.com", 1_000);
        let err = client
            .get::<serde_json::Value>(&["universities", ""])
            .await
            .unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::RequestConstruction);
        assert_eq!(err.status, 0);
    }

    #[tokio::test]
    async fn test_delete_accepts_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/specialties/s1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&format!("{}/api", server.uri()), 1_000);
        client.delete(&["specialties", "s1"]).await.unwrap();
    }

    #[tokio::test]
    async fn test_undecodable_success_body_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let client = client_for(&format!("{}/api", server.uri()), 1_000);
        let err = client
            .get::<serde_json::Value>(&["ai", "health"])
            .await
            .unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::RequestConstruction);
        assert!(err.message.starts_with("invalid response body"));
    }

    #[test]
    fn test_decode_empty_body_as_null() {
        let value: Option<u32> = decode(b"").unwrap();
        assert_eq!(value, None);
        assert!(decode::<IgnoredAny>(b"  \n").is_ok());
        assert!(decode::<u32>(b"").is_err());
    }
}
