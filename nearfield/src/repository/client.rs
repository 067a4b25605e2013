//! Remote endpoint boundary and its HTTP implementation.
//!
//! The [`ArtifactClient`] trait abstracts over the nearby-query endpoint so
//! the repository can be driven by the real [`HttpArtifactClient`] or by a
//! [`ScriptedArtifactClient`](super::ScriptedArtifactClient) in tests.

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use super::error::FetchError;
use super::query::NearbyRequest;
use crate::artifact::{Artifact, ArtifactId, ArtifactPage};
use crate::geo::GeoPoint;

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/v1";

/// Default HTTP timeout for a single query.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Trait for the remote artifact endpoint.
pub trait ArtifactClient: Send + Sync + 'static {
    /// Fetch one page of artifacts near a point.
    fn fetch_nearby(
        &self,
        request: &NearbyRequest,
    ) -> impl Future<Output = Result<ArtifactPage, FetchError>> + Send;

    /// Fetch a single artifact by id.
    ///
    /// `user` is forwarded so the server can annotate distance; the engine
    /// recomputes visibility locally either way.
    fn fetch_artifact(
        &self,
        id: ArtifactId,
        user: Option<GeoPoint>,
    ) -> impl Future<Output = Result<Artifact, FetchError>> + Send;
}

/// Connection settings for [`HttpArtifactClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root, e.g. `https://example.com/api/v1`.
    pub base_url: String,

    /// Per-request timeout.
    pub timeout: Duration,

    /// Bearer token attached to every request, if any.
    pub token: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_HTTP_TIMEOUT,
            token: None,
        }
    }
}

/// Error body shape used by the endpoint.
#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// Artifact client over HTTP.
///
/// Uses a reusable `reqwest::Client` with connection pooling and timeouts.
pub struct HttpArtifactClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpArtifactClient {
    /// Create a client from connection settings.
    pub fn new(config: &ClientConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("nearfield/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone().filter(|t| !t.is_empty()),
        })
    }

    /// Replace the bearer token.
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token.filter(|t| !t.is_empty());
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Vec<u8>, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.http.get(&url).query(query);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(transport_error)?;

        debug!(
            url = %url,
            status = status.as_u16(),
            bytes = body.len(),
            "Artifact endpoint responded"
        );

        if !status.is_success() {
            let detail = error_detail(&body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
            return Err(FetchError::from_status(status.as_u16(), detail));
        }
        Ok(body.to_vec())
    }
}

impl ArtifactClient for HttpArtifactClient {
    async fn fetch_nearby(&self, request: &NearbyRequest) -> Result<ArtifactPage, FetchError> {
        let body = self.get("/artifacts/near", &request.query_pairs()).await?;
        ArtifactPage::from_json(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }

    async fn fetch_artifact(
        &self,
        id: ArtifactId,
        user: Option<GeoPoint>,
    ) -> Result<Artifact, FetchError> {
        let query: Vec<(&str, String)> = match user {
            Some(p) => vec![
                ("lat", p.latitude().to_string()),
                ("lng", p.longitude().to_string()),
            ],
            None => Vec::new(),
        };
        let body = self.get(&format!("/artifacts/{}", id), &query).await?;
        serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

fn transport_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Network(format!("request timed out: {}", e))
    } else if e.is_connect() {
        FetchError::Network(format!("connection failed: {}", e))
    } else if e.is_decode() {
        FetchError::Decode(e.to_string())
    } else {
        FetchError::Network(e.to_string())
    }
}

/// Pull the `detail` text out of an error body, verbatim.
fn error_detail(body: &[u8]) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
    match parsed.detail {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}
