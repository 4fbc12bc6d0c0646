//! HTTP implementation of the resolution backend

use crate::error::{ResolverError, Result};
use crate::models::{normalize_media, normalize_search, ApiEnvelope, ResolvedMedia};
use crate::request::ResolveRequest;
use crate::SongResolver;
use async_trait::async_trait;
use mellow_core::{Platform, Song};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Resolution client over the proxy endpoint
///
/// # Example
///
/// ```ignore
/// use mellow_resolver::{HttpResolver, ResolveRequest, SongResolver};
/// use mellow_core::Platform;
///
/// let resolver = HttpResolver::new("https://music.example.com")?;
/// let hits = resolver.search(Platform::Wy, "respect").await?;
/// let media = resolver
///     .resolve(&ResolveRequest::detail(Platform::Wy, "respect", 0))
///     .await?;
/// ```
pub struct HttpResolver {
    http: Client,
    base_url: String,
}

impl HttpResolver {
    /// Create a new resolver for the proxy at `base_url`
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();
        if base_url.is_empty() {
            return Err(ResolverError::InvalidUrl("URL cannot be empty".into()));
        }

        let base_url = base_url.trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ResolverError::InvalidUrl(
                "URL must start with http:// or https://".into(),
            ));
        }

        // Create HTTP client with reasonable defaults; the caller owns
        // the per-attempt resolution timeout
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("Mellow/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ResolverError::Request)?;

        Ok(Self { http, base_url })
    }

    async fn fetch_envelope(&self, request: &ResolveRequest) -> Result<ApiEnvelope> {
        let url = format!("{}/api/sby{}", self.base_url, request.query_string());
        debug!(url = %url, "Fetching resolution endpoint");

        let response = self.http.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                ResolverError::Timeout
            } else if e.is_connect() {
                ResolverError::Unreachable(e.to_string())
            } else {
                ResolverError::Request(e)
            }
        })?;

        let status = response.status();
        let envelope: ApiEnvelope = response
            .json()
            .await
            .map_err(|e| ResolverError::Parse(e.to_string()))?;

        if !status.is_success() || !envelope.success {
            return Err(ResolverError::Api {
                code: i64::from(status.as_u16()),
                message: envelope
                    .error
                    .unwrap_or_else(|| "proxy request failed".to_string()),
            });
        }

        Ok(envelope)
    }
}

#[async_trait]
impl SongResolver for HttpResolver {
    async fn search(&self, platform: Platform, term: &str) -> Result<Vec<Song>> {
        let request = ResolveRequest::search(platform, term);
        let envelope = self.fetch_envelope(&request).await?;
        crate::models::check_code(&envelope.data)?;
        Ok(normalize_search(platform, &envelope.data, term))
    }

    async fn resolve(&self, request: &ResolveRequest) -> Result<ResolvedMedia> {
        let envelope = self.fetch_envelope(request).await?;
        normalize_media(request.platform, &envelope.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_validation() {
        assert!(HttpResolver::new("https://example.com").is_ok());
        assert!(HttpResolver::new("http://localhost:3000/").is_ok());

        assert!(HttpResolver::new("").is_err());
        assert!(HttpResolver::new("not-a-url").is_err());
        assert!(HttpResolver::new("ftp://example.com").is_err());
    }

    #[test]
    fn url_normalization_strips_trailing_slash() {
        let resolver = HttpResolver::new("https://example.com/").unwrap();
        assert_eq!(resolver.base_url, "https://example.com");
    }
}
