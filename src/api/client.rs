//! Async HTTP client shared by every upstream source.
//!
//! Features:
//! - One pooled `reqwest::Client` per process, cloned into each request
//! - Fixed upstream endpoints (`Endpoints::default()`)
//! - Single attempt per fetch: a failed fetch means "source unavailable"
//!
//! Each call classifies failures into `FetchError` so callers can decide
//! whether to degrade or to surface them.

use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use super::errors::FetchError;

pub const PRIMARY_URL: &str = "https://www.basketball-reference.com/";
pub const PRIMARY_ORIGIN: &str = "https://www.basketball-reference.com";
pub const ESPN_SITE_V2: &str = "https://site.api.espn.com/apis/site/v2/sports/basketball/nba";
pub const ESPN_WEB_V2: &str = "https://site.web.api.espn.com/apis/site/v2/sports/basketball/nba";
pub const NBA_LIVE_SCOREBOARD: &str =
    "https://cdn.nba.com/static/json/liveData/scoreboard/todaysScoreboard_00.json";

/// Upstream locations. The production values are constants; only tests
/// build a different set to point at local mock servers.
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// Primary HTML listing page.
    pub primary: String,
    /// Origin used to absolutize relative box score links.
    pub primary_origin: String,
    /// ESPN scoreboard bases, tried in order.
    pub espn_bases: Vec<String>,
    pub nba_live: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            primary: PRIMARY_URL.to_string(),
            primary_origin: PRIMARY_ORIGIN.to_string(),
            espn_bases: vec![ESPN_SITE_V2.to_string(), ESPN_WEB_V2.to_string()],
            nba_live: NBA_LIVE_SCOREBOARD.to_string(),
        }
    }
}

/// Thin wrapper over `reqwest::Client` with the service's fetch policy.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
}

impl UpstreamClient {
    pub fn new(user_agent: &str, timeout_secs: u64) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(timeout_secs))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| FetchError::Network {
                url: String::new(),
                message: e.to_string(),
            })?;

        Ok(Self { client })
    }

    /// Create with default settings.
    pub fn with_defaults() -> Result<Self, FetchError> {
        Self::new("Mozilla/5.0 (compatible; ScoreFetcher/1.0)", 10)
    }

    /// Fetch a document as text. Non-2xx is an error.
    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self.send(url).await?;
        response.text().await.map_err(|e| FetchError::Body {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    /// Fetch and deserialize a JSON document.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let response = self.send(url).await?;
        response.json::<T>().await.map_err(|e| {
            if e.is_decode() {
                FetchError::Deserialization {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            } else {
                FetchError::Body {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })
    }

    async fn send(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        debug!(url = %url, "Upstream request");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_transport(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status_code: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_endpoints_are_fixed_constants() {
        let endpoints = Endpoints::default();
        assert_eq!(endpoints.primary, PRIMARY_URL);
        assert_eq!(endpoints.espn_bases, vec![ESPN_SITE_V2, ESPN_WEB_V2]);
        assert_eq!(endpoints.nba_live, NBA_LIVE_SCOREBOARD);
    }

    #[tokio::test]
    async fn non_success_status_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/")
            .with_status(503)
            .create_async()
            .await;

        let client = UpstreamClient::with_defaults().unwrap();
        let err = client.get_text(&format!("{}/", server.url())).await.unwrap_err();
        assert_eq!(err.status_code(), Some(503));
    }

    #[tokio::test]
    async fn malformed_json_is_a_deserialization_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/feed.json")
            .with_status(200)
            .with_body("{not json")
            .create_async()
            .await;

        let client = UpstreamClient::with_defaults().unwrap();
        let err = client
            .get_json::<serde_json::Value>(&format!("{}/feed.json", server.url()))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Deserialization { .. }));
    }
}
