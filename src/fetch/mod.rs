//! Source fetchers.
//!
//! Each fetcher downloads (or, for the survey, embeds) one source's raw data
//! and reshapes it into a [`SourceDocument`].

pub mod githut;
pub mod pypl;
pub mod stackoverflow;
pub mod tiobe;

use crate::config::FetchConfig;
use crate::models::{SourceDocument, SourceId};
use chrono::{SecondsFormat, Utc};
use futures::future::join_all;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Errors returned by the fetchers.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status} fetching {url}")]
    Status { status: u16, url: String },

    #[error("Could not parse {source_name} data: {message}")]
    Parse {
        source_name: &'static str,
        message: String,
    },
}

impl FetchError {
    pub(crate) fn parse(source_name: &'static str, message: impl Into<String>) -> Self {
        FetchError::Parse {
            source_name,
            message: message.into(),
        }
    }
}

/// Thin HTTP client shared by all fetchers.
#[derive(Clone)]
pub struct HttpFetcher {
    http: Client,
}

impl HttpFetcher {
    /// Build a client with the configured timeout and user agent.
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { http })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        debug!("GET {}", url);
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            })
        }
    }

    /// Fetch a URL as text.
    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        Ok(self.get(url).await?.text().await?)
    }

    /// Fetch a URL and decode its JSON body.
    pub async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<T, FetchError> {
        Ok(self.get(url).await?.json().await?)
    }
}

/// Current time in the document timestamp format.
pub(crate) fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Fetch one source.
pub async fn fetch_source(
    id: SourceId,
    http: &HttpFetcher,
    config: &FetchConfig,
) -> Result<SourceDocument, FetchError> {
    info!("Fetching {} data", id.display_name());

    match id {
        SourceId::Githut => githut::fetch(http, &config.githut_base_url, config.githut_top_n).await,
        SourceId::Tiobe => tiobe::fetch(http, &config.tiobe_urls).await,
        SourceId::Pypl => pypl::fetch(http, &config.pypl_url).await,
        SourceId::StackOverflow => Ok(stackoverflow::build(timestamp())),
    }
}

/// Fetch several sources concurrently.
///
/// Results come back in the order requested; one source failing does not
/// affect the others.
pub async fn fetch_all(
    ids: &[SourceId],
    http: &HttpFetcher,
    config: &FetchConfig,
) -> Vec<(SourceId, Result<SourceDocument, FetchError>)> {
    let results = join_all(ids.iter().map(|&id| fetch_source(id, http, config))).await;

    ids.iter()
        .copied()
        .zip(results)
        .inspect(|(id, result)| match result {
            Ok(doc) => info!("Fetched {}: {} languages", id, doc.rankings.len()),
            Err(e) => warn!("Failed to fetch {}: {}", id, e),
        })
        .collect()
}
