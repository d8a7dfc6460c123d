use std::time::Duration;

use hotelstat_parser::RawArchive;
use reqwest::blocking::{Client, ClientBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::FetchError;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = concat!("hotelstat/", env!("CARGO_PKG_VERSION"));

/// Anything that can hand back the archive stored at a URL.
///
/// Implementations must be shareable across threads; batches fetch series in
/// parallel.
pub trait ArchiveSource: Send + Sync {
    fn fetch(&self, url: &str) -> Result<RawArchive, FetchError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Honour `HTTP_PROXY`-style environment variables.
    pub use_system_proxy: bool,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            use_system_proxy: true,
        }
    }
}

/// Blocking HTTP source. A single GET per call, no retries.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(settings: &FetchSettings) -> Result<Self, FetchError> {
        let mut builder = ClientBuilder::new()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(settings.user_agent.clone());
        if !settings.use_system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build().map_err(FetchError::Client)?;
        Ok(Self { client })
    }
}

impl ArchiveSource for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<RawArchive, FetchError> {
        let transport = |source| FetchError::Transport {
            url: url.to_string(),
            source,
        };

        debug!(url, "Fetching archive");
        let response = self.client.get(url).send().map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().map_err(transport)?;
        debug!(url, bytes = bytes.len(), "Fetched archive");
        Ok(RawArchive::new(url, bytes))
    }
}
