// On-demand retrieval of a match's event log.

use async_trait::async_trait;
use placar_core::log_entry::{parse_log_entries, LogEntry};
use placar_core::MatchId;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogFetchError {
    #[error("server returned status {0}")]
    Status(u16),

    #[error("network error: {0}")]
    Transport(String),

    #[error("invalid log payload: {0}")]
    Decode(String),
}

/// Anything that can produce the log entries of a match.
#[async_trait]
pub trait LogSource: Send + Sync {
    async fn fetch(&self, id: &MatchId) -> Result<Vec<LogEntry>, LogFetchError>;
}

/// Result of one fetch, tagged with the match it was requested for.
#[derive(Debug, Clone, PartialEq)]
pub struct LogResult {
    pub id: MatchId,
    /// Request counter value when the fetch was issued.
    pub generation: u64,
    pub result: Result<Vec<LogEntry>, LogFetchError>,
}

/// `LogSource` backed by the consumer API's log endpoint.
pub struct HttpLogClient {
    http: reqwest::Client,
    config: Config,
}

impl HttpLogClient {
    pub fn new(http: reqwest::Client, config: Config) -> Self {
        HttpLogClient { http, config }
    }

    pub fn url_for(&self, id: &MatchId) -> String {
        self.config.logs_url(id)
    }
}

#[async_trait]
impl LogSource for HttpLogClient {
    async fn fetch(&self, id: &MatchId) -> Result<Vec<LogEntry>, LogFetchError> {
        let url = self.url_for(id);
        debug!("fetching log for {} from {}", id, url);
        let response = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| LogFetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LogFetchError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| LogFetchError::Transport(e.to_string()))?;
        parse_log_entries(&body).map_err(|e| LogFetchError::Decode(e.to_string()))
    }
}
