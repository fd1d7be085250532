use reqwest::StatusCode;
use thiserror::Error;

use crate::retry::Transient;

/// Failure of a single request to the management API.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to management API failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("management API returned {status} for {url}")]
    Status { status: StatusCode, url: String },

    #[error("malformed queue list: {0}")]
    Json(#[from] serde_json::Error),

    #[error("queue entry {index} has no string 'name' field")]
    MissingName { index: usize },
}

impl Transient for FetchError {
    /// Only transport level failures are worth another attempt. A bad status
    /// or a bad body will be the same the next time.
    fn is_transient(&self) -> bool {
        match self {
            FetchError::Transport(e) => {
                e.is_connect() || e.is_timeout() || e.is_request() || e.is_body()
            }
            _ => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("{0} is missing from the management URL")]
    MissingCredentials(&'static str),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("fetching queues failed after {attempts} attempt(s): {source}")]
    Fetch {
        attempts: u32,
        #[source]
        source: FetchError,
    },

    #[error("AMQP error: {0}")]
    Amqp(#[from] lapin::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn invalid_url(url: &str, reason: impl ToString) -> Error {
        Error::InvalidUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}
