use reqwest::header::{ACCEPT, HeaderValue};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::error::{Error, FetchError};
use crate::retry::{retry, Exhausted, RetryPolicy};
use crate::settings::{Credentials, ManagementEndpoint};

/// One element of `GET /api/queues`. Everything but the name is ignored.
#[derive(Debug, Deserialize)]
struct QueueDescriptor {
    name: String,
}

pub struct QueueLister {
    client: reqwest::Client,
    url: Url,
    credentials: Credentials,
}

impl QueueLister {
    /// Compression is left off and the client speaks HTTP/1.1 only: chunked
    /// gzip bodies from the management plugin were seen to arrive truncated.
    pub fn new(
        endpoint: &ManagementEndpoint,
        vhost: Option<&str>,
        timeout: Duration,
    ) -> Result<QueueLister, Error> {
        let client = reqwest::Client::builder()
            .http1_only()
            .no_gzip()
            .timeout(timeout)
            .build()
            .map_err(Error::HttpClient)?;

        Ok(QueueLister {
            client,
            url: queues_url(&endpoint.url, vhost)?,
            credentials: endpoint.credentials.clone(),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub async fn list_queue_names(&self, policy: &RetryPolicy) -> Result<Vec<String>, Error> {
        let names = retry(policy, |attempt| {
            debug!(attempt, url = %self.url, "requesting queue list");
            self.fetch_once()
        })
        .await
        .map_err(|Exhausted { attempts, error }| Error::Fetch {
            attempts,
            source: error,
        })?;

        info!(count = names.len(), "fetched queue list");
        Ok(names)
    }

    async fn fetch_once(&self) -> Result<Vec<String>, FetchError> {
        let response = self
            .client
            .get(self.url.clone())
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                url: self.url.to_string(),
            });
        }

        let body = response.bytes().await?;
        parse_queue_names(&body)
    }
}

/// `{api}/queues`, or `{api}/queues/{vhost}?columns=name` when scoped to a
/// vhost. The vhost is a single path segment, so `/` becomes `%2F`.
pub fn queues_url(api: &Url, vhost: Option<&str>) -> Result<Url, Error> {
    let mut url = api.clone();
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| Error::invalid_url(api.as_str(), "cannot be a base"))?;
        segments.pop_if_empty().push("queues");
        if let Some(vhost) = vhost {
            segments.push(vhost);
        }
    }
    if vhost.is_some() {
        url.query_pairs_mut().append_pair("columns", "name");
    }
    Ok(url)
}

pub fn parse_queue_names(body: &[u8]) -> Result<Vec<String>, FetchError> {
    let entries: Vec<serde_json::Value> = serde_json::from_slice(body)?;

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            serde_json::from_value::<QueueDescriptor>(entry)
                .map(|queue| queue.name)
                .map_err(|_| FetchError::MissingName { index })
        })
        .collect()
}
