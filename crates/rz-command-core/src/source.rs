//! Remote candidate loading.
//!
//! Fetches run as tokio tasks and report back over a channel, tagged with a
//! sequence number. The owner applies only the outcome of the latest request.

use crate::{Error, Result};
use rz_command_types::CandidateSpec;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::debug;

/// Request timeout for [`HttpSource`]
const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// Something that can produce candidates for an optional query.
pub trait ItemSource: Send + Sync + 'static {
    /// Load candidates. `query` is `Some` only under server filtering with a
    /// non-empty query.
    fn fetch(
        &self,
        query: Option<String>,
    ) -> impl Future<Output = Result<Vec<CandidateSpec>>> + Send;
}

/// `GET {url}[?{param}={query}]`, expecting a JSON array of candidates.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    url: reqwest::Url,
    query_param: String,
}

impl HttpSource {
    /// # Errors
    ///
    /// Returns an error if the URL does not parse or the client cannot be built.
    pub fn new(url: &str, query_param: impl Into<String>) -> Result<Self> {
        let url = reqwest::Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{url}: {e}")))?;
        let client = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            client,
            url,
            query_param: query_param.into(),
        })
    }

    #[must_use]
    pub fn url(&self) -> &reqwest::Url {
        &self.url
    }

    /// URL for a request, with the query parameter appended when present
    #[must_use]
    pub fn request_url(&self, query: Option<&str>) -> reqwest::Url {
        let mut url = self.url.clone();
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            url.query_pairs_mut().append_pair(&self.query_param, query);
        }
        url
    }
}

impl ItemSource for HttpSource {
    fn fetch(
        &self,
        query: Option<String>,
    ) -> impl Future<Output = Result<Vec<CandidateSpec>>> + Send {
        let client = self.client.clone();
        let url = self.request_url(query.as_deref());

        async move {
            debug!("Fetching items from {}", url);
            let response = client.get(url.clone()).send().await?;

            let status = response.status();
            if !status.is_success() {
                return Err(Error::Status {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
            }

            let body = response.bytes().await?;
            let items: Vec<CandidateSpec> = serde_json::from_slice(&body)?;
            debug!("Fetched {} items from {}", items.len(), url);
            Ok(items)
        }
    }
}

/// Result of one fetch, tagged with the sequence number it was issued under
#[derive(Debug)]
pub struct FetchOutcome {
    pub seq: u64,
    pub result: Result<Vec<CandidateSpec>>,
}

/// Issues fetches, debounces query-driven ones and sequences their results.
pub(crate) struct FetchCoordinator<S: ItemSource> {
    source: Arc<S>,
    debounce: Duration,
    latest_seq: u64,
    pending: Option<u64>,
    debounce_task: Option<JoinHandle<()>>,
    outcome_tx: UnboundedSender<FetchOutcome>,
    outcome_rx: UnboundedReceiver<FetchOutcome>,
    fetched_once: bool,
    open_fetch_done: bool,
}

impl<S: ItemSource> FetchCoordinator<S> {
    pub fn new(source: Arc<S>, debounce: Duration) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        Self {
            source,
            debounce,
            latest_seq: 0,
            pending: None,
            debounce_task: None,
            outcome_tx,
            outcome_rx,
            fetched_once: false,
            open_fetch_done: false,
        }
    }

    /// A request whose outcome has not been applied yet
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// At least one fetch has been applied successfully
    pub fn has_fetched(&self) -> bool {
        self.fetched_once
    }

    /// Consume the one-shot on-open trigger. Returns false once used.
    pub fn take_open_trigger(&mut self) -> bool {
        !std::mem::replace(&mut self.open_fetch_done, true)
    }

    /// Start a fetch now. Must be called inside a tokio runtime.
    pub fn fetch_now(&mut self, query: Option<String>) -> u64 {
        self.cancel_debounce();
        let seq = self.next_seq();
        let source = Arc::clone(&self.source);
        let tx = self.outcome_tx.clone();

        tokio::spawn(async move {
            let result = source.fetch(query).await;
            let _ = tx.send(FetchOutcome { seq, result });
        });
        seq
    }

    /// Restart the debounce timer for a query-driven fetch. A pending timer
    /// is cancelled; only the last call within the window fetches.
    pub fn fetch_debounced(&mut self, query: Option<String>) -> u64 {
        self.cancel_debounce();
        let seq = self.next_seq();
        let source = Arc::clone(&self.source);
        let tx = self.outcome_tx.clone();
        let delay = self.debounce;

        self.debounce_task = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let result = source.fetch(query).await;
            let _ = tx.send(FetchOutcome { seq, result });
        }));
        seq
    }

    /// Wait for the next outcome belonging to the latest request.
    /// Returns `None` when nothing is pending.
    pub async fn next_outcome(&mut self) -> Option<FetchOutcome> {
        while self.pending.is_some() {
            let outcome = self.outcome_rx.recv().await?;
            if let Some(outcome) = self.accept(outcome) {
                return Some(outcome);
            }
        }
        None
    }

    /// Non-blocking variant of [`Self::next_outcome`]
    pub fn try_next_outcome(&mut self) -> Option<FetchOutcome> {
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            if let Some(outcome) = self.accept(outcome) {
                return Some(outcome);
            }
        }
        None
    }

    fn accept(&mut self, outcome: FetchOutcome) -> Option<FetchOutcome> {
        if self.pending != Some(outcome.seq) {
            debug!(
                "Dropping stale fetch result {} (latest {})",
                outcome.seq, self.latest_seq
            );
            return None;
        }
        self.pending = None;
        self.debounce_task = None;
        if outcome.result.is_ok() {
            self.fetched_once = true;
        }
        Some(outcome)
    }

    fn next_seq(&mut self) -> u64 {
        self.latest_seq += 1;
        self.pending = Some(self.latest_seq);
        self.latest_seq
    }

    fn cancel_debounce(&mut self) {
        if let Some(task) = self.debounce_task.take()
            && !task.is_finished()
        {
            debug!("Cancelling pending debounced fetch");
            task.abort();
        }
    }
}

impl<S: ItemSource> Drop for FetchCoordinator<S> {
    fn drop(&mut self) {
        if let Some(task) = self.debounce_task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_url_appends_query() {
        let source = HttpSource::new("http://localhost:8080/items?kind=cmd", "q").unwrap();
        let url = source.request_url(Some("open file"));
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/items?kind=cmd&q=open+file"
        );
    }

    #[test]
    fn test_request_url_without_query() {
        let source = HttpSource::new("http://localhost/items", "search").unwrap();
        assert_eq!(source.request_url(None).as_str(), "http://localhost/items");
        assert_eq!(source.request_url(Some("")).as_str(), "http://localhost/items");
    }

    #[test]
    fn test_invalid_url() {
        let err = HttpSource::new("not a url", "q").unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }
}
