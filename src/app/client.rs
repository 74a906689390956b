use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};
use url::Url;

use super::error::FetchError;
use super::types::{SearchRequest, SearchResult, UpdateInfo, WidgetEvent};

/// The two endpoints the widget talks to.
pub trait SearchBackend: Send + Sync + 'static {
    fn search(
        &self,
        term: &str,
    ) -> impl Future<Output = Result<Vec<SearchResult>, FetchError>> + Send;

    fn last_updated(&self) -> impl Future<Output = Result<UpdateInfo, FetchError>> + Send;
}

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base: Url,
}

impl HttpBackend {
    pub fn new(server: &str, timeout: Duration) -> Result<Self, FetchError> {
        Self::with_client(server, client_builder(timeout).build()?)
    }

    pub fn with_client(server: &str, client: reqwest::Client) -> Result<Self, FetchError> {
        let mut base = Url::parse(server.trim())?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { client, base })
    }

    pub fn search_url(&self, term: &str) -> Result<Url, FetchError> {
        let mut url = self.base.join("search")?;
        url.query_pairs_mut().append_pair("term", term);
        Ok(url)
    }

    pub fn last_updated_url(&self) -> Result<Url, FetchError> {
        Ok(self.base.join("last-updated")?)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        debug!(%url, "GET");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn fetch_results(&self, term: &str) -> Result<Vec<SearchResult>, FetchError> {
        // Go encodes an empty slice as `null`.
        let results: Option<Vec<SearchResult>> = self.get_json(self.search_url(term)?).await?;
        Ok(results.unwrap_or_default())
    }

    async fn fetch_update_info(&self) -> Result<UpdateInfo, FetchError> {
        self.get_json(self.last_updated_url()?).await
    }
}

fn client_builder(timeout: Duration) -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("pastpath/", env!("CARGO_PKG_VERSION")))
}

impl SearchBackend for HttpBackend {
    fn search(
        &self,
        term: &str,
    ) -> impl Future<Output = Result<Vec<SearchResult>, FetchError>> + Send {
        self.fetch_results(term)
    }

    fn last_updated(&self) -> impl Future<Output = Result<UpdateInfo, FetchError>> + Send {
        self.fetch_update_info()
    }
}

pub fn spawn_search<B: SearchBackend>(
    backend: Arc<B>,
    request: SearchRequest,
    tx: UnboundedSender<WidgetEvent>,
) {
    tokio::spawn(async move {
        let SearchRequest { seq, term } = request;
        let event = match backend.search(&term).await {
            Ok(results) => {
                debug!(seq, %term, count = results.len(), "search completed");
                WidgetEvent::SearchResults { seq, results }
            }
            Err(error) => WidgetEvent::SearchFailed { seq, error },
        };
        if tx.send(event).is_err() {
            warn!(seq, "widget closed before search response was delivered");
        }
    });
}

pub fn spawn_last_updated<B: SearchBackend>(backend: Arc<B>, tx: UnboundedSender<WidgetEvent>) {
    tokio::spawn(async move {
        let event = match backend.last_updated().await {
            Ok(info) => WidgetEvent::LastUpdated(info),
            Err(error) => WidgetEvent::LastUpdatedFailed(error),
        };
        if tx.send(event).is_err() {
            warn!("widget closed before last-updated info was delivered");
        }
    });
}
