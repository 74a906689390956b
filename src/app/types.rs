use std::time::Duration;

use clap::Parser;
use serde::Deserialize;

use super::error::FetchError;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:10000/";
pub const DEFAULT_SEARCH_PROVIDER_URL: &str = "https://www.google.com/search?q=";
pub const UPDATED_PLACEHOLDER: &str = "Updated: checking...";
pub const NO_UPDATE_TIMESTAMP: &str = "No update timestamp is available.";

const MIN_DEBOUNCE_MS: u64 = 10;
const MAX_DEBOUNCE_MS: u64 = 5_000;
const MIN_TIMEOUT_MS: u64 = 100;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "pastpath",
    version,
    about = "Search-as-you-type terminal client for a PastPath browser history server"
)]
pub struct Cli {
    #[arg(
        long,
        env = "PASTPATH_SERVER",
        value_name = "URL",
        default_value = DEFAULT_SERVER_URL
    )]
    pub server: String,

    #[arg(long, value_name = "URL", default_value = DEFAULT_SEARCH_PROVIDER_URL)]
    pub provider: String,

    #[arg(long, value_name = "MS", default_value_t = 250)]
    pub debounce_ms: u64,

    #[arg(long, value_name = "MS", default_value_t = 5_000)]
    pub timeout_ms: u64,

    #[arg(short, long, value_name = "TEXT")]
    pub query: Option<String>,

    #[arg(long, value_name = "FILE")]
    pub log_file: Option<String>,

    #[arg(long, default_value_t = false)]
    pub no_tui: bool,
}

impl Cli {
    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(sanitize_debounce_ms(self.debounce_ms))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.max(MIN_TIMEOUT_MS))
    }
}

fn sanitize_debounce_ms(value: u64) -> u64 {
    value.clamp(MIN_DEBOUNCE_MS, MAX_DEBOUNCE_MS)
}

/// One history entry as returned by `GET /search`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub visit_count: u64,
    pub last_visit_time: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdateInfo {
    #[serde(default)]
    pub last_timestamp: Option<i64>,
    #[serde(default)]
    pub build_version: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub seq: u64,
    pub term: String,
}

#[derive(Debug)]
pub enum WidgetEvent {
    SearchResults {
        seq: u64,
        results: Vec<SearchResult>,
    },
    SearchFailed {
        seq: u64,
        error: FetchError,
    },
    LastUpdated(UpdateInfo),
    LastUpdatedFailed(FetchError),
}
