use std::collections::VecDeque;
use std::time::{Duration, Instant};

use chrono::Local;
use tracing::{debug, info, warn};

use super::debounce::Debouncer;
use super::navigation::{Activation, Selection, web_search_url};
use super::types::{SearchRequest, SearchResult, UPDATED_PLACEHOLDER, WidgetEvent};
use super::ui_utils::format_update_line;

const MAX_ERRORS: usize = 5;

/// All state behind the search box: input, results, selection and the
/// pending debounced request. Owned by the draw loop.
#[derive(Debug)]
pub struct SearchWidget {
    input: String,
    results: Vec<SearchResult>,
    selection: Selection,
    debouncer: Debouncer<String>,
    generation: u64,
    awaiting: Option<u64>,
    provider: String,
    updated_line: String,
    errors: VecDeque<String>,
}

impl SearchWidget {
    pub fn new(provider: impl Into<String>, debounce_delay: Duration) -> Self {
        Self {
            input: String::new(),
            results: Vec::new(),
            selection: Selection::Unselected,
            debouncer: Debouncer::new(debounce_delay),
            generation: 0,
            awaiting: None,
            provider: provider.into(),
            updated_line: UPDATED_PLACEHOLDER.to_string(),
            errors: VecDeque::new(),
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }

    pub fn results_visible(&self) -> bool {
        !self.results.is_empty()
    }

    pub fn selection(&self) -> Selection {
        self.selection.normalize(self.results.len())
    }

    pub fn is_searching(&self) -> bool {
        self.awaiting.is_some() || self.debouncer.is_pending()
    }

    pub fn updated_line(&self) -> &str {
        &self.updated_line
    }

    pub fn errors(&self) -> impl Iterator<Item = &str> {
        self.errors.iter().map(String::as_str)
    }

    pub fn set_input(&mut self, text: impl Into<String>, now: Instant) {
        self.input = text.into();
        self.input_changed(now);
    }

    pub fn push_char(&mut self, ch: char, now: Instant) {
        self.input.push(ch);
        self.input_changed(now);
    }

    pub fn pop_char(&mut self, now: Instant) {
        if self.input.pop().is_some() {
            self.input_changed(now);
        }
    }

    pub fn clear_input(&mut self, now: Instant) {
        if !self.input.is_empty() {
            self.input.clear();
            self.input_changed(now);
        }
    }

    fn input_changed(&mut self, now: Instant) {
        if self.input.trim().is_empty() {
            // Bumping the generation drops whatever response is still in flight.
            self.debouncer.cancel();
            self.generation += 1;
            self.awaiting = None;
            self.results.clear();
            self.selection = Selection::Unselected;
            return;
        }
        self.debouncer.schedule(self.input.clone(), now);
    }

    /// Returns the search to dispatch once the input has been quiet long enough.
    pub fn poll_search(&mut self, now: Instant) -> Option<SearchRequest> {
        let term = self.debouncer.poll(now)?;
        self.generation += 1;
        self.awaiting = Some(self.generation);
        debug!(seq = self.generation, %term, "dispatching search");
        Some(SearchRequest {
            seq: self.generation,
            term,
        })
    }

    pub fn time_until_search(&self, now: Instant) -> Option<Duration> {
        self.debouncer.remaining(now)
    }

    pub fn apply(&mut self, event: WidgetEvent) {
        match event {
            WidgetEvent::SearchResults { seq, results } => {
                if seq != self.generation {
                    debug!(seq, latest = self.generation, "discarding stale search response");
                    return;
                }
                self.awaiting = None;
                self.results = results;
                self.selection = Selection::Unselected;
                self.errors.clear();
            }
            WidgetEvent::SearchFailed { seq, error } => {
                warn!(seq, timeout = error.is_timeout(), "error fetching search results: {error}");
                if seq == self.generation {
                    self.awaiting = None;
                    self.push_error(format!("search failed: {error}"));
                }
            }
            WidgetEvent::LastUpdated(info) => {
                self.updated_line = format_update_line(&info, &Local);
                info!(version = %info.build_version, "loaded last-updated info");
            }
            WidgetEvent::LastUpdatedFailed(error) => {
                warn!("error fetching last updated info: {error}");
            }
        }
    }

    pub fn move_down(&mut self) {
        self.selection = self.selection.down(self.results.len());
    }

    pub fn move_up(&mut self) {
        self.selection = self.selection.up(self.results.len());
    }

    pub fn unselect(&mut self) {
        self.selection = Selection::Unselected;
    }

    pub fn activate(&self) -> Activation {
        match self.selection() {
            Selection::Selected(idx) => Activation::OpenResult(self.results[idx].url.clone()),
            Selection::Unselected if self.input.trim().is_empty() => Activation::Nothing,
            Selection::Unselected => {
                Activation::WebSearch(web_search_url(&self.provider, &self.input))
            }
        }
    }

    /// Selects and activates a rendered item, e.g. after a mouse click.
    pub fn activate_index(&mut self, idx: usize) -> Activation {
        if idx >= self.results.len() {
            return Activation::Nothing;
        }
        self.selection = Selection::Selected(idx);
        self.activate()
    }

    pub fn push_error(&mut self, error: String) {
        self.errors.push_front(error);
        while self.errors.len() > MAX_ERRORS {
            self.errors.pop_back();
        }
    }
}
