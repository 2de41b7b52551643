//! The browse/search list
//!
//! Remote mode asks the gateway for pages; local mode filters what remote
//! mode already loaded and never touches the network. Every remote fetch is
//! issued as a [`FetchRequest`] stamped with a generation; a response whose
//! generation is no longer the latest is dropped on arrival.

use super::rate_limit::RateLimiter;
use super::validate::{sanitize_input, validate_search_input, InvalidSearch};
use crate::clock::Clock;
use crate::filter::Criteria;
use crate::gateway::{Gateway, GatewayError, GatewayResult, Page};
use crate::model::{Instruction, InstructionId, LabelCatalog};
use crate::notify::{Notifier, Toast};
use crate::storage::StorageAdapter;
use serde_json::Value;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use thiserror::Error;

pub const SEARCH_QUERY_KEY: &str = "instructionSearch";
pub const SELECTED_TAGS_KEY: &str = "selectedTags";
pub const SELECTED_CATEGORIES_KEY: &str = "selectedCategories";

pub const DEFAULT_PAGE_SIZE: usize = 20;

pub const RATE_LIMITED_TITLE: &str = "Rate limit exceeded";
pub const INVALID_SEARCH_TITLE: &str = "Invalid search";
pub const LOAD_FAILED_TITLE: &str = "Failed to load instructions";

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("local search is available once instructions have loaded")]
    LocalModeUnavailable,

    #[error(transparent)]
    InvalidInput(#[from] InvalidSearch),

    #[error("rate limit exceeded, {remaining} requests remaining")]
    RateLimited { remaining: usize },

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    #[default]
    Remote,
    Local,
}

/// What the user has asked for.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchState {
    pub query: String,
    pub selected_tag_ids: BTreeSet<i64>,
    pub selected_category_ids: BTreeSet<i64>,
    pub mode: SearchMode,
    /// Zero-based page; only meaningful in remote mode.
    pub page: usize,
}

impl SearchState {
    pub fn is_filtered(&self) -> bool {
        !self.query.trim().is_empty()
            || !self.selected_tag_ids.is_empty()
            || !self.selected_category_ids.is_empty()
    }
}

/// One issued remote fetch.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    generation: u64,
    criteria: Criteria,
    page: usize,
    page_size: usize,
}

impl FetchRequest {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Perform the fetch. Asks for one extra row to learn whether more exist.
    pub async fn run(self, gateway: &Gateway) -> FetchResponse {
        let limit = self.page_size + 1;
        let result = if self.criteria.is_unfiltered() {
            gateway.fetch_random_batch(limit).await
        } else {
            gateway
                .fetch_filtered(&self.criteria, limit, self.page * self.page_size)
                .await
        };

        let result = result.map(|items| {
            let mut page = Page::from_overfetch(items, self.page_size);
            // The filter endpoint can't page once it rejected offsets.
            let caps = gateway.capabilities();
            if !self.criteria.is_unfiltered()
                && caps.supports_filter_endpoint()
                && !caps.supports_offset_pagination()
            {
                page.has_more = false;
            }
            page
        });

        FetchResponse {
            request: self,
            result,
        }
    }
}

#[derive(Debug)]
pub struct FetchResponse {
    request: FetchRequest,
    result: GatewayResult<Page>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Results were updated; `added` new items are on screen.
    Applied { added: usize },
    /// A newer request was issued meanwhile; the response was dropped.
    Stale,
}

pub struct SearchOrchestrator {
    gateway: Arc<Gateway>,
    storage: Arc<StorageAdapter>,
    notifier: Arc<dyn Notifier>,
    limiter: RateLimiter,
    session_key: String,
    page_size: usize,

    state: SearchState,
    tags: LabelCatalog,
    categories: LabelCatalog,

    results: Vec<Instruction>,
    has_more: bool,
    has_loaded_instructions: bool,
    last_error: Option<GatewayError>,
    generation: u64,
}

impl SearchOrchestrator {
    pub fn new(
        gateway: Arc<Gateway>,
        storage: Arc<StorageAdapter>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            gateway,
            storage,
            notifier,
            limiter: RateLimiter::default(),
            session_key: uuid::Uuid::new_v4().to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            state: SearchState::default(),
            tags: LabelCatalog::default(),
            categories: LabelCatalog::default(),
            results: Vec::new(),
            has_more: false,
            has_loaded_instructions: false,
            last_error: None,
            generation: 0,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    /// Load the tag and category catalogs, restore saved criteria, fetch page 0.
    pub async fn start(&mut self) -> Result<FetchOutcome, SearchError> {
        match self.gateway.list_tags().await {
            Ok(tags) => self.tags = LabelCatalog::new(tags),
            Err(e) => tracing::error!(error = %e, "error loading tags"),
        }
        match self.gateway.list_categories().await {
            Ok(categories) => self.categories = LabelCatalog::new(categories),
            Err(e) => tracing::error!(error = %e, "error loading categories"),
        }
        self.restore();
        self.reload().await
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn tags(&self) -> &LabelCatalog {
        &self.tags
    }

    pub fn categories(&self) -> &LabelCatalog {
        &self.categories
    }

    pub fn has_more(&self) -> bool {
        self.state.mode == SearchMode::Remote && self.has_more
    }

    /// Raised by the first non-empty successful result; never lowered.
    pub fn has_loaded_instructions(&self) -> bool {
        self.has_loaded_instructions
    }

    pub fn last_error(&self) -> Option<&GatewayError> {
        self.last_error.as_ref()
    }

    /// Current criteria with selected ids resolved to names.
    pub fn criteria(&self) -> Criteria {
        Criteria::new(
            self.state.query.clone(),
            self.tags.names_for(&self.state.selected_tag_ids),
            self.categories.names_for(&self.state.selected_category_ids),
        )
    }

    /// What the list shows right now.
    pub fn visible(&self) -> Vec<Instruction> {
        match self.state.mode {
            SearchMode::Remote => self.results.clone(),
            SearchMode::Local => self.criteria().apply(&self.results),
        }
    }

    /// Change the text query; rejected terms leave everything as it was.
    pub async fn set_query(&mut self, raw: &str) -> Result<FetchOutcome, SearchError> {
        let now = self.storage.clock().now();
        if self.limiter.is_rate_limited(&self.session_key, now) {
            let remaining = self.limiter.remaining(&self.session_key, now);
            self.notifier.notify(Toast::destructive(
                RATE_LIMITED_TITLE,
                format!(
                    "Please wait before searching again. {} requests remaining.",
                    remaining
                ),
            ));
            return Err(SearchError::RateLimited { remaining });
        }

        if let Err(invalid) = validate_search_input(raw) {
            self.notifier
                .notify(Toast::destructive(INVALID_SEARCH_TITLE, invalid.to_string()));
            return Err(invalid.into());
        }

        self.state.query = sanitize_input(raw);
        self.storage
            .set(SEARCH_QUERY_KEY, Value::from(self.state.query.clone()));
        self.criteria_changed().await
    }

    pub async fn toggle_tag(&mut self, id: i64) -> Result<FetchOutcome, SearchError> {
        toggle(&mut self.state.selected_tag_ids, id);
        self.persist_selection();
        self.criteria_changed().await
    }

    pub async fn toggle_category(&mut self, id: i64) -> Result<FetchOutcome, SearchError> {
        toggle(&mut self.state.selected_category_ids, id);
        self.persist_selection();
        self.criteria_changed().await
    }

    /// Replace both label selections at once.
    pub async fn set_selection(
        &mut self,
        tag_ids: BTreeSet<i64>,
        category_ids: BTreeSet<i64>,
    ) -> Result<FetchOutcome, SearchError> {
        self.state.selected_tag_ids = tag_ids;
        self.state.selected_category_ids = category_ids;
        self.persist_selection();
        self.criteria_changed().await
    }

    /// Empty query, no tags, no categories.
    pub async fn clear_filters(&mut self) -> Result<FetchOutcome, SearchError> {
        self.state.query.clear();
        self.state.selected_tag_ids.clear();
        self.state.selected_category_ids.clear();
        for key in [SEARCH_QUERY_KEY, SELECTED_TAGS_KEY, SELECTED_CATEGORIES_KEY] {
            self.storage.remove(key);
        }
        self.criteria_changed().await
    }

    /// Switch between remote and local filtering.
    ///
    /// Local needs a working set, so it is refused until something loaded.
    /// Going back to remote refetches for the current criteria.
    pub async fn set_mode(&mut self, mode: SearchMode) -> Result<FetchOutcome, SearchError> {
        if mode == self.state.mode {
            return Ok(FetchOutcome::Applied { added: 0 });
        }
        match mode {
            SearchMode::Local if !self.has_loaded_instructions => {
                Err(SearchError::LocalModeUnavailable)
            }
            SearchMode::Local => {
                self.state.mode = mode;
                Ok(FetchOutcome::Applied { added: 0 })
            }
            SearchMode::Remote => {
                self.state.mode = mode;
                self.reload().await
            }
        }
    }

    /// Fetch the next page and append unseen items. No-op in local mode.
    pub async fn load_more(&mut self) -> Result<FetchOutcome, SearchError> {
        if self.state.mode == SearchMode::Local || !self.has_more {
            return Ok(FetchOutcome::Applied { added: 0 });
        }
        self.state.page += 1;
        let request = self.begin_fetch();
        let response = request.run(&self.gateway).await;
        self.complete(response)
    }

    /// Refetch page 0 for the current criteria.
    ///
    /// Results are replaced only when the fetch succeeds.
    pub async fn reload(&mut self) -> Result<FetchOutcome, SearchError> {
        self.state.page = 0;
        let request = self.begin_fetch();
        let response = request.run(&self.gateway).await;
        self.complete(response)
    }

    /// Issue a fetch for the current page, superseding any in flight.
    pub fn begin_fetch(&mut self) -> FetchRequest {
        self.generation += 1;
        FetchRequest {
            generation: self.generation,
            criteria: self.criteria(),
            page: self.state.page,
            page_size: self.page_size,
        }
    }

    /// Apply a response unless a newer request has been issued since.
    pub fn complete(&mut self, response: FetchResponse) -> Result<FetchOutcome, SearchError> {
        let FetchResponse { request, result } = response;
        if request.generation != self.generation {
            tracing::debug!(
                generation = request.generation,
                latest = self.generation,
                "discarding stale search response"
            );
            return Ok(FetchOutcome::Stale);
        }

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                tracing::error!(error = %e, "error fetching instructions");
                self.notifier
                    .notify(Toast::destructive(LOAD_FAILED_TITLE, "Please try again."));
                self.last_error = Some(e.clone());
                if request.page > 0 {
                    self.state.page = request.page - 1;
                }
                return Err(e.into());
            }
        };

        self.last_error = None;
        self.has_more = page.has_more;

        let added = if request.page == 0 {
            self.results = page.items;
            self.results.len()
        } else {
            let seen: HashSet<InstructionId> = self.results.iter().map(|i| i.id).collect();
            let before = self.results.len();
            self.results
                .extend(page.items.into_iter().filter(|i| !seen.contains(&i.id)));
            self.results.len() - before
        };

        if !self.results.is_empty() {
            self.has_loaded_instructions = true;
        }
        Ok(FetchOutcome::Applied { added })
    }

    async fn criteria_changed(&mut self) -> Result<FetchOutcome, SearchError> {
        match self.state.mode {
            SearchMode::Remote => self.reload().await,
            SearchMode::Local => Ok(FetchOutcome::Applied { added: 0 }),
        }
    }

    fn persist_selection(&self) {
        self.storage.set(
            SELECTED_TAGS_KEY,
            Value::from_iter(self.state.selected_tag_ids.iter().copied()),
        );
        self.storage.set(
            SELECTED_CATEGORIES_KEY,
            Value::from_iter(self.state.selected_category_ids.iter().copied()),
        );
    }

    fn restore(&mut self) {
        if let Some(query) = self.storage.get(SEARCH_QUERY_KEY).as_ref().and_then(Value::as_str) {
            if validate_search_input(query).is_ok() {
                self.state.query = sanitize_input(query);
            }
        }
        self.state.selected_tag_ids = stored_ids(self.storage.get(SELECTED_TAGS_KEY));
        self.state.selected_category_ids = stored_ids(self.storage.get(SELECTED_CATEGORIES_KEY));
    }
}

fn toggle(set: &mut BTreeSet<i64>, id: i64) {
    if !set.remove(&id) {
        set.insert(id);
    }
}

fn stored_ids(value: Option<Value>) -> BTreeSet<i64> {
    value
        .as_ref()
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_i64).collect())
        .unwrap_or_default()
}
