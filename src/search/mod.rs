//! List and search
//!
//! [`SearchOrchestrator`] drives the searchable list: criteria changes,
//! pagination, remote/local mode and stale-response handling. Input hygiene
//! and rate limiting sit in front of every query change.

mod orchestrator;
mod rate_limit;
mod validate;

pub use orchestrator::{
    FetchOutcome, FetchRequest, FetchResponse, SearchError, SearchMode, SearchOrchestrator,
    SearchState, DEFAULT_PAGE_SIZE, INVALID_SEARCH_TITLE, LOAD_FAILED_TITLE, RATE_LIMITED_TITLE,
    SEARCH_QUERY_KEY, SELECTED_CATEGORIES_KEY, SELECTED_TAGS_KEY,
};
pub use rate_limit::{RateLimiter, DEFAULT_MAX_REQUESTS};
pub use validate::{sanitize_input, validate_search_input, InvalidSearch, MAX_SEARCH_LENGTH};
