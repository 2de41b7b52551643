//! The remote data service contract

use super::error::RemoteError;
use super::rows::{RpcRow, TableRow};
use crate::model::Label;
use async_trait::async_trait;
use serde::Serialize;

/// Name of the server-side filter endpoint.
pub const FILTER_ENDPOINT: &str = "search_instructions_secure";
/// Name of the random-batch endpoint.
pub const RANDOM_ENDPOINT: &str = "get_random_instructions";
/// Parameter the filter endpoint may not know about.
pub const OFFSET_PARAMETER: &str = "result_offset";

/// Arguments of the filter endpoint. `result_offset` is omitted when `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchParams {
    pub search_term: String,
    pub tag_filters: Vec<String>,
    pub category_filters: Vec<String>,
    pub result_limit: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_offset: Option<usize>,
}

/// One page of a direct table read.
///
/// `text_pattern` is an `ILIKE` pattern the caller has already escaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub text_pattern: Option<String>,
    pub offset: usize,
    pub limit: usize,
}

/// Client trait for the hosted instruction database.
///
/// Abstracts over transport (PostgREST over HTTP, in-memory mock) so the
/// gateway doesn't depend on how the service is reached. Implementations
/// classify every failure into a [`RemoteError`] variant.
#[async_trait]
pub trait RemoteService: Send + Sync {
    /// Single instruction by id; `Err(RemoteError::NotFound)` when absent.
    async fn get_instruction(&self, id: i64) -> Result<TableRow, RemoteError>;

    /// Up to `limit` instructions in unspecified order.
    async fn random_instructions(&self, limit: usize) -> Result<Vec<RpcRow>, RemoteError>;

    /// The server-side filter endpoint.
    async fn search_instructions(&self, params: &SearchParams) -> Result<Vec<RpcRow>, RemoteError>;

    /// Page through the raw `instructions` table, ordered by id.
    async fn scan_instructions(&self, request: &ScanRequest) -> Result<Vec<TableRow>, RemoteError>;

    async fn list_tags(&self) -> Result<Vec<Label>, RemoteError>;

    async fn list_categories(&self) -> Result<Vec<Label>, RemoteError>;

    /// Exact number of instructions.
    async fn count_instructions(&self) -> Result<u64, RemoteError>;
}
