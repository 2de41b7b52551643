//! Remote data gateway
//!
//! Normalizes every response into [`Instruction`]s and hides the filter
//! endpoint's capability probing: an offset the endpoint doesn't know costs one
//! retry and pagination for the session; a missing endpoint moves the session
//! onto a direct table scan with client-side matching.

mod capabilities;
mod error;
mod mock;
mod pattern;
mod postgrest;
mod remote;
mod rows;

pub use capabilities::{Capabilities, CapabilityFlags, FilterRecovery};
pub use error::{GatewayError, GatewayResult, RemoteError};
pub use mock::{MockRemote, RemoteCall, RemoteOp};
pub use pattern::{contains_pattern, escape_like, ilike_matches};
pub use postgrest::{classify_error, parse_content_range_total, PostgrestClient, PostgrestConfig};
pub use remote::{
    RemoteService, ScanRequest, SearchParams, FILTER_ENDPOINT, OFFSET_PARAMETER, RANDOM_ENDPOINT,
};
pub use rows::{normalize_rpc, normalize_table, RpcRow, TableRow, TABLE_ROW_SELECT};

use crate::filter::Criteria;
use crate::model::{Instruction, InstructionId, Label};
use std::sync::Arc;

/// Rows fetched per request when scanning the table directly.
pub const SCAN_CHUNK: usize = 200;

/// Normalized instructions plus the number of rows the service returned.
///
/// Rows with blank text are dropped during normalization, so `rows` can exceed
/// `items.len()`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Batch {
    pub items: Vec<Instruction>,
    pub rows: usize,
}

impl Batch {
    fn from_rpc(rows: Vec<RpcRow>) -> Self {
        let count = rows.len();
        Self {
            items: normalize_rpc(rows),
            rows: count,
        }
    }

    fn matched(items: Vec<Instruction>) -> Self {
        Self {
            rows: items.len(),
            items,
        }
    }

    pub fn into_items(self) -> Vec<Instruction> {
        self.items
    }
}

impl std::ops::Deref for Batch {
    type Target = [Instruction];

    fn deref(&self) -> &Self::Target {
        &self.items
    }
}

/// A display page computed from an over-fetch of one extra row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Page {
    pub items: Vec<Instruction>,
    pub has_more: bool,
}

impl Page {
    /// Keep the first `display` items; more exist iff the service returned
    /// more than `display` rows, blank ones included.
    pub fn from_overfetch(batch: Batch, display: usize) -> Self {
        let has_more = batch.rows > display;
        let mut items = batch.items;
        items.truncate(display);
        Self { items, has_more }
    }
}

/// Session-scoped entry point to the instruction service.
pub struct Gateway {
    remote: Arc<dyn RemoteService>,
    capabilities: Capabilities,
}

impl Gateway {
    pub fn new(remote: Arc<dyn RemoteService>) -> Self {
        Self {
            remote,
            capabilities: Capabilities::new(),
        }
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// One instruction; `Ok(None)` when no row has this id.
    pub async fn fetch_by_id(&self, id: InstructionId) -> GatewayResult<Option<Instruction>> {
        match self.remote.get_instruction(id.get()).await {
            Ok(row) => Ok(row.into_instruction()),
            Err(RemoteError::NotFound) => {
                tracing::debug!(%id, "instruction not found");
                Ok(None)
            }
            Err(e) => {
                tracing::error!(%id, error = %e, "error fetching specific instruction");
                Err(e.into())
            }
        }
    }

    /// Up to `limit` instructions in unspecified order.
    pub async fn fetch_random_batch(&self, limit: usize) -> GatewayResult<Batch> {
        let rows = self.remote.random_instructions(limit).await.map_err(|e| {
            tracing::error!(limit, error = %e, "error fetching random instructions");
            GatewayError::from(e)
        })?;
        Ok(Batch::from_rpc(rows))
    }

    /// Instructions matching `criteria`, skipping `offset` matches.
    pub async fn fetch_filtered(
        &self,
        criteria: &Criteria,
        limit: usize,
        offset: usize,
    ) -> GatewayResult<Batch> {
        if self.capabilities.supports_filter_endpoint() {
            if let Some(found) = self.filter_via_endpoint(criteria, limit, offset).await? {
                return Ok(found);
            }
        }
        self.filter_via_table(criteria, limit, offset).await
    }

    /// `Ok(None)` means the endpoint is gone and the caller should scan.
    async fn filter_via_endpoint(
        &self,
        criteria: &Criteria,
        limit: usize,
        offset: usize,
    ) -> GatewayResult<Option<Batch>> {
        let paginate = self.capabilities.supports_offset_pagination();
        if !paginate && offset > 0 {
            // First page only once offsets are known to be unsupported.
            return Ok(Some(Batch::default()));
        }

        let mut params = SearchParams {
            search_term: criteria.text.clone(),
            tag_filters: criteria.tags.clone(),
            category_filters: criteria.categories.clone(),
            result_limit: limit,
            result_offset: paginate.then_some(offset),
        };

        let mut retried = false;
        loop {
            let error = match self.remote.search_instructions(&params).await {
                Ok(rows) => {
                    // The retry drops the offset, so anything past page one is empty.
                    let rows = if retried && offset > 0 { Vec::new() } else { rows };
                    return Ok(Some(Batch::from_rpc(rows)));
                }
                Err(e) => e,
            };

            match self
                .capabilities
                .on_filter_error(&error, params.result_offset.is_some())
            {
                FilterRecovery::RetryWithoutOffset if !retried => {
                    retried = true;
                    params.result_offset = None;
                }
                FilterRecovery::UseDirectTable => return Ok(None),
                _ => {
                    tracing::error!(error = %error, "filter endpoint failed");
                    return Err(error.into());
                }
            }
        }
    }

    /// Page through the raw table, matching on the client.
    async fn filter_via_table(
        &self,
        criteria: &Criteria,
        limit: usize,
        offset: usize,
    ) -> GatewayResult<Batch> {
        let wanted = offset + limit;
        let text_pattern = (!criteria.text.is_empty()).then(|| contains_pattern(&criteria.text));
        let mut matched = Vec::new();
        let mut cursor = 0;

        loop {
            let request = ScanRequest {
                text_pattern: text_pattern.clone(),
                offset: cursor,
                limit: SCAN_CHUNK,
            };
            let rows = self.remote.scan_instructions(&request).await.map_err(|e| {
                tracing::error!(error = %e, "direct table scan failed");
                GatewayError::from(e)
            })?;
            let fetched = rows.len();
            cursor += fetched;

            matched.extend(
                normalize_table(rows)
                    .into_iter()
                    .filter(|i| criteria.matches(i)),
            );

            if matched.len() >= wanted || fetched < SCAN_CHUNK {
                break;
            }
        }

        Ok(Batch::matched(
            matched.into_iter().skip(offset).take(limit).collect(),
        ))
    }

    pub async fn list_tags(&self) -> GatewayResult<Vec<Label>> {
        Ok(self.remote.list_tags().await?)
    }

    pub async fn list_categories(&self) -> GatewayResult<Vec<Label>> {
        Ok(self.remote.list_categories().await?)
    }

    pub async fn count_instructions(&self) -> GatewayResult<u64> {
        Ok(self.remote.count_instructions().await?)
    }
}
