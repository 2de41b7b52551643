//! Once-a-day random pick
//!
//! The id of the last randomly fetched instruction and the time it was fetched
//! live in two cookies. Within 24 hours the same instruction is shown again;
//! afterwards, or when the user asks for a new one, a fresh random item is
//! fetched and the cookies are rewritten.

use crate::gateway::{Gateway, GatewayResult};
use crate::model::{Instruction, InstructionId};
use crate::storage::StorageAdapter;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

pub const DAILY_ID_COOKIE: &str = "dailyRandomId";
/// Epoch milliseconds of the last fresh random fetch.
pub const DAILY_TIMESTAMP_COOKIE: &str = "dailyRandomTimestamp";

const COOKIE_TTL_DAYS: i64 = 1;

/// Cookie-backed daily cache in front of the gateway's random endpoint.
pub struct DailyCache {
    storage: Arc<StorageAdapter>,
}

impl DailyCache {
    pub fn new(storage: Arc<StorageAdapter>) -> Self {
        Self { storage }
    }

    /// The cached id, if the cookies are present, parse, and are under a day old.
    pub fn cached_id(&self) -> Option<InstructionId> {
        let id = self.storage.get_cookie(DAILY_ID_COOKIE)?;
        let stamp = self.storage.get_cookie(DAILY_TIMESTAMP_COOKIE)?;

        let fetched_at = stamp
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis)?;
        if self.storage.clock().now() - fetched_at >= Duration::hours(24) {
            return None;
        }
        id.parse().ok()
    }

    /// Forget the cached pick.
    pub fn expire(&self) {
        self.storage.set_cookie(DAILY_ID_COOKIE, "", -1);
        self.storage.set_cookie(DAILY_TIMESTAMP_COOKIE, "", -1);
    }

    /// Today's instruction.
    ///
    /// Serves the cached id while valid. A cached id that no longer resolves,
    /// or fails to load, falls through to a fresh random fetch. `Ok(None)`
    /// only when the service returned no rows at all.
    pub async fn fetch(
        &self,
        gateway: &Gateway,
        force_refresh: bool,
    ) -> GatewayResult<Option<Instruction>> {
        if force_refresh {
            self.expire();
        } else if let Some(id) = self.cached_id() {
            match gateway.fetch_by_id(id).await {
                Ok(Some(instruction)) => return Ok(Some(instruction)),
                Ok(None) => tracing::debug!(%id, "cached daily instruction is gone"),
                Err(e) => tracing::warn!(%id, error = %e, "cached daily instruction failed to load"),
            }
        }

        let batch = gateway.fetch_random_batch(1).await?;
        let Some(instruction) = batch.into_items().into_iter().next() else {
            return Ok(None);
        };
        self.remember(instruction.id);
        Ok(Some(instruction))
    }

    fn remember(&self, id: InstructionId) {
        let now = self.storage.clock().now().timestamp_millis();
        self.storage
            .set_cookie(DAILY_ID_COOKIE, &id.to_string(), COOKIE_TTL_DAYS);
        self.storage
            .set_cookie(DAILY_TIMESTAMP_COOKIE, &now.to_string(), COOKIE_TTL_DAYS);
    }
}
