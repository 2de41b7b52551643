//! Session-scoped capability flags for the filter endpoint
//!
//! Both flags start optimistic and only ever flip to `false`. The decision
//! table in [`Capabilities::on_filter_error`] is keyed on the structured error
//! variant, never on message text.

use super::error::RemoteError;
use std::sync::atomic::{AtomicBool, Ordering};

/// Point-in-time copy of the flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityFlags {
    pub supports_offset_pagination: bool,
    pub supports_filter_endpoint: bool,
}

impl Default for CapabilityFlags {
    fn default() -> Self {
        Self {
            supports_offset_pagination: true,
            supports_filter_endpoint: true,
        }
    }
}

/// How to continue after the filter endpoint failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterRecovery {
    /// Offset was rejected: call again once without it.
    RetryWithoutOffset,
    /// Endpoint is gone: scan the table directly.
    UseDirectTable,
    /// Nothing to fall back to.
    Abandon,
}

#[derive(Debug)]
pub struct Capabilities {
    offset_pagination: AtomicBool,
    filter_endpoint: AtomicBool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::new()
    }
}

impl Capabilities {
    pub fn new() -> Self {
        Self {
            offset_pagination: AtomicBool::new(true),
            filter_endpoint: AtomicBool::new(true),
        }
    }

    pub fn supports_offset_pagination(&self) -> bool {
        self.offset_pagination.load(Ordering::Relaxed)
    }

    pub fn supports_filter_endpoint(&self) -> bool {
        self.filter_endpoint.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> CapabilityFlags {
        CapabilityFlags {
            supports_offset_pagination: self.supports_offset_pagination(),
            supports_filter_endpoint: self.supports_filter_endpoint(),
        }
    }

    /// Reset to the optimistic defaults (new session).
    pub fn reset(&self) {
        self.offset_pagination.store(true, Ordering::Relaxed);
        self.filter_endpoint.store(true, Ordering::Relaxed);
    }

    /// Record a filter-endpoint failure and decide what to do next.
    ///
    /// | error                  | offset sent | effect                     | next               |
    /// |------------------------|-------------|----------------------------|--------------------|
    /// | `UnsupportedParameter` | yes         | offset pagination disabled | retry w/o offset   |
    /// | `EndpointMissing`      | any         | filter endpoint disabled   | direct table scan  |
    /// | anything else          | any         | none                       | abandon            |
    pub fn on_filter_error(&self, error: &RemoteError, offset_sent: bool) -> FilterRecovery {
        match error {
            RemoteError::UnsupportedParameter { parameter } if offset_sent => {
                if self.offset_pagination.swap(false, Ordering::Relaxed) {
                    tracing::info!(parameter = %parameter, "filter endpoint rejects offsets; first page only for this session");
                }
                FilterRecovery::RetryWithoutOffset
            }
            RemoteError::EndpointMissing { endpoint } => {
                if self.filter_endpoint.swap(false, Ordering::Relaxed) {
                    tracing::warn!(endpoint = %endpoint, "filter endpoint missing; using direct table scan for this session");
                }
                FilterRecovery::UseDirectTable
            }
            _ => FilterRecovery::Abandon,
        }
    }
}
