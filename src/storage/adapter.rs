//! Infallible storage facade with in-memory fallback
//!
//! Surfaces never see a storage error. The first key/value failure in a
//! session flips the adapter onto its own memory map for the rest of the
//! session and sends a single warning toast. Cookie failures are only logged;
//! cookies carry the daily-cache hint, not history.

use super::traits::{CookieStore, KeyValueStore, StorageError};
use crate::clock::{Clock, SystemClock};
use crate::notify::{Notifier, Toast};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const STORAGE_RESTRICTED_TITLE: &str = "Storage Access Restricted";
const STORAGE_RESTRICTED_DESCRIPTION: &str =
    "Your browser has restricted access to storage. History will not be saved after this session.";

pub struct StorageAdapter {
    values: Arc<dyn KeyValueStore>,
    cookies: Arc<dyn CookieStore>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    /// Owned per instance so independent sessions never share fallback state.
    fallback: DashMap<String, Value>,
    degraded: AtomicBool,
}

impl StorageAdapter {
    pub fn new(
        values: Arc<dyn KeyValueStore>,
        cookies: Arc<dyn CookieStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            values,
            cookies,
            notifier,
            clock: Arc::new(SystemClock),
            fallback: DashMap::new(),
            degraded: AtomicBool::new(false),
        }
    }

    /// One backend for both roles, e.g. a `SqliteStore`.
    pub fn with_store<S>(store: Arc<S>, notifier: Arc<dyn Notifier>) -> Self
    where
        S: KeyValueStore + CookieStore + 'static,
    {
        Self::new(store.clone(), store, notifier)
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Whether the session has fallen back to memory.
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Relaxed)
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        if !self.is_degraded() {
            match self.values.get(key) {
                Ok(value) => return value,
                Err(e) => self.degrade(&e),
            }
        }
        self.fallback.get(key).map(|v| v.clone())
    }

    pub fn set(&self, key: &str, value: Value) {
        if !self.is_degraded() {
            match self.values.set(key, &value) {
                Ok(()) => return,
                Err(e) => self.degrade(&e),
            }
        }
        self.fallback.insert(key.to_string(), value);
    }

    pub fn remove(&self, key: &str) {
        if !self.is_degraded() {
            match self.values.remove(key) {
                Ok(_) => return,
                Err(e) => self.degrade(&e),
            }
        }
        self.fallback.remove(key);
    }

    pub fn get_cookie(&self, name: &str) -> Option<String> {
        match self.cookies.get_cookie(name, self.clock.now()) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(cookie = name, error = %e, "cookie access failed");
                None
            }
        }
    }

    /// Write a cookie for `ttl_days`; a non-positive ttl expires it.
    ///
    /// A ttl outside the representable range saturates instead of overflowing.
    pub fn set_cookie(&self, name: &str, value: &str, ttl_days: i64) {
        let expires_at = Duration::try_days(ttl_days)
            .and_then(|ttl| self.clock.now().checked_add_signed(ttl))
            .unwrap_or(if ttl_days < 0 {
                DateTime::<Utc>::MIN_UTC
            } else {
                DateTime::<Utc>::MAX_UTC
            });
        if let Err(e) = self.cookies.set_cookie(name, value, expires_at) {
            tracing::warn!(cookie = name, error = %e, "cookie setting failed");
        }
    }

    fn degrade(&self, error: &StorageError) {
        tracing::warn!(error = %error, "storage failed, using memory fallback");
        if !self.degraded.swap(true, Ordering::Relaxed) {
            self.notifier.notify(Toast::destructive(
                STORAGE_RESTRICTED_TITLE,
                STORAGE_RESTRICTED_DESCRIPTION,
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::RecordingNotifier;
    use crate::storage::MemoryStore;
    use serde_json::json;

    fn adapter_over(store: Arc<MemoryStore>) -> (StorageAdapter, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::new());
        (StorageAdapter::with_store(store, notifier.clone()), notifier)
    }

    #[test]
    fn test_healthy_store_passes_through() {
        let store = Arc::new(MemoryStore::new());
        let (adapter, notifier) = adapter_over(store.clone());
        adapter.set("k", json!(1));
        assert_eq!(adapter.get("k"), Some(json!(1)));
        assert_eq!(store.len(), 1);
        assert!(!adapter.is_degraded());
        assert!(notifier.toasts().is_empty());
    }

    #[test]
    fn test_failure_falls_back_and_warns_once() {
        let store = Arc::new(MemoryStore::failing());
        let (adapter, notifier) = adapter_over(store);

        assert_eq!(adapter.get("instructionHistory"), None);
        adapter.set("instructionHistory", json!([{"id": 1, "text": "a"}]));
        adapter.set("instructionHistoryIndex", json!(0));

        assert!(adapter.is_degraded());
        assert_eq!(adapter.get("instructionHistoryIndex"), Some(json!(0)));
        assert_eq!(notifier.titles(), vec![STORAGE_RESTRICTED_TITLE]);
    }

    #[test]
    fn test_fallback_sticks_after_store_recovers() {
        let store = Arc::new(MemoryStore::new());
        let (adapter, _notifier) = adapter_over(store.clone());

        store.set_fail_values(true);
        adapter.set("k", json!("memory"));
        store.set_fail_values(false);
        adapter.set("k", json!("still memory"));

        assert_eq!(adapter.get("k"), Some(json!("still memory")));
        assert!(store.is_empty());
    }

    #[test]
    fn test_remove_reaches_store_and_fallback() {
        let store = Arc::new(MemoryStore::new());
        let (adapter, _notifier) = adapter_over(store.clone());
        adapter.set("selectedTags", json!([1]));
        adapter.remove("selectedTags");
        assert_eq!(adapter.get("selectedTags"), None);
        assert!(store.is_empty());

        store.set_fail_values(true);
        adapter.set("selectedTags", json!([2]));
        adapter.remove("selectedTags");
        assert_eq!(adapter.get("selectedTags"), None);
    }

    #[test]
    fn test_cookie_failures_never_warn() {
        let store = Arc::new(MemoryStore::new());
        store.set_fail_cookies(true);
        let (adapter, notifier) = adapter_over(store);

        adapter.set_cookie("dailyRandomId", "5", 1);
        assert_eq!(adapter.get_cookie("dailyRandomId"), None);
        assert!(!adapter.is_degraded());
        assert!(notifier.toasts().is_empty());
    }

    #[test]
    fn test_negative_ttl_expires_cookie() {
        let store = Arc::new(MemoryStore::new());
        let (adapter, _notifier) = adapter_over(store);
        adapter.set_cookie("dailyRandomId", "5", 1);
        assert_eq!(adapter.get_cookie("dailyRandomId").as_deref(), Some("5"));
        adapter.set_cookie("dailyRandomId", "", -1);
        assert_eq!(adapter.get_cookie("dailyRandomId"), None);
    }

    #[test]
    fn test_huge_ttl_saturates_instead_of_overflowing() {
        let store = Arc::new(MemoryStore::new());
        let (adapter, notifier) = adapter_over(store);
        adapter.set_cookie("dailyRandomId", "5", 200_000_000);
        assert_eq!(adapter.get_cookie("dailyRandomId").as_deref(), Some("5"));
        adapter.set_cookie("dailyRandomId", "5", i64::MIN);
        assert_eq!(adapter.get_cookie("dailyRandomId"), None);
        assert!(notifier.toasts().is_empty());
    }

    #[test]
    fn test_sessions_do_not_share_fallback() {
        let (first, _) = adapter_over(Arc::new(MemoryStore::failing()));
        let (second, _) = adapter_over(Arc::new(MemoryStore::failing()));
        first.set("k", json!("first"));
        assert_eq!(second.get("k"), None);
    }
}
