//! In-process storage backend

use super::traits::{CookieStore, KeyValueStore, StorageError, StorageResult};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};

/// Volatile store backed by concurrent maps.
///
/// Used for ephemeral sessions and tests. [`MemoryStore::failing`] builds a
/// store whose every call errors, which is how a sandboxed browser storage
/// behaves.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: DashMap<String, Value>,
    cookies: DashMap<String, (String, DateTime<Utc>)>,
    fail_values: AtomicBool,
    fail_cookies: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose key/value and cookie calls all fail.
    pub fn failing() -> Self {
        let store = Self::default();
        store.set_fail_values(true);
        store.set_fail_cookies(true);
        store
    }

    pub fn set_fail_values(&self, fail: bool) {
        self.fail_values.store(fail, Ordering::Relaxed);
    }

    pub fn set_fail_cookies(&self, fail: bool) {
        self.fail_cookies.store(fail, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn check(flag: &AtomicBool, what: &str) -> StorageResult<()> {
        if flag.load(Ordering::Relaxed) {
            return Err(StorageError::Unavailable(format!("{} access denied", what)));
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        Self::check(&self.fail_values, "storage")?;
        Ok(self.values.get(key).map(|v| v.clone()))
    }

    fn set(&self, key: &str, value: &Value) -> StorageResult<()> {
        Self::check(&self.fail_values, "storage")?;
        self.values.insert(key.to_string(), value.clone());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<bool> {
        Self::check(&self.fail_values, "storage")?;
        Ok(self.values.remove(key).is_some())
    }
}

impl CookieStore for MemoryStore {
    fn get_cookie(&self, name: &str, now: DateTime<Utc>) -> StorageResult<Option<String>> {
        Self::check(&self.fail_cookies, "cookie")?;
        let live = self
            .cookies
            .get(name)
            .and_then(|entry| (entry.1 > now).then(|| entry.0.clone()));
        if live.is_none() {
            self.cookies.remove(name);
        }
        Ok(live)
    }

    fn set_cookie(&self, name: &str, value: &str, expires_at: DateTime<Utc>) -> StorageResult<()> {
        Self::check(&self.fail_cookies, "cookie")?;
        self.cookies
            .insert(name.to_string(), (value.to_string(), expires_at));
        Ok(())
    }
}
