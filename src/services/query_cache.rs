//! In-memory query cache.
//!
//! Keyed JSON values with a stale flag. Login invalidates the `profile`
//! entry and logout clears everything, so data from one session is never
//! shown in the next.

use crate::error::AppError;
use crate::models::AuthUser;
use crate::services::api::AuthApi;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

/// Cache key of the signed-in user's profile.
pub const PROFILE_KEY: &str = "profile";

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    stale: bool,
}

/// Shared query cache.
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: impl Into<String>, value: Value) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key.into(), CacheEntry { value, stale: false });
        }
    }

    /// Fresh value for `key`, if any.
    pub fn get(&self, key: &str) -> Option<Value> {
        let entries = self.entries.read().ok()?;
        entries
            .get(key)
            .filter(|e| !e.stale)
            .map(|e| e.value.clone())
    }

    /// Mark every entry whose key starts with `prefix` as stale.
    ///
    /// Returns the number of entries invalidated.
    pub fn invalidate(&self, prefix: &str) -> usize {
        let Ok(mut entries) = self.entries.write() else {
            return 0;
        };
        let mut count = 0;
        for (_, entry) in entries.iter_mut().filter(|(k, _)| k.starts_with(prefix)) {
            entry.stale = true;
            count += 1;
        }
        count
    }

    /// Drop every entry.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Signed-in user's profile, fetched through `api` when missing or stale.
    pub async fn profile<A: AuthApi>(&self, api: &A) -> Result<AuthUser, AppError> {
        if let Some(cached) = self.get(PROFILE_KEY) {
            match serde_json::from_value(cached) {
                Ok(user) => return Ok(user),
                Err(e) => log::warn!("[auth] Discarding unreadable cached profile: {}", e),
            }
        }

        let user = api.fetch_profile().await?;
        self.insert(PROFILE_KEY, serde_json::to_value(&user)?);
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insert_get() {
        let cache = QueryCache::new();
        assert!(cache.get(PROFILE_KEY).is_none());
        cache.insert(PROFILE_KEY, json!({"username": "nyumba"}));
        assert_eq!(cache.get(PROFILE_KEY).unwrap()["username"], "nyumba");
    }

    #[test]
    fn test_invalidate_by_prefix() {
        let cache = QueryCache::new();
        cache.insert("profile", json!(1));
        cache.insert("profile:settings", json!(2));
        cache.insert("posts:pending", json!(3));

        assert_eq!(cache.invalidate("profile"), 2);
        assert!(cache.get("profile").is_none());
        assert!(cache.get("profile:settings").is_none());
        assert_eq!(cache.get("posts:pending"), Some(json!(3)));
        // stale entries are kept until cleared or replaced
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_clear() {
        let cache = QueryCache::new();
        cache.insert("a", json!(1));
        cache.clear();
        assert!(cache.is_empty());
    }
}
