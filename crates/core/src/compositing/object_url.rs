//! Short-lived `blob:` URLs for in-memory image bytes.
//!
//! [`ObjectUrlRegistry::create_object_url`] hands out an [`ObjectUrl`] guard;
//! dropping the guard revokes the URL, so every exit path of the scope that
//! created it releases it exactly once.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Scheme prefix of every URL minted by the registry.
pub const OBJECT_URL_PREFIX: &str = "blob:ehon/";

#[derive(Default)]
struct RegistryInner {
    entries: HashMap<String, Arc<[u8]>>,
    created: u64,
    revoked: u64,
}

#[derive(Default)]
pub struct ObjectUrlRegistry {
    inner: Mutex<RegistryInner>,
}

impl ObjectUrlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `bytes` under a fresh `blob:` URL.
    pub fn create_object_url(&self, bytes: Arc<[u8]>) -> ObjectUrl<'_> {
        let url = format!("{OBJECT_URL_PREFIX}{}", uuid::Uuid::new_v4());
        let mut inner = self.lock();
        inner.entries.insert(url.clone(), bytes);
        inner.created += 1;
        tracing::trace!(%url, "Object URL created");
        ObjectUrl {
            url,
            registry: self,
        }
    }

    /// Bytes registered under `url`, if it is still live.
    pub fn resolve(&self, url: &str) -> Option<Arc<[u8]>> {
        self.lock().entries.get(url).cloned()
    }

    /// Release `url`. Returns `false` if it was not live.
    fn revoke(&self, url: &str) -> bool {
        let mut inner = self.lock();
        let removed = inner.entries.remove(url).is_some();
        if removed {
            inner.revoked += 1;
            tracing::trace!(%url, "Object URL revoked");
        }
        removed
    }

    /// Number of URLs currently live.
    pub fn live_count(&self) -> usize {
        self.lock().entries.len()
    }

    /// Total URLs ever created.
    pub fn created_count(&self) -> u64 {
        self.lock().created
    }

    /// Total URLs ever revoked.
    pub fn revoked_count(&self) -> u64 {
        self.lock().revoked
    }
}

/// Live `blob:` URL, revoked on drop.
pub struct ObjectUrl<'r> {
    url: String,
    registry: &'r ObjectUrlRegistry,
}

impl ObjectUrl<'_> {
    pub fn as_str(&self) -> &str {
        &self.url
    }
}

impl Drop for ObjectUrl<'_> {
    fn drop(&mut self) {
        self.registry.revoke(&self.url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_revokes_on_drop() {
        let registry = ObjectUrlRegistry::new();
        let bytes: Arc<[u8]> = Arc::from(vec![1u8, 2, 3]);

        let url_string = {
            let url = registry.create_object_url(bytes.clone());
            assert!(url.as_str().starts_with(OBJECT_URL_PREFIX));
            assert_eq!(registry.resolve(url.as_str()).as_deref(), Some(&[1u8, 2, 3][..]));
            assert_eq!(registry.live_count(), 1);
            url.as_str().to_string()
        };

        assert_eq!(registry.live_count(), 0);
        assert_eq!(registry.created_count(), 1);
        assert_eq!(registry.revoked_count(), 1);
        assert!(registry.resolve(&url_string).is_none());
    }

    #[test]
    fn urls_are_unique() {
        let registry = ObjectUrlRegistry::new();
        let a = registry.create_object_url(Arc::from(vec![0u8]));
        let b = registry.create_object_url(Arc::from(vec![0u8]));
        assert_ne!(a.as_str(), b.as_str());
        assert_eq!(registry.live_count(), 2);
    }

    #[test]
    fn double_revoke_is_counted_once() {
        let registry = ObjectUrlRegistry::new();
        let url = registry.create_object_url(Arc::from(vec![0u8]));
        let raw = url.as_str().to_string();
        drop(url);
        assert!(!registry.revoke(&raw));
        assert_eq!(registry.revoked_count(), 1);
    }
}
