//! Read-through cache abstraction for per-resource-type permission sets.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::permission::PermissionRecord;

/// Key→value cache the catalog populates on miss.
///
/// The default process-local cache is never invalidated: a resource type's
/// permission set is treated as immutable once first observed (permissions
/// are additive-only in normal operation). Substitute [`NoopPermissionCache`]
/// to bypass caching entirely.
pub trait PermissionCache: Send + Sync {
    fn get(&self, resource_type: &str) -> Option<Vec<PermissionRecord>>;

    fn put(&self, resource_type: &str, permissions: &[PermissionRecord]);
}

/// Process-local cache keyed by resource-type name.
#[derive(Debug, Default)]
pub struct InMemoryPermissionCache {
    inner: RwLock<HashMap<String, Vec<PermissionRecord>>>,
}

impl InMemoryPermissionCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PermissionCache for InMemoryPermissionCache {
    fn get(&self, resource_type: &str) -> Option<Vec<PermissionRecord>> {
        let map = self.inner.read().ok()?;
        map.get(resource_type).cloned()
    }

    fn put(&self, resource_type: &str, permissions: &[PermissionRecord]) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(resource_type.to_string(), permissions.to_vec());
        }
    }
}

/// Cache that remembers nothing; every lookup goes to storage.
#[derive(Debug, Default)]
pub struct NoopPermissionCache;

impl PermissionCache for NoopPermissionCache {
    fn get(&self, _resource_type: &str) -> Option<Vec<PermissionRecord>> {
        None
    }

    fn put(&self, _resource_type: &str, _permissions: &[PermissionRecord]) {}
}
