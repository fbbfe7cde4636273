//! In-memory implementation of `TopicStore`
//!
//! Keeps resources in a shared map and records every patch, so callers can
//! assert exactly which writes a reconciliation cycle issued.

use crate::StoreError;
use lastused_domain::traits::TopicStore;
use lastused_domain::TopicResource;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// One recorded patch call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchRecord {
    /// Resource that was patched
    pub resource_name: String,
    /// Annotations carried by the patch
    pub annotations: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
struct Inner {
    resources: BTreeMap<String, TopicResource>,
    patches: Vec<PatchRecord>,
    fail_list: bool,
    fail_patch: bool,
}

/// Shared, cloneable in-memory topic store
///
/// Clones share the same state, like handles to one API server.
///
/// # Examples
///
/// ```
/// use lastused_domain::TopicResource;
/// use lastused_store::MemoryTopicStore;
///
/// let store = MemoryTopicStore::new();
/// let handle = store.clone();
/// store.insert(TopicResource::new("orders"));
/// assert_eq!(handle.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryTopicStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryTopicStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned lock only means a test panicked mid-update
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add or replace a resource
    pub fn insert(&self, resource: TopicResource) {
        self.lock().resources.insert(resource.name.clone(), resource);
    }

    /// Remove a resource, as if deleted externally
    pub fn remove(&self, resource_name: &str) -> Option<TopicResource> {
        self.lock().resources.remove(resource_name)
    }

    /// Current copy of one resource
    pub fn get(&self, resource_name: &str) -> Option<TopicResource> {
        self.lock().resources.get(resource_name).cloned()
    }

    /// Number of stored resources
    pub fn len(&self) -> usize {
        self.lock().resources.len()
    }

    /// True if no resources are stored
    pub fn is_empty(&self) -> bool {
        self.lock().resources.is_empty()
    }

    /// Every patch applied so far, in order
    pub fn patches(&self) -> Vec<PatchRecord> {
        self.lock().patches.clone()
    }

    /// Forget recorded patches (resources keep their patched state)
    pub fn clear_patches(&self) {
        self.lock().patches.clear();
    }

    /// Make subsequent `list_topics` calls fail
    pub fn fail_list(&self, fail: bool) {
        self.lock().fail_list = fail;
    }

    /// Make subsequent `patch_annotations` calls fail
    pub fn fail_patch(&self, fail: bool) {
        self.lock().fail_patch = fail;
    }
}

impl TopicStore for MemoryTopicStore {
    type Error = StoreError;

    async fn list_topics(&self) -> Result<Vec<TopicResource>, Self::Error> {
        let inner = self.lock();
        if inner.fail_list {
            return Err(StoreError::Connection("list failure injected".to_string()));
        }
        Ok(inner.resources.values().cloned().collect())
    }

    async fn patch_annotations(
        &self,
        resource_name: &str,
        annotations: &BTreeMap<String, String>,
    ) -> Result<(), Self::Error> {
        let mut inner = self.lock();
        if inner.fail_patch {
            return Err(StoreError::Connection("patch failure injected".to_string()));
        }

        let resource = inner
            .resources
            .get_mut(resource_name)
            .ok_or_else(|| StoreError::NotFound(resource_name.to_string()))?;
        resource
            .annotations
            .get_or_insert_with(BTreeMap::new)
            .extend(annotations.iter().map(|(k, v)| (k.clone(), v.clone())));

        inner.patches.push(PatchRecord {
            resource_name: resource_name.to_string(),
            annotations: annotations.clone(),
        });
        Ok(())
    }
}
