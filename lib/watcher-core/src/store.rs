//! Read-through caches for the watched collections

use crate::ListError;
use kube::Resource;
use kube_runtime::reflector::{self, ObjectRef, Store};
use kube_runtime::reflector::store::Writer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Read access to a locally cached collection of Kubernetes objects.
pub trait ResourceCache<K>: Send + Sync {
    /// Every object currently in the cache.
    fn list(&self) -> Result<Vec<Arc<K>>, ListError>;

    /// Look up a single object by namespace and name.
    fn get(&self, namespace: &str, name: &str) -> Option<Arc<K>>;
}

/// A reflector-backed cache that remembers whether its initial list completed.
///
/// The matching [`Writer`] is handed to the delivery loop, which marks the
/// collection synced once the watch stream reports `InitDone`.
pub struct Collection<K>
where
    K: Resource<DynamicType = ()> + Clone + 'static,
{
    kind: &'static str,
    store: Store<K>,
    synced: Arc<AtomicBool>,
}

impl<K> Collection<K>
where
    K: Resource<DynamicType = ()> + Clone + 'static,
{
    /// Create an empty collection and the writer that fills it
    pub fn new(kind: &'static str) -> (Self, Writer<K>) {
        let (store, writer) = reflector::store();
        let collection = Self {
            kind,
            store,
            synced: Arc::new(AtomicBool::new(false)),
        };
        (collection, writer)
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn is_synced(&self) -> bool {
        self.synced.load(Ordering::Acquire)
    }

    pub(crate) fn mark_synced(&self) {
        self.synced.store(true, Ordering::Release);
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

impl<K> Clone for Collection<K>
where
    K: Resource<DynamicType = ()> + Clone + 'static,
{
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            store: self.store.clone(),
            synced: self.synced.clone(),
        }
    }
}

impl<K> ResourceCache<K> for Collection<K>
where
    K: Resource<DynamicType = ()> + Clone + Send + Sync + 'static,
{
    fn list(&self) -> Result<Vec<Arc<K>>, ListError> {
        if !self.is_synced() {
            return Err(ListError::NotSynced(self.kind));
        }
        Ok(self.store.state())
    }

    fn get(&self, namespace: &str, name: &str) -> Option<Arc<K>> {
        self.store.get(&ObjectRef::new(name).within(namespace))
    }
}
