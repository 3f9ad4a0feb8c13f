use std::collections::HashMap;

use super::{Resource, ResourceId};

/// In-memory view of the resources known to exist remotely.
///
/// The store is a plain owned map: it is created empty, handed to the
/// scheduler at construction and only ever touched from the scheduler's own
/// task, so it needs no locking.
#[derive(Debug, Default, Clone)]
pub struct ResourceStore {
    resources: HashMap<ResourceId, Resource>,
}

impl ResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a resource, replacing any previous entry with the same ID.
    pub fn upsert(&mut self, resource: Resource) {
        self.resources.insert(resource.id.clone(), resource);
    }

    /// Upsert every resource, returning how many were written.
    pub fn extend(&mut self, resources: impl IntoIterator<Item = Resource>) -> usize {
        let mut count = 0;
        for resource in resources {
            self.upsert(resource);
            count += 1;
        }
        count
    }

    /// Remove a resource. Returns the removed entry, if there was one.
    pub fn remove(&mut self, id: &ResourceId) -> Option<Resource> {
        self.resources.remove(id)
    }

    /// Snapshot of every stored resource, in no particular order.
    pub fn all(&self) -> Vec<Resource> {
        self.resources.values().cloned().collect()
    }

    /// Borrowing iteration over the stored resources, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    pub fn get(&self, id: &ResourceId) -> Option<&Resource> {
        self.resources.get(id)
    }

    pub fn contains(&self, id: &ResourceId) -> bool {
        self.resources.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Sorted IDs, mainly for assertions and log output.
    pub fn ids(&self) -> Vec<ResourceId> {
        let mut ids: Vec<_> = self.resources.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl FromIterator<Resource> for ResourceStore {
    fn from_iter<I: IntoIterator<Item = Resource>>(iter: I) -> Self {
        let mut store = Self::new();
        store.extend(iter);
        store
    }
}
