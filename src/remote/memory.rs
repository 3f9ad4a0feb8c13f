//! In-process resource client.
//!
//! Holds the "remote" collection in memory. Failures can be injected per
//! operation, and every delete attempt is recorded, which makes it the
//! workhorse of the scheduler tests.

use std::{
    collections::{BTreeMap, HashSet},
    sync::{
        Mutex, MutexGuard,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;

use super::{ClientError, ResourceClient};
use crate::resources::{Resource, ResourceId};

#[derive(Debug, Default)]
struct Inner {
    resources: BTreeMap<ResourceId, Resource>,
    failing_deletes: HashSet<ResourceId>,
    delete_calls: Vec<ResourceId>,
}

/// A [`ResourceClient`] over an in-memory collection.
#[derive(Debug, Default)]
pub struct InMemoryClient {
    inner: Mutex<Inner>,
    fail_list: AtomicBool,
    list_calls: AtomicUsize,
}

impl InMemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a client whose remote collection holds `resources`.
    pub fn with_resources(resources: impl IntoIterator<Item = Resource>) -> Self {
        let client = Self::new();
        for resource in resources {
            client.insert(resource);
        }
        client
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Add or replace a remote resource.
    pub fn insert(&self, resource: Resource) {
        self.lock().resources.insert(resource.id.clone(), resource);
    }

    /// Remove a resource behind the agent's back, as another client would.
    pub fn remove_remotely(&self, id: &ResourceId) {
        self.lock().resources.remove(id);
    }

    /// Make `list` fail until toggled back.
    pub fn set_fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    /// Make deletes of `id` fail until cleared.
    pub fn fail_delete(&self, id: impl Into<ResourceId>) {
        self.lock().failing_deletes.insert(id.into());
    }

    pub fn clear_delete_failures(&self) {
        self.lock().failing_deletes.clear();
    }

    /// IDs passed to `delete`, in call order, including failed attempts.
    pub fn delete_calls(&self) -> Vec<ResourceId> {
        self.lock().delete_calls.clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Sorted IDs still present remotely.
    pub fn remote_ids(&self) -> Vec<ResourceId> {
        self.lock().resources.keys().cloned().collect()
    }
}

#[async_trait]
impl ResourceClient for InMemoryClient {
    async fn list(&self) -> Result<Vec<Resource>, ClientError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(ClientError::Unavailable("list failure injected".into()));
        }
        Ok(self.lock().resources.values().cloned().collect())
    }

    async fn delete(&self, id: &ResourceId) -> Result<(), ClientError> {
        let mut inner = self.lock();
        inner.delete_calls.push(id.clone());
        if inner.failing_deletes.contains(id) {
            return Err(ClientError::Unavailable(format!(
                "delete failure injected for {id}"
            )));
        }
        match inner.resources.remove(id) {
            Some(_) => Ok(()),
            None => Err(ClientError::Status {
                status: http::StatusCode::NOT_FOUND,
                body: format!("no resource {id}"),
            }),
        }
    }
}
