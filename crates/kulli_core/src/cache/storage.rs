//! Named cache partitions shared by every worker generation.
//!
//! # Invariants
//! - Partition lookup order is creation order.
//! - Each entry is written wholesale under its request key; concurrent
//!   writers to different keys never block each other.

use crate::cache::http::{cache_key_for, Request, Response};
use dashmap::DashMap;
use log::info;
use parking_lot::RwLock;
use std::sync::Arc;
use url::Url;

/// One named, versioned bucket of request key → response.
#[derive(Debug)]
pub struct Partition {
    name: String,
    entries: DashMap<String, Response>,
}

impl Partition {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: DashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn get(&self, request: &Request) -> Option<Response> {
        self.get_key(&request.cache_key())
    }

    pub fn get_key(&self, key: &str) -> Option<Response> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    pub fn put(&self, request: &Request, response: Response) {
        self.entries.insert(request.cache_key(), response);
    }

    pub fn contains(&self, request: &Request) -> bool {
        self.entries.contains_key(&request.cache_key())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns all stored keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.iter().map(|entry| entry.key().clone()).collect();
        keys.sort();
        keys
    }
}

/// The set of partitions owned by one application origin.
#[derive(Debug, Default)]
pub struct CacheStorage {
    partitions: RwLock<Vec<Arc<Partition>>>,
}

impl CacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens `name`, creating an empty partition on first use.
    pub fn open(&self, name: &str) -> Arc<Partition> {
        if let Some(existing) = self.get(name) {
            return existing;
        }

        let mut partitions = self.partitions.write();
        // Re-check under the write lock; another opener may have won.
        if let Some(existing) = partitions.iter().find(|p| p.name() == name) {
            return Arc::clone(existing);
        }
        let created = Arc::new(Partition::new(name));
        partitions.push(Arc::clone(&created));
        created
    }

    pub fn get(&self, name: &str) -> Option<Arc<Partition>> {
        self.partitions
            .read()
            .iter()
            .find(|partition| partition.name() == name)
            .cloned()
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Partition names in creation order.
    pub fn keys(&self) -> Vec<String> {
        self.partitions
            .read()
            .iter()
            .map(|partition| partition.name().to_string())
            .collect()
    }

    /// Deletes one partition. Returns whether it existed.
    pub fn delete(&self, name: &str) -> bool {
        let mut partitions = self.partitions.write();
        let before = partitions.len();
        partitions.retain(|partition| partition.name() != name);
        partitions.len() != before
    }

    /// Deletes every partition regardless of name. Returns the count removed.
    pub fn clear(&self) -> usize {
        let removed = std::mem::take(&mut *self.partitions.write());
        info!(
            "event=cache_clear module=cache status=ok partitions={}",
            removed.len()
        );
        removed.len()
    }

    /// Finds `request` in any partition, first match in creation order.
    pub fn match_request(&self, request: &Request) -> Option<Response> {
        self.match_key(&request.cache_key())
    }

    pub fn match_url(&self, url: &Url) -> Option<Response> {
        self.match_key(&cache_key_for(url))
    }

    fn match_key(&self, key: &str) -> Option<Response> {
        self.partitions
            .read()
            .iter()
            .find_map(|partition| partition.get_key(key))
    }
}
