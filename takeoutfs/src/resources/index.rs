//! Multi-keyed lookup over registered resources.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use super::resource::{Resource, ResourceMetadata};
use crate::vfs::Entry;

/// Index of every resource found in a bundle.
///
/// Populated by a single scanning pass, then shared read-only (wrap it in an
/// `Arc` to hand it to worker threads). Buckets only grow; lookups report
/// absence as `None`.
#[derive(Debug, Default)]
pub struct ResourceIndex {
    by_path: HashMap<String, Arc<Resource>>,
    by_base: HashMap<String, Vec<Arc<Resource>>>,
    by_container: HashMap<String, Vec<Arc<Resource>>>,
    ordered: Vec<Arc<Resource>>,
}

impl ResourceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `entry` under `container`.
    ///
    /// Without `metadata`, minimal metadata is derived from the entry. Paths
    /// are unique: registering a path twice keeps the first resource and
    /// returns it.
    pub fn add(
        &mut self,
        container: &str,
        parent: &str,
        entry: Entry,
        metadata: Option<ResourceMetadata>,
    ) -> Arc<Resource> {
        if let Some(existing) = self.by_path.get(entry.path()) {
            warn!(
                path = entry.path(),
                container = existing.container(),
                "Resource already registered, keeping first"
            );
            return Arc::clone(existing);
        }

        let resource = Arc::new(Resource::new(container, parent, entry, metadata));
        debug!(
            path = resource.path(),
            container = resource.container(),
            "Registered resource"
        );

        self.by_path
            .insert(resource.path().to_string(), Arc::clone(&resource));
        self.by_base
            .entry(resource.name().to_string())
            .or_default()
            .push(Arc::clone(&resource));
        self.by_container
            .entry(resource.container().to_string())
            .or_default()
            .push(Arc::clone(&resource));
        self.ordered.push(Arc::clone(&resource));
        resource
    }

    /// Every resource with base name `name`, in registration order.
    pub fn search_by_base(&self, name: &str) -> &[Arc<Resource>] {
        self.by_base.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First resource in `container` whose base name is `name`.
    pub fn search_in_container(&self, container: &str, name: &str) -> Option<&Arc<Resource>> {
        self.by_container
            .get(container)?
            .iter()
            .find(|r| r.name() == name)
    }

    /// Resource with base name `name` created closest to `target`.
    ///
    /// Equidistant candidates resolve to the one registered first. Candidates
    /// without a creation time rank after every dated one.
    pub fn search_by_base_and_date(
        &self,
        name: &str,
        target: DateTime<Utc>,
    ) -> Option<&Arc<Resource>> {
        let mut best: Option<(&Arc<Resource>, Option<Duration>)> = None;
        for candidate in self.search_by_base(name) {
            let distance = candidate.created().map(|created| abs_distance(target, created));
            let closer = match &best {
                None => true,
                Some((_, best_distance)) => is_closer(distance, *best_distance),
            };
            if closer {
                best = Some((candidate, distance));
            }
        }
        best.map(|(resource, _)| resource)
    }

    /// Resource registered at exactly `path`.
    pub fn search_by_path(&self, path: &str) -> Option<&Arc<Resource>> {
        self.by_path.get(path)
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Names of every container, sorted.
    pub fn containers(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_container.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Resources of one container, in registration order.
    pub fn container(&self, container: &str) -> &[Arc<Resource>] {
        self.by_container
            .get(container)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every resource in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Resource>> {
        self.ordered.iter()
    }
}

fn abs_distance(a: DateTime<Utc>, b: DateTime<Utc>) -> Duration {
    let delta = a.signed_duration_since(b);
    if delta < Duration::zero() {
        -delta
    } else {
        delta
    }
}

/// Strictly closer only; equal distances keep the earlier candidate.
fn is_closer(candidate: Option<Duration>, best: Option<Duration>) -> bool {
    match (candidate, best) {
        (Some(c), Some(b)) => c < b,
        (Some(_), None) => true,
        (None, _) => false,
    }
}
