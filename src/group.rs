//! A named collection of resources loaded and unloaded as a unit.

use std::sync::Arc;

use inlinable_string::InlinableString;
use smallvec::SmallVec;

use crate::errors::*;
use crate::manifest::GroupManifest;
use crate::registry::ResourceRegistry;
use crate::resource::{LoadContext, Resource, ResourceResolver};
use crate::utils::{FastHashMap, HashValue};

/// A group exclusively owns the resources parsed from one definition
/// document, keyed by (kind, name) and kept in insertion order so that
/// dependent resources listed after their dependencies load after them.
///
/// Group creation is all-or-nothing: the first malformed element fails the
/// whole group and nothing of it survives.
pub struct ResourceGroup {
    name: InlinableString,
    resources: Vec<Arc<dyn Resource>>,
    index: FastHashMap<(HashValue<str>, HashValue<str>), usize>,
}

impl ResourceGroup {
    pub fn from_manifest(manifest: &GroupManifest, registry: &ResourceRegistry) -> Result<Self> {
        let mut group = ResourceGroup {
            name: manifest.name.clone(),
            resources: Vec::with_capacity(manifest.resources.len()),
            index: FastHashMap::default(),
        };

        for def in &manifest.resources {
            let resource = registry.create(def)?;
            group.attach(resource)?;
        }

        Ok(group)
    }

    /// Adds a resource instance, e.g. a manual one built programmatically.
    /// Fails with `AlreadyExists` if the (kind, name) pair is taken.
    pub fn attach(&mut self, resource: Arc<dyn Resource>) -> Result<()> {
        let key = (resource.kind().into(), resource.name().into());
        if self.index.contains_key(&key) {
            return Err(Error::AlreadyExists(format!(
                "Resource '{}' ({}) in group '{}'",
                resource.name(),
                resource.kind(),
                self.name
            )));
        }

        self.index.insert(key, self.resources.len());
        self.resources.push(resource);
        Ok(())
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Resource>> {
        self.resources.iter()
    }

    /// Looks up a member resource; never mutates state and returns the same
    /// instance for repeated calls.
    pub fn resource(&self, kind: &str, name: &str) -> Option<Arc<dyn Resource>> {
        let key = (HashValue::from(kind), HashValue::from(name));
        self.index.get(&key).map(|&idx| self.resources[idx].clone())
    }

    /// Loads every member in insertion order. A failing member does not
    /// abort the rest; failures are aggregated into one non-success result.
    pub fn load(&self, ctx: &LoadContext) -> Result<()> {
        let mut failures: SmallVec<[&str; 8]> = SmallVec::new();

        for resource in &self.resources {
            if let Err(err) = resource.load(ctx) {
                warn!(
                    "Failed to load '{}' ({}) of group '{}': {}",
                    resource.name(),
                    resource.kind(),
                    self.name,
                    err
                );
                failures.push(resource.name());
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::Other(format!(
                "Group '{}' failed to load {} of {} resources: {}.",
                self.name,
                failures.len(),
                self.resources.len(),
                failures.join(", ")
            )))
        }
    }

    /// Unloads every member in insertion order; never fails.
    pub fn unload(&self, ctx: &LoadContext) {
        for resource in &self.resources {
            resource.unload(ctx);
        }
    }
}

impl ResourceResolver for ResourceGroup {
    fn resolve(&self, kind: &str, name: &str) -> Option<Arc<dyn Resource>> {
        self.resource(kind, name)
    }
}
