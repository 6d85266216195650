//! Graph nodes.

use crate::core::ResourceKind;
use crate::remote::RemoteRecord;
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;

/// Index of a node in the graph arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

/// Key of a child within its parent: kind plus remote id.
///
/// A task node can hold both sub-tasks and work entries, whose remote ids are drawn
/// from different sequences, so the kind is part of the key.
pub type ChildKey = (ResourceKind, u64);

/// One cached remote object.
#[derive(Debug, Clone)]
pub struct ResourceNode {
    pub(crate) kind: ResourceKind,
    pub(crate) uid: u64,
    pub(crate) name: Option<String>,
    pub(crate) partial: RemoteRecord,
    pub(crate) children: IndexMap<ChildKey, NodeId>,
    /// Resolved attributes; `None` records a miss so it is not retried.
    pub(crate) attributes: HashMap<String, Option<Value>>,
    /// Memoized hour total (task hours or user workload).
    pub(crate) aggregate: Option<f64>,
}

impl ResourceNode {
    pub(crate) fn new(kind: ResourceKind, partial: &RemoteRecord) -> Self {
        Self {
            kind,
            uid: partial.id,
            name: partial.name().map(str::to_string),
            partial: partial.clone(),
            children: IndexMap::new(),
            attributes: HashMap::new(),
            aggregate: None,
        }
    }

    /// Kind of remote object this node caches.
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Remote id.
    #[must_use]
    pub fn uid(&self) -> u64 {
        self.uid
    }

    /// Display name from the record that created the node.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Partial record supplied at creation.
    #[must_use]
    pub fn partial(&self) -> &RemoteRecord {
        &self.partial
    }

    /// Cached attribute value: outer `None` when never resolved.
    #[must_use]
    pub fn cached_attribute(&self, attribute: &str) -> Option<Option<&Value>> {
        self.attributes.get(attribute).map(Option::as_ref)
    }
}
