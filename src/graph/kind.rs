//! Per-kind configuration records.
//!
//! Every node in the graph has the same shape; what differs between projects, users,
//! tasks and work entries is which custom fields they expose as attributes. Those
//! tables live here.

use crate::core::ResourceKind;
use std::collections::{BTreeMap, HashMap};

/// Built-in project custom fields: attribute name → remote custom-field name.
const PROJECT_CUSTOM_FIELDS: [(&str, &str); 5] = [
    ("custom_num", "项目编号"),
    ("custom_name", "项目名称"),
    ("custom_category", "产品分类"),
    ("custom_leader", "项目负责人"),
    ("custom_time", "立项时间"),
];

/// Configuration for one resource kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KindConfig {
    custom_fields: BTreeMap<String, String>,
}

impl KindConfig {
    /// Remote custom-field name mapped to `attribute`, if any.
    ///
    /// Entries with an empty remote name are treated as unmapped.
    #[must_use]
    pub fn custom_field(&self, attribute: &str) -> Option<&str> {
        self.custom_fields.get(attribute).map(String::as_str).filter(|name| !name.is_empty())
    }
}

/// Configuration records for every [`ResourceKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindTable {
    kinds: HashMap<ResourceKind, KindConfig>,
}

impl Default for KindTable {
    fn default() -> Self {
        Self::new(&BTreeMap::new())
    }
}

impl KindTable {
    /// Built-in tables extended (and overridden) by `overrides`.
    #[must_use]
    pub fn new(overrides: &BTreeMap<ResourceKind, BTreeMap<String, String>>) -> Self {
        let mut kinds: HashMap<ResourceKind, KindConfig> =
            ResourceKind::ALL.iter().map(|kind| (*kind, KindConfig::default())).collect();

        if let Some(project) = kinds.get_mut(&ResourceKind::Project) {
            project.custom_fields.extend(
                PROJECT_CUSTOM_FIELDS.iter().map(|(attr, name)| (attr.to_string(), name.to_string())),
            );
        }

        for (kind, table) in overrides {
            kinds
                .entry(*kind)
                .or_default()
                .custom_fields
                .extend(table.iter().map(|(attr, name)| (attr.clone(), name.clone())));
        }

        Self {
            kinds,
        }
    }

    /// Configuration record of `kind`.
    #[must_use]
    pub fn get(&self, kind: ResourceKind) -> Option<&KindConfig> {
        self.kinds.get(&kind)
    }

    /// Remote custom-field name for `attribute` on `kind`.
    #[must_use]
    pub fn custom_field(&self, kind: ResourceKind, attribute: &str) -> Option<&str> {
        self.get(kind).and_then(|config| config.custom_field(attribute))
    }
}
