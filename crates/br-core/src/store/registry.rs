//! Entity registry: per-entity metadata used for grouping and collection.

use br_common::id::truncate_utf8;
use br_common::{EntityId, GroupName};
use br_config::RegistrySettings;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// How balances for an entity are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProxyKind {
    /// One remote status call per entity.
    Status,
    /// One remote call per proxy returns every entity it fronts.
    Summary,
}

impl std::fmt::Display for ProxyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProxyKind::Status => write!(f, "status"),
            ProxyKind::Summary => write!(f, "summary"),
        }
    }
}

/// Metadata for one tracked entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub entity_id: EntityId,
    #[serde(default)]
    pub group: Option<GroupName>,
    #[serde(default)]
    pub website: Option<String>,
    /// Address of the proxy that reports this entity's balance.
    pub proxy_reference: String,
    pub proxy_kind: ProxyKind,
    pub valid: bool,
}

impl EntityRecord {
    pub fn in_group(&self, group: &str) -> bool {
        self.valid && self.group.as_ref().is_some_and(|g| g.as_str() == group)
    }
}

/// An import row. `valid` defaults to true when omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityImport {
    pub entity_id: EntityId,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    pub proxy_reference: String,
    pub proxy_kind: ProxyKind,
    #[serde(default)]
    pub valid: Option<bool>,
}

/// Field changes for one entity.
///
/// The outer `Option` means "change this field"; the inner one is the new
/// value, where `None` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityUpdate {
    pub group: Option<Option<String>>,
    pub website: Option<Option<String>>,
}

/// All registered entities, keyed by id. Serialized as a JSON array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<EntityRecord>", into = "Vec<EntityRecord>")]
pub struct Registry {
    records: BTreeMap<EntityId, EntityRecord>,
}

impl From<Vec<EntityRecord>> for Registry {
    fn from(records: Vec<EntityRecord>) -> Self {
        Registry {
            records: records
                .into_iter()
                .map(|r| (r.entity_id.clone(), r))
                .collect(),
        }
    }
}

impl From<Registry> for Vec<EntityRecord> {
    fn from(registry: Registry) -> Self {
        registry.records.into_values().collect()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, entity: &str) -> Option<&EntityRecord> {
        self.records.get(entity)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityRecord> {
        self.records.values()
    }

    pub fn valid(&self) -> impl Iterator<Item = &EntityRecord> {
        self.records.values().filter(|r| r.valid)
    }

    /// Valid entities belonging to `group`.
    pub fn members<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a EntityRecord> + 'a {
        self.records.values().filter(move |r| r.in_group(group))
    }

    /// Names of groups with at least one valid member.
    pub fn groups(&self) -> BTreeSet<&GroupName> {
        self.records
            .values()
            .filter(|r| r.valid)
            .filter_map(|r| r.group.as_ref())
            .collect()
    }

    /// Distinct groups named by any record, valid or not.
    pub fn tracked_group_count(&self) -> usize {
        self.records
            .values()
            .filter_map(|r| r.group.as_ref())
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Insert or replace records. Returns the number imported.
    pub fn import(&mut self, rows: Vec<EntityImport>, limits: &RegistrySettings) -> usize {
        let mut count = 0;
        for row in rows {
            let record = EntityRecord {
                entity_id: row.entity_id,
                group: row
                    .group
                    .map(|g| GroupName::new(truncate_utf8(&g, limits.max_group_bytes))),
                website: row
                    .website
                    .map(|w| truncate_utf8(&w, limits.max_website_bytes)),
                proxy_reference: row.proxy_reference,
                proxy_kind: row.proxy_kind,
                valid: row.valid.unwrap_or(true),
            };
            self.records.insert(record.entity_id.clone(), record);
            count += 1;
        }
        count
    }

    /// Apply field changes. Returns false if the entity is unknown.
    pub fn update(&mut self, entity: &str, update: EntityUpdate, limits: &RegistrySettings) -> bool {
        let Some(record) = self.records.get_mut(entity) else {
            return false;
        };
        if let Some(group) = update.group {
            record.group = group.map(|g| GroupName::new(truncate_utf8(&g, limits.max_group_bytes)));
        }
        if let Some(website) = update.website {
            record.website = website.map(|w| truncate_utf8(&w, limits.max_website_bytes));
        }
        true
    }

    /// Returns false if the entity is unknown.
    pub fn set_valid(&mut self, entity: &str, valid: bool) -> bool {
        match self.records.get_mut(entity) {
            Some(record) => {
                record.valid = valid;
                true
            }
            None => false,
        }
    }

    /// Remove records; returns the ids that were present.
    pub fn remove(&mut self, entities: &[EntityId]) -> Vec<EntityId> {
        entities
            .iter()
            .filter(|id| self.records.remove(id.as_str()).is_some())
            .cloned()
            .collect()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// All records in import format, valid flag included.
    pub fn export(&self) -> Vec<EntityImport> {
        self.records
            .values()
            .map(|r| EntityImport {
                entity_id: r.entity_id.clone(),
                group: r.group.as_ref().map(|g| g.to_string()),
                website: r.website.clone(),
                proxy_reference: r.proxy_reference.clone(),
                proxy_kind: r.proxy_kind,
                valid: Some(r.valid),
            })
            .collect()
    }
}
