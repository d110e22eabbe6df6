//! Records keyed by database id.

use std::collections::BTreeMap;

use serde::Serialize;
use tsukuru_common::{WarningKind, Warnings};

use crate::model::Record;

/// Records in id order. Ids are unique.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct IdTable<T> {
    records: BTreeMap<i32, T>,
}

impl<T> Default for IdTable<T> {
    fn default() -> Self {
        Self {
            records: BTreeMap::new(),
        }
    }
}

impl<T: Record> IdTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record. A second record with an id already present is rejected
    /// with a schema warning and the first one is kept.
    pub fn insert(&mut self, record: T, context: &str, warnings: &mut Warnings) -> bool {
        let id = record.id();
        if id <= 0 {
            warnings.push(WarningKind::Schema, context, format!("record has invalid id {id}"));
            return false;
        }
        if self.records.contains_key(&id) {
            warnings.push(WarningKind::Schema, context, format!("duplicate id {id}, keeping the first record"));
            return false;
        }
        self.records.insert(id, record);
        true
    }

    pub fn get(&self, id: i32) -> Option<&T> {
        self.records.get(&id)
    }

    pub fn contains(&self, id: i32) -> bool {
        self.records.contains_key(&id)
    }

    /// Name of record `id`, if it exists.
    pub fn name(&self, id: i32) -> Option<&str> {
        self.get(id).map(Record::name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = i32> + '_ {
        self.records.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.records.values()
    }

    /// Records in id order.
    pub fn into_values(self) -> Vec<T> {
        self.records.into_values().collect()
    }
}

impl<'a, T> IntoIterator for &'a IdTable<T> {
    type Item = &'a T;
    type IntoIter = std::collections::btree_map::Values<'a, i32, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Item;

    fn item(id: i32, name: &str) -> Item {
        Item {
            id,
            name: name.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut warnings = Warnings::new();
        let mut table = IdTable::new();
        assert!(table.insert(item(1, "Potion"), "Items.json", &mut warnings));
        assert!(!table.insert(item(1, "Ether"), "Items.json", &mut warnings));

        assert_eq!(table.len(), 1);
        assert_eq!(table.name(1), Some("Potion"));
        assert_eq!(warnings.count(WarningKind::Schema), 1);
    }

    #[test]
    fn test_invalid_id_rejected() {
        let mut warnings = Warnings::new();
        let mut table = IdTable::new();
        assert!(!table.insert(item(0, "Nothing"), "Items.json", &mut warnings));
        assert!(table.is_empty());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_iterates_in_id_order() {
        let mut warnings = Warnings::new();
        let mut table = IdTable::new();
        for id in [3, 1, 2] {
            table.insert(item(id, "x"), "Items.json", &mut warnings);
        }
        assert_eq!(table.ids().collect::<Vec<_>>(), vec![1, 2, 3]);
    }
}
