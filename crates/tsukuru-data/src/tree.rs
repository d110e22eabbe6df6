//! On-demand map hierarchy.
//!
//! Maps are stored flat, keyed by id, each with a parent id. The tree is an
//! index computed from that table, never an owning structure.

use hashbrown::HashMap as FastHashMap;
use rustc_hash::FxHasher;
use serde::Serialize;
use tsukuru_common::{Loaded, WarningKind, Warnings};

use crate::id_table::IdTable;
use crate::model::MapInfo;

type FxHashMap<K, V> = FastHashMap<K, V, std::hash::BuildHasherDefault<FxHasher>>;
type FxHashSet<T> = hashbrown::HashSet<T, std::hash::BuildHasherDefault<FxHasher>>;

/// Parent id of top-level maps.
pub const ROOT_ID: i32 = 0;

/// Children index over a map table.
#[derive(Debug, Clone, Default)]
pub struct MapTree {
    children: FxHashMap<i32, Vec<i32>>,
}

/// One map in a depth-first walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeRow {
    pub id: i32,
    pub depth: usize,
}

impl MapTree {
    /// Index `infos`. Maps whose parent is missing, or that sit on a parent
    /// cycle, are attached to the root with a warning.
    pub fn build(infos: &IdTable<MapInfo>) -> Loaded<Self> {
        let mut warnings = Warnings::new();
        let mut children: FxHashMap<i32, Vec<i32>> = FxHashMap::default();

        for info in infos {
            let parent = if info.parent_id == ROOT_ID || (infos.contains(info.parent_id) && info.parent_id != info.id) {
                info.parent_id
            } else {
                warnings.push(
                    WarningKind::Schema,
                    "MapInfos",
                    format!("map {} has unknown parent {}, shown at top level", info.id, info.parent_id),
                );
                ROOT_ID
            };
            children.entry(parent).or_default().push(info.id);
        }

        let mut tree = Self { children };
        loop {
            let reached: FxHashSet<i32> = tree.walk().into_iter().map(|row| row.id).collect();
            let Some(id) = infos.ids().find(|id| !reached.contains(id)) else {
                break;
            };
            warnings.push(
                WarningKind::Schema,
                "MapInfos",
                format!("map {id} is on a parent cycle, shown at top level"),
            );
            for list in tree.children.values_mut() {
                list.retain(|&child| child != id);
            }
            tree.children.entry(ROOT_ID).or_default().push(id);
        }

        for list in tree.children.values_mut() {
            list.sort_by_key(|&id| (infos.get(id).map_or(0, |info| info.order), id));
        }
        Loaded::new(tree, warnings)
    }

    /// Top-level maps in display order.
    pub fn roots(&self) -> &[i32] {
        self.children(ROOT_ID)
    }

    pub fn children(&self, id: i32) -> &[i32] {
        self.children.get(&id).map_or(&[], Vec::as_slice)
    }

    /// Every reachable map, depth first, in display order.
    pub fn walk(&self) -> Vec<TreeRow> {
        let mut rows = Vec::new();
        let mut stack: Vec<TreeRow> = self
            .roots()
            .iter()
            .rev()
            .map(|&id| TreeRow { id, depth: 0 })
            .collect();
        let mut seen = FxHashSet::default();

        while let Some(row) = stack.pop() {
            if !seen.insert(row.id) {
                continue;
            }
            stack.extend(self.children(row.id).iter().rev().map(|&id| TreeRow {
                id,
                depth: row.depth + 1,
            }));
            rows.push(row);
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn infos(rows: &[(i32, i32, i32)]) -> IdTable<MapInfo> {
        let mut warnings = Warnings::new();
        let mut table = IdTable::new();
        for &(id, parent_id, order) in rows {
            let info = MapInfo {
                id,
                name: format!("MAP{id:03}"),
                parent_id,
                order,
                expanded: false,
            };
            table.insert(info, "MapInfos", &mut warnings);
        }
        table
    }

    #[test]
    fn test_order_then_id() {
        let table = infos(&[(1, 0, 2), (2, 0, 1), (3, 1, 5), (4, 1, 5), (5, 1, 1)]);
        let tree = MapTree::build(&table);

        assert!(tree.warnings.is_empty());
        assert_eq!(tree.value.roots(), &[2, 1]);
        assert_eq!(tree.value.children(1), &[5, 3, 4]);
        let walk: Vec<_> = tree.value.walk().iter().map(|r| (r.id, r.depth)).collect();
        assert_eq!(walk, vec![(2, 0), (1, 0), (5, 1), (3, 1), (4, 1)]);
    }

    #[test]
    fn test_dangling_parent_attaches_to_root() {
        let table = infos(&[(1, 0, 1), (2, 99, 2)]);
        let tree = MapTree::build(&table);

        assert_eq!(tree.value.roots(), &[1, 2]);
        assert_eq!(tree.warnings.count(WarningKind::Schema), 1);
    }

    #[test]
    fn test_cycle_attaches_to_root() {
        let table = infos(&[(1, 2, 1), (2, 1, 2)]);
        let tree = MapTree::build(&table);

        assert_eq!(tree.value.walk().len(), 2);
        assert_eq!(tree.warnings.count(WarningKind::Schema), 1);
    }
}
