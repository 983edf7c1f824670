//! Stable group identity for cluster lineages across the sweep

use std::collections::BTreeSet;

use indexmap::IndexMap;
use itertools::Itertools;

use crate::cluster::sweep::SweepSnapshot;

/// Identity of a cluster lineage: a single id until the lineage merges with
/// another, then the set of ids it absorbed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Group {
    Single(u64),
    Merged(BTreeSet<u64>),
}

impl Group {
    /// Canonical label, used as the color-map key
    pub fn label(&self) -> String {
        match self {
            Group::Single(id) => id.to_string(),
            Group::Merged(ids) => format!("{{{}}}", ids.iter().join(",")),
        }
    }

    pub fn as_single(&self) -> Option<u64> {
        match self {
            Group::Single(id) => Some(*id),
            Group::Merged(_) => None,
        }
    }
}

/// Walk the snapshot sequence from the highest threshold down and assign
/// every node the group of its first appearance.
///
/// A cluster's group is decided from the distinct single ids already held by
/// its members: none yields a fresh id, exactly one is shared, several mean
/// the lineages merged. Members that already hold a merged id contribute
/// nothing to the decision. A node's assignment is never revisited.
pub fn resolve_groups(snapshots: &[SweepSnapshot]) -> IndexMap<String, Group> {
    let mut assigned: IndexMap<String, Group> = IndexMap::new();
    let mut next_id: u64 = 1;

    for snapshot in snapshots {
        for cluster in &snapshot.clusters {
            let founders: BTreeSet<u64> = cluster
                .members
                .iter()
                .filter_map(|node| assigned.get(node))
                .filter_map(Group::as_single)
                .collect();

            let group = match founders.len() {
                0 => {
                    let group = Group::Single(next_id);
                    next_id += 1;
                    group
                }
                1 => Group::Single(founders.into_iter().next().unwrap_or_default()),
                _ => Group::Merged(founders),
            };

            for node in &cluster.members {
                if !assigned.contains_key(node) {
                    assigned.insert(node.clone(), group.clone());
                }
            }
        }
    }

    log::debug!(
        "Resolved {} nodes into {} lineages",
        assigned.len(),
        next_id - 1
    );
    assigned
}
