//! In-memory taxon hierarchy with underlying-id expansion.
//!
//! The taxonomy is technically a DAG, not a tree: a taxon may carry
//! secondary parents in addition to its primary one. The tree is built once
//! from a flat snapshot, published immutably, and answers one question:
//! "give me all descendant ids of these ids." Traversal is breadth-first
//! over a flat arena with a visited bitmap, so shared descendants are
//! visited once and accidental cycles cannot recurse forever.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::warn;

use sightline_core::BasicTaxon;

/// One node of the published taxon tree.
#[derive(Debug, Clone)]
pub struct TaxonNode {
    pub id: i32,
    pub scientific_name: String,
    pub parent_id: Option<i32>,
    pub secondary_parent_ids: Vec<i32>,
}

/// Immutable taxon hierarchy. Safe for unlimited concurrent readers;
/// rebuilt wholesale on cache invalidation, never mutated in place.
#[derive(Debug, Default)]
pub struct TaxonTree {
    /// Flat node arena.
    nodes: Vec<TaxonNode>,
    /// Taxon id → arena index.
    index_by_id: HashMap<i32, usize>,
    /// Arena index → child arena indexes, including edges contributed by
    /// secondary parents (so a node may appear under multiple parents).
    children: Vec<Vec<usize>>,
}

impl TaxonTree {
    /// Build a tree from a flat taxon snapshot.
    ///
    /// An empty snapshot yields an empty, valid tree. Parent references that
    /// do not resolve within the snapshot are treated as roots. Self-parent
    /// edges are dropped with a warning; they would otherwise form trivial
    /// cycles.
    pub fn build(taxa: Vec<BasicTaxon>) -> Self {
        let mut index_by_id = HashMap::with_capacity(taxa.len());
        let mut nodes = Vec::with_capacity(taxa.len());

        for taxon in taxa {
            if index_by_id.contains_key(&taxon.id) {
                warn!(
                    subsystem = "taxonomy",
                    taxon_id = taxon.id,
                    "duplicate taxon id in snapshot, keeping first"
                );
                continue;
            }
            index_by_id.insert(taxon.id, nodes.len());
            nodes.push(TaxonNode {
                id: taxon.id,
                scientific_name: taxon.scientific_name,
                parent_id: taxon.parent_id,
                secondary_parent_ids: taxon.secondary_parent_ids,
            });
        }

        let mut children: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
        for (child_idx, node) in nodes.iter().enumerate() {
            let parents = node
                .parent_id
                .iter()
                .chain(node.secondary_parent_ids.iter());
            for &parent_id in parents {
                if parent_id == node.id {
                    warn!(
                        subsystem = "taxonomy",
                        taxon_id = node.id,
                        "taxon is its own parent, edge dropped"
                    );
                    continue;
                }
                // Unresolvable parents leave the node a root.
                if let Some(&parent_idx) = index_by_id.get(&parent_id) {
                    children[parent_idx].push(child_idx);
                }
            }
        }

        Self {
            nodes,
            index_by_id,
            children,
        }
    }

    /// Number of taxa in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the tree holds no taxa.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node by taxon id.
    pub fn get(&self, id: i32) -> Option<&TaxonNode> {
        self.index_by_id.get(&id).map(|&idx| &self.nodes[idx])
    }

    /// Collect all descendant ids reachable from the seed ids.
    ///
    /// Breadth-first over the child adjacency. Each node is visited at most
    /// once no matter how many parents lead to it, which also makes
    /// accidental cycles terminate. Unknown seed ids are ignored. With
    /// `include_self`, every known seed id is part of the result even when
    /// it has no children.
    pub fn underlying_taxon_ids(
        &self,
        seed_ids: impl IntoIterator<Item = i32>,
        include_self: bool,
    ) -> HashSet<i32> {
        let mut result = HashSet::new();
        let mut visited = vec![false; self.nodes.len()];
        let mut queue = VecDeque::new();

        for seed in seed_ids {
            let Some(&idx) = self.index_by_id.get(&seed) else {
                continue;
            };
            if include_self {
                result.insert(seed);
            }
            if !visited[idx] {
                visited[idx] = true;
                queue.push_back(idx);
            }
        }

        while let Some(idx) = queue.pop_front() {
            for &child in &self.children[idx] {
                if !visited[child] {
                    visited[child] = true;
                    result.insert(self.nodes[child].id);
                    queue.push_back(child);
                }
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn taxon(id: i32, parent: Option<i32>, secondary: Vec<i32>) -> BasicTaxon {
        BasicTaxon {
            id,
            scientific_name: format!("Taxon {id}"),
            parent_id: parent,
            secondary_parent_ids: secondary,
        }
    }

    fn set(ids: &[i32]) -> HashSet<i32> {
        ids.iter().copied().collect()
    }

    #[test]
    fn test_empty_snapshot_builds_empty_valid_tree() {
        let tree = TaxonTree::build(Vec::new());
        assert!(tree.is_empty());
        assert!(tree.underlying_taxon_ids([10], true).is_empty());
    }

    #[test]
    fn test_example_scenario_expansion() {
        // Edges: 10→20, 10→21, 20→30
        let tree = TaxonTree::build(vec![
            taxon(10, None, vec![]),
            taxon(20, Some(10), vec![]),
            taxon(21, Some(10), vec![]),
            taxon(30, Some(20), vec![]),
        ]);
        assert_eq!(
            tree.underlying_taxon_ids([10], true),
            set(&[10, 20, 21, 30])
        );
        assert_eq!(tree.underlying_taxon_ids([10], false), set(&[20, 21, 30]));
    }

    #[test]
    fn test_include_self_holds_for_leaf_seeds() {
        let tree = TaxonTree::build(vec![taxon(10, None, vec![]), taxon(20, Some(10), vec![])]);
        assert_eq!(tree.underlying_taxon_ids([20], true), set(&[20]));
        assert!(tree.underlying_taxon_ids([20], false).is_empty());
    }

    #[test]
    fn test_shared_descendant_visited_once() {
        // Two parents, one common child via a secondary parent edge.
        let tree = TaxonTree::build(vec![
            taxon(1, None, vec![]),
            taxon(2, Some(1), vec![]),
            taxon(3, Some(1), vec![]),
            taxon(4, Some(2), vec![3]),
        ]);
        let ids = tree.underlying_taxon_ids([1], true);
        assert_eq!(ids, set(&[1, 2, 3, 4]));
        // Reachable through either parent independently.
        assert_eq!(tree.underlying_taxon_ids([2], false), set(&[4]));
        assert_eq!(tree.underlying_taxon_ids([3], false), set(&[4]));
    }

    #[test]
    fn test_cycle_terminates() {
        // 1→2→3 plus a back edge 3→1 through a secondary parent.
        let tree = TaxonTree::build(vec![
            taxon(1, None, vec![3]),
            taxon(2, Some(1), vec![]),
            taxon(3, Some(2), vec![]),
        ]);
        let ids = tree.underlying_taxon_ids([1], true);
        assert_eq!(ids, set(&[1, 2, 3]));
    }

    #[test]
    fn test_self_parent_edge_dropped() {
        let tree = TaxonTree::build(vec![taxon(5, Some(5), vec![5])]);
        assert_eq!(tree.underlying_taxon_ids([5], true), set(&[5]));
    }

    #[test]
    fn test_unknown_seed_ids_ignored() {
        let tree = TaxonTree::build(vec![taxon(10, None, vec![]), taxon(20, Some(10), vec![])]);
        assert_eq!(
            tree.underlying_taxon_ids([10, 999], true),
            set(&[10, 20])
        );
        assert!(tree.underlying_taxon_ids([999], true).is_empty());
    }

    #[test]
    fn test_result_monotonic_in_seeds() {
        let tree = TaxonTree::build(vec![
            taxon(10, None, vec![]),
            taxon(20, Some(10), vec![]),
            taxon(30, None, vec![]),
            taxon(31, Some(30), vec![]),
        ]);
        let one = tree.underlying_taxon_ids([10], true);
        let two = tree.underlying_taxon_ids([10, 30], true);
        assert!(two.len() >= one.len());
        assert!(one.is_subset(&two));
    }

    #[test]
    fn test_unresolvable_parent_treated_as_root() {
        let tree = TaxonTree::build(vec![taxon(7, Some(999), vec![])]);
        assert_eq!(tree.underlying_taxon_ids([7], true), set(&[7]));
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let tree = TaxonTree::build(vec![
            taxon(1, None, vec![]),
            BasicTaxon {
                id: 1,
                scientific_name: "Duplicate".into(),
                parent_id: None,
                secondary_parent_ids: vec![],
            },
            taxon(2, Some(1), vec![]),
        ]);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.get(1).unwrap().scientific_name, "Taxon 1");
    }
}
