//! Reference-counted metric registrations
//!
//! Two independent tables: per node (`node → name → count`) and global
//! (`name → count`). A name is present only while its count is above zero;
//! a node whose table empties is dropped as well.

use std::collections::{BTreeSet, HashMap};

use clusterwatch_domain::{MetricName, NodeId};

/// Registration tables of the metrics store
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Registrations {
    per_node: HashMap<NodeId, HashMap<MetricName, usize>>,
    global: HashMap<MetricName, usize>,
}

impl Registrations {
    /// Empty tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in `metric_name` on `node_id`; returns the new count.
    pub fn add(&mut self, node_id: &str, metric_name: &str) -> usize {
        let count = self
            .per_node
            .entry(node_id.to_string())
            .or_default()
            .entry(metric_name.to_string())
            .or_insert(0);
        *count += 1;
        *count
    }

    /// Register interest in `metric_name` regardless of node; returns the new
    /// count.
    pub fn add_global(&mut self, metric_name: &str) -> usize {
        let count = self.global.entry(metric_name.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    /// Drop one registration of `metric_name` on `node_id`; returns the
    /// remaining count. Unknown keys are a no-op returning 0.
    pub fn remove(&mut self, node_id: &str, metric_name: &str) -> usize {
        let Some(node) = self.per_node.get_mut(node_id) else {
            return 0;
        };

        let remaining = decrement(node, metric_name);
        if node.is_empty() {
            self.per_node.remove(node_id);
        }
        remaining
    }

    /// Drop one global registration of `metric_name`; returns the remaining
    /// count.
    pub fn remove_global(&mut self, metric_name: &str) -> usize {
        decrement(&mut self.global, metric_name)
    }

    /// Registrations of `metric_name` on `node_id`.
    pub fn count(&self, node_id: &str, metric_name: &str) -> usize {
        self.per_node
            .get(node_id)
            .and_then(|node| node.get(metric_name))
            .copied()
            .unwrap_or(0)
    }

    /// Global registrations of `metric_name`.
    pub fn global_count(&self, metric_name: &str) -> usize {
        self.global.get(metric_name).copied().unwrap_or(0)
    }

    /// Whether no registration is left in either table.
    pub fn is_empty(&self) -> bool {
        self.per_node.is_empty() && self.global.is_empty()
    }

    /// Every name with non-zero interest on any node or globally, sorted and
    /// de-duplicated.
    ///
    /// The backend fetches across all nodes in one request, so which node
    /// registered a name does not matter here.
    pub fn metrics_to_fetch(&self) -> Vec<MetricName> {
        let node_names = self.per_node.values().flat_map(|node| live_names(node));
        let global_names = live_names(&self.global);

        node_names.chain(global_names).cloned().collect::<BTreeSet<_>>().into_iter().collect()
    }
}

fn live_names(table: &HashMap<MetricName, usize>) -> impl Iterator<Item = &MetricName> {
    table.iter().filter(|(_, count)| **count > 0).map(|(name, _)| name)
}

fn decrement(table: &mut HashMap<MetricName, usize>, metric_name: &str) -> usize {
    let Some(count) = table.get_mut(metric_name) else {
        return 0;
    };

    *count = count.saturating_sub(1);
    let remaining = *count;
    if remaining == 0 {
        table.remove(metric_name);
    }
    remaining
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_add_remove_leaves_one() {
        let mut registrations = Registrations::new();

        assert_eq!(registrations.add("node-1", "jvm.heap"), 1);
        assert_eq!(registrations.add("node-1", "jvm.heap"), 2);
        assert_eq!(registrations.remove("node-1", "jvm.heap"), 1);

        assert_eq!(registrations.count("node-1", "jvm.heap"), 1);
        assert_eq!(registrations.metrics_to_fetch(), vec!["jvm.heap".to_string()]);
    }

    #[test]
    fn last_remove_deletes_entry_and_excludes_it_from_fetch() {
        let mut registrations = Registrations::new();
        registrations.add("node-1", "jvm.heap");
        registrations.add("node-1", "jvm.heap");
        registrations.remove("node-1", "jvm.heap");

        assert_eq!(registrations.remove("node-1", "jvm.heap"), 0);

        assert_eq!(registrations.count("node-1", "jvm.heap"), 0);
        assert!(registrations.metrics_to_fetch().is_empty());
        assert!(registrations.is_empty());
    }

    #[test]
    fn remove_is_floored_at_zero() {
        let mut registrations = Registrations::new();
        registrations.add("node-1", "a");

        registrations.remove("node-1", "a");
        registrations.remove("node-1", "a");
        registrations.remove("node-1", "a");

        assert_eq!(registrations.count("node-1", "a"), 0);
        // A later add starts from scratch rather than paying off a debt.
        assert_eq!(registrations.add("node-1", "a"), 1);
    }

    #[test]
    fn remove_on_unknown_node_is_noop() {
        let mut registrations = Registrations::new();
        registrations.add("node-1", "a");

        assert_eq!(registrations.remove("node-2", "a"), 0);
        assert_eq!(registrations.remove("node-1", "b"), 0);
        assert_eq!(registrations.count("node-1", "a"), 1);
    }

    #[test]
    fn global_table_is_independent() {
        let mut registrations = Registrations::new();
        registrations.add_global("throughput");
        registrations.add_global("throughput");
        registrations.add("node-1", "throughput");

        registrations.remove("node-1", "throughput");
        assert_eq!(registrations.global_count("throughput"), 2);
        assert_eq!(registrations.metrics_to_fetch(), vec!["throughput".to_string()]);

        registrations.remove_global("throughput");
        registrations.remove_global("throughput");
        assert_eq!(registrations.remove_global("throughput"), 0);
        assert!(registrations.metrics_to_fetch().is_empty());
    }

    #[test]
    fn fetch_set_is_union_without_duplicates() {
        let mut registrations = Registrations::new();
        registrations.add("node-1", "b");
        registrations.add("node-2", "b");
        registrations.add("node-2", "c");
        registrations.add_global("a");
        registrations.add_global("c");

        assert_eq!(
            registrations.metrics_to_fetch(),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn net_count_matches_adds_minus_removes() {
        // Deterministic interleavings of adds and removes on one key.
        let sequences: &[&[bool]] = &[
            &[true, true, false, true, false, false, false],
            &[false, true, false, false, true, true],
            &[true, false, false, true, true, true, false],
        ];

        for ops in sequences {
            let mut registrations = Registrations::new();
            let mut expected: usize = 0;
            for &is_add in *ops {
                if is_add {
                    registrations.add("n", "m");
                    expected += 1;
                } else {
                    registrations.remove("n", "m");
                    expected = expected.saturating_sub(1);
                }
                assert_eq!(registrations.count("n", "m"), expected);
                assert_eq!(registrations.metrics_to_fetch().is_empty(), expected == 0);
            }
        }
    }
}
