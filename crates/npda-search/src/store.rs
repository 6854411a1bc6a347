//! Per-run storage of expanded configurations.

use crate::configuration::Configuration;
use ahash::RandomState;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// How a configuration was reached.
#[derive(Debug, Clone)]
struct NodeInfo {
    config: Configuration,
    /// Parent node id (None for the start configuration).
    parent: Option<usize>,
}

/// Visited-configuration store with parent links.
///
/// Doubles as the visited set and as the arena the witness trace is rebuilt
/// from. Keys are exact configurations, so a revisit can never be a hashing
/// accident that prunes a live branch.
pub struct ConfigStore {
    ids: HashMap<Configuration, usize, RandomState>,
    nodes: Vec<NodeInfo>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self {
            ids: HashMap::default(),
            nodes: Vec::new(),
        }
    }

    /// Record a newly expanded configuration. Returns its node id, or
    /// `None` if it was already expanded in this run.
    pub fn insert(&mut self, config: Configuration, parent: Option<usize>) -> Option<usize> {
        match self.ids.entry(config) {
            Entry::Occupied(_) => None,
            Entry::Vacant(entry) => {
                let id = self.nodes.len();
                self.nodes.push(NodeInfo {
                    config: entry.key().clone(),
                    parent,
                });
                entry.insert(id);
                Some(id)
            }
        }
    }

    /// Stored configuration for a node id.
    pub fn get(&self, id: usize) -> &Configuration {
        &self.nodes[id].config
    }

    /// Number of expanded configurations.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Reconstruct the configuration path from the start node to `id` by
    /// walking parent links.
    pub fn trace_to(&self, id: usize) -> Vec<Configuration> {
        let mut trace = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            let info = &self.nodes[node];
            trace.push(info.config.clone());
            current = info.parent;
        }
        trace.reverse();
        trace
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::Stack;

    fn config(state: usize, offset: usize) -> Configuration {
        Configuration {
            state,
            offset,
            stack: Stack::from_slice(&['Z']),
        }
    }

    #[test]
    fn test_insert_dedupes() {
        let mut store = ConfigStore::new();
        assert_eq!(store.insert(config(0, 0), None), Some(0));
        assert_eq!(store.insert(config(0, 0), None), None);
        assert_eq!(store.insert(config(1, 0), Some(0)), Some(1));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_stack_distinguishes_configs() {
        let mut store = ConfigStore::new();
        let mut deeper = config(0, 0);
        deeper.stack.push('A');
        assert!(store.insert(config(0, 0), None).is_some());
        assert!(store.insert(deeper, None).is_some());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_trace_reconstruction() {
        let mut store = ConfigStore::new();
        let a = store.insert(config(0, 0), None).unwrap();
        let b = store.insert(config(0, 1), Some(a)).unwrap();
        let c = store.insert(config(1, 2), Some(b)).unwrap();

        let trace = store.trace_to(c);
        assert_eq!(trace.len(), 3);
        assert_eq!(trace[0], config(0, 0));
        assert_eq!(trace[1], config(0, 1));
        assert_eq!(trace[2], config(1, 2));
    }

    #[test]
    fn test_trace_of_root() {
        let mut store = ConfigStore::new();
        let root = store.insert(config(0, 0), None).unwrap();
        assert_eq!(store.trace_to(root), vec![config(0, 0)]);
    }
}
