use crate::graph::Key;
use crate::tree::NodeId;

/// Per-compilation memo table from node identity to the key of its entry.
///
/// This is where common subexpressions collapse: a node reached through a
/// second path resolves to the key assigned on the first.
#[derive(Debug, Default)]
pub struct Scope {
    slots: Vec<Option<Key>>,
    len: usize,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(nodes: usize) -> Self {
        Self {
            slots: vec![None; nodes],
            len: 0,
        }
    }

    pub fn get(&self, node: NodeId) -> Option<&Key> {
        self.slots.get(node.index()).and_then(Option::as_ref)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.get(node).is_some()
    }

    /// Number of nodes mapped so far.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Return the key already mapped to `node`, or run `compute` and map its
    /// result. `compute` is not invoked on a hit.
    pub fn resolve<E>(
        &mut self,
        node: NodeId,
        compute: impl FnOnce(&Scope) -> Result<Key, E>,
    ) -> Result<Key, E> {
        if let Some(key) = self.get(node) {
            return Ok(key.clone());
        }
        let key = compute(self)?;
        if self.slots.len() <= node.index() {
            self.slots.resize(node.index() + 1, None);
        }
        self.slots[node.index()] = Some(key.clone());
        self.len += 1;
        Ok(key)
    }
}
