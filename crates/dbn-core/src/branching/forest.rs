//! Arena-backed forest of edges recording the contraction hierarchy.
//!
//! Every chosen edge becomes a node; the edges of a contracted cycle hang
//! below the edge that later entered the contracted vertex. Nodes are
//! addressed by index and never freed; deleting a path only unlinks it from
//! the root set.

use std::collections::BTreeMap;

use super::Edge;

pub(crate) type NodeId = usize;

#[derive(Debug, Clone)]
struct Node {
    edge: Edge,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct EdgeForest {
    nodes: Vec<Node>,
    /// Current roots keyed by `(tail, head)`.
    roots: BTreeMap<(usize, usize), NodeId>,
}

impl EdgeForest {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, edge: Edge, parent: Option<NodeId>) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            edge,
            parent,
            children: Vec::new(),
        });
        id
    }

    /// Add `edge` as a new root above `children`. A child that is already a
    /// root is re-parented; any other child gets a fresh leaf node.
    pub(crate) fn add(&mut self, edge: Edge, children: &[Edge]) -> NodeId {
        let id = self.push(edge, None);
        for child in children {
            let child_id = match self.roots.remove(&child.key()) {
                Some(existing) => {
                    self.nodes[existing].parent = Some(id);
                    existing
                }
                None => self.push(*child, Some(id)),
            };
            self.nodes[id].children.push(child_id);
        }
        self.roots.insert(edge.key(), id);
        id
    }

    /// Remove the path from `leaf` up to its root. Every other child met
    /// along the way becomes a root.
    pub(crate) fn delete_up(&mut self, leaf: NodeId) {
        let mut orphans = Vec::new();
        let mut child = leaf;
        let mut parent = self.nodes[leaf].parent;
        while let Some(p) = parent {
            for &other in &self.nodes[p].children {
                if other != child {
                    orphans.push(other);
                }
            }
            child = p;
            parent = self.nodes[p].parent;
        }
        self.detach(child);
        for orphan in orphans {
            self.nodes[orphan].parent = None;
            self.roots.insert(self.nodes[orphan].edge.key(), orphan);
        }
    }

    /// Drop `id` from the root set if it is there.
    pub(crate) fn detach(&mut self, id: NodeId) {
        let key = self.nodes[id].edge.key();
        if self.roots.get(&key) == Some(&id) {
            self.roots.remove(&key);
        }
    }

    /// Root with the lowest arena index.
    pub(crate) fn first_root(&self) -> Option<NodeId> {
        self.roots.values().min().copied()
    }

    pub(crate) fn edge(&self, id: NodeId) -> Edge {
        self.nodes[id].edge
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn e(tail: usize, head: usize) -> Edge {
        Edge::new(tail, head, 0.0)
    }

    #[test]
    fn add_reparents_existing_roots() {
        let mut f = EdgeForest::new();
        f.add(e(0, 1), &[]);
        let top = f.add(e(2, 3), &[e(0, 1), e(4, 5)]);
        assert_eq!(f.first_root(), Some(top));
        f.detach(top);
        // the old root now hangs below `top`
        assert_eq!(f.first_root(), None);
    }

    #[test]
    fn delete_up_orphans_siblings() {
        let mut f = EdgeForest::new();
        let leaf = f.add(e(0, 1), &[]);
        f.add(e(2, 3), &[e(0, 1), e(4, 5), e(6, 7)]);
        f.delete_up(leaf);
        let mut remaining = Vec::new();
        while let Some(root) = f.first_root() {
            remaining.push(f.edge(root).key());
            f.detach(root);
        }
        remaining.sort_unstable();
        assert_eq!(remaining, vec![(4, 5), (6, 7)]);
    }
}
