//! Maximum-weight branchings (Chu–Liu/Edmonds with Tarjan's contraction
//! bookkeeping and Camerini's leaf phase).
//!
//! The input is an `n x n` matrix where `matrix[head][tail]` is the gain of
//! the edge `tail -> head`; the diagonal is ignored. The result is a set of
//! edges in which every node has at most one parent and no cycle exists.

mod disjoint_sets;
mod forest;

use std::collections::{BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DbnError, Result};
use crate::logging::{event_names, Stage};
use disjoint_sets::DisjointSets;
use forest::{EdgeForest, NodeId};

/// A weighted directed edge `tail -> head`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub tail: usize,
    pub head: usize,
    pub weight: f64,
}

impl Edge {
    pub fn new(tail: usize, head: usize, weight: f64) -> Self {
        Self { tail, head, weight }
    }

    /// Identity of the edge, ignoring its weight.
    pub fn key(&self) -> (usize, usize) {
        (self.tail, self.head)
    }
}

/// The maximum branching of a weight matrix.
#[derive(Debug, Clone)]
pub struct OptimumBranching {
    num_nodes: usize,
    /// Sorted by head.
    edges: Vec<Edge>,
    parent: Vec<Option<usize>>,
}

impl OptimumBranching {
    /// Compute the branching.
    ///
    /// With `spanning` set, every node except one root receives a parent;
    /// otherwise an edge is only taken while its (reduced) gain is positive.
    /// `root`, when given, never receives a parent. Emitted edges carry
    /// their original matrix weight.
    pub fn new(matrix: &[Vec<f64>], root: Option<usize>, spanning: bool) -> Result<Self> {
        let n = matrix.len();
        for (head, row) in matrix.iter().enumerate() {
            if row.len() != n {
                return Err(DbnError::NonSquareMatrix {
                    row: head,
                    expected: n,
                    actual: row.len(),
                });
            }
            for (tail, &weight) in row.iter().enumerate() {
                if tail != head && !weight.is_finite() {
                    return Err(DbnError::NonFiniteWeight { head, tail, weight });
                }
            }
        }
        if let Some(r) = root {
            if r >= n {
                return Err(DbnError::NodeOutOfRange {
                    node: r,
                    num_nodes: n,
                });
            }
        }

        let edges = contract_and_expand(matrix, root, spanning);
        let mut parent = vec![None; n];
        for e in &edges {
            parent[e.head] = Some(e.tail);
        }
        let branching = Self {
            num_nodes: n,
            edges,
            parent,
        };
        debug!(
            event = event_names::BRANCH_BUILT,
            stage = %Stage::Branch,
            nodes = n,
            edges = branching.edges.len(),
            spanning,
            "branching built"
        );
        Ok(branching)
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn into_edges(self) -> Vec<Edge> {
        self.edges
    }

    pub fn parent_of(&self, node: usize) -> Option<usize> {
        self.parent.get(node).copied().flatten()
    }

    /// Nodes without a parent, ascending.
    pub fn roots(&self) -> Vec<usize> {
        (0..self.num_nodes)
            .filter(|&i| self.parent[i].is_none())
            .collect()
    }

    /// Children of `node`, ascending.
    pub fn children(&self, node: usize) -> Vec<usize> {
        (0..self.num_nodes)
            .filter(|&i| self.parent[i] == Some(node))
            .collect()
    }

    /// Ancestors of `node`, nearest first.
    pub fn ancestors(&self, node: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut cur = node;
        while let Some(p) = self.parent_of(cur) {
            if out.len() >= self.num_nodes {
                break;
            }
            out.push(p);
            cur = p;
        }
        out
    }

    /// Sum of the emitted edge weights.
    pub fn total_weight(&self) -> f64 {
        self.edges.iter().map(|e| e.weight).sum()
    }

    /// Breadth-first visit order over every tree, roots ascending and
    /// children ascending.
    pub fn breadth_first_order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.num_nodes);
        let mut queue = VecDeque::new();
        for root in self.roots() {
            queue.push_back(root);
            while let Some(v) = queue.pop_front() {
                order.push(v);
                queue.extend(self.children(v));
            }
        }
        order
    }

    /// Replace the branching by the chain through its breadth-first order,
    /// so every node's ancestors are all nodes visited before it. Chain
    /// edges have zero weight.
    pub fn breadth_first_chain(&self) -> OptimumBranching {
        let order = self.breadth_first_order();
        let mut edges: Vec<Edge> = order
            .windows(2)
            .map(|w| Edge::new(w[0], w[1], 0.0))
            .collect();
        edges.sort_by_key(|e| e.head);
        let mut parent = vec![None; self.num_nodes];
        for e in &edges {
            parent[e.head] = Some(e.tail);
        }
        OptimumBranching {
            num_nodes: self.num_nodes,
            edges,
            parent,
        }
    }
}

fn contract_and_expand(matrix: &[Vec<f64>], root: Option<usize>, spanning: bool) -> Vec<Edge> {
    let n = matrix.len();
    let mut scc = DisjointSets::new(n);
    let mut wcc = DisjointSets::new(n);
    let mut forest = EdgeForest::new();

    // incoming edges per vertex, sorted by tail
    let mut incident: Vec<Vec<Edge>> = (0..n)
        .map(|head| {
            (0..n)
                .filter(|&tail| tail != head)
                .map(|tail| Edge::new(tail, head, matrix[head][tail]))
                .collect()
        })
        .collect();
    let mut cycle_edges: Vec<Vec<Edge>> = vec![Vec::new(); n];
    let mut entering: Vec<Option<Edge>> = vec![None; n];
    let mut forest_leaf: Vec<Option<NodeId>> = vec![None; n];
    let mut min: Vec<usize> = (0..n).collect();
    let mut vertices: VecDeque<usize> = (0..n).filter(|&v| Some(v) != root).collect();
    let mut roots: BTreeSet<usize> = root.into_iter().collect();

    while let Some(r) = vertices.pop_front() {
        let Some(max_index) = heaviest_index(&incident[r]) else {
            roots.insert(min[r]);
            continue;
        };
        let heaviest = incident[r].remove(max_index);
        if !spanning && heaviest.weight <= 0.0 {
            roots.insert(min[r]);
            continue;
        }

        let tail_weak = wcc.find(heaviest.tail);
        let head_weak = wcc.find(heaviest.head);

        let node = forest.add(heaviest, &cycle_edges[r]);
        if cycle_edges[r].is_empty() {
            forest_leaf[heaviest.head] = Some(node);
        }

        if tail_weak != head_weak {
            wcc.union(tail_weak, head_weak);
            entering[r] = Some(heaviest);
            continue;
        }

        // heaviest closes a cycle through r
        cycle_edges[r].clear();
        let mut lightest = heaviest;
        let mut cursor = Some(heaviest);
        while let Some(edge) = cursor {
            if edge.weight < lightest.weight {
                lightest = edge;
            }
            cycle_edges[r].push(edge);
            cursor = entering[scc.find(edge.tail)];
        }

        let shift = lightest.weight - heaviest.weight;
        for e in incident[r].iter_mut() {
            e.weight += shift;
        }
        min[r] = min[scc.find(lightest.head)];

        let mut cursor = entering[scc.find(heaviest.tail)];
        while let Some(edge) = cursor {
            let head_strong = scc.find(edge.head);
            let shift = lightest.weight - edge.weight;
            for e in incident[head_strong].iter_mut() {
                e.weight += shift;
            }
            scc.union(r, head_strong);
            let own = std::mem::take(&mut incident[r]);
            let absorbed = std::mem::take(&mut incident[head_strong]);
            incident[r] = merge(own, absorbed, &mut scc, r);
            cursor = entering[scc.find(edge.tail)];
        }

        vertices.push_front(r);
    }

    // leaf phase
    for &root in &roots {
        if let Some(leaf) = forest_leaf[root] {
            forest.delete_up(leaf);
        }
    }

    let mut edges = Vec::new();
    while let Some(top) = forest.first_root() {
        let e = forest.edge(top);
        edges.push(Edge::new(e.tail, e.head, matrix[e.head][e.tail]));
        if let Some(leaf) = forest_leaf[e.head] {
            forest.delete_up(leaf);
        }
        forest.detach(top);
    }
    edges.sort_by_key(|e| e.head);
    edges
}

/// Index of the first edge with the largest weight.
fn heaviest_index(edges: &[Edge]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, e) in edges.iter().enumerate() {
        if best.is_none_or(|b| e.weight > edges[b].weight) {
            best = Some(i);
        }
    }
    best
}

/// Merge two tail-sorted edge lists, dropping edges whose tail lies inside
/// `component` and keeping the heavier edge on equal tails (the second on a
/// tie).
fn merge(left: Vec<Edge>, right: Vec<Edge>, scc: &mut DisjointSets, component: usize) -> Vec<Edge> {
    let left: Vec<Edge> = left
        .into_iter()
        .filter(|e| scc.find(e.tail) != component)
        .collect();
    let right: Vec<Edge> = right
        .into_iter()
        .filter(|e| scc.find(e.tail) != component)
        .collect();

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut a = left.into_iter().peekable();
    let mut b = right.into_iter().peekable();
    loop {
        match (a.peek(), b.peek()) {
            (Some(x), Some(y)) => {
                if x.tail < y.tail {
                    merged.extend(a.next());
                } else if x.tail > y.tail {
                    merged.extend(b.next());
                } else {
                    let (x, y) = (a.next(), b.next());
                    match (x, y) {
                        (Some(x), Some(y)) if x.weight > y.weight => merged.push(x),
                        (_, Some(y)) => merged.push(y),
                        _ => {}
                    }
                }
            }
            (Some(_), None) => merged.extend(a.by_ref()),
            (None, Some(_)) => merged.extend(b.by_ref()),
            (None, None) => break,
        }
    }
    merged
}
