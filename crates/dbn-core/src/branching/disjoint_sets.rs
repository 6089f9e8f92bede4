//! Union-find over `0..n` with path compression.

#[derive(Debug, Clone)]
pub(crate) struct DisjointSets {
    parent: Vec<usize>,
}

impl DisjointSets {
    pub(crate) fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    pub(crate) fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut cur = x;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }

    /// Join two sets given their roots; `keep` stays the representative.
    pub(crate) fn union(&mut self, keep: usize, absorbed: usize) {
        self.parent[absorbed] = keep;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_keeps_first_root() {
        let mut sets = DisjointSets::new(5);
        sets.union(3, 1);
        sets.union(3, 4);
        assert_eq!(sets.find(1), 3);
        assert_eq!(sets.find(4), 3);
        assert_eq!(sets.find(0), 0);
        sets.union(0, 3);
        assert_eq!(sets.find(1), 0);
    }

    #[test]
    fn self_union_is_harmless() {
        let mut sets = DisjointSets::new(2);
        sets.union(1, 1);
        assert_eq!(sets.find(1), 1);
    }
}
