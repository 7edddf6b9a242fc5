//! Fibonacci heap over an externally owned, index-addressed node arena.
//!
//! The heap itself stores only bookkeeping (the minimum root and counters).
//! Nodes live in a caller-owned `[HeapNode]` slice that is passed to every
//! operation, so a single arena can back one node per voxel of a volume with
//! hundreds of millions of voxels, and several heaps may share one arena.
//!
//! Complexities are the textbook ones: `insert`, `decrease_key` and `union`
//! are O(1) amortized, `extract_min` and `delete` are O(log n) amortized.
//! Equal keys are ordered by structural position only.

mod node;
#[cfg(test)]
mod tests;

pub use node::{HeapNode, NodeIndex, NONE};

/// ln of the golden ratio; bounds the maximum root degree by `log_phi(n)`.
const LN_PHI: f64 = 0.481_211_825_059_603_4;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HeapError {
    #[error("new key {new_key} is greater than current key {current_key} of node {node}")]
    KeyIncrease {
        node: NodeIndex,
        current_key: f32,
        new_key: f32,
    },
    #[error("operation on node {node} of an empty heap")]
    Empty { node: NodeIndex },
}

#[derive(Debug, Clone)]
pub struct FibHeap {
    min: NodeIndex,
    num_nodes: usize,
    num_trees: usize,
    num_marked: usize,
    degree_table: Vec<NodeIndex>,
}

impl Default for FibHeap {
    fn default() -> Self {
        Self::new()
    }
}

impl FibHeap {
    pub fn new() -> Self {
        Self {
            min: NONE,
            num_nodes: 0,
            num_trees: 0,
            num_marked: 0,
            degree_table: Vec::new(),
        }
    }

    /// Forgets every held node. Node links in the arena are left stale and are
    /// rewritten by the next `insert` of each node.
    pub fn clear(&mut self) {
        self.min = NONE;
        self.num_nodes = 0;
        self.num_trees = 0;
        self.num_marked = 0;
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min == NONE
    }

    #[inline]
    pub fn minimum(&self) -> Option<NodeIndex> {
        (self.min != NONE).then_some(self.min)
    }

    #[inline]
    pub fn minimum_key(&self, nodes: &[HeapNode]) -> Option<f32> {
        self.minimum().map(|min| nodes[min as usize].key)
    }

    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    #[inline]
    pub fn num_trees(&self) -> usize {
        self.num_trees
    }

    #[inline]
    pub fn num_marked_nodes(&self) -> usize {
        self.num_marked
    }

    /// Adds node `index` with its current key.
    pub fn insert(&mut self, nodes: &mut [HeapNode], index: NodeIndex) {
        nodes[index as usize].detach(index);
        self.add_root(nodes, index);
        self.num_nodes += 1;
    }

    pub fn extract_min(&mut self, nodes: &mut [HeapNode]) -> Option<NodeIndex> {
        let z = self.min;
        if z == NONE {
            return None;
        }

        let first_child = nodes[z as usize].child;
        if first_child != NONE {
            let mut c = first_child;
            loop {
                let node = &mut nodes[c as usize];
                node.parent = NONE;
                if node.mark {
                    node.mark = false;
                    self.num_marked -= 1;
                }
                c = node.right;
                if c == first_child {
                    break;
                }
            }
            self.num_trees += nodes[z as usize].degree as usize;
            concat_lists(nodes, z, first_child);
            nodes[z as usize].child = NONE;
            nodes[z as usize].degree = 0;
        }

        let next = nodes[z as usize].right;
        unlink(nodes, z);
        self.num_trees -= 1;
        self.num_nodes -= 1;

        if next == z {
            self.min = NONE;
        } else {
            self.min = next;
            self.consolidate(nodes);
        }

        Some(z)
    }

    /// Lowers the key of a held node. Keys may only decrease.
    pub fn decrease_key(
        &mut self,
        nodes: &mut [HeapNode],
        index: NodeIndex,
        new_key: f32,
    ) -> Result<(), HeapError> {
        if self.min == NONE {
            return Err(HeapError::Empty { node: index });
        }
        let current_key = nodes[index as usize].key;
        // also rejects NaN
        if !(new_key <= current_key) {
            return Err(HeapError::KeyIncrease {
                node: index,
                current_key,
                new_key,
            });
        }

        nodes[index as usize].key = new_key;
        let parent = nodes[index as usize].parent;
        if parent != NONE && new_key < nodes[parent as usize].key {
            self.cut(nodes, index, parent);
            self.cascading_cut(nodes, parent);
        }
        if new_key < nodes[self.min as usize].key {
            self.min = index;
        }

        Ok(())
    }

    /// Removes a held node regardless of its key.
    pub fn delete(&mut self, nodes: &mut [HeapNode], index: NodeIndex) -> Result<(), HeapError> {
        if self.min == NONE {
            return Err(HeapError::Empty { node: index });
        }

        nodes[index as usize].key = f32::NEG_INFINITY;
        let parent = nodes[index as usize].parent;
        if parent != NONE {
            self.cut(nodes, index, parent);
            self.cascading_cut(nodes, parent);
        }
        // another node may already hold -inf, so the minimum is forced
        self.min = index;
        self.extract_min(nodes);

        Ok(())
    }

    /// Moves every node of `other` into `self`. Both heaps must use `nodes`.
    pub fn union(&mut self, nodes: &mut [HeapNode], other: FibHeap) {
        if other.min == NONE {
            return;
        }

        if self.min == NONE {
            self.min = other.min;
        } else {
            concat_lists(nodes, self.min, other.min);
            if nodes[other.min as usize].key < nodes[self.min as usize].key {
                self.min = other.min;
            }
        }

        self.num_nodes += other.num_nodes;
        self.num_trees += other.num_trees;
        self.num_marked += other.num_marked;
    }

    fn add_root(&mut self, nodes: &mut [HeapNode], index: NodeIndex) {
        nodes[index as usize].parent = NONE;
        if self.min == NONE {
            nodes[index as usize].left = index;
            nodes[index as usize].right = index;
            self.min = index;
        } else {
            splice_after(nodes, self.min, index);
            if nodes[index as usize].key < nodes[self.min as usize].key {
                self.min = index;
            }
        }
        self.num_trees += 1;
    }

    /// Merges roots of equal degree until all degrees are distinct, then
    /// rebuilds the root list and rescans it for the minimum.
    fn consolidate(&mut self, nodes: &mut [HeapNode]) {
        let mut table = std::mem::take(&mut self.degree_table);
        table.clear();
        table.resize(degree_bound(self.num_nodes), NONE);

        // the circular root list becomes a NONE-terminated chain
        let start = self.min;
        let last = nodes[start as usize].left;
        nodes[last as usize].right = NONE;

        let mut w = start;
        while w != NONE {
            let mut x = w;
            w = nodes[w as usize].right;

            let mut degree = nodes[x as usize].degree as usize;
            loop {
                if degree >= table.len() {
                    table.resize(degree + 1, NONE);
                }
                let mut y = table[degree];
                if y == NONE {
                    break;
                }
                if nodes[y as usize].key < nodes[x as usize].key {
                    std::mem::swap(&mut x, &mut y);
                }
                self.link(nodes, y, x);
                table[degree] = NONE;
                degree += 1;
            }
            table[degree] = x;
        }

        self.min = NONE;
        self.num_trees = 0;
        for &root in table.iter().filter(|&&root| root != NONE) {
            self.add_root(nodes, root);
        }

        self.degree_table = table;
    }

    /// Makes root `child` a child of root `parent`.
    fn link(&mut self, nodes: &mut [HeapNode], child: NodeIndex, parent: NodeIndex) {
        let first = nodes[parent as usize].child;
        if first == NONE {
            nodes[child as usize].left = child;
            nodes[child as usize].right = child;
            nodes[parent as usize].child = child;
        } else {
            splice_after(nodes, first, child);
        }

        let node = &mut nodes[child as usize];
        node.parent = parent;
        if node.mark {
            node.mark = false;
            self.num_marked -= 1;
        }
        nodes[parent as usize].degree += 1;
    }

    /// Moves `index` from the child list of `parent` to the root list.
    fn cut(&mut self, nodes: &mut [HeapNode], index: NodeIndex, parent: NodeIndex) {
        let right = nodes[index as usize].right;
        if right == index {
            nodes[parent as usize].child = NONE;
        } else {
            if nodes[parent as usize].child == index {
                nodes[parent as usize].child = right;
            }
            unlink(nodes, index);
        }
        nodes[parent as usize].degree -= 1;

        let node = &mut nodes[index as usize];
        if node.mark {
            node.mark = false;
            self.num_marked -= 1;
        }
        self.add_root(nodes, index);
    }

    fn cascading_cut(&mut self, nodes: &mut [HeapNode], index: NodeIndex) {
        let mut y = index;
        loop {
            let z = nodes[y as usize].parent;
            if z == NONE {
                return;
            }
            if !nodes[y as usize].mark {
                nodes[y as usize].mark = true;
                self.num_marked += 1;
                return;
            }
            self.cut(nodes, y, z);
            y = z;
        }
    }
}

fn degree_bound(num_nodes: usize) -> usize {
    ((num_nodes.max(1) as f64).ln() / LN_PHI).floor() as usize + 2
}

/// Inserts detached `index` to the right of `anchor` in anchor's circular list.
#[inline]
fn splice_after(nodes: &mut [HeapNode], anchor: NodeIndex, index: NodeIndex) {
    let right = nodes[anchor as usize].right;
    nodes[index as usize].left = anchor;
    nodes[index as usize].right = right;
    nodes[right as usize].left = index;
    nodes[anchor as usize].right = index;
}

/// Removes `index` from its circular list, leaving it as a one-node list.
#[inline]
fn unlink(nodes: &mut [HeapNode], index: NodeIndex) {
    let left = nodes[index as usize].left;
    let right = nodes[index as usize].right;
    nodes[left as usize].right = right;
    nodes[right as usize].left = left;
    nodes[index as usize].left = index;
    nodes[index as usize].right = index;
}

/// Joins two distinct circular lists given one member of each.
#[inline]
fn concat_lists(nodes: &mut [HeapNode], a: NodeIndex, b: NodeIndex) {
    let a_right = nodes[a as usize].right;
    let b_left = nodes[b as usize].left;
    nodes[a as usize].right = b;
    nodes[b as usize].left = a;
    nodes[a_right as usize].left = b_left;
    nodes[b_left as usize].right = a_right;
}
