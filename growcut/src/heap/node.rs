/// Index of a node inside the arena a [`FibHeap`](super::FibHeap) operates on.
pub type NodeIndex = u32;

/// Null link.
pub const NONE: NodeIndex = NodeIndex::MAX;

/// One heap entry per voxel. Structural links are arena indices, which keeps
/// the node at 28 bytes regardless of pointer width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeapNode {
    pub(super) key: f32,
    pub(super) left: NodeIndex,
    pub(super) right: NodeIndex,
    pub(super) parent: NodeIndex,
    pub(super) child: NodeIndex,
    pub(super) degree: u16,
    pub(super) mark: bool,
    voxel_index: u32,
}

impl HeapNode {
    pub fn new(voxel_index: u32) -> Self {
        Self {
            key: f32::INFINITY,
            left: NONE,
            right: NONE,
            parent: NONE,
            child: NONE,
            degree: 0,
            mark: false,
            voxel_index,
        }
    }

    #[inline]
    pub fn key(&self) -> f32 {
        self.key
    }

    /// Sets the key of a node that is not currently held by a heap.
    /// Keys of held nodes change only through `FibHeap::decrease_key`.
    #[inline]
    pub fn set_key(&mut self, key: f32) {
        self.key = key;
    }

    #[inline]
    pub fn voxel_index(&self) -> u32 {
        self.voxel_index
    }

    #[inline]
    pub fn degree(&self) -> u16 {
        self.degree
    }

    #[inline]
    pub fn is_marked(&self) -> bool {
        self.mark
    }

    #[inline]
    pub fn parent(&self) -> Option<NodeIndex> {
        (self.parent != NONE).then_some(self.parent)
    }

    #[inline]
    pub fn child(&self) -> Option<NodeIndex> {
        (self.child != NONE).then_some(self.child)
    }

    /// Puts the node back into the detached single-node state, keeping its key.
    #[inline]
    pub(super) fn detach(&mut self, own_index: NodeIndex) {
        self.left = own_index;
        self.right = own_index;
        self.parent = NONE;
        self.child = NONE;
        self.degree = 0;
        self.mark = false;
    }
}
