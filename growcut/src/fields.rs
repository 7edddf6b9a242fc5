//! Per-voxel working state and the padded grid it is laid out on.
//!
//! The engine surrounds the caller's grid with a one-voxel guard shell so
//! that every caller voxel has all of its neighbors in bounds. Guard voxels
//! are never seeds, never enter the heap and never reach the output.

use crate::error::{GrowCutError, GrowCutResult};
use crate::heap::{HeapNode, NodeIndex, NONE};

/// Smallest extent along any axis.
pub const MIN_DIMENSION: usize = 3;

/// Mapping between the caller grid and the padded working grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaddedGrid {
    dims: [usize; 3],
    padded: [usize; 3],
}

impl PaddedGrid {
    /// Validates `dims` and returns the padded layout. The padded voxel count
    /// plus the warm-up scratch node must be addressable by [`NodeIndex`].
    pub fn new(dims: [usize; 3]) -> GrowCutResult<Self> {
        if dims.iter().any(|&d| d < MIN_DIMENSION) {
            return Err(GrowCutError::VolumeTooSmall {
                dims,
                min: MIN_DIMENSION,
            });
        }

        let padded = dims.map(|d| d.saturating_add(2));
        let required = padded.iter().map(|&d| d as u128).product::<u128>() + 1;
        // NONE is reserved as the null link
        let max = NONE as u128;
        if required > max {
            return Err(GrowCutError::VolumeTooLarge {
                dims,
                required,
                max,
            });
        }

        Ok(Self { dims, padded })
    }

    #[inline]
    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    #[inline]
    pub fn padded_dims(&self) -> [usize; 3] {
        self.padded
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.dims[0] * self.dims[1] * self.dims[2]
    }

    #[inline]
    pub fn padded_len(&self) -> usize {
        self.padded[0] * self.padded[1] * self.padded[2]
    }

    /// Padded index of caller voxel `(x, y, z)`.
    #[inline]
    pub fn padded_index(&self, x: usize, y: usize, z: usize) -> usize {
        (x + 1) + self.padded[0] * ((y + 1) + self.padded[1] * (z + 1))
    }

    pub fn is_guard(&self, padded_index: usize) -> bool {
        let [px, py, pz] = self.padded;
        let x = padded_index % px;
        let y = (padded_index / px) % py;
        let z = padded_index / (px * py);
        x == 0 || y == 0 || z == 0 || x == px - 1 || y == py - 1 || z == pz - 1
    }

    /// Padded indices of the caller voxels, in caller (x-fastest) order.
    pub fn interior_indices(&self) -> impl Iterator<Item = usize> + '_ {
        let [dx, dy, dz] = self.dims;
        (0..dz).flat_map(move |z| {
            (0..dy).flat_map(move |y| (0..dx).map(move |x| self.padded_index(x, y, z)))
        })
    }

    /// Copies caller-grid values into a new padded buffer, filling the guard
    /// shell with `fill`.
    pub fn pad_with<S: Copy, T: Copy>(
        &self,
        src: &[S],
        fill: T,
        what: &'static str,
        mut convert: impl FnMut(S) -> T,
    ) -> GrowCutResult<Vec<T>> {
        debug_assert_eq!(src.len(), self.len());
        let mut padded = try_filled(self.padded_len(), fill, what)?;
        for (padded_index, &value) in self.interior_indices().zip(src) {
            padded[padded_index] = convert(value);
        }
        Ok(padded)
    }

    /// Extracts the caller-grid values from a padded buffer.
    pub fn unpad<T: Copy>(&self, padded: &[T]) -> Vec<T> {
        debug_assert_eq!(padded.len(), self.padded_len());
        self.interior_indices().map(|i| padded[i]).collect()
    }
}

/// Allocates `len` copies of `value`, reporting allocation failure instead of
/// aborting.
pub(crate) fn try_filled<T: Clone>(
    len: usize,
    value: T,
    what: &'static str,
) -> GrowCutResult<Vec<T>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| GrowCutError::AllocationFailed {
            what,
            bytes: len.saturating_mul(std::mem::size_of::<T>()),
        })?;
    buffer.resize(len, value);
    Ok(buffer)
}

/// Result of the last completed run, used to bound incremental runs.
#[derive(Debug, Clone)]
pub struct PreviousState {
    pub(crate) distance: Vec<f32>,
    pub(crate) label: Vec<i32>,
    pub(crate) seeds: Vec<i32>,
    pub(crate) excluded: Vec<bool>,
}

/// Working arrays of one segmentation session, all on the padded grid.
#[derive(Debug, Clone)]
pub struct VoxelFields {
    pub(crate) distance: Vec<f32>,
    pub(crate) label: Vec<i32>,
    /// Allocated up front so that snapshotting a finished run cannot fail.
    previous: PreviousState,
    has_previous: bool,
}

impl VoxelFields {
    pub fn allocate(grid: &PaddedGrid) -> GrowCutResult<Self> {
        let len = grid.padded_len();
        Ok(Self {
            distance: try_filled(len, f32::INFINITY, "distance field")?,
            label: try_filled(len, 0, "label field")?,
            previous: PreviousState {
                distance: try_filled(len, f32::INFINITY, "previous distance field")?,
                label: try_filled(len, 0, "previous label field")?,
                seeds: try_filled(len, 0, "previous seed field")?,
                excluded: try_filled(len, true, "previous mask field")?,
            },
            has_previous: false,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.distance.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.distance.is_empty()
    }

    #[inline]
    pub fn distance(&self) -> &[f32] {
        &self.distance
    }

    #[inline]
    pub fn label(&self) -> &[i32] {
        &self.label
    }

    pub fn previous(&self) -> Option<&PreviousState> {
        self.has_previous.then_some(&self.previous)
    }

    /// Overwrites the previous-run snapshot with the current fields.
    pub(crate) fn snapshot(&mut self, seeds: &[i32], excluded: &[bool]) {
        self.previous.distance.copy_from_slice(&self.distance);
        self.previous.label.copy_from_slice(&self.label);
        self.previous.seeds.copy_from_slice(seeds);
        self.previous.excluded.copy_from_slice(excluded);
        self.has_previous = true;
    }

    pub(crate) fn discard_previous(&mut self) {
        self.has_previous = false;
    }

    /// Mutable current fields together with the read-only snapshot.
    pub(crate) fn split_mut(&mut self) -> (&mut [f32], &mut [i32], &PreviousState) {
        (&mut self.distance, &mut self.label, &self.previous)
    }
}

impl PreviousState {
    #[inline]
    pub fn distance(&self) -> &[f32] {
        &self.distance
    }

    #[inline]
    pub fn label(&self) -> &[i32] {
        &self.label
    }

    #[inline]
    pub fn seeds(&self) -> &[i32] {
        &self.seeds
    }
}

/// One node per padded voxel plus the warm-up scratch node at the end.
pub(crate) fn allocate_nodes(grid: &PaddedGrid) -> GrowCutResult<Vec<HeapNode>> {
    let count = grid.padded_len() + 1;
    let mut nodes = Vec::new();
    nodes
        .try_reserve_exact(count)
        .map_err(|_| GrowCutError::AllocationFailed {
            what: "heap node array",
            bytes: count.saturating_mul(std::mem::size_of::<HeapNode>()),
        })?;
    nodes.extend((0..count).map(|i| HeapNode::new(i as NodeIndex)));
    Ok(nodes)
}
