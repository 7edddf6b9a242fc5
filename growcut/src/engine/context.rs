use log::trace;

use crate::config::GrowCutConfig;
use crate::error::GrowCutResult;
use crate::fields::{allocate_nodes, PaddedGrid, VoxelFields};
use crate::heap::{FibHeap, HeapNode, NodeIndex};
use crate::neighbors::NeighborModel;
use crate::scalar::IntensityScalar;
use crate::volume::ImageGeometry;

use super::{RunKind, RunSummary};

/// Inputs of one run, resampled onto the padded grid. The guard shell is
/// always excluded.
#[derive(Debug, Clone)]
pub struct PaddedInputs<T> {
    pub intensity: Vec<T>,
    pub seeds: Vec<i32>,
    pub excluded: Vec<bool>,
}

/// Everything a segmentation session keeps between runs on one geometry:
/// the neighbor model, the voxel fields with the previous-run snapshot, and
/// the heap with its node arena.
#[derive(Debug)]
pub struct GrowCutContext {
    geometry: ImageGeometry,
    grid: PaddedGrid,
    config: GrowCutConfig,
    neighbors: NeighborModel,
    fields: VoxelFields,
    /// One node per padded voxel plus the warm-up scratch node.
    nodes: Vec<HeapNode>,
    heap: FibHeap,
}

impl GrowCutContext {
    pub fn create(
        geometry: ImageGeometry,
        grid: PaddedGrid,
        config: GrowCutConfig,
    ) -> GrowCutResult<Self> {
        let fields = VoxelFields::allocate(&grid)?;
        let nodes = allocate_nodes(&grid)?;
        let neighbors = NeighborModel::new(
            grid,
            geometry.spacing,
            config.connectivity,
            config.distance_penalty,
        );

        Ok(Self {
            geometry,
            grid,
            config,
            neighbors,
            fields,
            nodes,
            heap: FibHeap::new(),
        })
    }

    #[inline]
    pub fn grid(&self) -> &PaddedGrid {
        &self.grid
    }

    #[inline]
    pub fn geometry(&self) -> &ImageGeometry {
        &self.geometry
    }

    #[inline]
    pub fn fields(&self) -> &VoxelFields {
        &self.fields
    }

    /// Why this context cannot serve a run on `geometry` under `config`, or
    /// `None` if it can.
    pub fn rebuild_reason(
        &self,
        geometry: &ImageGeometry,
        config: &GrowCutConfig,
    ) -> Option<&'static str> {
        if self
            .geometry
            .check_matches(geometry, config.geometry_tolerance)
            .is_err()
        {
            Some("the volume geometry changed")
        } else if !self.config.same_cost_model(config) {
            Some("the cost model changed")
        } else {
            None
        }
    }

    /// Why an incremental run on `inputs` would not reproduce a full run, or
    /// `None` if it would.
    pub fn incremental_blocker<T>(&self, inputs: &PaddedInputs<T>) -> Option<&'static str> {
        let Some(previous) = self.fields.previous() else {
            return Some("no previous run is available");
        };
        if previous.excluded != inputs.excluded {
            return Some("the mask changed");
        }
        let seed_removed = previous
            .seeds
            .iter()
            .zip(&inputs.seeds)
            .any(|(&old, &new)| old != 0 && new == 0);
        if seed_removed {
            return Some("a seed was removed");
        }
        None
    }

    /// Forgets the previous-run snapshot; the next run must be full.
    pub fn reset(&mut self) {
        self.fields.discard_previous();
        self.heap.clear();
    }

    pub fn run_full<T: IntensityScalar>(
        &mut self,
        inputs: &PaddedInputs<T>,
    ) -> GrowCutResult<RunSummary> {
        let mut summary = RunSummary::new(RunKind::Full);
        let epsilon = self.config.epsilon;

        self.heap.clear();
        for i in 0..self.grid.padded_len() {
            if inputs.excluded[i] {
                self.fields.distance[i] = epsilon;
                self.fields.label[i] = 0;
                continue;
            }

            let seed = inputs.seeds[i];
            let distance = if seed != 0 {
                summary.seeds += 1;
                epsilon
            } else {
                f32::INFINITY
            };
            self.fields.distance[i] = distance;
            self.fields.label[i] = seed;
            self.nodes[i].set_key(distance);
            self.heap.insert(&mut self.nodes, i as NodeIndex);
        }
        self.warm_up();

        while let Some(node) = self.heap.extract_min(&mut self.nodes) {
            let v = self.nodes[node as usize].voxel_index() as usize;
            summary.popped += 1;
            summary.relaxed += self.relax_from(v, inputs)?;
        }

        self.fields.snapshot(&inputs.seeds, &inputs.excluded);
        Ok(summary)
    }

    /// Recomputes only the voxels whose distance can drop below the previous
    /// run's, starting from seeds that are new or relabeled. Requires a
    /// previous run with the same mask and no removed seeds, see
    /// [`Self::incremental_blocker`].
    pub fn run_incremental<T: IntensityScalar>(
        &mut self,
        inputs: &PaddedInputs<T>,
    ) -> GrowCutResult<RunSummary> {
        let mut summary = RunSummary::new(RunKind::Incremental);
        let epsilon = self.config.epsilon;

        self.heap.clear();
        let (distance, label, previous) = self.fields.split_mut();
        for i in 0..self.grid.padded_len() {
            if inputs.excluded[i] {
                distance[i] = epsilon;
                label[i] = 0;
                continue;
            }

            let seed = inputs.seeds[i];
            if seed != 0 && seed == previous.seeds[i] {
                // its propagation is already part of the previous fields
                distance[i] = epsilon;
                label[i] = seed;
                continue;
            }

            let key = if seed != 0 {
                summary.seeds += 1;
                epsilon
            } else {
                f32::INFINITY
            };
            distance[i] = key;
            label[i] = seed;
            self.nodes[i].set_key(key);
            self.heap.insert(&mut self.nodes, i as NodeIndex);
        }
        self.warm_up();

        while let Some(node) = self.heap.extract_min(&mut self.nodes) {
            let key = self.nodes[node as usize].key();
            if key == f32::INFINITY {
                // everything left is unreachable from the new seeds
                summary.terminated_early = true;
                break;
            }

            let v = self.nodes[node as usize].voxel_index() as usize;
            summary.popped += 1;

            let (distance, label, previous) = self.fields.split_mut();
            if key > previous.distance[v] {
                distance[v] = previous.distance[v];
                label[v] = previous.label[v];
                summary.restored += 1;
                continue;
            }

            summary.relaxed += self.relax_from(v, inputs)?;
        }

        let (distance, label, previous) = self.fields.split_mut();
        for i in 0..distance.len() {
            if !inputs.excluded[i] && distance[i] > previous.distance[i] {
                distance[i] = previous.distance[i];
                label[i] = previous.label[i];
                summary.restored += 1;
            }
        }
        // the heap may still hold unreachable nodes
        self.heap.clear();

        self.fields.snapshot(&inputs.seeds, &inputs.excluded);
        Ok(summary)
    }

    /// Inserts the scratch node with key zero and immediately extracts it,
    /// which consolidates the freshly built root list once before draining.
    fn warm_up(&mut self) {
        let sentinel = self.grid.padded_len();
        self.nodes[sentinel].set_key(0.0);
        self.heap.insert(&mut self.nodes, sentinel as NodeIndex);
        let extracted = self.heap.extract_min(&mut self.nodes);
        debug_assert_eq!(extracted, Some(sentinel as NodeIndex));
        trace!("heap warmed up with {} trees", self.heap.num_trees());
    }

    /// Relaxes every usable, non-excluded neighbor of `v`. Returns the number
    /// of improved neighbors.
    fn relax_from<T: IntensityScalar>(
        &mut self,
        v: usize,
        inputs: &PaddedInputs<T>,
    ) -> GrowCutResult<usize> {
        let distance = self.fields.distance[v];
        let label = self.fields.label[v];
        let intensity = inputs.intensity[v];

        let mut relaxed = 0;
        for k in 0..self.neighbors.usable_count(v) {
            let n = self.neighbors.neighbor(v, k);
            if inputs.excluded[n] {
                continue;
            }

            let candidate =
                intensity.abs_diff_cost(inputs.intensity[n]) + distance + self.neighbors.penalty(k);
            if candidate < self.fields.distance[n] {
                self.fields.distance[n] = candidate;
                self.fields.label[n] = label;
                self.heap.decrease_key(&mut self.nodes, n as NodeIndex, candidate)?;
                relaxed += 1;
            }
        }
        Ok(relaxed)
    }
}
