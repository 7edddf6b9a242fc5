//! Precomputed neighborhood of a padded voxel grid.

use glam::DVec3;

use crate::config::Connectivity;
use crate::fields::PaddedGrid;

/// Index offsets of one voxel neighborhood, plus optional per-offset spatial
/// penalties. Built once per geometry and configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborModel {
    grid: PaddedGrid,
    offsets: Vec<isize>,
    /// Step vectors in voxel units, parallel to `offsets`.
    steps: Vec<[i32; 3]>,
    /// `distance_penalty * |step * spacing|`, absent when the penalty is zero.
    penalties: Option<Vec<f32>>,
}

impl NeighborModel {
    pub fn new(
        grid: PaddedGrid,
        spacing: DVec3,
        connectivity: Connectivity,
        distance_penalty: f64,
    ) -> Self {
        let [px, py, _] = grid.padded_dims();
        let (px, py) = (px as isize, py as isize);

        let mut offsets = Vec::with_capacity(connectivity.neighbor_count());
        let mut steps = Vec::with_capacity(connectivity.neighbor_count());
        for dz in -1..=1 {
            for dy in -1..=1 {
                for dx in -1..=1 {
                    let step = [dx, dy, dz];
                    if !connectivity.includes(step) {
                        continue;
                    }
                    offsets.push(dx as isize + px * (dy as isize + py * dz as isize));
                    steps.push(step);
                }
            }
        }

        let penalties = (distance_penalty > 0.0).then(|| {
            steps
                .iter()
                .map(|&[dx, dy, dz]| {
                    let physical = DVec3::new(dx as f64, dy as f64, dz as f64) * spacing;
                    (distance_penalty * physical.length()) as f32
                })
                .collect()
        });

        Self {
            grid,
            offsets,
            steps,
            penalties,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    #[inline]
    pub fn offsets(&self) -> &[isize] {
        &self.offsets
    }

    #[inline]
    pub fn steps(&self) -> &[[i32; 3]] {
        &self.steps
    }

    #[inline]
    pub fn penalties(&self) -> Option<&[f32]> {
        self.penalties.as_deref()
    }

    /// Spatial cost of stepping along neighbor `k`.
    #[inline]
    pub fn penalty(&self, k: usize) -> f32 {
        match &self.penalties {
            Some(penalties) => penalties[k],
            None => 0.0,
        }
    }

    /// Padded index of neighbor `k` of `index`. Only valid for interior
    /// voxels, see [`Self::usable_count`].
    #[inline]
    pub fn neighbor(&self, index: usize, k: usize) -> usize {
        index.wrapping_add_signed(self.offsets[k])
    }

    /// Number of neighbors that may be visited from `index`: the whole
    /// neighborhood for interior voxels, none on the guard shell.
    #[inline]
    pub fn usable_count(&self, index: usize) -> usize {
        if self.grid.is_guard(index) {
            0
        } else {
            self.offsets.len()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> PaddedGrid {
        PaddedGrid::new([3, 4, 5]).unwrap()
    }

    #[test]
    fn neighborhood_sizes() {
        for connectivity in [
            Connectivity::Six,
            Connectivity::Eighteen,
            Connectivity::TwentySix,
        ] {
            let model = NeighborModel::new(grid(), DVec3::ONE, connectivity, 0.0);
            assert_eq!(model.len(), connectivity.neighbor_count());
            assert!(model.penalties().is_none());
        }
    }

    #[test]
    fn offsets_are_symmetric_and_unique() {
        let model = NeighborModel::new(grid(), DVec3::ONE, Connectivity::TwentySix, 0.0);
        let offsets = model.offsets();
        for &offset in offsets {
            assert_ne!(offset, 0);
            assert!(offsets.contains(&-offset));
            assert_eq!(offsets.iter().filter(|&&o| o == offset).count(), 1);
        }
    }

    #[test]
    fn neighbors_of_interior_voxel_stay_in_grid() {
        let grid = grid();
        let model = NeighborModel::new(grid, DVec3::ONE, Connectivity::TwentySix, 0.0);

        // caller corner voxel: some neighbors fall on the guard shell
        let corner = grid.padded_index(0, 0, 0);
        assert_eq!(model.usable_count(corner), 26);
        let guards = (0..model.len())
            .map(|k| model.neighbor(corner, k))
            .filter(|&n| {
                assert!(n < grid.padded_len());
                grid.is_guard(n)
            })
            .count();
        assert_eq!(guards, 26 - 7);

        assert_eq!(model.usable_count(0), 0);
    }

    #[test]
    fn penalties_follow_physical_step_length() {
        let spacing = DVec3::new(1.0, 2.0, 0.5);
        let model = NeighborModel::new(grid(), spacing, Connectivity::TwentySix, 2.0);
        let penalties = model.penalties().unwrap();
        assert_eq!(penalties.len(), 26);

        for (k, &[dx, dy, dz]) in model.steps().iter().enumerate() {
            let [sx, sy, sz] = [dx as f64 * 1.0, dy as f64 * 2.0, dz as f64 * 0.5];
            let expected = 2.0 * (sx * sx + sy * sy + sz * sz).sqrt();
            assert!((model.penalty(k) as f64 - expected).abs() < 1e-5);
        }
    }

    #[test]
    fn face_offsets_match_layout() {
        let grid = grid();
        let model = NeighborModel::new(grid, DVec3::ONE, Connectivity::Six, 0.0);
        let [px, py, _] = grid.padded_dims();
        let (px, py) = (px as isize, py as isize);
        let mut offsets = model.offsets().to_vec();
        offsets.sort_unstable();
        assert_eq!(offsets, vec![-px * py, -px, -1, 1, px, px * py]);
    }
}
