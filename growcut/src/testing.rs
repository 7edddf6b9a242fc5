//! Volume builders shared by the unit tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::volume::{ImageGeometry, Volume};

pub fn uniform_intensity(dims: [usize; 3], value: f32) -> Volume {
    Volume::filled(ImageGeometry::new(dims), value)
}

/// Intensities drawn uniformly from `0..100`.
pub fn random_intensity(dims: [usize; 3], seed: u64) -> Volume {
    let mut rng = StdRng::seed_from_u64(seed);
    let geometry = ImageGeometry::new(dims);
    let count = dims[0] * dims[1] * dims[2];
    let voxels: Vec<f32> = (0..count).map(|_| rng.random_range(0.0..100.0)).collect();
    Volume::from_voxels(geometry, voxels).unwrap()
}

/// `u8` seed volume with the given `(x, y, z) -> label` seeds.
pub fn seeds(dims: [usize; 3], seeds: &[([usize; 3], u8)]) -> Volume {
    let mut volume = Volume::filled(ImageGeometry::new(dims), 0u8);
    for &([x, y, z], label) in seeds {
        assert!(volume.set(x, y, z, label));
    }
    volume
}

/// `u8` mask excluding every voxel for which `excluded(x, y, z)` holds.
pub fn mask(dims: [usize; 3], excluded: impl Fn(usize, usize, usize) -> bool) -> Volume {
    let mut volume = Volume::filled(ImageGeometry::new(dims), 0u8);
    for z in 0..dims[2] {
        for y in 0..dims[1] {
            for x in 0..dims[0] {
                if excluded(x, y, z) {
                    volume.set(x, y, z, 1u8);
                }
            }
        }
    }
    volume
}

pub fn labels(volume: &Volume) -> Vec<u8> {
    volume.voxels::<u8>().unwrap().to_vec()
}
