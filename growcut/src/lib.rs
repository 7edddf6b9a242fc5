//! Seeded region-growing segmentation of dense 3D volumes.
//!
//! Every voxel receives the label of the seed it can be reached from at the
//! lowest accumulated intensity-difference cost. Propagation runs Dijkstra
//! style over an index-addressed Fibonacci heap with one node per voxel, and
//! a session can re-run incrementally after seeds are added, revisiting only
//! the voxels the new seeds can claim.
//!
//! ```no_run
//! use growcut::{GrowCutConfig, GrowCutEngine, GrowCutInput, ImageGeometry, Volume};
//!
//! let geometry = ImageGeometry::new([64, 64, 64]);
//! let intensity = Volume::filled(geometry.clone(), 0.0f32);
//! let mut seeds = Volume::filled(geometry, 0u8);
//! seeds.set(10, 10, 10, 1u8);
//! seeds.set(50, 50, 50, 2u8);
//!
//! let mut engine = GrowCutEngine::new(GrowCutConfig::default())?;
//! let labels = engine.segment(&GrowCutInput::new(&intensity, &seeds))?;
//! # Ok::<(), growcut::GrowCutError>(())
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod fields;
pub mod heap;
pub mod neighbors;
pub mod scalar;
pub mod volume;

#[cfg(test)]
mod testing;

pub use config::{Connectivity, GrowCutConfig};
pub use engine::{
    EngineState, GrowCutEngine, GrowCutInput, GrowCutOutput, RunKind, RunMode, RunSummary,
};
pub use error::{GrowCutError, GrowCutResult, VolumeRole};
pub use scalar::ScalarType;
pub use volume::{ImageGeometry, ScalarBuffer, Volume};
