use strum_macros::Display;
use thiserror::Error;

use crate::heap::HeapError;
use crate::scalar::ScalarType;
use crate::volume::GeometryMismatch;

/// Which input a validation error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum VolumeRole {
    Intensity,
    Seed,
    Mask,
}

/// Errors that reject a segmentation run. Every variant is raised before the
/// engine state or any output is modified.
#[derive(Debug, Error)]
pub enum GrowCutError {
    #[error("{role} volume does not match the intensity volume geometry: {mismatch}")]
    GeometryMismatch {
        role: VolumeRole,
        mismatch: GeometryMismatch,
    },

    #[error("voxel buffer holds {found} voxels but dimensions {dims:?} require {expected}")]
    VoxelCountMismatch {
        dims: [usize; 3],
        expected: usize,
        found: usize,
    },

    #[error("volume dimensions {dims:?} are too small, every axis needs at least {min} voxels")]
    VolumeTooSmall { dims: [usize; 3], min: usize },

    #[error(
        "volume dimensions {dims:?} need {required} heap nodes, \
         more than the {max} addressable by a 32-bit node index"
    )]
    VolumeTooLarge {
        dims: [usize; 3],
        required: u128,
        max: u128,
    },

    #[error("failed to allocate {bytes} bytes for the {what}")]
    AllocationFailed { what: &'static str, bytes: usize },

    #[error("unsupported {role} scalar type {scalar_type}")]
    UnsupportedScalarType {
        role: VolumeRole,
        scalar_type: ScalarType,
    },

    #[error("seed label {value} at voxel {index} does not fit the 32-bit label range")]
    LabelOutOfRange { index: usize, value: i128 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse configuration")]
    ConfigParse(#[from] serde_yml::Error),

    #[error("incremental run requested but {reason}")]
    NoPreviousState { reason: &'static str },

    #[error("heap invariant violated")]
    Heap(#[from] HeapError),
}

pub type GrowCutResult<T> = Result<T, GrowCutError>;
