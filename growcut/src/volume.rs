//! Dense scalar volumes exchanged with the engine.
//!
//! A [`Volume`] pairs an [`ImageGeometry`] (dimensions plus the
//! image-to-world placement) with a typed [`ScalarBuffer`]. Buffers are stored
//! x-fastest, so voxel `(x, y, z)` lives at `x + y*Dx + z*Dx*Dy`.

use common::{Buffer3, FloatExt};
use glam::{DAffine3, DMat3, DVec3};
use serde::{Deserialize, Serialize};

use crate::error::{GrowCutError, GrowCutResult};
use crate::scalar::{ScalarType, VoxelScalar};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageGeometry {
    pub dimensions: [usize; 3],
    /// Physical voxel size along each image axis.
    pub spacing: DVec3,
    /// World position of voxel `(0, 0, 0)`.
    pub origin: DVec3,
    /// Unit image axes in world space, one per column.
    pub directions: DMat3,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryMismatch {
    #[error("dimensions {expected:?} vs {found:?}")]
    Dimensions {
        expected: [usize; 3],
        found: [usize; 3],
    },
    #[error("spacing {expected} vs {found}")]
    Spacing { expected: DVec3, found: DVec3 },
    #[error("origin {expected} vs {found}")]
    Origin { expected: DVec3, found: DVec3 },
    #[error("axis directions differ")]
    Orientation,
}

impl ImageGeometry {
    /// Unit spacing, zero origin, identity orientation.
    pub fn new(dimensions: [usize; 3]) -> Self {
        Self {
            dimensions,
            spacing: DVec3::ONE,
            origin: DVec3::ZERO,
            directions: DMat3::IDENTITY,
        }
    }

    pub fn with_spacing(mut self, spacing: DVec3) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn with_origin(mut self, origin: DVec3) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_directions(mut self, directions: DMat3) -> Self {
        self.directions = directions;
        self
    }

    pub fn voxel_count(&self) -> Option<usize> {
        Buffer3::<u8>::checked_len(self.dimensions)
    }

    pub fn mean_spacing(&self) -> f64 {
        self.spacing.abs().element_sum() / 3.0
    }

    pub fn image_to_world(&self) -> DAffine3 {
        DAffine3::from_mat3_translation(
            self.directions * DMat3::from_diagonal(self.spacing),
            self.origin,
        )
    }

    /// World position of the center of voxel `(x, y, z)`.
    pub fn voxel_to_world(&self, x: usize, y: usize, z: usize) -> DVec3 {
        self.image_to_world()
            .transform_point3(DVec3::new(x as f64, y as f64, z as f64))
    }

    /// Compares `other` against `self`. Dimensions must be equal; spacing and
    /// origin may differ by `tolerance_fraction` of this geometry's mean
    /// spacing, direction cosines by `tolerance_fraction` itself.
    pub fn check_matches(
        &self,
        other: &ImageGeometry,
        tolerance_fraction: f64,
    ) -> Result<(), GeometryMismatch> {
        if self.dimensions != other.dimensions {
            return Err(GeometryMismatch::Dimensions {
                expected: self.dimensions,
                found: other.dimensions,
            });
        }

        let tolerance = tolerance_fraction * self.mean_spacing();
        let spacing_matches =
            (0..3).all(|axis| self.spacing[axis].approx_eq_within(other.spacing[axis], tolerance));
        if !spacing_matches {
            return Err(GeometryMismatch::Spacing {
                expected: self.spacing,
                found: other.spacing,
            });
        }

        if !self.origin.distance(other.origin).approx_eq_within(0.0, tolerance) {
            return Err(GeometryMismatch::Origin {
                expected: self.origin,
                found: other.origin,
            });
        }

        if !self
            .directions
            .abs_diff_eq(other.directions, tolerance_fraction)
        {
            return Err(GeometryMismatch::Orientation);
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScalarBuffer {
    U8(Buffer3<u8>),
    I8(Buffer3<i8>),
    U16(Buffer3<u16>),
    I16(Buffer3<i16>),
    U32(Buffer3<u32>),
    I32(Buffer3<i32>),
    U64(Buffer3<u64>),
    I64(Buffer3<i64>),
    F32(Buffer3<f32>),
    F64(Buffer3<f64>),
    Rgb8(Buffer3<[u8; 3]>),
}

macro_rules! with_buffer {
    ($value:expr, $buffer:ident => $body:expr) => {
        match $value {
            ScalarBuffer::U8($buffer) => $body,
            ScalarBuffer::I8($buffer) => $body,
            ScalarBuffer::U16($buffer) => $body,
            ScalarBuffer::I16($buffer) => $body,
            ScalarBuffer::U32($buffer) => $body,
            ScalarBuffer::I32($buffer) => $body,
            ScalarBuffer::U64($buffer) => $body,
            ScalarBuffer::I64($buffer) => $body,
            ScalarBuffer::F32($buffer) => $body,
            ScalarBuffer::F64($buffer) => $body,
            ScalarBuffer::Rgb8($buffer) => $body,
        }
    };
}

impl ScalarBuffer {
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            ScalarBuffer::U8(_) => ScalarType::U8,
            ScalarBuffer::I8(_) => ScalarType::I8,
            ScalarBuffer::U16(_) => ScalarType::U16,
            ScalarBuffer::I16(_) => ScalarType::I16,
            ScalarBuffer::U32(_) => ScalarType::U32,
            ScalarBuffer::I32(_) => ScalarType::I32,
            ScalarBuffer::U64(_) => ScalarType::U64,
            ScalarBuffer::I64(_) => ScalarType::I64,
            ScalarBuffer::F32(_) => ScalarType::F32,
            ScalarBuffer::F64(_) => ScalarType::F64,
            ScalarBuffer::Rgb8(_) => ScalarType::Rgb8,
        }
    }

    pub fn dims(&self) -> [usize; 3] {
        with_buffer!(self, b => b.dims())
    }

    pub fn len(&self) -> usize {
        with_buffer!(self, b => b.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    geometry: ImageGeometry,
    scalars: ScalarBuffer,
}

impl Volume {
    pub fn new(geometry: ImageGeometry, scalars: ScalarBuffer) -> GrowCutResult<Self> {
        if scalars.dims() != geometry.dimensions {
            return Err(GrowCutError::VoxelCountMismatch {
                dims: geometry.dimensions,
                expected: geometry.voxel_count().unwrap_or(usize::MAX),
                found: scalars.len(),
            });
        }
        Ok(Self { geometry, scalars })
    }

    pub fn from_voxels<T: VoxelScalar>(
        geometry: ImageGeometry,
        voxels: Vec<T>,
    ) -> GrowCutResult<Self> {
        let expected = geometry.voxel_count();
        if expected != Some(voxels.len()) {
            return Err(GrowCutError::VoxelCountMismatch {
                dims: geometry.dimensions,
                expected: expected.unwrap_or(usize::MAX),
                found: voxels.len(),
            });
        }
        let buffer = Buffer3::new(geometry.dimensions, voxels);
        Ok(Self {
            geometry,
            scalars: T::wrap(buffer),
        })
    }

    pub fn filled<T: VoxelScalar>(geometry: ImageGeometry, value: T) -> Self {
        let buffer = Buffer3::new_filled(geometry.dimensions, value);
        Self {
            geometry,
            scalars: T::wrap(buffer),
        }
    }

    #[inline]
    pub fn geometry(&self) -> &ImageGeometry {
        &self.geometry
    }

    #[inline]
    pub fn dims(&self) -> [usize; 3] {
        self.geometry.dimensions
    }

    #[inline]
    pub fn scalars(&self) -> &ScalarBuffer {
        &self.scalars
    }

    #[inline]
    pub fn scalar_type(&self) -> ScalarType {
        self.scalars.scalar_type()
    }

    /// Typed view of the voxels, `None` if `T` is not the stored type.
    pub fn voxels<T: VoxelScalar>(&self) -> Option<&[T]> {
        T::unwrap_ref(&self.scalars).map(|b| b.voxels())
    }

    pub fn voxels_mut<T: VoxelScalar>(&mut self) -> Option<&mut [T]> {
        T::unwrap_mut(&mut self.scalars).map(|b| b.voxels_mut())
    }

    pub fn get<T: VoxelScalar>(&self, x: usize, y: usize, z: usize) -> Option<T> {
        T::unwrap_ref(&self.scalars).map(|b| *b.get(x, y, z))
    }

    /// Sets one voxel; returns `false` if `T` is not the stored type.
    pub fn set<T: VoxelScalar>(&mut self, x: usize, y: usize, z: usize, value: T) -> bool {
        match T::unwrap_mut(&mut self.scalars) {
            Some(b) => {
                *b.get_mut(x, y, z) = value;
                true
            }
            None => false,
        }
    }
}
