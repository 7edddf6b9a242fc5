//! Voxel scalar types and the compile-time traits the relaxation loop is
//! instantiated over.

use common::Buffer3;
use num_traits::{NumCast, ToPrimitive};
use strum_macros::{Display, EnumIter};

use crate::volume::ScalarBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum ScalarType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
    /// Packed 3-channel color; readable as a volume but not segmentable.
    Rgb8,
}

impl ScalarType {
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            ScalarType::U8
                | ScalarType::I8
                | ScalarType::U16
                | ScalarType::I16
                | ScalarType::U32
                | ScalarType::I32
                | ScalarType::U64
                | ScalarType::I64
        )
    }

    pub fn byte_size(self) -> usize {
        match self {
            ScalarType::U8 | ScalarType::I8 => 1,
            ScalarType::U16 | ScalarType::I16 => 2,
            ScalarType::U32 | ScalarType::I32 | ScalarType::F32 => 4,
            ScalarType::U64 | ScalarType::I64 | ScalarType::F64 => 8,
            ScalarType::Rgb8 => 3,
        }
    }
}

/// A type that can be stored in a [`ScalarBuffer`].
pub trait VoxelScalar: Copy + Default + Send + Sync + 'static {
    const SCALAR_TYPE: ScalarType;

    fn wrap(buffer: Buffer3<Self>) -> ScalarBuffer;

    fn unwrap_ref(buffer: &ScalarBuffer) -> Option<&Buffer3<Self>>;

    fn unwrap_mut(buffer: &mut ScalarBuffer) -> Option<&mut Buffer3<Self>>;
}

/// Intensity types the relaxation loop is instantiated for.
pub trait IntensityScalar: VoxelScalar {
    /// `|self - other|` as an edge cost. Integers use an exact absolute
    /// difference, so no intermediate value can overflow.
    fn abs_diff_cost(self, other: Self) -> f32;
}

/// Integer types accepted for seed and output label volumes. Labels are
/// carried internally as `i32`.
pub trait LabelScalar: VoxelScalar + ToPrimitive + NumCast {
    #[inline]
    fn to_label(self) -> Option<i32> {
        self.to_i32()
    }

    #[inline]
    fn from_label(label: i32) -> Option<Self> {
        <Self as NumCast>::from(label)
    }
}

macro_rules! voxel_scalar {
    ($ty:ty, $variant:ident) => {
        impl VoxelScalar for $ty {
            const SCALAR_TYPE: ScalarType = ScalarType::$variant;

            #[inline]
            fn wrap(buffer: Buffer3<Self>) -> ScalarBuffer {
                ScalarBuffer::$variant(buffer)
            }

            #[inline]
            fn unwrap_ref(buffer: &ScalarBuffer) -> Option<&Buffer3<Self>> {
                match buffer {
                    ScalarBuffer::$variant(b) => Some(b),
                    _ => None,
                }
            }

            #[inline]
            fn unwrap_mut(buffer: &mut ScalarBuffer) -> Option<&mut Buffer3<Self>> {
                match buffer {
                    ScalarBuffer::$variant(b) => Some(b),
                    _ => None,
                }
            }
        }
    };
}

macro_rules! integer_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            voxel_scalar!($ty, $variant);

            impl IntensityScalar for $ty {
                #[inline]
                fn abs_diff_cost(self, other: Self) -> f32 {
                    self.abs_diff(other) as f32
                }
            }

            impl LabelScalar for $ty {}
        )*
    };
}

macro_rules! float_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            voxel_scalar!($ty, $variant);

            impl IntensityScalar for $ty {
                #[inline]
                fn abs_diff_cost(self, other: Self) -> f32 {
                    (self - other).abs() as f32
                }
            }
        )*
    };
}

integer_scalar!(
    u8 => U8,
    i8 => I8,
    u16 => U16,
    i16 => I16,
    u32 => U32,
    i32 => I32,
    u64 => U64,
    i64 => I64,
);

float_scalar!(f32 => F32, f64 => F64);

voxel_scalar!([u8; 3], Rgb8);

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn integer_abs_diff_does_not_overflow() {
        assert_eq!(i8::MIN.abs_diff_cost(i8::MAX), 255.0);
        assert_eq!(0u8.abs_diff_cost(200), 200.0);
        assert_eq!(200u8.abs_diff_cost(0), 200.0);
        assert_eq!(u32::MAX.abs_diff_cost(0), u32::MAX as f32);
        assert_eq!((-5i16).abs_diff_cost(5), 10.0);
    }

    #[test]
    fn float_abs_diff() {
        assert_eq!(1.5f32.abs_diff_cost(-0.5), 2.0);
        assert_eq!((-2.0f64).abs_diff_cost(-2.0), 0.0);
    }

    #[test]
    fn label_range_conversion() {
        assert_eq!(7u8.to_label(), Some(7));
        assert_eq!((-3i16).to_label(), Some(-3));
        assert_eq!(u32::MAX.to_label(), None);
        assert_eq!(i64::MIN.to_label(), None);
        assert_eq!(u8::from_label(300), None);
        assert_eq!(u16::from_label(300), Some(300));
    }

    #[test]
    fn integer_types_are_flagged() {
        let integers: Vec<ScalarType> = ScalarType::iter().filter(|t| t.is_integer()).collect();
        assert_eq!(integers.len(), 8);
        assert!(!ScalarType::F32.is_integer());
        assert!(!ScalarType::Rgb8.is_integer());
    }

    #[test]
    fn scalar_type_constants_match_sizes() {
        assert_eq!(u8::SCALAR_TYPE.byte_size(), std::mem::size_of::<u8>());
        assert_eq!(i64::SCALAR_TYPE.byte_size(), std::mem::size_of::<i64>());
        assert_eq!(f32::SCALAR_TYPE.byte_size(), std::mem::size_of::<f32>());
        assert_eq!(<[u8; 3]>::SCALAR_TYPE.byte_size(), 3);
        assert_eq!(ScalarType::U16.to_string(), "U16");
    }
}
