pub trait FloatExt: Copy {
    /// Absolute comparison against a caller-chosen tolerance.
    /// NaN on either side is never equal.
    fn approx_eq_within(self, other: Self, tolerance: Self) -> bool;
}

impl FloatExt for f32 {
    fn approx_eq_within(self, other: Self, tolerance: Self) -> bool {
        (self - other).abs() <= tolerance
    }
}

impl FloatExt for f64 {
    fn approx_eq_within(self, other: Self, tolerance: Self) -> bool {
        (self - other).abs() <= tolerance
    }
}
