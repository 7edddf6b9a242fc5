use std::ops::{Deref, Index, IndexMut};
use std::slice;

/// Dense 3D buffer stored x-fastest: `index = x + y * width + z * width * height`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buffer3<T> {
    voxels: Vec<T>,
    dims: [usize; 3],
}

impl<T> Buffer3<T> {
    pub fn new(dims: [usize; 3], voxels: Vec<T>) -> Self {
        assert_eq!(
            Some(voxels.len()),
            Self::checked_len(dims),
            "voxels length must equal width * height * depth"
        );
        Self { voxels, dims }
    }

    /// Number of voxels for `dims`, or `None` if the product overflows `usize`.
    #[inline]
    pub fn checked_len(dims: [usize; 3]) -> Option<usize> {
        dims[0].checked_mul(dims[1])?.checked_mul(dims[2])
    }

    #[inline]
    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        debug_assert!(x < self.dims[0] && y < self.dims[1] && z < self.dims[2]);
        x + self.dims[0] * (y + self.dims[1] * z)
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> &T {
        &self.voxels[self.index(x, y, z)]
    }

    #[inline]
    pub fn get_mut(&mut self, x: usize, y: usize, z: usize) -> &mut T {
        let idx = self.index(x, y, z);
        &mut self.voxels[idx]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    #[inline]
    pub fn voxels(&self) -> &[T] {
        &self.voxels
    }

    #[inline]
    pub fn voxels_mut(&mut self) -> &mut [T] {
        &mut self.voxels
    }

    #[inline]
    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.voxels.iter()
    }
}

impl<T: Default + Clone> Buffer3<T> {
    pub fn new_default(dims: [usize; 3]) -> Self {
        Self::new_filled(dims, T::default())
    }
}

impl<T: Clone> Buffer3<T> {
    pub fn new_filled(dims: [usize; 3], value: T) -> Self {
        Self {
            voxels: vec![value; dims[0] * dims[1] * dims[2]],
            dims,
        }
    }
}

impl<T> Index<(usize, usize, usize)> for Buffer3<T> {
    type Output = T;

    #[inline]
    fn index(&self, (x, y, z): (usize, usize, usize)) -> &Self::Output {
        self.get(x, y, z)
    }
}

impl<T> IndexMut<(usize, usize, usize)> for Buffer3<T> {
    #[inline]
    fn index_mut(&mut self, (x, y, z): (usize, usize, usize)) -> &mut Self::Output {
        self.get_mut(x, y, z)
    }
}

impl<T> Index<usize> for Buffer3<T> {
    type Output = T;

    #[inline]
    fn index(&self, idx: usize) -> &Self::Output {
        &self.voxels[idx]
    }
}

impl<T> Deref for Buffer3<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.voxels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_stores_dimensions() {
        let buf = Buffer3::new([3, 2, 2], (0..12).collect());
        assert_eq!(buf.dims(), [3, 2, 2]);
        assert_eq!(buf.len(), 12);
        assert!(!buf.is_empty());
    }

    #[test]
    #[should_panic(expected = "voxels length must equal width * height * depth")]
    fn new_panics_on_size_mismatch() {
        Buffer3::new([3, 2, 2], vec![1, 2, 3]);
    }

    #[test]
    fn checked_len_detects_overflow() {
        assert_eq!(Buffer3::<u8>::checked_len([4, 5, 6]), Some(120));
        assert_eq!(Buffer3::<u8>::checked_len([usize::MAX, 2, 1]), None);
    }

    #[test]
    fn index_is_x_fastest() {
        let buf = Buffer3::<u8>::new_default([4, 3, 2]);
        assert_eq!(buf.index(0, 0, 0), 0);
        assert_eq!(buf.index(3, 0, 0), 3);
        assert_eq!(buf.index(0, 1, 0), 4);
        assert_eq!(buf.index(0, 0, 1), 12);
        assert_eq!(buf.index(3, 2, 1), 23);
    }

    #[test]
    fn tuple_indexing() {
        let mut buf = Buffer3::new_filled([2, 2, 2], 0i32);
        buf[(1, 0, 1)] = 7;
        assert_eq!(buf[(1, 0, 1)], 7);
        assert_eq!(buf[5], 7); // 1 + 0*2 + 1*4
        assert_eq!(buf.iter().filter(|&&v| v == 7).count(), 1);
    }
}
