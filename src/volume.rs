use crate::enums::Orientation;

use ndarray::Array3;
use ndarray::ArrayView2;
use ndarray::Axis;
use thiserror::Error;

/// A 2D cross-section borrowed from a [`Volume`].
///
/// The two remaining axes keep their original order: a sagittal slice is
/// indexed `[y, z]`, a coronal slice `[x, z]` and an axial slice `[x, y]`.
pub type Slice2D<'a, T> = ArrayView2<'a, T>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SliceError {
    #[error("invalid axis {0}, expected 1, 2 or 3")]
    InvalidAxis(u8),

    #[error("slice index {index} out of range for {orientation} axis of length {len}")]
    IndexOutOfRange {
        orientation: Orientation,
        index: i64,
        len: usize,
    },
}

/// A 3D scalar grid indexed `[x, y, z]`.
///
/// Anatomical scans are held as `Volume<f32>`, label maps as `Volume<i32>`.
/// The data is never mutated after construction.
#[derive(Debug, Clone)]
pub struct Volume<T> {
    data: Array3<T>,
    spacing: (f32, f32, f32),
}

impl<T> Volume<T> {
    pub fn new(data: Array3<T>, spacing: (f32, f32, f32)) -> Self {
        Self { data, spacing }
    }

    /// Get the dimensions of the volume (nx, ny, nz)
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Get a reference to the underlying data
    pub fn data(&self) -> &Array3<T> {
        &self.data
    }

    /// Voxel size in millimetres along x, y and z
    pub fn spacing(&self) -> (f32, f32, f32) {
        self.spacing
    }

    pub fn voxel_volume_mm3(&self) -> f64 {
        let (sx, sy, sz) = self.spacing;
        f64::from(sx) * f64::from(sy) * f64::from(sz)
    }

    /// Length of the axis held constant by `orientation`.
    pub fn len_along(&self, orientation: Orientation) -> usize {
        self.data.len_of(Axis(orientation.array_axis()))
    }

    /// Borrow the slice at a 0-based `index` along `orientation`.
    pub fn slice(
        &self,
        orientation: Orientation,
        index: usize,
    ) -> Result<Slice2D<'_, T>, SliceError> {
        let len = self.len_along(orientation);
        if index >= len {
            return Err(SliceError::IndexOutOfRange {
                orientation,
                index: index as i64,
                len,
            });
        }
        Ok(self.data.index_axis(Axis(orientation.array_axis()), index))
    }

    /// Like [`Volume::slice`] but for signed voxel coordinates, as parsed
    /// from centroid output. Negative indices are out of range, never clamped.
    pub fn slice_at(
        &self,
        orientation: Orientation,
        index: i64,
    ) -> Result<Slice2D<'_, T>, SliceError> {
        let index = usize::try_from(index).map_err(|_| SliceError::IndexOutOfRange {
            orientation,
            index,
            len: self.len_along(orientation),
        })?;
        self.slice(orientation, index)
    }

    /// Slice by the 1-based axis number used by the segmentation tooling.
    pub fn slice_by_axis_number(
        &self,
        axis: u8,
        index: usize,
    ) -> Result<Slice2D<'_, T>, SliceError> {
        self.slice(Orientation::from_axis_number(axis)?, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn ramp(shape: (usize, usize, usize)) -> Volume<f32> {
        let data = Array3::from_shape_fn(shape, |(x, y, z)| (x * 100 + y * 10 + z) as f32);
        Volume::new(data, (1.0, 1.0, 1.0))
    }

    #[test]
    fn slice_drops_the_fixed_axis_in_original_order() {
        let volume = ramp((2, 3, 4));

        let sagittal = volume.slice(Orientation::Sagittal, 1).unwrap();
        assert_eq!(sagittal.dim(), (3, 4));
        assert_eq!(sagittal[[2, 3]], 123.0);

        let coronal = volume.slice(Orientation::Coronal, 2).unwrap();
        assert_eq!(coronal.dim(), (2, 4));
        assert_eq!(coronal[[1, 3]], 123.0);

        let axial = volume.slice(Orientation::Axial, 3).unwrap();
        assert_eq!(axial.dim(), (2, 3));
        assert_eq!(axial[[1, 2]], 123.0);
    }

    #[test]
    fn slice_values_keep_order() {
        let volume = ramp((2, 3, 4));
        let axial = volume.slice(Orientation::Axial, 0).unwrap();
        let values: Vec<f32> = axial.iter().copied().collect();
        assert_eq!(values, vec![0.0, 10.0, 20.0, 100.0, 110.0, 120.0]);
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let volume = ramp((2, 3, 4));
        assert_eq!(
            volume.slice(Orientation::Sagittal, 2).unwrap_err(),
            SliceError::IndexOutOfRange {
                orientation: Orientation::Sagittal,
                index: 2,
                len: 2,
            }
        );
        assert!(volume.slice_at(Orientation::Axial, -1).is_err());
        assert!(volume.slice_at(Orientation::Axial, 3).is_ok());
    }

    #[test]
    fn axis_numbers_select_the_fixed_dimension() {
        let volume = ramp((2, 3, 4));
        assert_eq!(volume.slice_by_axis_number(1, 0).unwrap().dim(), (3, 4));
        assert_eq!(volume.slice_by_axis_number(2, 0).unwrap().dim(), (2, 4));
        assert_eq!(volume.slice_by_axis_number(3, 0).unwrap().dim(), (2, 3));
        assert_eq!(
            volume.slice_by_axis_number(4, 0).unwrap_err(),
            SliceError::InvalidAxis(4)
        );
    }

    #[test]
    fn voxel_volume_uses_spacing() {
        let volume = Volume::new(Array3::<i32>::zeros((1, 1, 1)), (1.0, 2.0, 0.5));
        assert_eq!(volume.voxel_volume_mm3(), 1.0);
    }
}
