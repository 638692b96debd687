use crate::volume::Volume;

use ndarray::{Array3, ArrayD, Axis, Ix3};
use nifti::error::NiftiError;
use nifti::{IntoNdArray, NiftiObject, ReaderOptions};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum VolumeLoaderError {
    #[error("{path}: not a 3D scalar volume (shape {shape:?})")]
    NotThreeDimensional { path: PathBuf, shape: Vec<usize> },

    #[error("{path}: could not read NIfTI volume: {source}")]
    Nifti {
        path: PathBuf,
        #[source]
        source: NiftiError,
    },
}

pub struct VolumeLoader;

impl VolumeLoader {
    /// Load an anatomical scan from a `.nii` or `.nii.gz` file.
    ///
    /// The returned volume is indexed `[x, y, z]` and has the header's
    /// scaling slope and intercept applied.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be parsed or is not a single 3D volume
    pub fn load_anatomical(path: impl AsRef<Path>) -> Result<Volume<f32>, VolumeLoaderError> {
        let (data, spacing) = Self::read_f32(path.as_ref())?;
        Ok(Volume::new(data, spacing))
    }

    /// Load an integer-coded label map.
    ///
    /// Segmentation tools often store labels as floats, so values are
    /// rounded to the nearest integer.
    pub fn load_labels(path: impl AsRef<Path>) -> Result<Volume<i32>, VolumeLoaderError> {
        let (data, spacing) = Self::read_f32(path.as_ref())?;
        Ok(Volume::new(data.mapv(|v| v.round() as i32), spacing))
    }

    fn read_f32(path: &Path) -> Result<(Array3<f32>, (f32, f32, f32)), VolumeLoaderError> {
        let nifti_err = |source| VolumeLoaderError::Nifti {
            path: path.to_path_buf(),
            source,
        };
        let obj = ReaderOptions::new().read_file(path).map_err(nifti_err)?;
        let spacing = Self::get_spacing(&obj.header().pixdim);
        let array = obj.into_volume().into_ndarray::<f32>().map_err(nifti_err)?;
        let data = Self::into_three_dimensional(array, path)?;
        debug!(path = %path.display(), dim = ?data.dim(), ?spacing, "loaded volume");
        Ok((data, spacing))
    }

    /// Accept 3D data, or 4D data with a single trailing volume.
    fn into_three_dimensional(
        mut array: ArrayD<f32>,
        path: &Path,
    ) -> Result<Array3<f32>, VolumeLoaderError> {
        while array.ndim() > 3 && array.shape()[array.ndim() - 1] == 1 {
            let last = array.ndim() - 1;
            array = array.index_axis_move(Axis(last), 0);
        }
        let shape = array.shape().to_vec();
        array
            .into_dimensionality::<Ix3>()
            .map_err(|_| VolumeLoaderError::NotThreeDimensional {
                path: path.to_path_buf(),
                shape,
            })
    }

    fn get_spacing(pixdim: &[f32; 8]) -> (f32, f32, f32) {
        let size = |v: f32| if v.is_finite() && v != 0.0 { v.abs() } else { 1.0 };
        (size(pixdim[1]), size(pixdim[2]), size(pixdim[3]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_pixdim_falls_back_to_one_millimetre() {
        let pixdim = [1.0, 0.0, 2.0, -0.5, 0.0, 0.0, 0.0, 0.0];
        assert_eq!(VolumeLoader::get_spacing(&pixdim), (1.0, 2.0, 0.5));
    }

    #[test]
    fn trailing_singleton_volume_is_dropped() {
        let array = ArrayD::<f32>::zeros(vec![2, 3, 4, 1]);
        let data = VolumeLoader::into_three_dimensional(array, Path::new("x.nii")).unwrap();
        assert_eq!(data.dim(), (2, 3, 4));
    }

    #[test]
    fn two_dimensional_data_is_rejected() {
        let array = ArrayD::<f32>::zeros(vec![2, 3]);
        let err = VolumeLoader::into_three_dimensional(array, Path::new("x.nii")).unwrap_err();
        assert!(matches!(
            err,
            VolumeLoaderError::NotThreeDimensional { shape, .. } if shape == vec![2, 3]
        ));
    }

    #[test]
    fn missing_file_is_a_format_error() {
        let err = VolumeLoader::load_anatomical("/nonexistent/brain.nii").unwrap_err();
        assert!(matches!(err, VolumeLoaderError::Nifti { .. }));
    }
}
