//! # hippovol
//!
//! Hippocampal and subcortical volumetry from a segmented brain MRI.
//!
//! Given an anatomical NIfTI volume, a co-registered label volume and the
//! output of an external statistics tool, this crate
//!  - parses per-structure centroids and voxel counts into typed records,
//!  - extracts the three orthogonal slices through each centroid,
//!  - renders them as grayscale images stretched to the slice's own range,
//!  - highlights the structure's label on top.
//!
//! Volumes are indexed `[x, y, z]` with 0-based voxel indices. Slices keep
//! the remaining axes in their original order, and raster pixel `(x, y)`
//! shows slice element `[x, y]`.
//!
//! Conversion from DICOM, segmentation and statistics are external tools,
//! reached through the traits in [`services`]. The [`services::Fsl`]
//! implementation drives the FSL command line utilities.
//!
//! # Examples
//!
//! ## Rendering a labelled hippocampus slice
//!
//! ```no_run
//! # use hippovol::{CoordinateTable, Orientation, Pipeline, PipelineConfig, VolumeLoader};
//! # use hippovol::structures::find_by_name;
//! let config = PipelineConfig::default();
//! let anatomical = VolumeLoader::load_anatomical("T1.nii.gz").expect("anatomical volume");
//! let labels = VolumeLoader::load_labels("first_all_fast_firstseg.nii.gz").expect("label volume");
//! let table = CoordinateTable::parse_text(
//!     &std::fs::read_to_string("cog.txt").expect("centroid output"),
//!     &config.structure_names(),
//! )
//! .expect("one centroid per structure");
//!
//! let hippocampus = find_by_name(&config.structures, "L_Hipp").cloned().expect("configured");
//! let pipeline = Pipeline::new(anatomical, labels, config).expect("same grid");
//! let image = pipeline
//!     .render(&hippocampus, table.get("L_Hipp").expect("centroid"), Orientation::Coronal)
//!     .expect("centroid inside the volume");
//! image.save("L_Hipp_coronal_labeled.png").expect("writable output");
//! ```

pub mod config;
pub mod coordinates;
pub mod enums;
pub mod intensity;
pub mod pipeline;
pub mod raster;
pub mod report;
pub mod services;
pub mod statistics;
pub mod structures;
pub mod study;
pub mod volume;
pub mod volume_loader;

pub use config::PipelineConfig;
pub use coordinates::{CoordinateTable, ParseError, StructureCoordinate};
pub use enums::{Hemisphere, Orientation};
pub use pipeline::{Pipeline, PipelineError};
pub use raster::{LabelOverlay, RasterImage};
pub use statistics::VolumeMeasurement;
pub use volume::{Slice2D, Volume};
pub use volume_loader::VolumeLoader;
