//! Orchestration of a run: locate structures, measure them and render a
//! labelled slice through each centroid.
//!
//! Per-structure failures are logged and returned alongside the successes;
//! only a malformed centroid table aborts the run, since a misaligned
//! structure order would silently corrupt every later measurement.

use crate::config::{ConfigError, PipelineConfig};
use crate::coordinates::{CoordinateTable, ParseError, StructureCoordinate};
use crate::enums::Orientation;
use crate::raster::{LabelOverlay, OverlayError, RasterImage, flip_horizontal, rasterize};
use crate::report::ReportError;
use crate::services::{Segmentation, ServiceError, StatisticsService};
use crate::statistics::{VolumeMeasurement, parse_voxel_count};
use crate::structures::Structure;
use crate::study::StudyError;
use crate::volume::{SliceError, Volume};
use crate::volume_loader::{VolumeLoader, VolumeLoaderError};

use rayon::prelude::*;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};
use web_time::Instant;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Load(#[from] VolumeLoaderError),

    #[error(transparent)]
    Slice(#[from] SliceError),

    #[error(transparent)]
    Overlay(#[from] OverlayError),

    #[error("malformed statistics output: {0}")]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Study(#[from] StudyError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("anatomical volume is {anatomical:?} but label volume is {labels:?}")]
    VolumeShapeMismatch {
        anatomical: (usize, usize, usize),
        labels: (usize, usize, usize),
    },

    #[error("no centroid for structure '{0}'")]
    MissingCentroid(String),

    #[error("{structure}: {source}")]
    Structure {
        structure: String,
        #[source]
        source: Box<PipelineError>,
    },
}

/// Rendered slice for one (structure, orientation) pair.
#[derive(Debug)]
pub struct RenderOutcome {
    pub structure: String,
    pub orientation: Orientation,
    pub result: Result<RasterImage, PipelineError>,
}

#[derive(Debug)]
pub struct MeasurementOutcome {
    pub structure: String,
    pub result: Result<VolumeMeasurement, PipelineError>,
}

/// An anatomical scan and its co-registered label map.
pub struct Pipeline {
    anatomical: Volume<f32>,
    labels: Volume<i32>,
    config: PipelineConfig,
    overlay: LabelOverlay,
    /// Source files, when loaded from disk
    source: Option<Segmentation>,
}

impl Pipeline {
    /// # Errors
    ///
    /// Returns [`PipelineError::VolumeShapeMismatch`] if the two grids differ.
    pub fn new(
        anatomical: Volume<f32>,
        labels: Volume<i32>,
        config: PipelineConfig,
    ) -> Result<Self, PipelineError> {
        if anatomical.dim() != labels.dim() {
            return Err(PipelineError::VolumeShapeMismatch {
                anatomical: anatomical.dim(),
                labels: labels.dim(),
            });
        }
        let overlay = config.label_overlay();
        Ok(Self {
            anatomical,
            labels,
            config,
            overlay,
            source: None,
        })
    }

    pub fn open(
        segmentation: &Segmentation,
        config: PipelineConfig,
    ) -> Result<Self, PipelineError> {
        let anatomical = VolumeLoader::load_anatomical(&segmentation.anatomical)?;
        let labels = VolumeLoader::load_labels(&segmentation.labels)?;
        let mut pipeline = Self::new(anatomical, labels, config)?;
        pipeline.source = Some(segmentation.clone());
        Ok(pipeline)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn source(&self) -> Option<&Segmentation> {
        self.source.as_ref()
    }

    /// Voxel size used for measurements, from the label volume header
    /// unless the configuration overrides it.
    pub fn voxel_volume_mm3(&self) -> f64 {
        self.config.resolve_voxel_volume(self.labels.voxel_volume_mm3())
    }

    /// Labelled slice through `coordinate`, perpendicular to `orientation`.
    pub fn render(
        &self,
        structure: &Structure,
        coordinate: &StructureCoordinate,
        orientation: Orientation,
    ) -> Result<RasterImage, PipelineError> {
        let index = coordinate.index_along(orientation);
        let anatomical = self.anatomical.slice_at(orientation, index)?;
        let labels = self.labels.slice_at(orientation, index)?;
        debug!(structure = %structure.name, %orientation, index, "rendering slice");

        let composed = self
            .overlay
            .overlay(&rasterize(&anatomical), &labels, structure.label)?;
        if self.config.flip_horizontal {
            Ok(flip_horizontal(&composed))
        } else {
            Ok(composed)
        }
    }

    /// Render every configured structure in every configured orientation.
    ///
    /// Pairs are independent and rendered in parallel; the result keeps the
    /// structure-major order of the configuration.
    pub fn render_all(&self, table: &CoordinateTable) -> Vec<RenderOutcome> {
        let start = Instant::now();
        let (anatomical_path, labels_path) = match &self.source {
            Some(source) => (source.anatomical.as_path(), source.labels.as_path()),
            None => (Path::new("<memory>"), Path::new("<memory>")),
        };
        let jobs: Vec<(&Structure, Orientation)> = self
            .config
            .structures
            .iter()
            .flat_map(|s| self.config.orientations.iter().map(move |&o| (s, o)))
            .collect();

        let outcomes: Vec<RenderOutcome> = jobs
            .into_par_iter()
            .map(|(structure, orientation)| {
                let result = table
                    .get(&structure.name)
                    .ok_or_else(|| PipelineError::MissingCentroid(structure.name.clone()))
                    .and_then(|coordinate| self.render(structure, coordinate, orientation));
                if let Err(e) = &result {
                    warn!(
                        structure = %structure.name,
                        %orientation,
                        anatomical = %anatomical_path.display(),
                        labels = %labels_path.display(),
                        "could not render slice: {e}"
                    );
                }
                RenderOutcome {
                    structure: structure.name.clone(),
                    orientation,
                    result,
                }
            })
            .collect();

        info!(
            rendered = outcomes.iter().filter(|o| o.result.is_ok()).count(),
            total = outcomes.len(),
            elapsed = ?start.elapsed(),
            "rendered structure slices"
        );
        outcomes
    }
}

/// Ask the statistics tool for every centroid and parse them in structure
/// order. Any malformed output is fatal for the run.
pub fn locate_structures(
    stats: &dyn StatisticsService,
    labels: &Path,
    config: &PipelineConfig,
) -> Result<CoordinateTable, PipelineError> {
    let output = stats.centres_of_gravity(labels, &config.structures)?;
    let table = CoordinateTable::parse_text(&output, &config.structure_names())?;
    info!(structures = table.len(), labels = %labels.display(), "located structures");
    Ok(table)
}

/// Voxel counts for every configured structure, each `voxel_volume_mm3`
/// in size. A failure for one structure is logged and recorded; the others
/// are still measured.
pub fn measure_structures(
    stats: &dyn StatisticsService,
    labels: &Path,
    config: &PipelineConfig,
    voxel_volume_mm3: f64,
) -> Vec<MeasurementOutcome> {
    config
        .structures
        .iter()
        .map(|structure| {
            let result = stats
                .voxel_count(labels, structure.label)
                .map_err(PipelineError::from)
                .and_then(|output| {
                    parse_voxel_count(&output, config.voxel_count_token)
                        .map_err(PipelineError::from)
                })
                .map(|count| VolumeMeasurement::new(count, voxel_volume_mm3))
                .map_err(|e| PipelineError::Structure {
                    structure: structure.name.clone(),
                    source: Box::new(e),
                });
            match &result {
                Ok(m) => debug!(structure = %structure.name, voxels = m.voxel_count, "measured"),
                Err(e) => warn!(labels = %labels.display(), "could not measure {e}"),
            }
            MeasurementOutcome {
                structure: structure.name.clone(),
                result,
            }
        })
        .collect()
}
