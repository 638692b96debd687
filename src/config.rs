use crate::enums::Orientation;
use crate::raster::LabelOverlay;
use crate::structures::{Structure, find_by_name, subcortical_structures};

use image::Rgba;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse config {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("structure list is empty")]
    NoStructures,

    #[error("structure '{0}' is listed more than once")]
    DuplicateStructure(String),

    #[error("record structure '{0}' is not in the structure list")]
    UnknownRecordStructure(String),

    #[error("voxel volume must be a positive number of mm3, got {0}")]
    InvalidVoxelVolume(f64),
}

/// Settings shared by every stage of a run.
///
/// The structure order is a contract with the statistics tool: centroids
/// are emitted in exactly this order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub structures: Vec<Structure>,
    pub highlight: [u8; 4],
    /// 0-based position of the voxel count in the statistics output line
    pub voxel_count_token: usize,
    /// Overrides the voxel size read from the label volume header
    pub voxel_volume_mm3: Option<f64>,
    pub orientations: Vec<Orientation>,
    pub flip_horizontal: bool,
    /// Left and right structure written to the per-subject record
    pub record_pair: (String, String),
    pub record_file: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            structures: subcortical_structures(),
            highlight: [255, 0, 0, 255],
            // `fslstats -V` prints `<voxels> <mm3>`
            voxel_count_token: 0,
            voxel_volume_mm3: None,
            orientations: Orientation::ALL.to_vec(),
            flip_horizontal: true,
            record_pair: ("L_Hipp".to_string(), "R_Hipp".to_string()),
            record_file: PathBuf::from("volumes.tsv"),
        }
    }
}

impl PipelineConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.structures.is_empty() {
            return Err(ConfigError::NoStructures);
        }
        let mut seen = HashSet::new();
        for structure in &self.structures {
            if !seen.insert(structure.name.as_str()) {
                return Err(ConfigError::DuplicateStructure(structure.name.clone()));
            }
        }
        for name in [&self.record_pair.0, &self.record_pair.1] {
            if find_by_name(&self.structures, name).is_none() {
                return Err(ConfigError::UnknownRecordStructure(name.clone()));
            }
        }
        if let Some(mm3) = self.voxel_volume_mm3.filter(|v| !(v.is_finite() && *v > 0.0)) {
            return Err(ConfigError::InvalidVoxelVolume(mm3));
        }
        Ok(())
    }

    /// Voxel volume for measurements: the configured override, else the
    /// header value, else 1 mm3.
    pub fn resolve_voxel_volume(&self, header_mm3: f64) -> f64 {
        match self.voxel_volume_mm3 {
            Some(mm3) => mm3,
            None if header_mm3.is_finite() && header_mm3 > 0.0 => header_mm3,
            None => 1.0,
        }
    }

    pub fn structure_names(&self) -> Vec<&str> {
        self.structures.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn label_overlay(&self) -> LabelOverlay {
        LabelOverlay::new(Rgba(self.highlight))
    }
}
