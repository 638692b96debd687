//! Typed interfaces to the external conversion, segmentation and statistics
//! tools, plus an implementation backed by the FSL command line utilities.
//!
//! Nothing in the slicing or parsing modules calls these; they are driven
//! by the orchestration layer in [`crate::pipeline`] and the binary.

use crate::structures::{LabelId, Structure};

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("could not run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("{program} produced no {expected} in {dir}")]
    MissingOutput {
        program: String,
        expected: &'static str,
        dir: PathBuf,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// DICOM series to a NIfTI anatomical volume.
pub trait ConversionService {
    fn convert(&self, dicom_dir: &Path, output_dir: &Path) -> Result<PathBuf, ServiceError>;
}

/// Paths produced by a segmentation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segmentation {
    /// Anatomical image in the label volume's space
    pub anatomical: PathBuf,
    pub labels: PathBuf,
}

pub trait SegmentationService {
    fn segment(&self, anatomical: &Path, output_dir: &Path) -> Result<Segmentation, ServiceError>;
}

/// Raw text output of the statistics tool. Parsing lives in
/// [`crate::coordinates`] and [`crate::statistics`].
pub trait StatisticsService {
    /// One whitespace-delimited line of `x y z` centroids, in structure order.
    fn centres_of_gravity(
        &self,
        labels: &Path,
        structures: &[Structure],
    ) -> Result<String, ServiceError>;

    fn voxel_count(&self, labels: &Path, label: LabelId) -> Result<String, ServiceError>;
}

/// FSL tooling: `mcverter` for conversion, `run_first_all` for subcortical
/// segmentation and `fslstats` for statistics.
#[derive(Debug, Clone, Default)]
pub struct Fsl {
    /// Directory holding the executables; `PATH` lookup when unset
    pub bin_dir: Option<PathBuf>,
}

impl Fsl {
    pub fn new(bin_dir: Option<PathBuf>) -> Self {
        Self { bin_dir }
    }

    fn program(&self, name: &str) -> PathBuf {
        match &self.bin_dir {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        }
    }

    fn run(&self, name: &str, args: &[&str]) -> Result<String, ServiceError> {
        let program = self.program(name);
        debug!(program = %program.display(), ?args, "running");
        let output = Command::new(&program)
            .args(args)
            .output()
            .map_err(|source| ServiceError::Spawn {
                program: name.to_string(),
                source,
            })?;
        if !output.status.success() {
            return Err(ServiceError::Failed {
                program: name.to_string(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn label_window(label: LabelId) -> [String; 2] {
        [
            format!("{}", f64::from(label) - 0.5),
            format!("{}", f64::from(label) + 0.5),
        ]
    }

    fn find_nifti(dir: &Path) -> Result<Option<PathBuf>, ServiceError> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                entries.extend(Self::find_nifti(&path)?);
            } else if is_nifti(&path) {
                entries.push(path);
            }
        }
        entries.sort();
        Ok(entries.into_iter().next())
    }
}

pub fn is_nifti(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(".nii") || name.ends_with(".nii.gz"))
}

impl ConversionService for Fsl {
    fn convert(&self, dicom_dir: &Path, output_dir: &Path) -> Result<PathBuf, ServiceError> {
        info!(dicom_dir = %dicom_dir.display(), "converting DICOM to NIfTI");
        fs::create_dir_all(output_dir)?;
        let dicom = dicom_dir.to_string_lossy();
        let output = output_dir.to_string_lossy();
        self.run(
            "mcverter",
            &["-f", "fsl", "-x", "-d", "-n", "-o", &*output, &*dicom],
        )?;
        Self::find_nifti(output_dir)?.ok_or_else(|| ServiceError::MissingOutput {
            program: "mcverter".to_string(),
            expected: "NIfTI volume",
            dir: output_dir.to_path_buf(),
        })
    }
}

impl SegmentationService for Fsl {
    fn segment(&self, anatomical: &Path, output_dir: &Path) -> Result<Segmentation, ServiceError> {
        info!(anatomical = %anatomical.display(), "running subcortical segmentation");
        fs::create_dir_all(output_dir)?;
        let prefix = output_dir.join("first");
        let input = anatomical.to_string_lossy();
        let prefix_arg = prefix.to_string_lossy();
        self.run("run_first_all", &["-i", &*input, "-o", &*prefix_arg])?;

        let labels = ["first_all_fast_firstseg.nii.gz", "first_all_none_firstseg.nii.gz"]
            .iter()
            .map(|name| output_dir.join(name))
            .find(|path| path.exists())
            .ok_or_else(|| ServiceError::MissingOutput {
                program: "run_first_all".to_string(),
                expected: "label volume",
                dir: output_dir.to_path_buf(),
            })?;

        Ok(Segmentation {
            anatomical: anatomical.to_path_buf(),
            labels,
        })
    }
}

impl StatisticsService for Fsl {
    fn centres_of_gravity(
        &self,
        labels: &Path,
        structures: &[Structure],
    ) -> Result<String, ServiceError> {
        let input = labels.to_string_lossy();
        let mut line = Vec::with_capacity(structures.len());
        for structure in structures {
            let [lower, upper] = Self::label_window(structure.label);
            let cog = self.run("fslstats", &[&*input, "-l", &*lower, "-u", &*upper, "-C"])?;
            line.push(cog.trim().to_string());
        }
        Ok(line.join(" "))
    }

    fn voxel_count(&self, labels: &Path, label: LabelId) -> Result<String, ServiceError> {
        let input = labels.to_string_lossy();
        let [lower, upper] = Self::label_window(label);
        self.run("fslstats", &[&*input, "-l", &*lower, "-u", &*upper, "-V"])
    }
}
