//! Files handed to the report writer: labelled PNG slices, the appended
//! per-subject volume record and a JSON summary of the run.

use crate::coordinates::CoordinateTable;
use crate::enums::Orientation;
use crate::raster::RasterImage;
use crate::statistics::VolumeMeasurement;
use crate::study::StudyInfo;

use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("could not save {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("could not write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not serialise summary: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn render_file_name(structure: &str, orientation: Orientation) -> String {
    format!("{structure}_{orientation}_labeled.png")
}

/// Save a rendered slice as `{structure}_{orientation}_labeled.png` in `dir`.
pub fn save_render(
    dir: &Path,
    structure: &str,
    orientation: Orientation,
    image: &RasterImage,
) -> Result<PathBuf, ReportError> {
    let path = dir.join(render_file_name(structure, orientation));
    image.save(&path).map_err(|source| ReportError::Image {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// `{accession}\t{left cm³}\t{right cm³}\n`
pub fn record_line(
    accession: &str,
    left: &VolumeMeasurement,
    right: &VolumeMeasurement,
) -> String {
    format!(
        "{accession}\t{}\t{}\n",
        left.display_cm3(),
        right.display_cm3()
    )
}

/// Append one record line, creating the file if needed.
pub fn append_record(path: &Path, line: &str) -> Result<(), ReportError> {
    let io_err = |source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(io_err)?;
    file.write_all(line.as_bytes()).map_err(io_err)?;
    info!(path = %path.display(), "appended volume record");
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct StructureVolume<'a> {
    pub structure: &'a str,
    pub voxel_count: u64,
    pub volume_cm3: f64,
}

#[derive(Debug, Serialize)]
pub struct Summary<'a> {
    pub study: &'a StudyInfo,
    pub centroids: &'a CoordinateTable,
    pub volumes: Vec<StructureVolume<'a>>,
    pub images: Vec<PathBuf>,
}

pub fn write_summary(path: &Path, summary: &Summary<'_>) -> Result<(), ReportError> {
    let json = serde_json::to_string_pretty(summary)?;
    fs::write(path, json).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn file_names_follow_structure_and_orientation() {
        assert_eq!(
            render_file_name("L_Hipp", Orientation::Coronal),
            "L_Hipp_coronal_labeled.png"
        );
    }

    #[test]
    fn record_line_is_tab_delimited_cm3() {
        let left = VolumeMeasurement::new(4821, 1.0);
        let right = VolumeMeasurement::new(3912, 1.0);
        assert_eq!(record_line("ACC123", &left, &right), "ACC123\t4.82\t3.91\n");
    }

    #[test]
    fn records_are_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("volumes.tsv");
        append_record(&path, "A\t1.00\t2.00\n").unwrap();
        append_record(&path, "B\t3.00\t4.00\n").unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "A\t1.00\t2.00\nB\t3.00\t4.00\n"
        );
    }

    #[test]
    fn saved_png_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let image = RasterImage::from_pixel(3, 2, Rgba([255, 0, 0, 255]));
        let path = save_render(dir.path(), "R_Hipp", Orientation::Axial, &image).unwrap();

        assert!(path.ends_with("R_Hipp_axial_labeled.png"));
        let loaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(loaded, image);
    }

    #[test]
    fn summary_is_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        let study = StudyInfo {
            accession_number: "ACC123".into(),
            ..StudyInfo::default()
        };
        let centroids = CoordinateTable::parse(&[1.0, 2.0, 3.0], &["L_Hipp"]).unwrap();
        let summary = Summary {
            study: &study,
            centroids: &centroids,
            volumes: vec![StructureVolume {
                structure: "L_Hipp",
                voxel_count: 4821,
                volume_cm3: 4.821,
            }],
            images: Vec::new(),
        };
        write_summary(&path, &summary).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["study"]["accession_number"], "ACC123");
        assert_eq!(value["centroids"]["entries"][0]["coordinate"]["z"], 3);
        assert_eq!(value["volumes"][0]["voxel_count"], 4821);
    }
}
