use dicom::core::Tag;
use dicom::object::{FileDicomObject, InMemDicomObject, open_file};
use dicom_dictionary_std::tags;
use serde::Serialize;
use std::{fs, path::Path, path::PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StudyError {
    #[error("No DICOM files found in {0}")]
    NoDicomFiles(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("DICOM error: {0}")]
    Dicom(#[from] dicom::object::ReadError),
}

/// Patient and study details printed on the report and used to key the
/// volume record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StudyInfo {
    pub description: String,
    pub patient_first_name: String,
    pub patient_last_name: String,
    pub patient_id: String,
    pub study_date: String,
    pub accession_number: String,
}

impl StudyInfo {
    /// Read study details from the first `.dcm` file (by name) in `dir`.
    pub fn from_directory(dir: impl AsRef<Path>) -> Result<Self, StudyError> {
        let dir = dir.as_ref();
        let mut paths: Vec<_> = fs::read_dir(dir)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|s| s.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("dcm"))
            })
            .collect();
        paths.sort();

        let first = paths
            .first()
            .ok_or_else(|| StudyError::NoDicomFiles(dir.to_path_buf()))?;
        Ok(Self::from_dicom_object(&open_file(first)?))
    }

    pub fn from_dicom_object(dicom_object: &FileDicomObject<InMemDicomObject>) -> Self {
        let text = |tag: Tag| {
            dicom_object
                .element(tag)
                .ok()
                .and_then(|element| element.to_str().ok())
                .map(|value| value.trim_end_matches(['\0', ' ']).to_string())
                .unwrap_or_default()
        };
        let (patient_last_name, patient_first_name) = split_person_name(&text(tags::PATIENT_NAME));

        Self {
            description: text(tags::STUDY_DESCRIPTION),
            patient_first_name,
            patient_last_name,
            patient_id: text(tags::PATIENT_ID),
            study_date: text(tags::STUDY_DATE),
            accession_number: text(tags::ACCESSION_NUMBER),
        }
    }
}

/// Split a DICOM person name `Last^First[^Middle...]` into last and first.
///
/// Names without a `^` are treated as a family name only.
pub fn split_person_name(name: &str) -> (String, String) {
    let mut parts = name.split('^');
    let last = parts.next().unwrap_or_default().trim().to_string();
    let first = parts.next().unwrap_or_default().trim().to_string();
    (last, first)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_family_and_given_names() {
        assert_eq!(
            split_person_name("Doe^Jane"),
            ("Doe".to_string(), "Jane".to_string())
        );
        assert_eq!(
            split_person_name("Doe^Jane^Q^^"),
            ("Doe".to_string(), "Jane".to_string())
        );
        assert_eq!(split_person_name("Anonymous"), ("Anonymous".to_string(), String::new()));
        assert_eq!(split_person_name(""), (String::new(), String::new()));
    }

    #[test]
    fn directory_without_dicom_files_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("brain.nii"), "").unwrap();
        assert!(matches!(
            StudyInfo::from_directory(dir.path()),
            Err(StudyError::NoDicomFiles(_))
        ));
    }

    #[test]
    fn unreadable_dicom_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("IM0001.dcm"), b"not a dicom file").unwrap();
        assert!(matches!(
            StudyInfo::from_directory(dir.path()),
            Err(StudyError::Dicom(_))
        ));
    }
}
