//! Structure centroids parsed from positional statistics output.

use crate::enums::Orientation;

use serde::Serialize;
use thiserror::Error;

/// Malformed output from an external statistics command.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected {expected} values, found {found}")]
    WrongValueCount { expected: usize, found: usize },

    #[error("token {position} ('{token}') for {field} is not a number")]
    NotNumeric {
        field: String,
        position: usize,
        token: String,
    },

    #[error("missing token {position} for {field}: output has {found} tokens")]
    MissingToken {
        field: String,
        position: usize,
        found: usize,
    },
}

/// Rounded voxel centroid of one structure. Indices are 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct StructureCoordinate {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl StructureCoordinate {
    pub fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    /// Index of the slice through this centroid for `orientation`.
    pub fn index_along(&self, orientation: Orientation) -> i64 {
        match orientation {
            Orientation::Sagittal => self.x,
            Orientation::Coronal => self.y,
            Orientation::Axial => self.z,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedCoordinate {
    pub name: String,
    pub coordinate: StructureCoordinate,
}

/// Centroids for every structure, in the order the tool emitted them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CoordinateTable {
    entries: Vec<NamedCoordinate>,
}

impl CoordinateTable {
    /// Split `values` into consecutive `(x, y, z)` triples, one per name.
    ///
    /// Each value is rounded half away from zero.
    ///
    /// # Errors
    ///
    /// [`ParseError::WrongValueCount`] unless there are exactly three values
    /// per structure, [`ParseError::NotNumeric`] for non-finite values.
    pub fn parse<S: AsRef<str>>(values: &[f64], names: &[S]) -> Result<Self, ParseError> {
        let expected = 3 * names.len();
        if values.len() != expected {
            return Err(ParseError::WrongValueCount {
                expected,
                found: values.len(),
            });
        }

        let entries = names
            .iter()
            .zip(values.chunks_exact(3))
            .enumerate()
            .map(|(i, (name, xyz))| -> Result<NamedCoordinate, ParseError> {
                let round = |axis: usize| round_coordinate(xyz[axis], name.as_ref(), 3 * i + axis);
                Ok(NamedCoordinate {
                    name: name.as_ref().to_string(),
                    coordinate: StructureCoordinate::new(round(0)?, round(1)?, round(2)?),
                })
            })
            .collect::<Result<Vec<_>, ParseError>>()?;

        Ok(Self { entries })
    }

    /// Parse a whitespace-delimited line of numbers.
    pub fn parse_text<S: AsRef<str>>(text: &str, names: &[S]) -> Result<Self, ParseError> {
        let values = text
            .split_whitespace()
            .enumerate()
            .map(|(position, token)| {
                token.parse::<f64>().map_err(|_| ParseError::NotNumeric {
                    field: centroid_field(names, position),
                    position,
                    token: token.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::parse(&values, names)
    }

    pub fn get(&self, name: &str) -> Option<&StructureCoordinate> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| &entry.coordinate)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NamedCoordinate> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn round_coordinate(value: f64, name: &str, position: usize) -> Result<i64, ParseError> {
    if !value.is_finite() {
        return Err(ParseError::NotNumeric {
            field: format!("{name} centroid"),
            position,
            token: value.to_string(),
        });
    }
    Ok(value.round() as i64)
}

fn centroid_field<S: AsRef<str>>(names: &[S], position: usize) -> String {
    match names.get(position / 3) {
        Some(name) => format!("{} centroid", name.as_ref()),
        None => "centroid".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_values_into_named_triples() {
        let table =
            CoordinateTable::parse(&[10.0, 20.0, 30.0, 40.0, 50.0, 60.0], &["L_Hipp", "R_Hipp"])
                .unwrap();

        let coords: Vec<_> = table.iter().map(|e| (e.name.as_str(), e.coordinate)).collect();
        assert_eq!(
            coords,
            vec![
                ("L_Hipp", StructureCoordinate::new(10, 20, 30)),
                ("R_Hipp", StructureCoordinate::new(40, 50, 60)),
            ]
        );
    }

    #[test]
    fn integers_survive_parsing_in_order() {
        let names: Vec<String> = (0..14).map(|i| format!("S{i}")).collect();
        let expected: Vec<i64> = (0..42).map(|i| i * 7 - 30).collect();
        let values: Vec<f64> = expected.iter().map(|&v| v as f64).collect();

        let table = CoordinateTable::parse(&values, &names).unwrap();
        let flat: Vec<i64> = table
            .iter()
            .flat_map(|e| [e.coordinate.x, e.coordinate.y, e.coordinate.z])
            .collect();
        assert_eq!(flat, expected);
        assert_eq!(table.iter().nth(13).unwrap().name, "S13");
    }

    #[test]
    fn rounds_half_away_from_zero() {
        let table = CoordinateTable::parse(&[2.5, -2.5, 61.49], &["L_Hipp"]).unwrap();
        assert_eq!(table.get("L_Hipp"), Some(&StructureCoordinate::new(3, -3, 61)));
    }

    #[test]
    fn rejects_wrong_value_count() {
        let names: Vec<String> = (0..14).map(|i| format!("S{i}")).collect();
        let values = vec![1.0; 41];
        assert_eq!(
            CoordinateTable::parse(&values, &names),
            Err(ParseError::WrongValueCount {
                expected: 42,
                found: 41,
            })
        );
    }

    #[test]
    fn parses_tool_output_line() {
        let table = CoordinateTable::parse_text(
            "  45.5621 102.3110 71.0000\n134.20 101.9 70.49 \n",
            &["L_Hipp", "R_Hipp"],
        )
        .unwrap();
        assert_eq!(table.get("L_Hipp"), Some(&StructureCoordinate::new(46, 102, 71)));
        assert_eq!(table.get("R_Hipp"), Some(&StructureCoordinate::new(134, 102, 70)));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn reports_the_structure_of_a_bad_token() {
        let err = CoordinateTable::parse_text("1 2 3 4 five 6", &["L_Hipp", "R_Hipp"]).unwrap_err();
        assert_eq!(
            err,
            ParseError::NotNumeric {
                field: "R_Hipp centroid".to_string(),
                position: 4,
                token: "five".to_string(),
            }
        );
    }

    #[test]
    fn empty_output_is_malformed() {
        assert!(matches!(
            CoordinateTable::parse_text("", &["L_Hipp"]),
            Err(ParseError::WrongValueCount { expected: 3, found: 0 })
        ));
    }

    #[test]
    fn index_follows_orientation() {
        let c = StructureCoordinate::new(1, 2, 3);
        assert_eq!(c.index_along(Orientation::Sagittal), 1);
        assert_eq!(c.index_along(Orientation::Coronal), 2);
        assert_eq!(c.index_along(Orientation::Axial), 3);
    }
}
