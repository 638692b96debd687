use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::volume::SliceError;

/// The three orthogonal slicing planes.
///
/// Volumes are indexed `[x, y, z]`, so each orientation fixes one array
/// axis: sagittal fixes x (axis number 1), coronal fixes y (2) and axial
/// fixes z (3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Sagittal,
    Coronal,
    Axial,
}

impl Orientation {
    pub const ALL: [Orientation; 3] = [
        Orientation::Sagittal,
        Orientation::Coronal,
        Orientation::Axial,
    ];

    /// Resolve a 1-based axis number as emitted by the segmentation tooling.
    pub fn from_axis_number(axis: u8) -> Result<Self, SliceError> {
        match axis {
            1 => Ok(Orientation::Sagittal),
            2 => Ok(Orientation::Coronal),
            3 => Ok(Orientation::Axial),
            other => Err(SliceError::InvalidAxis(other)),
        }
    }

    pub fn axis_number(self) -> u8 {
        self.array_axis() as u8 + 1
    }

    /// Index of the array axis held constant by this orientation.
    pub fn array_axis(self) -> usize {
        match self {
            Orientation::Sagittal => 0,
            Orientation::Coronal => 1,
            Orientation::Axial => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Orientation::Sagittal => "sagittal",
            Orientation::Coronal => "coronal",
            Orientation::Axial => "axial",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Orientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            // "sagital" is a common misspelling
            "sagittal" | "sagital" | "1" => Ok(Orientation::Sagittal),
            "coronal" | "2" => Ok(Orientation::Coronal),
            "axial" | "3" => Ok(Orientation::Axial),
            other => Err(format!("unknown orientation '{other}'")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hemisphere {
    Left,
    Right,
}

impl fmt::Display for Hemisphere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hemisphere::Left => f.write_str("left"),
            Hemisphere::Right => f.write_str("right"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_numbers_round_trip() {
        for orientation in Orientation::ALL {
            let number = orientation.axis_number();
            assert_eq!(Orientation::from_axis_number(number).unwrap(), orientation);
        }
    }

    #[test]
    fn rejects_axis_outside_one_to_three() {
        assert!(matches!(
            Orientation::from_axis_number(0),
            Err(SliceError::InvalidAxis(0))
        ));
        assert!(matches!(
            Orientation::from_axis_number(4),
            Err(SliceError::InvalidAxis(4))
        ));
    }

    #[test]
    fn parses_orientation_names() {
        assert_eq!("Sagital".parse::<Orientation>(), Ok(Orientation::Sagittal));
        assert_eq!("coronal".parse::<Orientation>(), Ok(Orientation::Coronal));
        assert_eq!("3".parse::<Orientation>(), Ok(Orientation::Axial));
        assert!("oblique".parse::<Orientation>().is_err());
    }
}
