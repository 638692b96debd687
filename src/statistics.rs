//! Structure volumes from voxel-count statistics output.

use crate::coordinates::ParseError;

use serde::Serialize;

/// Physical volume of one structure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VolumeMeasurement {
    pub voxel_count: u64,
    pub voxel_volume_mm3: f64,
}

impl VolumeMeasurement {
    pub fn new(voxel_count: u64, voxel_volume_mm3: f64) -> Self {
        Self {
            voxel_count,
            voxel_volume_mm3,
        }
    }

    pub fn mm3(&self) -> f64 {
        to_volume_mm3(self.voxel_count, self.voxel_volume_mm3)
    }

    pub fn cm3(&self) -> f64 {
        self.mm3() / 1000.0
    }

    /// Volume in cm³ with two decimals, as shown in reports.
    pub fn display_cm3(&self) -> String {
        format!("{:.2}", self.cm3())
    }
}

/// Read the voxel count at 0-based `position` of a statistics output line.
///
/// Counts written with a fractional part (`4821.000000`) are accepted as
/// long as the fraction is zero.
pub fn parse_voxel_count(output: &str, position: usize) -> Result<u64, ParseError> {
    let tokens: Vec<&str> = output.split_whitespace().collect();
    let token = tokens.get(position).ok_or_else(|| ParseError::MissingToken {
        field: "voxel count".to_string(),
        position,
        found: tokens.len(),
    })?;

    let not_numeric = || ParseError::NotNumeric {
        field: "voxel count".to_string(),
        position,
        token: token.to_string(),
    };
    if let Ok(count) = token.parse::<u64>() {
        return Ok(count);
    }
    let value = token.parse::<f64>().map_err(|_| not_numeric())?;
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 {
        Ok(value as u64)
    } else {
        Err(not_numeric())
    }
}

pub fn to_volume_mm3(voxel_count: u64, voxel_volume_mm3: f64) -> f64 {
    voxel_count as f64 * voxel_volume_mm3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_the_second_token() {
        let count = parse_voxel_count("Volume 4821", 1).unwrap();
        assert_eq!(count, 4821);

        let measurement = VolumeMeasurement::new(count, 1.0);
        assert_eq!(measurement.mm3(), 4821.0);
        assert_eq!(measurement.display_cm3(), "4.82");
    }

    #[test]
    fn accepts_fslstats_style_output() {
        assert_eq!(parse_voxel_count("3912 3912.000000 \n", 1).unwrap(), 3912);
        assert_eq!(parse_voxel_count("3912 3912.000000", 0).unwrap(), 3912);
    }

    #[test]
    fn anisotropic_fslstats_output_counts_the_first_token() {
        let output = "3912 4125.937500 \n";
        assert_eq!(parse_voxel_count(output, 0).unwrap(), 3912);
        // the mm3 field is not a voxel count
        assert!(matches!(
            parse_voxel_count(output, 1),
            Err(ParseError::NotNumeric { position: 1, .. })
        ));
    }

    #[test]
    fn missing_token_is_malformed() {
        assert_eq!(
            parse_voxel_count("4821", 1),
            Err(ParseError::MissingToken {
                field: "voxel count".to_string(),
                position: 1,
                found: 1,
            })
        );
        assert!(matches!(
            parse_voxel_count("", 1),
            Err(ParseError::MissingToken { found: 0, .. })
        ));
    }

    #[test]
    fn rejects_non_numeric_and_negative_counts() {
        assert!(matches!(
            parse_voxel_count("Volume many", 1),
            Err(ParseError::NotNumeric { token, .. }) if token == "many"
        ));
        assert!(parse_voxel_count("Volume -3", 1).is_err());
        assert!(parse_voxel_count("Volume 12.5", 1).is_err());
    }

    #[test]
    fn scales_by_voxel_volume() {
        let measurement = VolumeMeasurement::new(2000, 0.5);
        assert_eq!(measurement.mm3(), 1000.0);
        assert_eq!(measurement.cm3(), 1.0);
        assert_eq!(measurement.display_cm3(), "1.00");
    }
}
