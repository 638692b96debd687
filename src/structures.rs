use crate::enums::Hemisphere;

use serde::{Deserialize, Serialize};

/// Integer code of a structure inside a label volume.
pub type LabelId = i32;

/// One segmented structure, e.g. `L_Hipp` with label 17.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Structure {
    pub name: String,
    pub label: LabelId,
    pub hemisphere: Hemisphere,
}

impl Structure {
    pub fn new(name: impl Into<String>, label: LabelId, hemisphere: Hemisphere) -> Self {
        Self {
            name: name.into(),
            label,
            hemisphere,
        }
    }
}

pub const LEFT_HIPPOCAMPUS: LabelId = 17;
pub const RIGHT_HIPPOCAMPUS: LabelId = 53;

// FIRST emission order: left then right, alphabetical within a hemisphere.
const SUBCORTICAL: [(&str, LabelId, Hemisphere); 14] = [
    ("L_Accu", 26, Hemisphere::Left),
    ("L_Amyg", 18, Hemisphere::Left),
    ("L_Caud", 11, Hemisphere::Left),
    ("L_Hipp", LEFT_HIPPOCAMPUS, Hemisphere::Left),
    ("L_Pall", 13, Hemisphere::Left),
    ("L_Puta", 12, Hemisphere::Left),
    ("L_Thal", 10, Hemisphere::Left),
    ("R_Accu", 58, Hemisphere::Right),
    ("R_Amyg", 54, Hemisphere::Right),
    ("R_Caud", 50, Hemisphere::Right),
    ("R_Hipp", RIGHT_HIPPOCAMPUS, Hemisphere::Right),
    ("R_Pall", 52, Hemisphere::Right),
    ("R_Puta", 51, Hemisphere::Right),
    ("R_Thal", 49, Hemisphere::Right),
];

/// The fourteen subcortical structures segmented by FSL FIRST.
pub fn subcortical_structures() -> Vec<Structure> {
    SUBCORTICAL
        .iter()
        .map(|&(name, label, hemisphere)| Structure::new(name, label, hemisphere))
        .collect()
}

pub fn find_by_name<'a>(structures: &'a [Structure], name: &str) -> Option<&'a Structure> {
    structures.iter().find(|s| s.name == name)
}

pub fn find_by_label(structures: &[Structure], label: LabelId) -> Option<&Structure> {
    structures.iter().find(|s| s.label == label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_has_paired_hemispheres() {
        let structures = subcortical_structures();
        assert_eq!(structures.len(), 14);
        let left = structures
            .iter()
            .filter(|s| s.hemisphere == Hemisphere::Left)
            .count();
        assert_eq!(left, 7);
    }

    #[test]
    fn hippocampus_lookup() {
        let structures = subcortical_structures();
        assert_eq!(find_by_name(&structures, "L_Hipp").unwrap().label, 17);
        assert_eq!(find_by_label(&structures, 53).unwrap().name, "R_Hipp");
        assert!(find_by_name(&structures, "L_Cere").is_none());
    }
}
