//! Reference dose models.

use serde::{Deserialize, Serialize};

/// Inclusive numeric band. Either bound may be missing in the reference data.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct DoseRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl DoseRange {
    /// Create a range with both bounds present.
    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Both bounds present.
    pub fn is_fully_known(&self) -> bool {
        self.min.is_some() && self.max.is_some()
    }

    /// Inclusive membership. Always false unless both bounds are present.
    pub fn contains(&self, value: f64) -> bool {
        match (self.min, self.max) {
            (Some(min), Some(max)) => min <= value && value <= max,
            _ => false,
        }
    }
}

/// Reference dose table for one route of administration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceDose {
    /// Dose unit (e.g., "mg", "µg"). Compared case-sensitively.
    pub units: Option<String>,
    /// Doses strictly below this are threshold doses
    pub threshold: Option<f64>,
    pub light: Option<DoseRange>,
    pub common: Option<DoseRange>,
    pub strong: Option<DoseRange>,
    /// Doses strictly above this are heavy doses
    pub heavy: Option<f64>,
}

/// Severity band a logged dose falls into, ordered by increasing intensity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DoseClass {
    Threshold,
    Light,
    Common,
    Strong,
    Heavy,
}

/// ARGB colors for the light and dark app themes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeColors {
    pub light: u32,
    pub dark: u32,
}

impl DoseClass {
    /// All classes in ascending intensity.
    pub const ALL: [DoseClass; 5] = [
        DoseClass::Threshold,
        DoseClass::Light,
        DoseClass::Common,
        DoseClass::Strong,
        DoseClass::Heavy,
    ];

    /// Number of filled dots shown next to a dose of this class.
    pub fn num_dots(self) -> u8 {
        match self {
            DoseClass::Threshold => 0,
            DoseClass::Light => 1,
            DoseClass::Common => 2,
            DoseClass::Strong => 3,
            DoseClass::Heavy => 4,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            DoseClass::Threshold => {
                "A threshold dose is the minimum amount needed to produce noticeable effects."
            }
            DoseClass::Light => {
                "A light dose produces mild effects that are easy to manage and ignore."
            }
            DoseClass::Common => {
                "A common dose is the amount at which effects are reliably present but manageable."
            }
            DoseClass::Strong => {
                "A strong dose produces intense effects and a higher risk of adverse reactions."
            }
            DoseClass::Heavy => {
                "A heavy dose is far beyond the common range and carries a high risk of harm."
            }
        }
    }

    pub fn colors(self) -> ThemeColors {
        match self {
            DoseClass::Threshold => ThemeColors {
                light: 0xFF_00_82_C8,
                dark: 0xFF_4F_C3_F7,
            },
            DoseClass::Light => ThemeColors {
                light: 0xFF_00_8A_3E,
                dark: 0xFF_66_BB_6A,
            },
            DoseClass::Common => ThemeColors {
                light: 0xFF_B2_8A_00,
                dark: 0xFF_FF_EE_58,
            },
            DoseClass::Strong => ThemeColors {
                light: 0xFF_D8_5A_00,
                dark: 0xFF_FF_A7_26,
            },
            DoseClass::Heavy => ThemeColors {
                light: 0xFF_C6_28_28,
                dark: 0xFF_EF_53_50,
            },
        }
    }
}
