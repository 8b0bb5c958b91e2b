//! Journal models: experiences, ingestions and per-substance settings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::AdministrationRoute;

/// A journal entry grouping the ingestions of one session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Experience {
    /// Local UUID
    pub id: String,
    pub title: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    /// Date the experience is listed under (usually the first ingestion)
    pub sort_date: DateTime<Utc>,
}

impl Experience {
    /// Create a new experience with required fields.
    pub fn new(title: String, sort_date: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title,
            text: String::new(),
            created_at: Utc::now(),
            sort_date,
        }
    }
}

/// A single logged ingestion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ingestion {
    /// Local UUID
    pub id: String,
    pub experience_id: String,
    pub substance_name: String,
    pub route: AdministrationRoute,
    pub time: DateTime<Utc>,
    /// Logged dose. `None` when the user did not know the amount.
    pub dose: Option<f64>,
    pub units: Option<String>,
    pub is_dose_an_estimate: bool,
    pub note: String,
}

impl Ingestion {
    /// Create a new ingestion with required fields.
    pub fn new(
        experience_id: String,
        substance_name: String,
        route: AdministrationRoute,
        time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            experience_id,
            substance_name,
            route,
            time,
            dose: None,
            units: None,
            is_dose_an_estimate: false,
            note: String::new(),
        }
    }

    /// Builder-style dose setter.
    pub fn with_dose(mut self, dose: f64, units: &str) -> Self {
        self.dose = Some(dose);
        self.units = Some(units.to_string());
        self
    }
}

/// Color palette for substances in the journal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SubstanceColor {
    Red,
    Orange,
    Yellow,
    Green,
    Mint,
    Teal,
    Cyan,
    Blue,
    Indigo,
    Purple,
    Pink,
    Brown,
}

impl SubstanceColor {
    pub const ALL: [SubstanceColor; 12] = [
        SubstanceColor::Red,
        SubstanceColor::Orange,
        SubstanceColor::Yellow,
        SubstanceColor::Green,
        SubstanceColor::Mint,
        SubstanceColor::Teal,
        SubstanceColor::Cyan,
        SubstanceColor::Blue,
        SubstanceColor::Indigo,
        SubstanceColor::Purple,
        SubstanceColor::Pink,
        SubstanceColor::Brown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SubstanceColor::Red => "red",
            SubstanceColor::Orange => "orange",
            SubstanceColor::Yellow => "yellow",
            SubstanceColor::Green => "green",
            SubstanceColor::Mint => "mint",
            SubstanceColor::Teal => "teal",
            SubstanceColor::Cyan => "cyan",
            SubstanceColor::Blue => "blue",
            SubstanceColor::Indigo => "indigo",
            SubstanceColor::Purple => "purple",
            SubstanceColor::Pink => "pink",
            SubstanceColor::Brown => "brown",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_lowercase();
        Self::ALL.into_iter().find(|color| color.as_str() == lower)
    }

    /// ARGB value used when drawing.
    pub fn argb(self) -> u32 {
        match self {
            SubstanceColor::Red => 0xFF_FF_3B_30,
            SubstanceColor::Orange => 0xFF_FF_95_00,
            SubstanceColor::Yellow => 0xFF_FF_CC_00,
            SubstanceColor::Green => 0xFF_34_C7_59,
            SubstanceColor::Mint => 0xFF_00_C7_BE,
            SubstanceColor::Teal => 0xFF_30_B0_C7,
            SubstanceColor::Cyan => 0xFF_32_AD_E6,
            SubstanceColor::Blue => 0xFF_00_7A_FF,
            SubstanceColor::Indigo => 0xFF_58_56_D6,
            SubstanceColor::Purple => 0xFF_AF_52_DE,
            SubstanceColor::Pink => 0xFF_FF_2D_55,
            SubstanceColor::Brown => 0xFF_A2_84_5E,
        }
    }

    /// First palette color not already taken, falling back to the first color.
    pub fn first_unused(taken: &[SubstanceColor]) -> Self {
        Self::ALL
            .into_iter()
            .find(|color| !taken.contains(color))
            .unwrap_or(SubstanceColor::Red)
    }
}

/// Per-substance journal settings. Immutable: use `with_color` and persist the result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubstanceCompanion {
    pub substance_name: String,
    pub color: SubstanceColor,
}

impl SubstanceCompanion {
    pub fn new(substance_name: String, color: SubstanceColor) -> Self {
        Self {
            substance_name,
            color,
        }
    }

    /// Copy of this companion with a different color.
    pub fn with_color(&self, color: SubstanceColor) -> Self {
        Self {
            substance_name: self.substance_name.clone(),
            color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ingestion() {
        let ingestion = Ingestion::new(
            "exp-1".into(),
            "Caffeine".into(),
            AdministrationRoute::Oral,
            Utc::now(),
        )
        .with_dose(100.0, "mg");

        assert_eq!(ingestion.id.len(), 36); // UUID format
        assert_eq!(ingestion.dose, Some(100.0));
        assert_eq!(ingestion.units.as_deref(), Some("mg"));
        assert!(!ingestion.is_dose_an_estimate);
    }

    #[test]
    fn test_companion_with_color_leaves_original() {
        let companion = SubstanceCompanion::new("Caffeine".into(), SubstanceColor::Brown);
        let recolored = companion.with_color(SubstanceColor::Blue);

        assert_eq!(companion.color, SubstanceColor::Brown);
        assert_eq!(recolored.color, SubstanceColor::Blue);
        assert_eq!(recolored.substance_name, "Caffeine");
    }

    #[test]
    fn test_first_unused_color() {
        assert_eq!(SubstanceColor::first_unused(&[]), SubstanceColor::Red);
        assert_eq!(
            SubstanceColor::first_unused(&[SubstanceColor::Red, SubstanceColor::Orange]),
            SubstanceColor::Yellow
        );
        assert_eq!(SubstanceColor::first_unused(&SubstanceColor::ALL), SubstanceColor::Red);
    }

    #[test]
    fn test_color_names() {
        for color in SubstanceColor::ALL {
            assert_eq!(SubstanceColor::from_name(color.as_str()), Some(color));
        }
        assert_eq!(SubstanceColor::from_name("magenta"), None);
    }
}
