//! Substance reference models.

use serde::{Deserialize, Serialize};

use super::{ReferenceDose, ReferenceDuration};

/// Route of administration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum AdministrationRoute {
    Oral,
    Sublingual,
    Buccal,
    Insufflated,
    Rectal,
    Transdermal,
    Subcutaneous,
    Intramuscular,
    Intravenous,
    Smoked,
    Inhaled,
}

impl AdministrationRoute {
    pub const ALL: [AdministrationRoute; 11] = [
        AdministrationRoute::Oral,
        AdministrationRoute::Sublingual,
        AdministrationRoute::Buccal,
        AdministrationRoute::Insufflated,
        AdministrationRoute::Rectal,
        AdministrationRoute::Transdermal,
        AdministrationRoute::Subcutaneous,
        AdministrationRoute::Intramuscular,
        AdministrationRoute::Intravenous,
        AdministrationRoute::Smoked,
        AdministrationRoute::Inhaled,
    ];

    /// Canonical lowercase name, as stored in the database and the reference data.
    pub fn as_str(self) -> &'static str {
        match self {
            AdministrationRoute::Oral => "oral",
            AdministrationRoute::Sublingual => "sublingual",
            AdministrationRoute::Buccal => "buccal",
            AdministrationRoute::Insufflated => "insufflated",
            AdministrationRoute::Rectal => "rectal",
            AdministrationRoute::Transdermal => "transdermal",
            AdministrationRoute::Subcutaneous => "subcutaneous",
            AdministrationRoute::Intramuscular => "intramuscular",
            AdministrationRoute::Intravenous => "intravenous",
            AdministrationRoute::Smoked => "smoked",
            AdministrationRoute::Inhaled => "inhaled",
        }
    }

    /// Parse a route name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_lowercase();
        Self::ALL.into_iter().find(|route| route.as_str() == lower)
    }

    /// Routes where the dose enters the bloodstream directly.
    pub fn is_injected(self) -> bool {
        matches!(
            self,
            AdministrationRoute::Subcutaneous
                | AdministrationRoute::Intramuscular
                | AdministrationRoute::Intravenous
        )
    }
}

/// Bioavailability in percent.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Bioavailability {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Reference data for one route of administration of a substance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Roa {
    #[serde(rename = "name")]
    pub route: AdministrationRoute,
    #[serde(default)]
    pub dose: Option<ReferenceDose>,
    #[serde(default)]
    pub duration: Option<ReferenceDuration>,
    #[serde(default)]
    pub bioavailability: Option<Bioavailability>,
}

/// Interaction severity, ordered from most to least severe.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum InteractionSeverity {
    Dangerous,
    Unsafe,
    Uncertain,
}

impl InteractionSeverity {
    /// Tiers in priority order.
    pub const ALL: [InteractionSeverity; 3] = [
        InteractionSeverity::Dangerous,
        InteractionSeverity::Unsafe,
        InteractionSeverity::Uncertain,
    ];
}

/// Names a substance interacts with, per severity tier.
///
/// Entries may be substance names, category names or wildcard names like `2C-x`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InteractionLists {
    #[serde(default)]
    pub dangerous: Vec<String>,
    #[serde(default, rename = "unsafe")]
    pub unsafe_: Vec<String>,
    #[serde(default)]
    pub uncertain: Vec<String>,
}

impl InteractionLists {
    pub fn get(&self, severity: InteractionSeverity) -> &[String] {
        match severity {
            InteractionSeverity::Dangerous => &self.dangerous,
            InteractionSeverity::Unsafe => &self.unsafe_,
            InteractionSeverity::Uncertain => &self.uncertain,
        }
    }

    pub fn get_mut(&mut self, severity: InteractionSeverity) -> &mut Vec<String> {
        match severity {
            InteractionSeverity::Dangerous => &mut self.dangerous,
            InteractionSeverity::Unsafe => &mut self.unsafe_,
            InteractionSeverity::Uncertain => &mut self.uncertain,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.dangerous.is_empty() && self.unsafe_.is_empty() && self.uncertain.is_empty()
    }

    /// Highest severity under which `name` is listed (exact match).
    pub fn severity_of(&self, name: &str) -> Option<InteractionSeverity> {
        InteractionSeverity::ALL
            .into_iter()
            .find(|severity| self.get(*severity).iter().any(|n| n == name))
    }
}

/// A pharmacological category (e.g., "stimulant", "opioid").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// A substance from the bundled reference data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Substance {
    pub name: String,
    #[serde(default)]
    pub common_names: Vec<String>,
    #[serde(default)]
    pub url: Option<String>,
    /// Category names this substance belongs to
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub interactions: Option<InteractionLists>,
    #[serde(default)]
    pub roas: Vec<Roa>,
}

impl Substance {
    /// Create a substance with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            common_names: Vec::new(),
            url: None,
            categories: Vec::new(),
            interactions: None,
            roas: Vec::new(),
        }
    }

    /// Reference data for a route, if published.
    pub fn roa(&self, route: AdministrationRoute) -> Option<&Roa> {
        self.roas.iter().find(|roa| roa.route == route)
    }

    /// Case-insensitive match on name or any common name.
    pub fn is_named(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.name.to_lowercase() == lower
            || self.common_names.iter().any(|n| n.to_lowercase() == lower)
    }

    pub fn is_in_category(&self, category: &str) -> bool {
        let lower = category.to_lowercase();
        self.categories.iter().any(|c| c.to_lowercase() == lower)
    }
}
