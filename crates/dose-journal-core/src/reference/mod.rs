//! Bundled substance reference data.
//!
//! The dataset is parsed once at startup and never mutated. Every range is
//! validated on load so that the analysis code can treat a range with a
//! missing bound or unit as "unknown" rather than as corrupt data.

mod search;

pub use search::*;

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::analysis::CategoryMembership;
use crate::models::{AdministrationRoute, Category, DoseRange, DurationRange, Roa, Substance};

/// Reference data errors.
#[derive(Error, Debug)]
pub enum ReferenceError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Inconsistent range {field} for {substance}: {reason}")]
    InconsistentRange {
        substance: String,
        field: String,
        reason: String,
    },

    #[error("Duplicate substance: {0}")]
    DuplicateSubstance(String),
}

pub type ReferenceResult<T> = Result<T, ReferenceError>;

/// Upper bound for any single duration range.
const MAX_PHASE_SECONDS: f64 = 366.0 * 86_400.0;

/// The parsed reference dataset.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SubstanceFile {
    #[serde(default)]
    pub categories: Vec<Category>,
    pub substances: Vec<Substance>,
}

impl SubstanceFile {
    pub fn new(categories: Vec<Category>, substances: Vec<Substance>) -> Self {
        Self {
            categories,
            substances,
        }
    }

    /// Parse and validate the bundled JSON asset.
    pub fn from_json(json: &str) -> ReferenceResult<Self> {
        let file: SubstanceFile = serde_json::from_str(json)?;
        file.validate()?;
        info!(
            substances = file.substances.len(),
            categories = file.categories.len(),
            "loaded reference data"
        );
        Ok(file)
    }

    /// Check every dose and duration range for internal consistency.
    pub fn validate(&self) -> ReferenceResult<()> {
        let mut seen = HashSet::new();
        for substance in &self.substances {
            if !seen.insert(substance.name.to_lowercase()) {
                return Err(ReferenceError::DuplicateSubstance(substance.name.clone()));
            }
            for roa in &substance.roas {
                if let Err(e) = validate_roa(&substance.name, roa) {
                    warn!(error = %e, "rejected reference data");
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Find a substance by name or common name, case-insensitively.
    pub fn substance(&self, name: &str) -> Option<&Substance> {
        let lower = name.to_lowercase();
        self.substances
            .iter()
            .find(|s| s.name.to_lowercase() == lower)
            .or_else(|| self.substances.iter().find(|s| s.is_named(name)))
    }

    pub fn roa(&self, name: &str, route: AdministrationRoute) -> Option<&Roa> {
        self.substance(name)?.roa(route)
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        let lower = name.to_lowercase();
        self.categories.iter().find(|c| c.name.to_lowercase() == lower)
    }

    /// Category name → member substance names.
    ///
    /// Covers every category of the category table (possibly with no
    /// members) and every category only mentioned by a substance.
    pub fn category_membership(&self) -> CategoryMembership {
        let mut membership: CategoryMembership = self
            .categories
            .iter()
            .map(|c| (c.name.clone(), Vec::new()))
            .collect();
        // lowercase name → key as first spelled
        let mut keys: HashMap<String, String> = membership
            .keys()
            .map(|k| (k.to_lowercase(), k.clone()))
            .collect();

        for substance in &self.substances {
            for category in &substance.categories {
                let key = keys
                    .entry(category.to_lowercase())
                    .or_insert_with(|| category.clone());
                membership.entry(key.clone()).or_default().push(substance.name.clone());
            }
        }

        membership
    }
}

fn validate_roa(substance: &str, roa: &Roa) -> ReferenceResult<()> {
    let route = roa.route.as_str();

    if let Some(dose) = &roa.dose {
        if let Some(threshold) = dose.threshold {
            check_dose_value(substance, &format!("{route}.dose.threshold"), threshold)?;
        }
        if let Some(heavy) = dose.heavy {
            check_dose_value(substance, &format!("{route}.dose.heavy"), heavy)?;
        }
        let bands = [("light", &dose.light), ("common", &dose.common), ("strong", &dose.strong)];
        for (band, range) in bands {
            if let Some(range) = range {
                check_dose_range(substance, &format!("{route}.dose.{band}"), range)?;
            }
        }
    }

    if let Some(duration) = &roa.duration {
        for (phase, range) in duration.named_ranges() {
            check_duration_range(substance, &format!("{route}.duration.{phase}"), range)?;
        }
    }

    Ok(())
}

fn inconsistent(substance: &str, field: &str, reason: &str) -> ReferenceError {
    ReferenceError::InconsistentRange {
        substance: substance.to_string(),
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn check_dose_range(substance: &str, field: &str, range: &DoseRange) -> ReferenceResult<()> {
    for bound in [range.min, range.max].into_iter().flatten() {
        check_dose_value(substance, field, bound)?;
    }
    match (range.min, range.max) {
        (Some(min), Some(max)) if min > max => Err(inconsistent(substance, field, "min > max")),
        _ => Ok(()),
    }
}

fn check_dose_value(substance: &str, field: &str, value: f64) -> ReferenceResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(inconsistent(substance, field, "negative or non-finite dose"));
    }
    Ok(())
}

fn check_duration_range(substance: &str, field: &str, range: &DurationRange) -> ReferenceResult<()> {
    let has_bound = range.min.is_some() || range.max.is_some();
    let Some(units) = range.units else {
        return if has_bound {
            Err(inconsistent(substance, field, "bound without units"))
        } else {
            Ok(())
        };
    };
    for bound in [range.min, range.max].into_iter().flatten() {
        let seconds = bound * units.seconds_multiplier();
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(inconsistent(substance, field, "negative or non-finite duration"));
        }
        if seconds > MAX_PHASE_SECONDS {
            return Err(inconsistent(substance, field, "duration longer than a year"));
        }
    }
    match (range.min, range.max) {
        (Some(min), Some(max)) if min > max => Err(inconsistent(substance, field, "min > max")),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATA: &str = r#"{
        "categories": [
            {"name": "stimulant", "description": "Increases alertness"},
            {"name": "deliriant"}
        ],
        "substances": [
            {
                "name": "Caffeine",
                "commonNames": ["Coffee"],
                "categories": ["stimulant"],
                "roas": [{
                    "name": "oral",
                    "dose": {"units": "mg", "threshold": 10, "light": {"min": 10, "max": 50}},
                    "duration": {"onset": {"min": 5, "max": 10, "units": "minutes"}}
                }]
            },
            {"name": "Modafinil", "categories": ["Stimulant", "nootropic"]}
        ]
    }"#;

    #[test]
    fn test_load() {
        let file = SubstanceFile::from_json(DATA).unwrap();
        assert_eq!(file.substances.len(), 2);
        assert_eq!(file.categories.len(), 2);

        let caffeine = file.substance("coffee").unwrap();
        assert_eq!(caffeine.name, "Caffeine");
        assert!(file.roa("Caffeine", AdministrationRoute::Oral).is_some());
        assert!(file.roa("Caffeine", AdministrationRoute::Smoked).is_none());
        assert!(file.substance("Tea").is_none());
    }

    #[test]
    fn test_category_membership() {
        let file = SubstanceFile::from_json(DATA).unwrap();
        let membership = file.category_membership();

        assert_eq!(membership["stimulant"], vec!["Caffeine", "Modafinil"]);
        assert!(membership["deliriant"].is_empty());
        assert_eq!(membership["nootropic"], vec!["Modafinil"]);
    }

    #[test]
    fn test_duration_without_units_rejected() {
        let json = r#"{"substances": [{"name": "X", "roas": [{
            "name": "oral", "duration": {"peak": {"min": 1, "max": 2}}
        }]}]}"#;
        let err = SubstanceFile::from_json(json).unwrap_err();
        assert!(matches!(
            err,
            ReferenceError::InconsistentRange { ref field, .. } if field == "oral.duration.peak"
        ));
    }

    #[test]
    fn test_inverted_dose_range_rejected() {
        let json = r#"{"substances": [{"name": "X", "roas": [{
            "name": "oral", "dose": {"units": "mg", "common": {"min": 20, "max": 10}}
        }]}]}"#;
        assert!(matches!(
            SubstanceFile::from_json(json),
            Err(ReferenceError::InconsistentRange { .. })
        ));
    }

    #[test]
    fn test_out_of_range_durations_rejected() {
        let cases = [
            (r#"{"min": -1, "max": 2, "units": "hours"}"#, "oral.duration.onset"),
            (r#"{"min": 1, "max": 1e15, "units": "days"}"#, "oral.duration.onset"),
            (r#"{"min": 1, "max": 1e306, "units": "days"}"#, "oral.duration.onset"),
            (r#"{"max": 400, "units": "days"}"#, "oral.duration.onset"),
        ];
        for (range, expected) in cases {
            let json = format!(
                r#"{{"substances": [{{"name": "X", "roas": [{{"name": "oral", "duration": {{"onset": {range}}}}}]}}]}}"#
            );
            let err = SubstanceFile::from_json(&json).unwrap_err();
            assert!(
                matches!(err, ReferenceError::InconsistentRange { ref field, .. } if field == expected),
                "{range} gave {err}"
            );
        }

        let year = r#"{"substances": [{"name": "X", "roas": [{
            "name": "oral", "duration": {"afterglow": {"min": 1, "max": 365, "units": "days"}}
        }]}]}"#;
        assert!(SubstanceFile::from_json(year).is_ok());
    }

    #[test]
    fn test_negative_doses_rejected() {
        let cases = [
            (r#"{"units": "mg", "light": {"min": -5, "max": 10}}"#, "oral.dose.light"),
            (r#"{"units": "mg", "threshold": -1}"#, "oral.dose.threshold"),
            (r#"{"units": "mg", "heavy": -100}"#, "oral.dose.heavy"),
        ];
        for (dose, expected) in cases {
            let json = format!(
                r#"{{"substances": [{{"name": "X", "roas": [{{"name": "oral", "dose": {dose}}}]}}]}}"#
            );
            let err = SubstanceFile::from_json(&json).unwrap_err();
            assert!(
                matches!(err, ReferenceError::InconsistentRange { ref field, .. } if field == expected),
                "{dose} gave {err}"
            );
        }
    }

    #[test]
    fn test_membership_keeps_first_spelling() {
        let json = r#"{"substances": [
            {"name": "A", "categories": ["Opioid"]},
            {"name": "B", "categories": ["opioid"]}
        ]}"#;
        let membership = SubstanceFile::from_json(json).unwrap().category_membership();
        assert_eq!(membership.len(), 1);
        assert_eq!(membership["Opioid"], vec!["A", "B"]);
    }

    #[test]
    fn test_partial_ranges_accepted() {
        let json = r#"{"substances": [{"name": "X", "roas": [{
            "name": "oral",
            "dose": {"units": "mg", "common": {"min": 20}},
            "duration": {"total": {"units": "hours"}}
        }]}]}"#;
        assert!(SubstanceFile::from_json(json).is_ok());
    }

    #[test]
    fn test_duplicate_substance_rejected() {
        let json = r#"{"substances": [{"name": "X"}, {"name": "x"}]}"#;
        assert!(matches!(
            SubstanceFile::from_json(json),
            Err(ReferenceError::DuplicateSubstance(_))
        ));
    }
}
