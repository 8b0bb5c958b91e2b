//! Dose classification against a reference dose table.
//!
//! Bands are checked in a fixed order, first match wins:
//! - threshold: dose strictly below `threshold`
//! - light / common / strong: inclusive range membership
//! - heavy: dose strictly above `heavy`
//!
//! Doses between two bands (e.g. above `light.max` but below `common.min`)
//! are not classified.

use crate::models::{DoseClass, ReferenceDose};

/// Unit for which every dose is measured volumetrically.
const MICROGRAM_UNIT: &str = "µg";

/// Below this common minimum in mg, a substance should be dosed volumetrically.
const VOLUMETRIC_MG_THRESHOLD: f64 = 15.0;

/// Classify a logged dose. `None` when units differ or the dose is unknown.
pub fn classify(reference: &ReferenceDose, dose: Option<f64>, units: Option<&str>) -> Option<DoseClass> {
    if units != reference.units.as_deref() {
        return None;
    }
    let dose = dose?;

    if reference.threshold.is_some_and(|threshold| dose < threshold) {
        return Some(DoseClass::Threshold);
    }

    let bands = [
        (DoseClass::Light, reference.light),
        (DoseClass::Common, reference.common),
        (DoseClass::Strong, reference.strong),
    ];
    for (class, range) in bands {
        if range.is_some_and(|r| r.contains(dose)) {
            return Some(class);
        }
    }

    if reference.heavy.is_some_and(|heavy| dose > heavy) {
        return Some(DoseClass::Heavy);
    }

    None
}

/// Whether the substance is potent enough that doses should be measured volumetrically.
pub fn uses_volumetric_dosing(reference: &ReferenceDose) -> bool {
    match reference.units.as_deref() {
        Some(MICROGRAM_UNIT) => true,
        Some("mg") => reference
            .common
            .and_then(|common| common.min)
            .is_some_and(|min| min < VOLUMETRIC_MG_THRESHOLD),
        _ => false,
    }
}
