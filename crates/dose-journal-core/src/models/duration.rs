//! Reference duration models.

use serde::{Deserialize, Serialize};

/// Time unit used by the reference duration tables.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    pub fn seconds_multiplier(self) -> f64 {
        match self {
            TimeUnit::Seconds => 1.0,
            TimeUnit::Minutes => 60.0,
            TimeUnit::Hours => 3600.0,
            TimeUnit::Days => 86400.0,
        }
    }
}

/// A phase duration as published in the reference data.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct DurationRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub units: Option<TimeUnit>,
}

impl DurationRange {
    pub fn new(min: f64, max: f64, units: TimeUnit) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            units: Some(units),
        }
    }

    /// Both bounds and the unit are present.
    pub fn is_fully_known(&self) -> bool {
        self.min.is_some() && self.max.is_some() && self.units.is_some()
    }

    /// Convert to seconds. `None` unless fully known.
    pub fn in_seconds(&self) -> Option<SecondsRange> {
        let (min, max, units) = (self.min?, self.max?, self.units?);
        let multiplier = units.seconds_multiplier();
        Some(SecondsRange {
            min: min * multiplier,
            max: max * multiplier,
        })
    }
}

/// A duration range converted to seconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SecondsRange {
    pub min: f64,
    pub max: f64,
}

impl SecondsRange {
    /// Point at `weight` (0.0 = min, 1.0 = max) within the range.
    pub fn interpolate_at(&self, weight: f64) -> f64 {
        self.min + (self.max - self.min) * weight
    }
}

/// Phase durations for one route of administration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceDuration {
    pub onset: Option<DurationRange>,
    pub comeup: Option<DurationRange>,
    pub peak: Option<DurationRange>,
    pub offset: Option<DurationRange>,
    pub total: Option<DurationRange>,
    pub afterglow: Option<DurationRange>,
}

impl ReferenceDuration {
    /// All phase ranges that are present, with their names.
    pub fn named_ranges(&self) -> Vec<(&'static str, &DurationRange)> {
        [
            ("onset", &self.onset),
            ("comeup", &self.comeup),
            ("peak", &self.peak),
            ("offset", &self.offset),
            ("total", &self.total),
            ("afterglow", &self.afterglow),
        ]
        .into_iter()
        .filter_map(|(name, range)| range.as_ref().map(|r| (name, r)))
        .collect()
    }
}
