//! Per-experience analysis: timelines for each ingestion and cumulative doses.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Ingestion;
use crate::reference::SubstanceFile;

use super::timeline::{build_timeline, TimelineShape};

/// Timeline of a single ingestion, placed on the wall clock.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngestionTimeline {
    pub ingestion_id: String,
    pub substance_name: String,
    pub start: DateTime<Utc>,
    pub shape: TimelineShape,
    /// Relative intensity (0, 1] compared to the largest dose of the same substance
    pub height: f64,
}

impl IngestionTimeline {
    /// End of the timeline. `None` if it lies beyond the representable time range.
    pub fn end(&self) -> Option<DateTime<Utc>> {
        offset(self.start, self.shape.width())
    }

    /// Estimated peak interval, if the shape knows it.
    pub fn peak_window(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let window = self.shape.peak_window()?;
        Some((offset(self.start, window.start)?, offset(self.start, window.end)?))
    }
}

fn offset(start: DateTime<Utc>, seconds: f64) -> Option<DateTime<Utc>> {
    let millis = (seconds * 1000.0).round();
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        return None;
    }
    start.checked_add_signed(Duration::try_milliseconds(millis as i64)?)
}

/// Build a timeline for every ingestion whose route has drawable duration data.
pub fn ingestion_timelines(ingestions: &[Ingestion], reference: &SubstanceFile) -> Vec<IngestionTimeline> {
    ingestions
        .iter()
        .filter_map(|ingestion| {
            let roa = reference
                .substance(&ingestion.substance_name)?
                .roa(ingestion.route)?;
            let shape = build_timeline(roa.duration.as_ref()?)?;
            Some(IngestionTimeline {
                ingestion_id: ingestion.id.clone(),
                substance_name: ingestion.substance_name.clone(),
                start: ingestion.time,
                shape,
                height: relative_height(ingestion, ingestions),
            })
        })
        .collect()
}

fn relative_height(ingestion: &Ingestion, all: &[Ingestion]) -> f64 {
    let Some(dose) = ingestion.dose else {
        return 1.0;
    };
    let max = all
        .iter()
        .filter(|other| {
            other.substance_name == ingestion.substance_name && other.units == ingestion.units
        })
        .filter_map(|other| other.dose)
        .fold(dose, f64::max);

    if max > 0.0 {
        dose / max
    } else {
        1.0
    }
}

/// Sum of the logged doses of one substance in one unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CumulativeDose {
    pub substance_name: String,
    pub units: Option<String>,
    pub total: f64,
    /// At least one contributing dose was an estimate
    pub is_estimate: bool,
    /// At least one ingestion had no dose
    pub has_unknown: bool,
}

/// Cumulative doses per (substance, units), in order of first ingestion.
pub fn cumulative_doses(ingestions: &[Ingestion]) -> Vec<CumulativeDose> {
    let mut totals: Vec<CumulativeDose> = Vec::new();

    for ingestion in ingestions {
        let index = match totals.iter().position(|t| {
            t.substance_name == ingestion.substance_name && t.units == ingestion.units
        }) {
            Some(index) => index,
            None => {
                totals.push(CumulativeDose {
                    substance_name: ingestion.substance_name.clone(),
                    units: ingestion.units.clone(),
                    total: 0.0,
                    is_estimate: false,
                    has_unknown: false,
                });
                totals.len() - 1
            }
        };

        let entry = &mut totals[index];
        match ingestion.dose {
            Some(dose) => {
                entry.total += dose;
                entry.is_estimate |= ingestion.is_dose_an_estimate;
            }
            None => entry.has_unknown = true,
        }
    }

    totals
}
