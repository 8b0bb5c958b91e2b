//! Dose classification, timelines and interaction checks.
//!
//! The submodules are pure functions over reference data. [`Analyzer`] ties
//! them to a loaded [`SubstanceFile`] and looks substances up by name.

mod dose_class;
mod experience;
mod interactions;
mod timeline;

pub use dose_class::*;
pub use experience::*;
pub use interactions::*;
pub use timeline::*;

use chrono::{DateTime, Duration, TimeDelta, Utc};
use thiserror::Error;
use tracing::debug;

use crate::config::JournalConfig;
use crate::models::{AdministrationRoute, DoseClass, Ingestion, InteractionLists, Substance};
use crate::reference::SubstanceFile;

/// Analysis errors.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Unknown substance: {0}")]
    UnknownSubstance(String),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Runs the analyses against a loaded reference dataset.
pub struct Analyzer<'a> {
    reference: &'a SubstanceFile,
    expander: InteractionExpander<'a>,
    lookback: Duration,
}

impl<'a> Analyzer<'a> {
    /// Create a new analyzer.
    ///
    /// `membership` is the category membership of `reference`, built once by
    /// the caller with [`SubstanceFile::category_membership`].
    pub fn new(
        reference: &'a SubstanceFile,
        membership: &'a CategoryMembership,
        config: &JournalConfig,
    ) -> Self {
        Self {
            reference,
            expander: InteractionExpander::new(
                &reference.substances,
                membership,
                config.bidirectional_interactions,
            ),
            lookback: Duration::try_hours(config.interaction_lookback_hours)
                .unwrap_or(TimeDelta::MAX),
        }
    }

    /// Classify a dose of a substance taken by a route.
    ///
    /// `Ok(None)` when the route has no dose data, units differ or the dose is unknown.
    pub fn classify_dose(
        &self,
        substance_name: &str,
        route: AdministrationRoute,
        dose: Option<f64>,
        units: Option<&str>,
    ) -> AnalysisResult<Option<DoseClass>> {
        let substance = self.substance(substance_name)?;
        let class = substance
            .roa(route)
            .and_then(|roa| roa.dose.as_ref())
            .and_then(|reference| classify(reference, dose, units));
        debug!(substance = %substance.name, route = route.as_str(), ?class, "classified dose");
        Ok(class)
    }

    /// Classify a logged ingestion. Unknown substances are not classified.
    pub fn classify_ingestion(&self, ingestion: &Ingestion) -> Option<DoseClass> {
        self.classify_dose(
            &ingestion.substance_name,
            ingestion.route,
            ingestion.dose,
            ingestion.units.as_deref(),
        )
        .ok()
        .flatten()
    }

    pub fn uses_volumetric_dosing(
        &self,
        substance_name: &str,
        route: AdministrationRoute,
    ) -> AnalysisResult<bool> {
        let substance = self.substance(substance_name)?;
        Ok(substance
            .roa(route)
            .and_then(|roa| roa.dose.as_ref())
            .is_some_and(uses_volumetric_dosing))
    }

    /// Timeline shape for a substance and route. `Ok(None)` when nothing can be drawn.
    pub fn timeline(
        &self,
        substance_name: &str,
        route: AdministrationRoute,
    ) -> AnalysisResult<Option<TimelineShape>> {
        let substance = self.substance(substance_name)?;
        let shape = substance
            .roa(route)
            .and_then(|roa| roa.duration.as_ref())
            .and_then(build_timeline);

        match &shape {
            Some(TimelineShape::TotalOnly(_)) => {
                debug!(substance = %substance.name, route = route.as_str(), "timeline from total duration only")
            }
            None => debug!(substance = %substance.name, route = route.as_str(), "no timeline data"),
            Some(TimelineShape::Full(_)) => {}
        }
        Ok(shape)
    }

    /// Expanded interaction lists of a substance.
    pub fn interactions(&self, substance_name: &str) -> AnalysisResult<InteractionLists> {
        let substance = self.substance(substance_name)?;
        Ok(self.expander.expand(substance))
    }

    /// Alerts for a substance about to be taken, against recent ingestions.
    pub fn check_interactions(
        &self,
        substance_name: &str,
        recent: &[Ingestion],
        now: DateTime<Utc>,
    ) -> AnalysisResult<Vec<InteractionAlert>> {
        let substance = self.substance(substance_name)?;
        let expanded = self.expander.expand(substance);
        let alerts = check_recent(&substance.name, &expanded, recent, now, self.lookback);
        debug!(substance = %substance.name, alerts = alerts.len(), "checked interactions");
        Ok(alerts)
    }

    /// Timelines for the ingestions of one experience.
    pub fn experience_timelines(&self, ingestions: &[Ingestion]) -> Vec<IngestionTimeline> {
        ingestion_timelines(ingestions, self.reference)
    }

    /// Start of the interaction lookback window, clamped to the earliest
    /// representable time.
    pub fn lookback_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        lookback_cutoff(now, self.lookback)
    }

    fn substance(&self, name: &str) -> AnalysisResult<&'a Substance> {
        self.reference
            .substance(name)
            .ok_or_else(|| AnalysisError::UnknownSubstance(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InteractionSeverity;

    const DATA: &str = r#"{
        "categories": [{"name": "stimulant"}, {"name": "opioid"}],
        "substances": [
            {
                "name": "Amphetamine",
                "commonNames": ["Speed"],
                "categories": ["stimulant"],
                "interactions": {"dangerous": ["Tramadol"], "unsafe": ["opioid"]},
                "roas": [{
                    "name": "oral",
                    "dose": {"units": "mg", "threshold": 5,
                             "light": {"min": 5, "max": 10}, "common": {"min": 10, "max": 20},
                             "strong": {"min": 20, "max": 35}, "heavy": 35},
                    "duration": {"total": {"min": 4, "max": 8, "units": "hours"}}
                }]
            },
            {"name": "Tramadol", "categories": ["opioid"]},
            {"name": "Oxycodone", "categories": ["opioid"]}
        ]
    }"#;

    fn setup() -> (SubstanceFile, CategoryMembership) {
        let reference = SubstanceFile::from_json(DATA).unwrap();
        let membership = reference.category_membership();
        (reference, membership)
    }

    #[test]
    fn test_classify_by_name() {
        let (reference, membership) = setup();
        let analyzer = Analyzer::new(&reference, &membership, &JournalConfig::default());

        let class = analyzer
            .classify_dose("speed", AdministrationRoute::Oral, Some(20.0), Some("mg"))
            .unwrap();
        assert_eq!(class, Some(DoseClass::Common));

        let no_route = analyzer
            .classify_dose("Amphetamine", AdministrationRoute::Smoked, Some(20.0), Some("mg"))
            .unwrap();
        assert_eq!(no_route, None);

        assert!(matches!(
            analyzer.classify_dose("Nope", AdministrationRoute::Oral, Some(1.0), Some("mg")),
            Err(AnalysisError::UnknownSubstance(_))
        ));
        assert!(analyzer.uses_volumetric_dosing("Amphetamine", AdministrationRoute::Oral).unwrap());
    }

    #[test]
    fn test_total_only_timeline() {
        let (reference, membership) = setup();
        let analyzer = Analyzer::new(&reference, &membership, &JournalConfig::default());

        let shape = analyzer
            .timeline("Amphetamine", AdministrationRoute::Oral)
            .unwrap()
            .unwrap();
        assert!(matches!(shape, TimelineShape::TotalOnly(_)));
        assert!(analyzer.timeline("Tramadol", AdministrationRoute::Oral).unwrap().is_none());
    }

    #[test]
    fn test_interactions_and_alerts() {
        let (reference, membership) = setup();
        let analyzer = Analyzer::new(&reference, &membership, &JournalConfig::default());

        let lists = analyzer.interactions("Amphetamine").unwrap();
        assert_eq!(lists.dangerous, vec!["Tramadol"]);
        assert_eq!(lists.unsafe_, vec!["Oxycodone"]);

        // bidirectional by default: Tramadol inherits Amphetamine's listing
        let tramadol = analyzer.interactions("Tramadol").unwrap();
        assert_eq!(tramadol.dangerous, vec!["Amphetamine"]);

        let now = Utc::now();
        let recent = vec![Ingestion::new(
            "exp".into(),
            "Oxycodone".into(),
            AdministrationRoute::Oral,
            now - Duration::hours(3),
        )];
        let alerts = analyzer.check_interactions("Amphetamine", &recent, now).unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, InteractionSeverity::Unsafe);
    }

    #[test]
    fn test_one_directional_config() {
        let (reference, membership) = setup();
        let config = JournalConfig {
            bidirectional_interactions: false,
            ..JournalConfig::default()
        };
        let analyzer = Analyzer::new(&reference, &membership, &config);
        assert!(analyzer.interactions("Tramadol").unwrap().is_empty());
    }

    #[test]
    fn test_lookback_beyond_time_range() {
        let (reference, membership) = setup();
        let config = JournalConfig {
            interaction_lookback_hours: 9_000_000_000_000_000,
            ..JournalConfig::default()
        };
        let analyzer = Analyzer::new(&reference, &membership, &config);
        let now = Utc::now();
        assert_eq!(analyzer.lookback_start(now), DateTime::<Utc>::MIN_UTC);

        let recent = vec![Ingestion::new(
            "exp".into(),
            "Oxycodone".into(),
            AdministrationRoute::Oral,
            now - Duration::days(365 * 100),
        )];
        let alerts = analyzer.check_interactions("Amphetamine", &recent, now).unwrap();
        assert_eq!(alerts.len(), 1);
    }

    #[test]
    fn test_lookback_start_clamped_near_min() {
        let (reference, membership) = setup();
        let config = JournalConfig {
            interaction_lookback_hours: 48,
            ..JournalConfig::default()
        };
        let analyzer = Analyzer::new(&reference, &membership, &config);
        let early = DateTime::<Utc>::MIN_UTC + Duration::hours(1);
        assert_eq!(analyzer.lookback_start(early), DateTime::<Utc>::MIN_UTC);
    }
}
