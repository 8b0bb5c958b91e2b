//! Dose Journal Core Library
//!
//! Local-first substance journal: dose classification, duration timelines and
//! interaction checks over a bundled reference dataset, plus the SQLite
//! journal the app logs ingestions to.
//!
//! # Architecture
//!
//! ```text
//!   reference JSON ──► SubstanceFile ──► Analyzer ──► dose class
//!                           │               │    ──► timeline shape
//!                           │               │    ──► expanded interactions
//!                           ▼               │
//!                        search             ▼
//!                                   interaction alerts
//!                                           ▲
//!   app ──► experiences / ingestions ──► Database (SQLite) ──► JSON export
//! ```
//!
//! # Modules
//!
//! - [`analysis`]: Dose classifier, timeline builder, interaction expander
//! - [`reference`]: Reference dataset loading, validation and search
//! - [`db`]: SQLite journal storage
//! - [`export`]: Whole-journal JSON export and import
//! - [`models`]: Domain types (Substance, Ingestion, DoseClass, etc.)
//! - [`config`]: Journal configuration
//! - [`logging`]: tracing subscriber setup

pub mod analysis;
pub mod config;
pub mod db;
pub mod export;
pub mod logging;
pub mod models;
pub mod reference;

// Re-export commonly used types
pub use analysis::{Analyzer, CategoryMembership, InteractionAlert, TimelineShape};
pub use config::JournalConfig;
pub use db::Database;
pub use export::{ImportSummary, JournalExport, JournalExporter};
pub use models::{
    AdministrationRoute, DoseClass, Experience, Ingestion, InteractionLists, InteractionSeverity,
    Substance, SubstanceColor, SubstanceCompanion,
};
pub use reference::SubstanceFile;

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tracing::warn;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum DoseJournalError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Reference data error: {0}")]
    ReferenceError(String),

    #[error("Unknown substance: {0}")]
    UnknownSubstance(String),
}

impl From<db::DbError> for DoseJournalError {
    fn from(e: db::DbError) -> Self {
        DoseJournalError::DatabaseError(e.to_string())
    }
}

impl From<serde_json::Error> for DoseJournalError {
    fn from(e: serde_json::Error) -> Self {
        DoseJournalError::SerializationError(e.to_string())
    }
}

impl From<reference::ReferenceError> for DoseJournalError {
    fn from(e: reference::ReferenceError) -> Self {
        DoseJournalError::ReferenceError(e.to_string())
    }
}

impl From<config::ConfigError> for DoseJournalError {
    fn from(e: config::ConfigError) -> Self {
        DoseJournalError::InvalidInput(e.to_string())
    }
}

impl From<analysis::AnalysisError> for DoseJournalError {
    fn from(e: analysis::AnalysisError) -> Self {
        match e {
            analysis::AnalysisError::UnknownSubstance(name) => {
                DoseJournalError::UnknownSubstance(name)
            }
        }
    }
}

impl From<export::ExportError> for DoseJournalError {
    fn from(e: export::ExportError) -> Self {
        match e {
            export::ExportError::Json(e) => e.into(),
            other => DoseJournalError::DatabaseError(other.to_string()),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for DoseJournalError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        DoseJournalError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

fn parse_route(route: &str) -> Result<AdministrationRoute, DoseJournalError> {
    AdministrationRoute::from_name(route)
        .ok_or_else(|| DoseJournalError::InvalidInput(format!("Unknown route: {}", route)))
}

fn parse_color(color: &str) -> Result<SubstanceColor, DoseJournalError> {
    SubstanceColor::from_name(color)
        .ok_or_else(|| DoseJournalError::InvalidInput(format!("Unknown color: {}", color)))
}

fn from_millis(millis: i64) -> Result<DateTime<Utc>, DoseJournalError> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| DoseJournalError::InvalidInput(format!("Timestamp out of range: {}", millis)))
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Install the tracing subscriber. Returns false if one was already installed.
#[uniffi::export]
pub fn init_logging(level: String) -> bool {
    logging::init(&level)
}

/// Open or create a journal at the given path.
#[uniffi::export]
pub fn open_journal(
    path: String,
    reference_json: String,
    config_json: Option<String>,
) -> Result<Arc<DoseJournalCore>, DoseJournalError> {
    let db = Database::open(&path)?;
    DoseJournalCore::new(db, &reference_json, config_json.as_deref())
}

/// Create an in-memory journal (for testing).
#[uniffi::export]
pub fn open_journal_in_memory(
    reference_json: String,
    config_json: Option<String>,
) -> Result<Arc<DoseJournalCore>, DoseJournalError> {
    let db = Database::open_in_memory()?;
    DoseJournalCore::new(db, &reference_json, config_json.as_deref())
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe journal wrapper for FFI.
#[derive(uniffi::Object)]
pub struct DoseJournalCore {
    db: Arc<Mutex<Database>>,
    reference: SubstanceFile,
    membership: CategoryMembership,
    config: JournalConfig,
}

impl DoseJournalCore {
    fn new(
        db: Database,
        reference_json: &str,
        config_json: Option<&str>,
    ) -> Result<Arc<Self>, DoseJournalError> {
        let reference = SubstanceFile::from_json(reference_json)?;
        let config = match config_json {
            Some(json) => JournalConfig::from_json(json)?,
            None => JournalConfig::default(),
        };
        let membership = reference.category_membership();
        Ok(Arc::new(Self {
            db: Arc::new(Mutex::new(db)),
            reference,
            membership,
            config,
        }))
    }

    fn analyzer(&self) -> Analyzer<'_> {
        Analyzer::new(&self.reference, &self.membership, &self.config)
    }
}

#[uniffi::export]
impl DoseJournalCore {
    // =========================================================================
    // Reference Operations
    // =========================================================================

    /// Search substances by name, common name or category.
    pub fn search_substances(&self, query: String) -> Vec<FfiSearchHit> {
        self.reference
            .search(&query, self.config.search_threshold)
            .into_iter()
            .map(|hit| FfiSearchHit {
                name: hit.substance.name.clone(),
                common_names: hit.substance.common_names.clone(),
                categories: hit.substance.categories.clone(),
                score: hit.score,
            })
            .collect()
    }

    /// Classify a dose against the reference ranges of a substance and route.
    pub fn classify_dose(
        &self,
        substance_name: String,
        route: String,
        dose: Option<f64>,
        units: Option<String>,
    ) -> Result<Option<FfiDoseClassification>, DoseJournalError> {
        let route = parse_route(&route)?;
        let class = self
            .analyzer()
            .classify_dose(&substance_name, route, dose, units.as_deref())?;
        Ok(class.map(Into::into))
    }

    /// Whether doses of this substance and route are usually measured volumetrically.
    pub fn uses_volumetric_dosing(
        &self,
        substance_name: String,
        route: String,
    ) -> Result<bool, DoseJournalError> {
        let route = parse_route(&route)?;
        Ok(self.analyzer().uses_volumetric_dosing(&substance_name, route)?)
    }

    /// Timeline shape for a substance and route, flattened to points.
    pub fn build_timeline(
        &self,
        substance_name: String,
        route: String,
        samples_per_curve: u32,
    ) -> Result<Option<FfiTimeline>, DoseJournalError> {
        let route = parse_route(&route)?;
        let shape = self.analyzer().timeline(&substance_name, route)?;
        Ok(shape.map(|shape| FfiTimeline::new(&shape, 1.0, samples_per_curve as usize)))
    }

    /// Expanded interaction lists of a substance.
    pub fn interactions_for(
        &self,
        substance_name: String,
    ) -> Result<FfiInteractionLists, DoseJournalError> {
        Ok(self.analyzer().interactions(&substance_name)?.into())
    }

    /// Alerts for taking a substance at `now_ms`, against logged ingestions.
    pub fn check_interactions(
        &self,
        substance_name: String,
        now_ms: i64,
    ) -> Result<Vec<FfiInteractionAlert>, DoseJournalError> {
        let now = from_millis(now_ms)?;
        let analyzer = self.analyzer();
        let recent = {
            let db = self.db.lock()?;
            db.list_ingestions_since(&analyzer.lookback_start(now))?
        };
        let alerts = analyzer.check_interactions(&substance_name, &recent, now)?;
        Ok(alerts.into_iter().map(Into::into).collect())
    }

    // =========================================================================
    // Experience Operations
    // =========================================================================

    /// Create a new experience.
    pub fn create_experience(
        &self,
        title: String,
        sort_date_ms: i64,
    ) -> Result<FfiExperience, DoseJournalError> {
        let db = self.db.lock()?;
        let experience = Experience::new(title, from_millis(sort_date_ms)?);
        db.insert_experience(&experience)?;
        Ok(experience.into())
    }

    /// Get an experience by ID.
    pub fn get_experience(&self, id: String) -> Result<Option<FfiExperience>, DoseJournalError> {
        let db = self.db.lock()?;
        Ok(db.get_experience(&id)?.map(Into::into))
    }

    /// List experiences, most recent first.
    pub fn list_experiences(&self) -> Result<Vec<FfiExperience>, DoseJournalError> {
        let db = self.db.lock()?;
        Ok(db.list_experiences()?.into_iter().map(Into::into).collect())
    }

    /// Update title, text and sort date of an experience.
    pub fn update_experience(&self, experience: FfiExperience) -> Result<bool, DoseJournalError> {
        let db = self.db.lock()?;
        let experience = experience.try_into()?;
        Ok(db.update_experience(&experience)?)
    }

    /// Delete an experience with all of its ingestions.
    pub fn delete_experience(&self, id: String) -> Result<bool, DoseJournalError> {
        let db = self.db.lock()?;
        Ok(db.delete_experience(&id)?)
    }

    // =========================================================================
    // Ingestion Operations
    // =========================================================================

    /// Log an ingestion into an existing experience.
    #[allow(clippy::too_many_arguments)]
    pub fn log_ingestion(
        &self,
        experience_id: String,
        substance_name: String,
        route: String,
        time_ms: i64,
        dose: Option<f64>,
        units: Option<String>,
        is_dose_an_estimate: bool,
        note: String,
    ) -> Result<FfiIngestion, DoseJournalError> {
        let db = self.db.lock()?;
        if db.get_experience(&experience_id)?.is_none() {
            return Err(DoseJournalError::NotFound(experience_id));
        }

        let mut ingestion = Ingestion::new(
            experience_id,
            substance_name,
            parse_route(&route)?,
            from_millis(time_ms)?,
        );
        ingestion.dose = dose;
        ingestion.units = units;
        ingestion.is_dose_an_estimate = is_dose_an_estimate;
        ingestion.note = note;

        db.insert_ingestion(&ingestion)?;
        Ok(ffi_ingestion(&self.analyzer(), ingestion))
    }

    /// Get an ingestion by ID.
    pub fn get_ingestion(&self, id: String) -> Result<Option<FfiIngestion>, DoseJournalError> {
        let db = self.db.lock()?;
        Ok(db.get_ingestion(&id)?.map(|i| ffi_ingestion(&self.analyzer(), i)))
    }

    /// Ingestions of an experience in chronological order.
    pub fn list_ingestions(&self, experience_id: String) -> Result<Vec<FfiIngestion>, DoseJournalError> {
        let db = self.db.lock()?;
        let ingestions = db.list_ingestions_for_experience(&experience_id)?;
        let analyzer = self.analyzer();
        Ok(ingestions
            .into_iter()
            .map(|i| ffi_ingestion(&analyzer, i))
            .collect())
    }

    /// Update an existing ingestion.
    pub fn update_ingestion(&self, ingestion: FfiIngestion) -> Result<bool, DoseJournalError> {
        let db = self.db.lock()?;
        let ingestion = ingestion.try_into()?;
        Ok(db.update_ingestion(&ingestion)?)
    }

    /// Delete an ingestion.
    pub fn delete_ingestion(&self, id: String) -> Result<bool, DoseJournalError> {
        let db = self.db.lock()?;
        Ok(db.delete_ingestion(&id)?)
    }

    /// Timelines of an experience's ingestions, scaled by relative dose.
    pub fn experience_timelines(
        &self,
        experience_id: String,
        samples_per_curve: u32,
    ) -> Result<Vec<FfiIngestionTimeline>, DoseJournalError> {
        let ingestions = {
            let db = self.db.lock()?;
            db.list_ingestions_for_experience(&experience_id)?
        };
        Ok(self
            .analyzer()
            .experience_timelines(&ingestions)
            .into_iter()
            .filter_map(|timeline| {
                let Some(end) = timeline.end() else {
                    warn!(ingestion = %timeline.ingestion_id, "timeline ends out of range");
                    return None;
                };
                Some(FfiIngestionTimeline {
                    ingestion_id: timeline.ingestion_id.clone(),
                    substance_name: timeline.substance_name.clone(),
                    start_ms: timeline.start.timestamp_millis(),
                    end_ms: end.timestamp_millis(),
                    timeline: FfiTimeline::new(
                        &timeline.shape,
                        timeline.height,
                        samples_per_curve as usize,
                    ),
                })
            })
            .collect())
    }

    /// Summed doses per substance and unit within an experience.
    pub fn cumulative_doses(
        &self,
        experience_id: String,
    ) -> Result<Vec<FfiCumulativeDose>, DoseJournalError> {
        let db = self.db.lock()?;
        let ingestions = db.list_ingestions_for_experience(&experience_id)?;
        Ok(analysis::cumulative_doses(&ingestions)
            .into_iter()
            .map(|total| FfiCumulativeDose {
                substance_name: total.substance_name,
                units: total.units,
                total: total.total,
                is_estimate: total.is_estimate,
                has_unknown: total.has_unknown,
            })
            .collect())
    }

    // =========================================================================
    // Companion Operations
    // =========================================================================

    /// Color of a substance, assigning the first unused one on first use.
    pub fn substance_color(&self, substance_name: String) -> Result<FfiCompanion, DoseJournalError> {
        let db = self.db.lock()?;
        Ok(db.companion_or_default(&substance_name)?.into())
    }

    /// Change the color of a substance.
    pub fn set_substance_color(
        &self,
        substance_name: String,
        color: String,
    ) -> Result<FfiCompanion, DoseJournalError> {
        let db = self.db.lock()?;
        let color = parse_color(&color)?;
        let companion = db.companion_or_default(&substance_name)?.with_color(color);
        db.upsert_companion(&companion)?;
        Ok(companion.into())
    }

    // =========================================================================
    // Export Operations
    // =========================================================================

    /// Export the whole journal as JSON.
    pub fn export_journal_json(&self) -> Result<String, DoseJournalError> {
        let db = self.db.lock()?;
        let export = JournalExporter::new(&db).export_all()?;
        Ok(export.to_json()?)
    }

    /// Import a JSON export, skipping records that already exist.
    pub fn import_journal_json(&self, json: String) -> Result<FfiImportSummary, DoseJournalError> {
        let db = self.db.lock()?;
        let summary = JournalExporter::new(&db).import_json(&json)?;
        Ok(summary.into())
    }
}

fn ffi_ingestion(analyzer: &Analyzer<'_>, ingestion: Ingestion) -> FfiIngestion {
    let dose_class = analyzer.classify_ingestion(&ingestion).map(Into::into);
    FfiIngestion {
        id: ingestion.id,
        experience_id: ingestion.experience_id,
        substance_name: ingestion.substance_name,
        route: ingestion.route.as_str().to_string(),
        time_ms: ingestion.time.timestamp_millis(),
        dose: ingestion.dose,
        units: ingestion.units,
        is_dose_an_estimate: ingestion.is_dose_an_estimate,
        note: ingestion.note,
        dose_class,
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe dose class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiDoseClass {
    Threshold,
    Light,
    Common,
    Strong,
    Heavy,
}

impl From<DoseClass> for FfiDoseClass {
    fn from(class: DoseClass) -> Self {
        match class {
            DoseClass::Threshold => FfiDoseClass::Threshold,
            DoseClass::Light => FfiDoseClass::Light,
            DoseClass::Common => FfiDoseClass::Common,
            DoseClass::Strong => FfiDoseClass::Strong,
            DoseClass::Heavy => FfiDoseClass::Heavy,
        }
    }
}

/// FFI-safe dose class with its display attributes.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDoseClassification {
    pub level: FfiDoseClass,
    pub num_dots: u8,
    pub description: String,
    pub light_color: u32,
    pub dark_color: u32,
}

impl From<DoseClass> for FfiDoseClassification {
    fn from(class: DoseClass) -> Self {
        let colors = class.colors();
        Self {
            level: class.into(),
            num_dots: class.num_dots(),
            description: class.description().to_string(),
            light_color: colors.light,
            dark_color: colors.dark,
        }
    }
}

/// FFI-safe timeline point.
#[derive(Debug, Clone, Copy, uniffi::Record)]
pub struct FfiPoint {
    pub seconds: f64,
    pub intensity: f64,
}

impl From<analysis::Point> for FfiPoint {
    fn from(point: analysis::Point) -> Self {
        Self {
            seconds: point.seconds,
            intensity: point.intensity,
        }
    }
}

/// FFI-safe timeline, paths flattened to points.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTimeline {
    /// False when only the total duration was known
    pub is_full: bool,
    pub width_seconds: f64,
    pub center: Vec<FfiPoint>,
    pub envelope: Vec<FfiPoint>,
    pub peak_start_seconds: Option<f64>,
    pub peak_end_seconds: Option<f64>,
}

impl FfiTimeline {
    fn new(shape: &TimelineShape, height: f64, samples_per_curve: usize) -> Self {
        let flatten = |path: analysis::TimelinePath| -> Vec<FfiPoint> {
            path.scaled(height)
                .points(samples_per_curve)
                .into_iter()
                .map(Into::into)
                .collect()
        };
        let peak = shape.peak_window();
        Self {
            is_full: matches!(shape, TimelineShape::Full(_)),
            width_seconds: shape.width(),
            center: flatten(shape.center()),
            envelope: flatten(shape.envelope()),
            peak_start_seconds: peak.map(|w| w.start),
            peak_end_seconds: peak.map(|w| w.end),
        }
    }
}

/// FFI-safe ingestion timeline placed on the wall clock.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiIngestionTimeline {
    pub ingestion_id: String,
    pub substance_name: String,
    pub start_ms: i64,
    pub end_ms: i64,
    pub timeline: FfiTimeline,
}

/// FFI-safe expanded interaction lists.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiInteractionLists {
    pub dangerous: Vec<String>,
    pub unsafe_interactions: Vec<String>,
    pub uncertain: Vec<String>,
}

impl From<InteractionLists> for FfiInteractionLists {
    fn from(lists: InteractionLists) -> Self {
        Self {
            dangerous: lists.dangerous,
            unsafe_interactions: lists.unsafe_,
            uncertain: lists.uncertain,
        }
    }
}

/// FFI-safe interaction severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiInteractionSeverity {
    Dangerous,
    Unsafe,
    Uncertain,
}

impl From<InteractionSeverity> for FfiInteractionSeverity {
    fn from(severity: InteractionSeverity) -> Self {
        match severity {
            InteractionSeverity::Dangerous => FfiInteractionSeverity::Dangerous,
            InteractionSeverity::Unsafe => FfiInteractionSeverity::Unsafe,
            InteractionSeverity::Uncertain => FfiInteractionSeverity::Uncertain,
        }
    }
}

/// FFI-safe interaction alert.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiInteractionAlert {
    pub severity: FfiInteractionSeverity,
    pub with_substance: String,
    pub last_ingested_ms: i64,
}

impl From<InteractionAlert> for FfiInteractionAlert {
    fn from(alert: InteractionAlert) -> Self {
        Self {
            severity: alert.severity.into(),
            with_substance: alert.with_substance,
            last_ingested_ms: alert.last_ingested.timestamp_millis(),
        }
    }
}

/// FFI-safe search hit.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSearchHit {
    pub name: String,
    pub common_names: Vec<String>,
    pub categories: Vec<String>,
    pub score: f64,
}

/// FFI-safe experience.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiExperience {
    pub id: String,
    pub title: String,
    pub text: String,
    pub created_at_ms: i64,
    pub sort_date_ms: i64,
}

impl From<Experience> for FfiExperience {
    fn from(experience: Experience) -> Self {
        Self {
            id: experience.id,
            title: experience.title,
            text: experience.text,
            created_at_ms: experience.created_at.timestamp_millis(),
            sort_date_ms: experience.sort_date.timestamp_millis(),
        }
    }
}

impl TryFrom<FfiExperience> for Experience {
    type Error = DoseJournalError;

    fn try_from(experience: FfiExperience) -> Result<Self, Self::Error> {
        Ok(Experience {
            id: experience.id,
            title: experience.title,
            text: experience.text,
            created_at: from_millis(experience.created_at_ms)?,
            sort_date: from_millis(experience.sort_date_ms)?,
        })
    }
}

/// FFI-safe ingestion.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiIngestion {
    pub id: String,
    pub experience_id: String,
    pub substance_name: String,
    pub route: String,
    pub time_ms: i64,
    pub dose: Option<f64>,
    pub units: Option<String>,
    pub is_dose_an_estimate: bool,
    pub note: String,
    /// Filled in on the way out, ignored on the way in
    pub dose_class: Option<FfiDoseClassification>,
}

impl TryFrom<FfiIngestion> for Ingestion {
    type Error = DoseJournalError;

    fn try_from(ingestion: FfiIngestion) -> Result<Self, Self::Error> {
        Ok(Ingestion {
            id: ingestion.id,
            experience_id: ingestion.experience_id,
            substance_name: ingestion.substance_name,
            route: parse_route(&ingestion.route)?,
            time: from_millis(ingestion.time_ms)?,
            dose: ingestion.dose,
            units: ingestion.units,
            is_dose_an_estimate: ingestion.is_dose_an_estimate,
            note: ingestion.note,
        })
    }
}

/// FFI-safe cumulative dose.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCumulativeDose {
    pub substance_name: String,
    pub units: Option<String>,
    pub total: f64,
    pub is_estimate: bool,
    pub has_unknown: bool,
}

/// FFI-safe substance companion.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCompanion {
    pub substance_name: String,
    pub color: String,
    pub argb: u32,
}

impl From<SubstanceCompanion> for FfiCompanion {
    fn from(companion: SubstanceCompanion) -> Self {
        Self {
            substance_name: companion.substance_name,
            color: companion.color.as_str().to_string(),
            argb: companion.color.argb(),
        }
    }
}

/// FFI-safe import summary.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiImportSummary {
    pub experiences_added: u32,
    pub ingestions_added: u32,
    pub companions_added: u32,
    pub skipped: u32,
}

impl From<ImportSummary> for FfiImportSummary {
    fn from(summary: ImportSummary) -> Self {
        Self {
            experiences_added: summary.experiences_added,
            ingestions_added: summary.ingestions_added,
            companions_added: summary.companions_added,
            skipped: summary.skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFERENCE: &str = r#"{
        "categories": [{"name": "stimulant"}, {"name": "opioid"}],
        "substances": [
            {
                "name": "Amphetamine",
                "categories": ["stimulant"],
                "interactions": {"dangerous": ["Tramadol"], "unsafe": ["opioid"]},
                "roas": [{
                    "name": "oral",
                    "dose": {"units": "mg", "threshold": 5,
                             "light": {"min": 5, "max": 10}, "common": {"min": 10, "max": 20},
                             "strong": {"min": 20, "max": 35}, "heavy": 35},
                    "duration": {
                        "onset": {"min": 30, "max": 60, "units": "minutes"},
                        "comeup": {"min": 30, "max": 60, "units": "minutes"},
                        "peak": {"min": 2, "max": 3, "units": "hours"},
                        "offset": {"min": 2, "max": 4, "units": "hours"}
                    }
                }]
            },
            {"name": "Tramadol", "categories": ["opioid"]},
            {"name": "Oxycodone", "categories": ["opioid"]}
        ]
    }"#;

    const HOUR_MS: i64 = 3_600_000;
    const NOW_MS: i64 = 1_714_000_000_000;

    fn core() -> Arc<DoseJournalCore> {
        open_journal_in_memory(REFERENCE.into(), None).unwrap()
    }

    #[test]
    fn test_open_rejects_bad_input() {
        assert!(matches!(
            open_journal_in_memory("not json".into(), None),
            Err(DoseJournalError::SerializationError(_)) | Err(DoseJournalError::ReferenceError(_))
        ));
        assert!(matches!(
            open_journal_in_memory(REFERENCE.into(), Some(r#"{"searchThreshold": 3}"#.into())),
            Err(DoseJournalError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_open_rejects_out_of_range_numbers() {
        assert!(matches!(
            open_journal_in_memory(
                REFERENCE.into(),
                Some(r#"{"interactionLookbackHours": 9000000000000000}"#.into())
            ),
            Err(DoseJournalError::InvalidInput(_))
        ));

        let endless = r#"{"substances": [{"name": "Caffeine", "roas": [{
            "name": "oral", "duration": {"total": {"min": 1, "max": 1e15, "units": "days"}}
        }]}]}"#;
        assert!(matches!(
            open_journal_in_memory(endless.into(), None),
            Err(DoseJournalError::ReferenceError(_))
        ));
    }

    #[test]
    fn test_list_ingestions_classifies_each_row() {
        let core = core();
        let experience = core.create_experience("Night".into(), NOW_MS).unwrap();
        for (hour, dose) in [3.0, 15.0, 50.0].into_iter().enumerate() {
            core.log_ingestion(
                experience.id.clone(),
                "Amphetamine".into(),
                "oral".into(),
                NOW_MS + hour as i64 * HOUR_MS,
                Some(dose),
                Some("mg".into()),
                false,
                String::new(),
            )
            .unwrap();
        }

        let levels: Vec<FfiDoseClass> = core
            .list_ingestions(experience.id)
            .unwrap()
            .into_iter()
            .filter_map(|i| i.dose_class.map(|c| c.level))
            .collect();
        assert_eq!(levels, vec![FfiDoseClass::Threshold, FfiDoseClass::Common, FfiDoseClass::Heavy]);
    }

    #[test]
    fn test_classify_dose() {
        let core = core();

        let class = core
            .classify_dose("Amphetamine".into(), "oral".into(), Some(15.0), Some("mg".into()))
            .unwrap()
            .unwrap();
        assert_eq!(class.level, FfiDoseClass::Common);
        assert_eq!(class.num_dots, 2);

        assert!(matches!(
            core.classify_dose("Amphetamine".into(), "teleported".into(), Some(15.0), None),
            Err(DoseJournalError::InvalidInput(_))
        ));
        assert!(matches!(
            core.classify_dose("Nope".into(), "oral".into(), Some(15.0), None),
            Err(DoseJournalError::UnknownSubstance(_))
        ));
    }

    #[test]
    fn test_build_timeline() {
        let core = core();
        let timeline = core
            .build_timeline("Amphetamine".into(), "oral".into(), 8)
            .unwrap()
            .unwrap();

        assert!(timeline.is_full);
        assert_eq!(timeline.width_seconds, (60.0 + 60.0 + 180.0 + 240.0) * 60.0);
        assert!(timeline.peak_start_seconds.is_some());
        assert_eq!(timeline.center.first().map(|p| p.seconds), Some(0.0));
    }

    #[test]
    fn test_journal_flow_with_alerts() {
        let core = core();

        let experience = core
            .create_experience("Evening".into(), NOW_MS - 2 * HOUR_MS)
            .unwrap();
        let logged = core
            .log_ingestion(
                experience.id.clone(),
                "Oxycodone".into(),
                "oral".into(),
                NOW_MS - 2 * HOUR_MS,
                Some(10.0),
                Some("mg".into()),
                false,
                String::new(),
            )
            .unwrap();
        assert!(logged.dose_class.is_none());

        let alerts = core.check_interactions("Amphetamine".into(), NOW_MS).unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, FfiInteractionSeverity::Unsafe);
        assert_eq!(alerts[0].with_substance, "Oxycodone");
        assert_eq!(alerts[0].last_ingested_ms, NOW_MS - 2 * HOUR_MS);

        // outside the 48h default lookback
        assert!(core
            .check_interactions("Amphetamine".into(), NOW_MS + 72 * HOUR_MS)
            .unwrap()
            .is_empty());

        assert_eq!(core.list_ingestions(experience.id.clone()).unwrap().len(), 1);
        assert!(core.delete_experience(experience.id.clone()).unwrap());
        assert!(core.get_ingestion(logged.id).unwrap().is_none());
    }

    #[test]
    fn test_log_ingestion_requires_experience() {
        let core = core();
        assert!(matches!(
            core.log_ingestion(
                "missing".into(),
                "Amphetamine".into(),
                "oral".into(),
                NOW_MS,
                None,
                None,
                false,
                String::new(),
            ),
            Err(DoseJournalError::NotFound(_))
        ));
    }

    #[test]
    fn test_substance_colors() {
        let core = core();

        let first = core.substance_color("Amphetamine".into()).unwrap();
        assert_eq!(first.color, "red");

        let changed = core
            .set_substance_color("Amphetamine".into(), "Blue".into())
            .unwrap();
        assert_eq!(changed.color, "blue");
        assert_eq!(core.substance_color("Amphetamine".into()).unwrap().color, "blue");

        assert!(matches!(
            core.set_substance_color("Amphetamine".into(), "magenta".into()),
            Err(DoseJournalError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_export_import_round_trip() {
        let source = core();
        let experience = source.create_experience("Trip".into(), NOW_MS).unwrap();
        source
            .log_ingestion(
                experience.id,
                "Amphetamine".into(),
                "oral".into(),
                NOW_MS,
                Some(15.0),
                Some("mg".into()),
                true,
                "with food".into(),
            )
            .unwrap();
        let json = source.export_journal_json().unwrap();

        let target = core();
        let summary = target.import_journal_json(json.clone()).unwrap();
        assert_eq!(summary.experiences_added, 1);
        assert_eq!(summary.ingestions_added, 1);

        let again = target.import_journal_json(json).unwrap();
        assert_eq!(again.experiences_added, 0);
        assert_eq!(again.skipped, 2);
    }
}
