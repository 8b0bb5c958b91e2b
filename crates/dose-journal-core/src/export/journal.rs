//! Whole-journal JSON backup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{ExportError, ExportResult};
use crate::db::{Database, DbError};
use crate::models::{Experience, Ingestion, SubstanceCompanion};

/// Current export format version.
pub const EXPORT_VERSION: u32 = 1;

/// Everything the journal stores.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JournalExport {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub experiences: Vec<Experience>,
    pub ingestions: Vec<Ingestion>,
    #[serde(default)]
    pub companions: Vec<SubstanceCompanion>,
}

impl JournalExport {
    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Counts of what an import added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub experiences_added: u32,
    pub ingestions_added: u32,
    pub companions_added: u32,
    /// Records whose id (or substance name) was already present
    pub skipped: u32,
}

/// Journal exporter.
pub struct JournalExporter<'a> {
    db: &'a Database,
}

impl<'a> JournalExporter<'a> {
    /// Create a new journal exporter.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Export every experience, ingestion and companion.
    pub fn export_all(&self) -> ExportResult<JournalExport> {
        let export = JournalExport {
            version: EXPORT_VERSION,
            exported_at: Utc::now(),
            experiences: self.db.list_experiences()?,
            ingestions: self.db.list_all_ingestions()?,
            companions: self.db.list_companions()?,
        };
        info!(
            experiences = export.experiences.len(),
            ingestions = export.ingestions.len(),
            "exported journal"
        );
        Ok(export)
    }

    /// Import an export, adding only records that are not present yet.
    ///
    /// Runs in a single transaction: on error nothing is imported.
    pub fn import(&self, export: &JournalExport) -> ExportResult<ImportSummary> {
        if export.version != EXPORT_VERSION {
            return Err(ExportError::UnsupportedVersion(export.version));
        }

        let tx = self
            .db
            .conn()
            .unchecked_transaction()
            .map_err(DbError::from)?;
        let mut summary = ImportSummary::default();

        for experience in &export.experiences {
            if self.db.get_experience(&experience.id)?.is_some() {
                summary.skipped += 1;
                continue;
            }
            self.db.insert_experience(experience)?;
            summary.experiences_added += 1;
        }

        for ingestion in &export.ingestions {
            if self.db.get_ingestion(&ingestion.id)?.is_some() {
                summary.skipped += 1;
                continue;
            }
            if self.db.get_experience(&ingestion.experience_id)?.is_none() {
                return Err(ExportError::MissingExperience {
                    ingestion: ingestion.id.clone(),
                    experience: ingestion.experience_id.clone(),
                });
            }
            self.db.insert_ingestion(ingestion)?;
            summary.ingestions_added += 1;
        }

        for companion in &export.companions {
            if self.db.get_companion(&companion.substance_name)?.is_some() {
                summary.skipped += 1;
                continue;
            }
            self.db.upsert_companion(companion)?;
            summary.companions_added += 1;
        }

        tx.commit().map_err(DbError::from)?;
        info!(?summary, "imported journal");
        Ok(summary)
    }

    /// Parse and import a JSON export.
    pub fn import_json(&self, json: &str) -> ExportResult<ImportSummary> {
        let export = JournalExport::from_json(json)?;
        self.import(&export)
    }
}
