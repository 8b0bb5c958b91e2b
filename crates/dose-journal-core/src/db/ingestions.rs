//! Ingestion database operations.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;

use super::{from_millis, to_millis, Database, DbError, DbResult};
use crate::models::{AdministrationRoute, Ingestion};

const INGESTION_COLUMNS: &str = "id, experience_id, substance_name, route, time, dose, units, is_dose_an_estimate, note";

impl Database {
    /// Insert a new ingestion. The experience must exist.
    pub fn insert_ingestion(&self, ingestion: &Ingestion) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO ingestions (
                id, experience_id, substance_name, route, time,
                dose, units, is_dose_an_estimate, note
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                ingestion.id,
                ingestion.experience_id,
                ingestion.substance_name,
                ingestion.route.as_str(),
                to_millis(&ingestion.time),
                ingestion.dose,
                ingestion.units,
                ingestion.is_dose_an_estimate,
                ingestion.note,
            ],
        )?;
        debug!(id = %ingestion.id, substance = %ingestion.substance_name, "inserted ingestion");
        Ok(())
    }

    /// Update an existing ingestion.
    pub fn update_ingestion(&self, ingestion: &Ingestion) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE ingestions SET
                experience_id = ?2,
                substance_name = ?3,
                route = ?4,
                time = ?5,
                dose = ?6,
                units = ?7,
                is_dose_an_estimate = ?8,
                note = ?9
            WHERE id = ?1
            "#,
            params![
                ingestion.id,
                ingestion.experience_id,
                ingestion.substance_name,
                ingestion.route.as_str(),
                to_millis(&ingestion.time),
                ingestion.dose,
                ingestion.units,
                ingestion.is_dose_an_estimate,
                ingestion.note,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get an ingestion by ID.
    pub fn get_ingestion(&self, id: &str) -> DbResult<Option<Ingestion>> {
        let result = self
            .conn
            .query_row(
                &format!("SELECT {INGESTION_COLUMNS} FROM ingestions WHERE id = ?"),
                [id],
                IngestionRow::from_row,
            )
            .optional()?;

        result.map(|row| row.try_into()).transpose()
    }

    /// Ingestions of one experience in chronological order.
    pub fn list_ingestions_for_experience(&self, experience_id: &str) -> DbResult<Vec<Ingestion>> {
        self.query_ingestions(
            &format!(
                "SELECT {INGESTION_COLUMNS} FROM ingestions WHERE experience_id = ? ORDER BY time, id"
            ),
            params![experience_id],
        )
    }

    /// Ingestions at or after `since`, across all experiences, oldest first.
    pub fn list_ingestions_since(&self, since: &DateTime<Utc>) -> DbResult<Vec<Ingestion>> {
        self.query_ingestions(
            &format!("SELECT {INGESTION_COLUMNS} FROM ingestions WHERE time >= ? ORDER BY time, id"),
            params![to_millis(since)],
        )
    }

    /// Every ingestion of a substance, newest first. Names match case-insensitively.
    pub fn list_ingestions_for_substance(&self, substance_name: &str) -> DbResult<Vec<Ingestion>> {
        self.query_ingestions(
            &format!(
                "SELECT {INGESTION_COLUMNS} FROM ingestions WHERE substance_name = ? COLLATE NOCASE ORDER BY time DESC, id"
            ),
            params![substance_name],
        )
    }

    /// Every ingestion, oldest first.
    pub fn list_all_ingestions(&self) -> DbResult<Vec<Ingestion>> {
        self.query_ingestions(
            &format!("SELECT {INGESTION_COLUMNS} FROM ingestions ORDER BY time, id"),
            params![],
        )
    }

    /// Delete an ingestion.
    pub fn delete_ingestion(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM ingestions WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    fn query_ingestions<P: rusqlite::Params>(&self, sql: &str, params: P) -> DbResult<Vec<Ingestion>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, IngestionRow::from_row)?;

        let mut ingestions = Vec::new();
        for row in rows {
            ingestions.push(row?.try_into()?);
        }
        Ok(ingestions)
    }
}

/// Intermediate row struct for database mapping.
struct IngestionRow {
    id: String,
    experience_id: String,
    substance_name: String,
    route: String,
    time: i64,
    dose: Option<f64>,
    units: Option<String>,
    is_dose_an_estimate: bool,
    note: String,
}

impl IngestionRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(IngestionRow {
            id: row.get(0)?,
            experience_id: row.get(1)?,
            substance_name: row.get(2)?,
            route: row.get(3)?,
            time: row.get(4)?,
            dose: row.get(5)?,
            units: row.get(6)?,
            is_dose_an_estimate: row.get(7)?,
            note: row.get(8)?,
        })
    }
}

impl TryFrom<IngestionRow> for Ingestion {
    type Error = DbError;

    fn try_from(row: IngestionRow) -> Result<Self, Self::Error> {
        let route = AdministrationRoute::from_name(&row.route)
            .ok_or_else(|| DbError::Constraint(format!("Unknown route: {}", row.route)))?;

        Ok(Ingestion {
            id: row.id,
            experience_id: row.experience_id,
            substance_name: row.substance_name,
            route,
            time: from_millis(row.time)?,
            dose: row.dose,
            units: row.units,
            is_dose_an_estimate: row.is_dose_an_estimate,
            note: row.note,
        })
    }
}
