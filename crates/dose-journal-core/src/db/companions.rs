//! Substance companion database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::{SubstanceColor, SubstanceCompanion};

impl Database {
    /// Insert or replace the settings of a substance.
    pub fn upsert_companion(&self, companion: &SubstanceCompanion) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO substance_companions (substance_name, color)
            VALUES (?1, ?2)
            ON CONFLICT(substance_name) DO UPDATE SET
                color = excluded.color
            "#,
            params![companion.substance_name, companion.color.as_str()],
        )?;
        Ok(())
    }

    /// Get the settings of a substance.
    pub fn get_companion(&self, substance_name: &str) -> DbResult<Option<SubstanceCompanion>> {
        let result = self
            .conn
            .query_row(
                "SELECT substance_name, color FROM substance_companions WHERE substance_name = ?",
                [substance_name],
                |row| {
                    Ok(CompanionRow {
                        substance_name: row.get(0)?,
                        color: row.get(1)?,
                    })
                },
            )
            .optional()?;

        result.map(|row| row.try_into()).transpose()
    }

    /// List all companions by substance name.
    pub fn list_companions(&self) -> DbResult<Vec<SubstanceCompanion>> {
        let mut stmt = self.conn.prepare(
            "SELECT substance_name, color FROM substance_companions ORDER BY substance_name",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(CompanionRow {
                substance_name: row.get(0)?,
                color: row.get(1)?,
            })
        })?;

        let mut companions = Vec::new();
        for row in rows {
            companions.push(row?.try_into()?);
        }
        Ok(companions)
    }

    /// Companion of a substance, creating one with the first unused color if missing.
    pub fn companion_or_default(&self, substance_name: &str) -> DbResult<SubstanceCompanion> {
        if let Some(existing) = self.get_companion(substance_name)? {
            return Ok(existing);
        }

        let taken: Vec<SubstanceColor> = self
            .list_companions()?
            .into_iter()
            .map(|c| c.color)
            .collect();
        let companion = SubstanceCompanion::new(
            substance_name.to_string(),
            SubstanceColor::first_unused(&taken),
        );
        self.upsert_companion(&companion)?;
        Ok(companion)
    }
}

/// Intermediate row struct for database mapping.
struct CompanionRow {
    substance_name: String,
    color: String,
}

impl TryFrom<CompanionRow> for SubstanceCompanion {
    type Error = DbError;

    fn try_from(row: CompanionRow) -> Result<Self, Self::Error> {
        let color = SubstanceColor::from_name(&row.color)
            .ok_or_else(|| DbError::Constraint(format!("Unknown color: {}", row.color)))?;
        Ok(SubstanceCompanion::new(row.substance_name, color))
    }
}
