//! Experience database operations.

use rusqlite::{params, OptionalExtension};
use tracing::debug;

use super::{from_millis, to_millis, Database, DbError, DbResult};
use crate::models::Experience;

impl Database {
    /// Insert a new experience.
    pub fn insert_experience(&self, experience: &Experience) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO experiences (id, title, text, created_at, sort_date)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                experience.id,
                experience.title,
                experience.text,
                to_millis(&experience.created_at),
                to_millis(&experience.sort_date),
            ],
        )?;
        Ok(())
    }

    /// Update title, text and sort date of an experience.
    pub fn update_experience(&self, experience: &Experience) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE experiences SET
                title = ?2,
                text = ?3,
                sort_date = ?4
            WHERE id = ?1
            "#,
            params![
                experience.id,
                experience.title,
                experience.text,
                to_millis(&experience.sort_date),
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get an experience by ID.
    pub fn get_experience(&self, id: &str) -> DbResult<Option<Experience>> {
        let result = self
            .conn
            .query_row(
                r#"
                SELECT id, title, text, created_at, sort_date
                FROM experiences
                WHERE id = ?
                "#,
                [id],
                |row| {
                    Ok(ExperienceRow {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        text: row.get(2)?,
                        created_at: row.get(3)?,
                        sort_date: row.get(4)?,
                    })
                },
            )
            .optional()?;

        result.map(|row| row.try_into()).transpose()
    }

    /// List experiences, most recent sort date first.
    pub fn list_experiences(&self) -> DbResult<Vec<Experience>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, title, text, created_at, sort_date
            FROM experiences
            ORDER BY sort_date DESC
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(ExperienceRow {
                id: row.get(0)?,
                title: row.get(1)?,
                text: row.get(2)?,
                created_at: row.get(3)?,
                sort_date: row.get(4)?,
            })
        })?;

        let mut experiences = Vec::new();
        for row in rows {
            experiences.push(row?.try_into()?);
        }
        Ok(experiences)
    }

    /// Delete an experience and, through the foreign key, its ingestions.
    pub fn delete_experience(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM experiences WHERE id = ?", [id])?;
        debug!(id, deleted = rows_affected > 0, "deleted experience");
        Ok(rows_affected > 0)
    }
}

/// Intermediate row struct for database mapping.
struct ExperienceRow {
    id: String,
    title: String,
    text: String,
    created_at: i64,
    sort_date: i64,
}

impl TryFrom<ExperienceRow> for Experience {
    type Error = DbError;

    fn try_from(row: ExperienceRow) -> Result<Self, Self::Error> {
        Ok(Experience {
            id: row.id,
            title: row.title,
            text: row.text,
            created_at: from_millis(row.created_at)?,
            sort_date: from_millis(row.sort_date)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn at(hour: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_insert_and_get() {
        let db = setup_db();

        let mut experience = Experience::new("Festival".into(), at(20));
        experience.text = "Saturday night".into();
        db.insert_experience(&experience).unwrap();

        let retrieved = db.get_experience(&experience.id).unwrap().unwrap();
        assert_eq!(retrieved.title, "Festival");
        assert_eq!(retrieved.text, "Saturday night");
        assert_eq!(retrieved.sort_date, at(20));
    }

    #[test]
    fn test_get_missing() {
        let db = setup_db();
        assert!(db.get_experience("nope").unwrap().is_none());
    }

    #[test]
    fn test_update() {
        let db = setup_db();

        let mut experience = Experience::new("Draft".into(), at(10));
        db.insert_experience(&experience).unwrap();

        experience.title = "Morning coffee".into();
        experience.sort_date = at(11);
        assert!(db.update_experience(&experience).unwrap());

        let retrieved = db.get_experience(&experience.id).unwrap().unwrap();
        assert_eq!(retrieved.title, "Morning coffee");
        assert_eq!(retrieved.sort_date, at(11));

        let unsaved = Experience::new("Other".into(), at(12));
        assert!(!db.update_experience(&unsaved).unwrap());
    }

    #[test]
    fn test_list_most_recent_first() {
        let db = setup_db();

        let older = Experience::new("Older".into(), at(8));
        let newer = Experience::new("Newer".into(), at(8) + Duration::days(2));
        db.insert_experience(&older).unwrap();
        db.insert_experience(&newer).unwrap();

        let titles: Vec<String> = db
            .list_experiences()
            .unwrap()
            .into_iter()
            .map(|e| e.title)
            .collect();
        assert_eq!(titles, vec!["Newer", "Older"]);
    }

    #[test]
    fn test_delete() {
        let db = setup_db();

        let experience = Experience::new("Gone".into(), at(9));
        db.insert_experience(&experience).unwrap();

        assert!(db.delete_experience(&experience.id).unwrap());
        assert!(!db.delete_experience(&experience.id).unwrap());
        assert!(db.get_experience(&experience.id).unwrap().is_none());
    }
}
