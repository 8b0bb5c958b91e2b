//! SQLite schema definition.

/// Complete database schema for the dose journal.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Experiences
-- ============================================================================

CREATE TABLE IF NOT EXISTS experiences (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    text TEXT NOT NULL DEFAULT '',
    created_at INTEGER NOT NULL,                 -- Unix milliseconds
    sort_date INTEGER NOT NULL                   -- Unix milliseconds
);

CREATE INDEX IF NOT EXISTS idx_experiences_sort_date ON experiences(sort_date);

-- ============================================================================
-- Ingestions
-- ============================================================================

CREATE TABLE IF NOT EXISTS ingestions (
    id TEXT PRIMARY KEY,
    experience_id TEXT NOT NULL REFERENCES experiences(id) ON DELETE CASCADE,
    substance_name TEXT NOT NULL,
    route TEXT NOT NULL,                         -- oral, insufflated, ...
    time INTEGER NOT NULL,                       -- Unix milliseconds
    dose REAL,                                   -- NULL when unknown
    units TEXT,
    is_dose_an_estimate INTEGER NOT NULL DEFAULT 0,
    note TEXT NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS idx_ingestions_experience ON ingestions(experience_id);
CREATE INDEX IF NOT EXISTS idx_ingestions_time ON ingestions(time);
CREATE INDEX IF NOT EXISTS idx_ingestions_substance ON ingestions(substance_name);

-- ============================================================================
-- Substance Companions (per-substance settings)
-- ============================================================================

CREATE TABLE IF NOT EXISTS substance_companions (
    substance_name TEXT PRIMARY KEY,
    color TEXT NOT NULL
);
"#;
