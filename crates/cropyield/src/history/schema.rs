//! `SQLite` schema definitions for the prediction history.

/// SQL statement to create the predictions table.
///
/// Numeric inputs are nullable: `SQLite` stores NaN as NULL. Later columns
/// are added by migrations.
pub const CREATE_PREDICTIONS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS predictions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    predicted_at TEXT NOT NULL,
    region TEXT NOT NULL,
    soil_type TEXT NOT NULL,
    crop TEXT NOT NULL,
    weather_condition TEXT NOT NULL,
    fertilizer_used INTEGER NOT NULL,
    irrigation_used INTEGER NOT NULL,
    rainfall_mm REAL,
    temperature_celsius REAL,
    days_to_harvest REAL,
    yield_tons_per_hectare REAL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

/// SQL statement to create an index on `predicted_at` for recency queries.
pub const CREATE_PREDICTED_AT_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_predictions_predicted_at ON predictions(predicted_at DESC)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_PREDICTIONS_TABLE,
    CREATE_PREDICTED_AT_INDEX,
    CREATE_METADATA_TABLE,
];
