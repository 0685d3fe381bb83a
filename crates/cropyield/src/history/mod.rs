//! Opt-in log of past predictions.
//!
//! Backs the "Recent Predictions" sidebar. Only successful predictions are
//! written; a failure to write is the caller's to log, never the user's to see.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::record::PredictionRecord;
use crate::tier::Tier;

/// A stored prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    /// Row id.
    pub id: i64,
    /// When the prediction was made.
    pub predicted_at: DateTime<Utc>,
    /// The scored record.
    pub record: PredictionRecord,
    /// The estimate, tons/hectare.
    pub yield_tons_per_hectare: f64,
    /// Name of the model that produced it.
    pub model_name: String,
}

impl HistoryEntry {
    /// Tier of the stored estimate.
    #[must_use]
    pub fn tier(&self) -> Tier {
        Tier::classify(self.yield_tons_per_hectare)
    }
}

/// `SQLite`-backed prediction history.
#[derive(Debug)]
pub struct History {
    path: PathBuf,
    conn: Connection,
}

const SELECT_COLUMNS: &str = r"
    SELECT id, predicted_at, region, soil_type, crop, weather_condition,
           fertilizer_used, irrigation_used, rainfall_mm, temperature_celsius,
           days_to_harvest, yield_tons_per_hectare, model_name
    FROM predictions
";

impl History {
    /// Open or create the history database at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created, the
    /// database cannot be opened, or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening history database at {}", path.display());
        let mut conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&mut conn)?;

        info!("History database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory history.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        migrations::initialize_schema(&mut conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a prediction, returning its row id.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn append(
        &self,
        record: &PredictionRecord,
        yield_tons_per_hectare: f64,
        predicted_at: DateTime<Utc>,
        model_name: &str,
    ) -> Result<i64> {
        self.conn.execute(
            r"
            INSERT INTO predictions (
                predicted_at, region, soil_type, crop, weather_condition,
                fertilizer_used, irrigation_used, rainfall_mm, temperature_celsius,
                days_to_harvest, yield_tons_per_hectare, model_name
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            ",
            params![
                predicted_at.to_rfc3339(),
                record.region.label(),
                record.soil_type.label(),
                record.crop.label(),
                record.weather_condition.label(),
                record.fertilizer_used,
                record.irrigation_used,
                finite_or_null(record.rainfall_mm),
                finite_or_null(record.temperature_celsius),
                finite_or_null(record.days_to_harvest),
                finite_or_null(yield_tons_per_hectare),
                model_name,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!("Recorded prediction {}", id);
        Ok(id)
    }

    /// The most recent predictions, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        let sql = format!("{SELECT_COLUMNS} ORDER BY predicted_at DESC, id DESC LIMIT ?1");
        let mut stmt = self.conn.prepare(&sql)?;

        let limit_i64 = i64::try_from(limit).unwrap_or(i64::MAX);
        let entries = stmt
            .query_map([limit_i64], Self::row_to_entry)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Number of stored predictions.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM predictions", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Keep only the newest `keep_count` predictions, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn prune_keep_recent(&self, keep_count: usize) -> Result<usize> {
        let keep_i64 = i64::try_from(keep_count).unwrap_or(i64::MAX);
        let affected = self.conn.execute(
            r"
            DELETE FROM predictions WHERE id NOT IN (
                SELECT id FROM predictions ORDER BY predicted_at DESC, id DESC LIMIT ?1
            )
            ",
            [keep_i64],
        )?;

        if affected > 0 {
            info!("Pruned {} predictions to keep {} recent", affected, keep_count);
        }
        Ok(affected)
    }

    fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<HistoryEntry> {
        let id: i64 = row.get(0)?;
        let predicted_at_str: String = row.get(1)?;
        let region: String = row.get(2)?;
        let soil_type: String = row.get(3)?;
        let crop: String = row.get(4)?;
        let weather_condition: String = row.get(5)?;

        let predicted_at = DateTime::parse_from_rfc3339(&predicted_at_str)
            .map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc));

        let record = PredictionRecord {
            region: parse_or_default(&region),
            soil_type: parse_or_default(&soil_type),
            crop: parse_or_default(&crop),
            rainfall_mm: null_to_nan(row.get(8)?),
            temperature_celsius: null_to_nan(row.get(9)?),
            fertilizer_used: row.get(6)?,
            irrigation_used: row.get(7)?,
            weather_condition: parse_or_default(&weather_condition),
            days_to_harvest: null_to_nan(row.get(10)?),
        };

        Ok(HistoryEntry {
            id,
            predicted_at,
            record,
            yield_tons_per_hectare: null_to_nan(row.get(11)?),
            model_name: row.get(12)?,
        })
    }
}

fn finite_or_null(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

fn null_to_nan(value: Option<f64>) -> f64 {
    value.unwrap_or(f64::NAN)
}

fn parse_or_default<T>(label: &str) -> T
where
    T: std::str::FromStr + Default,
{
    label.parse().unwrap_or_else(|_| {
        warn!("Unknown stored label: {}, using default", label);
        T::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Crop, Region, SoilType, WeatherCondition};
    use chrono::TimeZone;

    fn create_test_history() -> History {
        History::open_in_memory().expect("failed to create test history")
    }

    fn record(crop: Crop, region: Region) -> PredictionRecord {
        PredictionRecord {
            region,
            soil_type: SoilType::Loam,
            crop,
            rainfall_mm: 500.0,
            temperature_celsius: 25.0,
            fertilizer_used: true,
            irrigation_used: false,
            weather_condition: WeatherCondition::Cloudy,
            days_to_harvest: 120.0,
        }
    }

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 8, minute, 0).unwrap()
    }

    #[test]
    fn test_append_and_recent() {
        let history = create_test_history();
        let id = history
            .append(&record(Crop::Wheat, Region::North), 4.2, at(0), "linear")
            .unwrap();
        assert!(id > 0);

        let entries = history.recent(10).unwrap();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.id, id);
        assert_eq!(entry.predicted_at, at(0));
        assert_eq!(entry.record, record(Crop::Wheat, Region::North));
        assert!((entry.yield_tons_per_hectare - 4.2).abs() < f64::EPSILON);
        assert_eq!(entry.model_name, "linear");
        assert_eq!(entry.tier(), Tier::Moderate);
    }

    #[test]
    fn test_recent_is_newest_first_and_limited() {
        let history = create_test_history();
        history
            .append(&record(Crop::Wheat, Region::North), 4.2, at(0), "m")
            .unwrap();
        history
            .append(&record(Crop::Rice, Region::South), 5.7, at(1), "m")
            .unwrap();
        history
            .append(&record(Crop::Maize, Region::West), 6.3, at(2), "m")
            .unwrap();

        let crops: Vec<Crop> = history
            .recent(2)
            .unwrap()
            .iter()
            .map(|e| e.record.crop)
            .collect();
        assert_eq!(crops, vec![Crop::Maize, Crop::Rice]);
    }

    #[test]
    fn test_nan_inputs_round_trip_as_nan() {
        let history = create_test_history();
        let mut with_nan = record(Crop::Potato, Region::East);
        with_nan.rainfall_mm = f64::NAN;
        history.append(&with_nan, 3.1, at(5), "m").unwrap();

        let entry = history.recent(1).unwrap().remove(0);
        assert!(entry.record.rainfall_mm.is_nan());
        assert!((entry.record.temperature_celsius - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_count_and_prune() {
        let history = create_test_history();
        for minute in 0..5 {
            history
                .append(&record(Crop::Cotton, Region::West), 2.0, at(minute), "m")
                .unwrap();
        }
        assert_eq!(history.count().unwrap(), 5);

        let removed = history.prune_keep_recent(2).unwrap();
        assert_eq!(removed, 3);
        assert_eq!(history.count().unwrap(), 2);

        let newest = history.recent(1).unwrap().remove(0);
        assert_eq!(newest.predicted_at, at(4));
    }

    #[test]
    fn test_open_file_creates_parent_dirs() {
        let dir = std::env::temp_dir().join(format!("cropyield-history-{}", std::process::id()));
        let path = dir.join("nested").join("history.db");

        {
            let history = History::open(&path).unwrap();
            assert_eq!(history.path(), path.as_path());
            history
                .append(&record(Crop::Soybean, Region::South), 5.5, at(0), "m")
                .unwrap();
        }

        let reopened = History::open(&path).unwrap();
        assert_eq!(reopened.count().unwrap(), 1);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_parse_or_default_falls_back() {
        let region: Region = parse_or_default("Atlantis");
        assert_eq!(region, Region::West);
    }
}
