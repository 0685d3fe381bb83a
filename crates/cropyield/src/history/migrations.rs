//! Schema versioning for the prediction history database.
//!
//! The base tables come from [`SCHEMA_STATEMENTS`]; each later version is an
//! entry in [`MIGRATIONS`], applied in order inside one transaction.

use rusqlite::{Connection, OptionalExtension};
use tracing::info;

use crate::error::{Error, Result};

use super::schema::SCHEMA_STATEMENTS;

/// Key used to store the schema version in the metadata table.
const VERSION_KEY: &str = "schema_version";

/// Ordered `(version, sql)` steps on top of the base schema.
///
/// Version 1 is the base schema itself.
pub const MIGRATIONS: &[(i32, &str)] = &[(
    2,
    "ALTER TABLE predictions ADD COLUMN model_name TEXT NOT NULL DEFAULT ''",
)];

/// The schema version a fully migrated database reports.
#[must_use]
pub fn current_version() -> i32 {
    MIGRATIONS.last().map_or(1, |(version, _)| *version)
}

/// Create the base schema if needed and apply pending migrations.
///
/// # Errors
///
/// Returns an error if schema creation or a migration step fails, or if the
/// database reports a version newer than this build knows.
pub fn initialize_schema(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;

    for statement in SCHEMA_STATEMENTS {
        tx.execute(statement, [])?;
    }

    let mut version = schema_version(&tx)?.unwrap_or(1);
    let target = current_version();
    if version > target {
        return Err(Error::DatabaseMigration {
            message: format!("database schema version {version} is newer than supported {target}"),
        });
    }

    let start = version;
    for (step, sql) in MIGRATIONS.iter().filter(|(step, _)| *step > start) {
        tx.execute_batch(sql).map_err(|e| Error::DatabaseMigration {
            message: format!("step {step} failed: {e}"),
        })?;
        info!(version = step, "applied history migration");
        version = *step;
    }

    set_schema_version(&tx, version)?;
    tx.commit()?;
    Ok(())
}

/// Read the stored schema version, `None` on a fresh database.
fn schema_version(conn: &Connection) -> Result<Option<i32>> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM metadata WHERE key = ?1",
            [VERSION_KEY],
            |row| row.get(0),
        )
        .optional()?;

    value
        .map(|v| {
            v.parse().map_err(|_| Error::DatabaseMigration {
                message: format!("invalid schema version: {v}"),
            })
        })
        .transpose()
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
        (VERSION_KEY, version.to_string()),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_db() -> Connection {
        Connection::open_in_memory().expect("failed to create in-memory database")
    }

    fn column_names(conn: &Connection) -> Vec<String> {
        conn.prepare("SELECT name FROM pragma_table_info('predictions')")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(std::result::Result::ok)
            .collect()
    }

    #[test]
    fn test_fresh_database_reaches_current_version() {
        let mut conn = create_test_db();
        initialize_schema(&mut conn).expect("failed to initialize schema");

        assert_eq!(schema_version(&conn).unwrap(), Some(current_version()));
        assert!(column_names(&conn).contains(&"model_name".to_string()));
    }

    #[test]
    fn test_initialize_schema_idempotent() {
        let mut conn = create_test_db();
        initialize_schema(&mut conn).expect("first init failed");
        initialize_schema(&mut conn).expect("second init failed");

        assert_eq!(schema_version(&conn).unwrap(), Some(current_version()));
    }

    #[test]
    fn test_version_one_database_is_upgraded() {
        let mut conn = create_test_db();
        for statement in SCHEMA_STATEMENTS {
            conn.execute(statement, []).unwrap();
        }
        set_schema_version(&conn, 1).unwrap();
        assert!(!column_names(&conn).contains(&"model_name".to_string()));

        initialize_schema(&mut conn).unwrap();
        assert!(column_names(&conn).contains(&"model_name".to_string()));
    }

    #[test]
    fn test_newer_database_is_rejected() {
        let mut conn = create_test_db();
        initialize_schema(&mut conn).unwrap();
        set_schema_version(&conn, 99).unwrap();

        let err = initialize_schema(&mut conn).unwrap_err();
        assert!(err.to_string().contains("newer than supported"));
    }

    #[test]
    fn test_invalid_version_value() {
        let mut conn = create_test_db();
        initialize_schema(&mut conn).unwrap();
        conn.execute(
            "UPDATE metadata SET value = 'abc' WHERE key = ?1",
            [VERSION_KEY],
        )
        .unwrap();

        let err = initialize_schema(&mut conn).unwrap_err();
        assert!(err.to_string().contains("invalid schema version"));
    }

    #[test]
    fn test_migrations_are_ordered() {
        let versions: Vec<i32> = MIGRATIONS.iter().map(|(v, _)| *v).collect();
        let mut sorted = versions.clone();
        sorted.sort_unstable();
        assert_eq!(versions, sorted);
        assert!(versions.iter().all(|v| *v > 1));
    }
}
