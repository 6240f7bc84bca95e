mod versioned_schema;

pub use versioned_schema::*;

use anyhow::{bail, Context, Result};
use rusqlite::Connection;
use std::path::Path;
use tracing::info;

/// Opens a database and brings it to the latest of `schemas`.
///
/// A fresh database gets the latest schema created directly. An existing one
/// is validated against its recorded version, then migrated forward inside a
/// single transaction.
pub fn open_versioned<P: AsRef<Path>>(
    db_path: P,
    schemas: &'static [VersionedSchema],
    label: &str,
) -> Result<Connection> {
    let path = db_path.as_ref();
    let mut conn = Connection::open(path)
        .with_context(|| format!("Failed to open {} database at {:?}", label, path))?;
    conn.execute("PRAGMA foreign_keys = ON;", [])?;
    prepare_schema(&mut conn, schemas, label)?;
    Ok(conn)
}

pub fn prepare_schema(
    conn: &mut Connection,
    schemas: &'static [VersionedSchema],
    label: &str,
) -> Result<()> {
    let Some(latest) = schemas.last() else {
        bail!("No schema versions defined for {} database", label);
    };

    let Some(db_version) = read_schema_version(conn)? else {
        info!("Creating new {} database at version {}", label, latest.version);
        let tx = conn.transaction()?;
        latest.create(&tx)?;
        tx.commit()?;
        return Ok(());
    };

    let schema = schemas
        .iter()
        .find(|s| s.version == db_version)
        .with_context(|| format!("Unknown {} database version {}", label, db_version))?;
    schema.validate(conn).with_context(|| {
        format!(
            "{} database schema validation failed for version {}",
            label, db_version
        )
    })?;

    if db_version < latest.version {
        info!(
            "Migrating {} database from version {} to {}",
            label, db_version, latest.version
        );
        migrate(conn, schemas, db_version)?;
    }
    Ok(())
}

fn migrate(conn: &mut Connection, schemas: &[VersionedSchema], from_version: usize) -> Result<()> {
    let tx = conn.transaction()?;
    let mut current = from_version;
    for schema in schemas.iter().filter(|s| s.version > from_version) {
        if let Some(migration) = schema.migration {
            migration(&tx).with_context(|| {
                format!("Failed to run migration to version {}", schema.version)
            })?;
        }
        current = schema.version;
    }
    set_schema_version(&tx, current)?;
    tx.commit()?;
    Ok(())
}
