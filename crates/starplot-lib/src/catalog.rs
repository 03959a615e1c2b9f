//! Writing catalog databases.
//!
//! The loader in [`crate::db`] only reads; this module creates the `systems`
//! table and populates it, which is how local catalogs and test fixtures are
//! produced.

use std::path::Path;

use rusqlite::{params, Connection};
use tracing::info;

use crate::db::System;
use crate::error::Result;

const CREATE_SYSTEMS_SQL: &str = "CREATE TABLE IF NOT EXISTS systems (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    x REAL,
    y REAL,
    z REAL
)";

/// Create (or extend) a catalog at `path` holding `systems`.
///
/// Systems without an identifier are skipped. Existing rows with the same
/// identifier are replaced.
pub fn create_catalog(path: &Path, systems: &[System]) -> Result<usize> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut connection = Connection::open(path)?;
    connection.execute(CREATE_SYSTEMS_SQL, [])?;

    let tx = connection.transaction()?;
    let mut written = 0usize;
    for system in systems {
        if insert_system(&tx, system)? {
            written += 1;
        }
    }
    tx.commit()?;

    info!(path = %path.display(), written, "wrote catalog");
    Ok(written)
}

/// Insert a single system, returning `false` when it has no identifier.
pub fn insert_system(connection: &Connection, system: &System) -> Result<bool> {
    let Some(id) = system.id else {
        return Ok(false);
    };
    let (x, y, z) = match system.position {
        Some(p) => (Some(p.x), Some(p.y), Some(p.z)),
        None => (None, None, None),
    };
    connection.execute(
        "INSERT OR REPLACE INTO systems (id, name, x, y, z) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![id, system.name, x, y, z],
    )?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::load_starmap;
    use crate::geometry::Point3D;

    #[test]
    fn written_catalog_loads_back() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("systems.db");
        let systems = vec![
            System::synthetic("Sol", Point3D::ORIGIN).with_id(1),
            System::synthetic("Sirius", Point3D::new(6.25, -1.28, -5.75)).with_id(2),
            System::synthetic("Drifter", Point3D::ORIGIN),
        ];

        let written = create_catalog(&path, &systems).expect("catalog written");
        assert_eq!(written, 2);

        let starmap = load_starmap(&path).expect("catalog loads");
        assert_eq!(starmap.systems.len(), 2);
        assert_eq!(
            starmap.system_by_name("sirius").and_then(|s| s.position),
            Some(Point3D::new(6.25, -1.28, -5.75))
        );
    }
}
