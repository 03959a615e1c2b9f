use std::collections::HashMap;
use std::path::Path;

use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags, Row};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::geometry::Point3D;

/// Numeric identifier for a star system.
pub type SystemId = i64;

const SYSTEMS_TABLE: &str = "systems";
const REQUIRED_COLUMNS: &[&str] = &["id", "name", "x", "y", "z"];

/// A named star system, as found in the catalog, a directory service, or
/// synthesised from raw coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct System {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<SystemId>,
    pub name: String,
    pub position: Option<Point3D>,
    /// Diagnostic annotation written by the plotter once per hop.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl System {
    /// A system known only by name and coordinates.
    pub fn synthetic(name: impl Into<String>, position: Point3D) -> Self {
        Self {
            id: None,
            name: name.into(),
            position: Some(position),
            tag: None,
        }
    }

    pub fn with_id(mut self, id: SystemId) -> Self {
        self.id = Some(id);
        self
    }
}

/// In-memory representation of the star catalog.
#[derive(Debug, Clone, Default)]
pub struct Starmap {
    pub systems: HashMap<SystemId, System>,
    /// Lower-cased system name to identifier.
    pub name_to_id: HashMap<String, SystemId>,
}

impl Starmap {
    /// Build a starmap from already-constructed systems. Systems without an
    /// identifier are skipped.
    pub fn from_systems(systems: impl IntoIterator<Item = System>) -> Self {
        let mut starmap = Starmap::default();
        for system in systems {
            starmap.insert(system);
        }
        starmap
    }

    pub fn insert(&mut self, system: System) {
        let Some(id) = system.id else {
            return;
        };
        self.name_to_id.insert(system.name.to_lowercase(), id);
        self.systems.insert(id, system);
    }

    /// Lookup a system identifier by its case-insensitive name.
    pub fn system_id_by_name(&self, name: &str) -> Option<SystemId> {
        self.name_to_id.get(&name.to_lowercase()).copied()
    }

    /// Lookup a system by its case-insensitive name.
    pub fn system_by_name(&self, name: &str) -> Option<&System> {
        self.system_id_by_name(name)
            .and_then(|id| self.systems.get(&id))
    }

    /// Lookup a system name by identifier.
    pub fn system_name(&self, id: SystemId) -> Option<&str> {
        self.systems.get(&id).map(|sys| sys.name.as_str())
    }

    /// Resolve a name to a system, suggesting close matches when unknown.
    pub fn require_system(&self, name: &str) -> Result<&System> {
        self.system_by_name(name)
            .ok_or_else(|| Error::UnknownSystem {
                name: name.to_string(),
                suggestions: self.fuzzy_system_matches(name, 3),
            })
    }

    /// Closest catalog names to `name` by Jaro-Winkler similarity.
    pub fn fuzzy_system_matches(&self, name: &str, limit: usize) -> Vec<String> {
        const MIN_SIMILARITY: f64 = 0.75;

        let needle = name.to_lowercase();
        let mut scored: Vec<(f64, &str)> = self
            .systems
            .values()
            .map(|system| {
                let score = strsim::jaro_winkler(&needle, &system.name.to_lowercase());
                (score, system.name.as_str())
            })
            .filter(|(score, _)| *score >= MIN_SIMILARITY)
            .collect();

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.cmp(b.1))
        });
        scored
            .into_iter()
            .take(limit)
            .map(|(_, name)| name.to_string())
            .collect()
    }
}

/// Load the star catalog from a SQLite database into memory.
///
/// The database must expose a `systems` table with `id`, `name`, `x`, `y`
/// and `z` columns. Coordinates may be stored as numbers or text; rows whose
/// coordinates cannot be reconstructed are kept without a position so they
/// can still be resolved by name.
pub fn load_starmap(db_path: &Path) -> Result<Starmap> {
    if !db_path.exists() {
        return Err(Error::CatalogNotFound {
            path: db_path.to_path_buf(),
        });
    }

    let connection = Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    if !table_exists(&connection, SYSTEMS_TABLE)?
        || !table_has_columns(&connection, SYSTEMS_TABLE, REQUIRED_COLUMNS)?
    {
        return Err(Error::UnsupportedSchema);
    }
    debug!(path = %db_path.display(), "loading starmap");

    let sql = format!("SELECT id, name, x, y, z FROM {SYSTEMS_TABLE}");
    let mut stmt = connection.prepare(&sql)?;
    let rows = stmt.query_map([], row_to_system)?;

    let mut starmap = Starmap::default();
    let mut unpositioned = 0usize;
    for entry in rows {
        let system = entry?;
        if system.position.is_none() {
            unpositioned += 1;
        }
        starmap.insert(system);
    }

    if unpositioned > 0 {
        warn!(unpositioned, "catalog systems without usable coordinates");
    }
    info!(systems = starmap.systems.len(), "loaded starmap");

    Ok(starmap)
}

fn row_to_system(row: &Row<'_>) -> rusqlite::Result<System> {
    let id: SystemId = row.get(0)?;
    let name: String = row.get(1)?;
    let coords = [row.get::<_, Value>(2)?, row.get::<_, Value>(3)?, row.get::<_, Value>(4)?];

    let position = match parse_coordinates(&coords) {
        Ok(position) => position,
        Err(raw) => {
            warn!(system = %name, id, coordinate = %raw, "could not parse system coordinates");
            None
        }
    };

    Ok(System {
        id: Some(id),
        name,
        position,
        tag: None,
    })
}

/// Reconstruct a position from raw column values.
///
/// Returns `Ok(None)` when any coordinate is missing and `Err` carrying the
/// offending text when a coordinate is present but unusable.
pub(crate) fn parse_coordinates(
    values: &[Value; 3],
) -> std::result::Result<Option<Point3D>, String> {
    let mut coords = [0.0f64; 3];
    for (slot, value) in coords.iter_mut().zip(values) {
        *slot = match value {
            Value::Null => return Ok(None),
            Value::Integer(v) => *v as f64,
            Value::Real(v) => *v,
            Value::Text(text) => text.trim().parse::<f64>().map_err(|_| text.clone())?,
            Value::Blob(_) => return Err("<blob>".to_string()),
        };
        if !slot.is_finite() {
            return Err(slot.to_string());
        }
    }
    Ok(Some(Point3D::from(coords)))
}

fn table_exists(connection: &Connection, table: &str) -> Result<bool> {
    let mut stmt = connection
        .prepare("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1 LIMIT 1")?;
    let mut rows = stmt.query([table])?;
    Ok(rows.next()?.is_some())
}

fn table_has_columns(connection: &Connection, table: &str, required: &[&str]) -> Result<bool> {
    let pragma = format!("PRAGMA table_info('{table}')");
    let mut stmt = connection.prepare(&pragma)?;
    let mut rows = stmt.query([])?;

    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        columns.push(name.to_lowercase());
    }

    Ok(required
        .iter()
        .all(|column| columns.iter().any(|c| c == column)))
}
