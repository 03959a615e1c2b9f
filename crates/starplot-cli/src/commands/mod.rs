//! Subcommand handlers. `main.rs` parses arguments and dispatches here.

pub mod nearest;
pub mod resolve;
pub mod route;

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use starplot_lib::{load_starmap, resolve_catalog_path, Error, Point3D, Starmap};
use tracing::warn;

/// A route endpoint: a display name and where it is.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub name: String,
    pub position: Point3D,
}

/// Whether `text` is a raw `x,y,z` position rather than a system name.
pub fn is_coordinate(text: &str) -> bool {
    text.parse::<Point3D>().is_ok()
}

/// Turn a `--from`/`--to` value into an endpoint. Raw coordinates are named
/// after the text given; names must be in the catalog with a position.
pub fn resolve_endpoint(text: &str, starmap: &Starmap) -> Result<Endpoint> {
    if let Ok(position) = text.parse::<Point3D>() {
        return Ok(Endpoint {
            name: text.trim().to_string(),
            position,
        });
    }

    let system = starmap.require_system(text.trim())?;
    let position = system
        .position
        .ok_or_else(|| anyhow!("system '{}' has no known coordinates", system.name))?;
    Ok(Endpoint {
        name: system.name.clone(),
        position,
    })
}

/// Load the catalog. When `optional` is set a missing catalog yields an
/// empty starmap instead of an error.
pub fn load_catalog(data_dir: Option<&Path>, optional: bool) -> Result<Starmap> {
    let path = match resolve_catalog_path(data_dir) {
        Ok(path) => path,
        Err(Error::CatalogNotFound { path }) if optional => {
            warn!(path = %path.display(), "no catalog found; relying on directory services");
            return Ok(Starmap::default());
        }
        Err(error) => return Err(error).context("failed to locate the star catalog"),
    };
    load_starmap(&path).with_context(|| format!("failed to load catalog from {}", path.display()))
}
