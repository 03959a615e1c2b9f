use std::env;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use tracing::debug;

use crate::error::{Error, Result};

/// Default filename for the catalog database.
pub const CATALOG_FILENAME: &str = "systems.db";

/// Environment variable overriding the catalog location.
pub const CATALOG_ENV: &str = "STARPLOT_CATALOG";

/// Resolve the default catalog location using platform-specific project directories.
pub fn default_catalog_path() -> Result<PathBuf> {
    let dirs =
        ProjectDirs::from("com", "starplot", "starplot").ok_or(Error::ProjectDirsUnavailable)?;
    Ok(dirs.data_dir().join(CATALOG_FILENAME))
}

/// Resolve the catalog path from an explicit override, the `STARPLOT_CATALOG`
/// environment variable, or the platform default, in that order.
///
/// Directories resolve to the `systems.db` file inside them. The resolved
/// file must exist.
pub fn resolve_catalog_path(target: Option<&Path>) -> Result<PathBuf> {
    let candidate = match target {
        Some(path) => path.to_path_buf(),
        None => match env::var_os(CATALOG_ENV) {
            Some(value) => PathBuf::from(value),
            None => default_catalog_path()?,
        },
    };

    let resolved = if candidate.is_dir() {
        candidate.join(CATALOG_FILENAME)
    } else {
        candidate
    };

    debug!(path = %resolved.display(), "resolved catalog path");
    if !resolved.exists() {
        return Err(Error::CatalogNotFound { path: resolved });
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_override_resolves_to_catalog_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let file = dir.path().join(CATALOG_FILENAME);
        std::fs::write(&file, b"").expect("touch catalog");

        let resolved = resolve_catalog_path(Some(dir.path())).expect("resolves");
        assert_eq!(resolved, file);
    }

    #[test]
    fn missing_catalog_is_reported_with_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        let missing = dir.path().join("absent.db");
        let error = resolve_catalog_path(Some(&missing)).unwrap_err();
        assert!(matches!(error, Error::CatalogNotFound { path } if path == missing));
    }
}
