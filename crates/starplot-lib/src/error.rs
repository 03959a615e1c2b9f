use std::path::PathBuf;

use thiserror::Error;

/// Convenient result alias for the starplot library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Catalog could not be located at the resolved path.
    #[error("catalog not found at {path}")]
    CatalogNotFound { path: PathBuf },

    /// No suitable project directories could be resolved for this platform.
    #[error("failed to resolve project directories for the catalog")]
    ProjectDirsUnavailable,

    /// Raised when attempting to load a schema that is not supported.
    #[error("unsupported catalog schema; expected a systems table with id, name, x, y, z columns")]
    UnsupportedSchema,

    /// Raised when a system name could not be found in the catalog.
    #[error("unknown system name: {name}{}", format_suggestions(.suggestions))]
    UnknownSystem {
        name: String,
        suggestions: Vec<String>,
    },

    /// Raised when the per-hop range is zero, negative or not a number.
    #[error("maximum hop range must be a positive number of light-years, got {range}")]
    InvalidRange { range: f64 },

    /// Raised when an endpoint carries non-finite coordinates.
    #[error("{which} position has non-finite coordinates")]
    InvalidCoordinates { which: &'static str },

    /// Raised when an endpoint name is blank.
    #[error("{which} name must not be empty")]
    EmptyName { which: &'static str },

    /// Raised when a lookup mode string is not recognised.
    #[error("unknown lookup mode {value}; expected none, edsm, spansh or edsm-spansh")]
    UnknownLookup { value: String },

    /// Raised when a route metric string is not recognised.
    #[error("unknown route metric {value}")]
    UnknownMetric { value: String },

    /// Wrapper for SQLite errors.
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapper for HTTP client errors.
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else if suggestions.len() == 1 {
        format!(". Did you mean '{}'?", suggestions[0])
    } else {
        format!(
            ". Did you mean one of: {}?",
            suggestions
                .iter()
                .map(|s| format!("'{}'", s))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}
