//! External directory services queried when the local cache has no answer.
//!
//! This module provides:
//! - [`SystemDirectory`] - the sphere-query capability every backend offers
//! - [`EdsmDirectory`] and [`SpanshDirectory`] - bundled HTTP backends
//! - [`LookupMode`] - the ordered provider chains selectable from the CLI
//! - [`select_candidate`] - reconciliation of a candidate list against the
//!   hop's geometric windows
//!
//! Backends report failures as `None` rather than errors: an unreachable or
//! misbehaving provider must never abort a route.

mod edsm;
mod spansh;

pub use edsm::EdsmDirectory;
pub use spansh::SpanshDirectory;

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use thiserror::Error;

use crate::db::{System, SystemId};
use crate::error::{Error, Result};
use crate::geometry::Point3D;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A system reported by a directory, with the position it reported.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryCandidate {
    pub system: System,
    pub position: Point3D,
}

impl DirectoryCandidate {
    pub fn new(system: System, position: Point3D) -> Self {
        Self { system, position }
    }
}

/// An external catalog that can list the systems inside a sphere.
pub trait SystemDirectory: Send + Sync {
    /// Stable backend name, also used as the rate-limiter key.
    fn name(&self) -> &str;

    /// Minimum time between the starts of two consecutive calls.
    fn min_interval(&self) -> Duration;

    /// Systems within `radius` light-years of `centre`.
    ///
    /// `None` means the provider failed; `Some(vec![])` is a successful
    /// empty answer.
    fn sphere_query(&self, centre: Point3D, radius: f64) -> Option<Vec<DirectoryCandidate>>;
}

/// Failures inside a directory backend. Logged, never surfaced to the plotter.
#[derive(Debug, Error)]
pub(crate) enum DirectoryError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    Status(StatusCode),

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Connection settings shared by the HTTP backends.
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl DirectoryConfig {
    /// Settings for `base_url`, normalised without a trailing slash.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
            user_agent: user_agent(),
        }
    }

    /// Base URL from `env_var`, falling back to `default_url`.
    pub fn from_env(env_var: &str, default_url: &str) -> Self {
        match std::env::var(env_var) {
            Ok(url) if !url.trim().is_empty() => Self::new(url),
            _ => Self::new(default_url),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn build_client(&self) -> Result<Client> {
        Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.clone())
            .build()
            .map_err(Error::Http)
    }
}

fn user_agent() -> String {
    format!("starplot-lib/{version}", version = env!("CARGO_PKG_VERSION"))
}

/// Which directory services the plotter may consult, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LookupMode {
    /// Local cache only.
    #[default]
    None,
    Edsm,
    Spansh,
    /// EDSM first, Spansh when EDSM fails or has nothing in the window.
    EdsmThenSpansh,
}

impl LookupMode {
    /// Instantiate the backends for this mode using environment-derived
    /// endpoints.
    pub fn build_chain(self) -> Result<Vec<Arc<dyn SystemDirectory>>> {
        let mut chain: Vec<Arc<dyn SystemDirectory>> = Vec::new();
        if matches!(self, LookupMode::Edsm | LookupMode::EdsmThenSpansh) {
            chain.push(Arc::new(EdsmDirectory::from_env()?));
        }
        if matches!(self, LookupMode::Spansh | LookupMode::EdsmThenSpansh) {
            chain.push(Arc::new(SpanshDirectory::from_env()?));
        }
        Ok(chain)
    }
}

impl fmt::Display for LookupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            LookupMode::None => "none",
            LookupMode::Edsm => "edsm",
            LookupMode::Spansh => "spansh",
            LookupMode::EdsmThenSpansh => "edsm-spansh",
        };
        f.write_str(value)
    }
}

impl FromStr for LookupMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "off" => Ok(LookupMode::None),
            "edsm" => Ok(LookupMode::Edsm),
            "spansh" => Ok(LookupMode::Spansh),
            "edsm-spansh" | "both" => Ok(LookupMode::EdsmThenSpansh),
            _ => Err(Error::UnknownLookup {
                value: s.to_string(),
            }),
        }
    }
}

/// Centre of the directory sphere for a hop.
///
/// The sphere is pulled back from the ideal point by half the search radius
/// so that the region it covers lines up with the cache's "distance from
/// wanted" window on the near side of the ideal point.
pub fn query_centre(current: Point3D, ideal: Point3D, radius: f64) -> Point3D {
    match (ideal - current).unit() {
        Some(direction) => ideal - direction * (radius / 2.0),
        None => ideal,
    }
}

/// Pick the directory candidate closest to `ideal` that is reachable from
/// `current` and lies inside the search window.
///
/// Providers are not trusted to honour the sphere they were asked for, so
/// both windows are re-checked here. A non-positive radius or range is an
/// empty window.
pub fn select_candidate(
    candidates: Vec<DirectoryCandidate>,
    current: Point3D,
    ideal: Point3D,
    max_range: f64,
    radius: f64,
    discard: &HashSet<SystemId>,
) -> Option<System> {
    if radius <= 0.0 || max_range <= 0.0 {
        return None;
    }
    let max_range_sq = max_range * max_range;
    let radius_sq = radius * radius;

    let mut accepted: Vec<(f64, DirectoryCandidate)> = candidates
        .into_iter()
        .filter(|candidate| {
            candidate
                .system
                .id
                .map_or(true, |id| !discard.contains(&id))
        })
        .filter(|candidate| candidate.position.distance_squared_to(&current) <= max_range_sq)
        .filter_map(|candidate| {
            let from_ideal_sq = candidate.position.distance_squared_to(&ideal);
            (from_ideal_sq <= radius_sq).then_some((from_ideal_sq, candidate))
        })
        .collect();

    accepted.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    accepted.into_iter().next().map(|(_, candidate)| {
        let mut system = candidate.system;
        system.position = Some(candidate.position);
        system
    })
}
