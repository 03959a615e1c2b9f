use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{DirectoryCandidate, DirectoryConfig, DirectoryError, SystemDirectory};
use crate::db::{System, SystemId};
use crate::error::Result;
use crate::geometry::Point3D;

const DEFAULT_BASE_URL: &str = "https://www.edsm.net";
const BASE_URL_ENV: &str = "STARPLOT_EDSM_URL";

/// EDSM refuses sphere queries wider than this.
const MAX_SPHERE_RADIUS: f64 = 100.0;

/// Sphere queries against the EDSM `sphere-systems` endpoint.
#[derive(Debug)]
pub struct EdsmDirectory {
    client: Client,
    config: DirectoryConfig,
}

impl EdsmDirectory {
    /// EDSM throttles aggressively; one request every five seconds.
    pub const MIN_INTERVAL: Duration = Duration::from_millis(5000);

    pub fn new(config: DirectoryConfig) -> Result<Self> {
        let client = config.build_client()?;
        Ok(Self { client, config })
    }

    /// Endpoint from `STARPLOT_EDSM_URL`, defaulting to the public service.
    pub fn from_env() -> Result<Self> {
        Self::new(DirectoryConfig::from_env(BASE_URL_ENV, DEFAULT_BASE_URL))
    }

    fn fetch(
        &self,
        centre: Point3D,
        radius: f64,
    ) -> std::result::Result<Vec<DirectoryCandidate>, DirectoryError> {
        let url = format!("{}/api-v1/sphere-systems", self.config.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("x", format!("{:.3}", centre.x)),
                ("y", format!("{:.3}", centre.y)),
                ("z", format!("{:.3}", centre.z)),
                ("radius", format!("{:.3}", radius.min(MAX_SPHERE_RADIUS))),
                ("showCoordinates", "1".to_string()),
                ("showId", "1".to_string()),
            ])
            .send()?;

        if !response.status().is_success() {
            return Err(DirectoryError::Status(response.status()));
        }
        let body = response.text()?;
        parse_sphere_response(&body)
    }
}

impl SystemDirectory for EdsmDirectory {
    fn name(&self) -> &str {
        "edsm"
    }

    fn min_interval(&self) -> Duration {
        Self::MIN_INTERVAL
    }

    fn sphere_query(&self, centre: Point3D, radius: f64) -> Option<Vec<DirectoryCandidate>> {
        if radius > MAX_SPHERE_RADIUS {
            debug!(radius, max = MAX_SPHERE_RADIUS, "clamping EDSM sphere radius");
        }
        match self.fetch(centre, radius) {
            Ok(candidates) => {
                debug!(%centre, radius, count = candidates.len(), "EDSM sphere query");
                Some(candidates)
            }
            Err(error) => {
                warn!(%centre, radius, error = %error, "EDSM sphere query failed");
                None
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct EdsmSystem {
    name: String,
    #[serde(default)]
    id: Option<SystemId>,
    #[serde(default)]
    id64: Option<u64>,
    #[serde(default)]
    coords: Option<EdsmCoords>,
}

#[derive(Debug, Deserialize)]
struct EdsmCoords {
    x: f64,
    y: f64,
    z: f64,
}

/// Decode a `sphere-systems` body. EDSM answers `{}` instead of `[]` when
/// nothing matches.
pub(crate) fn parse_sphere_response(
    body: &str,
) -> std::result::Result<Vec<DirectoryCandidate>, DirectoryError> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    let entries: Vec<EdsmSystem> = match value {
        serde_json::Value::Object(map) if map.is_empty() => return Ok(Vec::new()),
        other => serde_json::from_value(other)?,
    };

    let candidates = entries
        .into_iter()
        .filter_map(|entry| {
            let Some(coords) = entry.coords else {
                warn!(system = %entry.name, "EDSM system without coordinates");
                return None;
            };
            let position = Point3D::new(coords.x, coords.y, coords.z);
            let id = entry
                .id64
                .and_then(|id64| SystemId::try_from(id64).ok())
                .or(entry.id);
            let system = System {
                id,
                name: entry.name,
                position: Some(position),
                tag: None,
            };
            Some(DirectoryCandidate::new(system, position))
        })
        .collect();
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sphere_systems_payload() {
        let body = r#"[
            {"distance": 0, "name": "Sol", "id": 27, "id64": 10477373803,
             "coords": {"x": 0, "y": 0, "z": 0}},
            {"distance": 4.38, "name": "Alpha Centauri", "id": 28,
             "coords": {"x": 3.03125, "y": -0.09375, "z": 3.15625}},
            {"distance": 9.0, "name": "Unmapped", "id": 29}
        ]"#;

        let candidates = parse_sphere_response(body).expect("parses");
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].system.id, Some(10477373803));
        assert_eq!(candidates[1].system.id, Some(28));
        assert_eq!(
            candidates[1].position,
            Point3D::new(3.03125, -0.09375, 3.15625)
        );
    }

    #[test]
    fn empty_object_means_no_systems() {
        assert!(parse_sphere_response("{}").expect("parses").is_empty());
        assert!(parse_sphere_response("[]").expect("parses").is_empty());
    }

    #[test]
    fn malformed_payload_is_an_error() {
        assert!(parse_sphere_response("<html>busy</html>").is_err());
        assert!(parse_sphere_response(r#"{"error": "rate"}"#).is_err());
    }

    #[test]
    fn unreachable_service_yields_none() {
        let config = DirectoryConfig::new("http://127.0.0.1:1").with_timeout(Duration::from_secs(2));
        let directory = EdsmDirectory::new(config).expect("client builds");
        assert!(directory.sphere_query(Point3D::ORIGIN, 20.0).is_none());
    }
}
