use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{DirectoryCandidate, DirectoryConfig, DirectoryError, SystemDirectory};
use crate::db::{System, SystemId};
use crate::error::Result;
use crate::geometry::Point3D;

const DEFAULT_BASE_URL: &str = "https://spansh.co.uk";
const BASE_URL_ENV: &str = "STARPLOT_SPANSH_URL";

/// Page size requested per sphere query.
const RESULT_LIMIT: usize = 200;

/// Sphere queries against the Spansh system search API.
#[derive(Debug)]
pub struct SpanshDirectory {
    client: Client,
    config: DirectoryConfig,
}

impl SpanshDirectory {
    pub const MIN_INTERVAL: Duration = Duration::from_millis(200);

    pub fn new(config: DirectoryConfig) -> Result<Self> {
        let client = config.build_client()?;
        Ok(Self { client, config })
    }

    /// Endpoint from `STARPLOT_SPANSH_URL`, defaulting to the public service.
    pub fn from_env() -> Result<Self> {
        Self::new(DirectoryConfig::from_env(BASE_URL_ENV, DEFAULT_BASE_URL))
    }

    fn fetch(
        &self,
        centre: Point3D,
        radius: f64,
    ) -> std::result::Result<Vec<DirectoryCandidate>, DirectoryError> {
        let url = format!("{}/api/systems/search", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .json(&SearchRequest::sphere(centre, radius))
            .send()?;

        if !response.status().is_success() {
            return Err(DirectoryError::Status(response.status()));
        }
        let body = response.text()?;
        parse_search_response(&body)
    }
}

impl SystemDirectory for SpanshDirectory {
    fn name(&self) -> &str {
        "spansh"
    }

    fn min_interval(&self) -> Duration {
        Self::MIN_INTERVAL
    }

    fn sphere_query(&self, centre: Point3D, radius: f64) -> Option<Vec<DirectoryCandidate>> {
        match self.fetch(centre, radius) {
            Ok(candidates) => {
                debug!(%centre, radius, count = candidates.len(), "Spansh sphere query");
                Some(candidates)
            }
            Err(error) => {
                warn!(%centre, radius, error = %error, "Spansh sphere query failed");
                None
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct SearchRequest {
    filters: SearchFilters,
    sort: Vec<SortField>,
    size: usize,
    page: usize,
    reference_coords: Point3D,
}

#[derive(Debug, Serialize)]
struct SearchFilters {
    distance: DistanceFilter,
}

#[derive(Debug, Serialize)]
struct DistanceFilter {
    min: String,
    max: String,
}

#[derive(Debug, Serialize)]
struct SortField {
    distance: SortDirection,
}

#[derive(Debug, Serialize)]
struct SortDirection {
    direction: &'static str,
}

impl SearchRequest {
    fn sphere(centre: Point3D, radius: f64) -> Self {
        Self {
            filters: SearchFilters {
                distance: DistanceFilter {
                    min: "0".to_string(),
                    max: format!("{radius:.3}"),
                },
            },
            sort: vec![SortField {
                distance: SortDirection { direction: "asc" },
            }],
            size: RESULT_LIMIT,
            page: 0,
            reference_coords: centre,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SpanshSystem>,
}

#[derive(Debug, Deserialize)]
struct SpanshSystem {
    name: String,
    #[serde(default)]
    id64: Option<u64>,
    x: Option<f64>,
    y: Option<f64>,
    z: Option<f64>,
}

pub(crate) fn parse_search_response(
    body: &str,
) -> std::result::Result<Vec<DirectoryCandidate>, DirectoryError> {
    let response: SearchResponse = serde_json::from_str(body)?;
    let candidates = response
        .results
        .into_iter()
        .filter_map(|entry| {
            let (Some(x), Some(y), Some(z)) = (entry.x, entry.y, entry.z) else {
                warn!(system = %entry.name, "Spansh system without coordinates");
                return None;
            };
            let position = Point3D::new(x, y, z);
            let system = System {
                id: entry.id64.and_then(|id64| SystemId::try_from(id64).ok()),
                name: entry.name,
                position: Some(position),
                tag: None,
            };
            Some(DirectoryCandidate::new(system, position))
        })
        .collect();
    Ok(candidates)
}
