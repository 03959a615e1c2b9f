//! Greedy point-to-point route plotting.
//!
//! This module provides:
//! - [`RouteMetric`] - tie-break policy handed to the spatial cache
//! - [`PlotRequest`] - endpoints, hop range and options for one plot
//! - [`RouteStep`] - the progress record streamed once per hop
//! - [`RoutePlotter`] - the hop-selection loop itself
//!
//! # Algorithm
//!
//! Each hop aims for the *ideal position*, exactly `max_range` along the
//! straight line towards the destination, and accepts the best real system
//! within the [`search_radius`] of that point. The local cache is asked
//! first, then each configured directory service in order. When nothing is
//! found and boosting is enabled, the range and radius are widened along
//! [`BOOST_LADDER`]. If every lookup misses, the ideal position itself
//! becomes a synthetic [`WAYPOINT_LABEL`] hop. The plotter never
//! backtracks.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use starplot_lib::{load_starmap, PlotRequest, Point3D, RoutePlotter, StarmapCache, StopToken};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let starmap = load_starmap(std::path::Path::new("systems.db"))?;
//! let plotter = RoutePlotter::new(Arc::new(StarmapCache::new(starmap)));
//! let request = PlotRequest::new(
//!     "Sol",
//!     Point3D::ORIGIN,
//!     "Colonia",
//!     Point3D::new(-9530.5, -910.28, 19808.125),
//!     500.0,
//! );
//! let route = plotter.plot(&request, &StopToken::new(), |step| {
//!     println!("{} {:.2} ly", step.label, step.distance);
//! })?;
//! println!("{} systems", route.systems.len());
//! # Ok(())
//! # }
//! ```

mod plotter;

pub use plotter::RoutePlotter;

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::cache::DEFAULT_CANDIDATE_CAP;
use crate::db::{System, SystemId};
use crate::error::{Error, Result};
use crate::geometry::Point3D;

/// Label given to synthetic hops where no real system was found.
pub const WAYPOINT_LABEL: &str = "WAYPOINT";

/// Boost strengths tried in order when a hop finds no system.
///
/// The ladder doubles from 1 and stops before 8: with at most
/// [`MAX_BOOST_ATTEMPTS`] tries only 1, 2 and 4 are ever reached.
pub const BOOST_LADDER: [u32; 3] = [1, 2, 4];

/// Upper bound on boost attempts for a single hop.
pub const MAX_BOOST_ATTEMPTS: usize = 4;

/// Tie-break policy among systems inside a hop's search window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RouteMetric {
    /// Closest to the ideal position.
    #[default]
    NearestWaypoint,
    /// Smallest perpendicular deviation from the travel line.
    MinDeviationFromPath,
    /// Longest jump among systems deviating at most 100 ly.
    MaximumDev100Ly,
    /// Longest jump among systems deviating at most 250 ly.
    MaximumDev250Ly,
    /// Longest jump among systems deviating at most 500 ly.
    MaximumDev500Ly,
    /// Longest jump among systems within half the search radius of the
    /// ideal position.
    WaypointDeviationHalf,
}

impl RouteMetric {
    pub const ALL: [RouteMetric; 6] = [
        RouteMetric::NearestWaypoint,
        RouteMetric::MinDeviationFromPath,
        RouteMetric::MaximumDev100Ly,
        RouteMetric::MaximumDev250Ly,
        RouteMetric::MaximumDev500Ly,
        RouteMetric::WaypointDeviationHalf,
    ];

    /// Deviation ceiling for the `MaximumDev*` metrics.
    pub fn deviation_limit(self) -> Option<f64> {
        match self {
            RouteMetric::MaximumDev100Ly => Some(100.0),
            RouteMetric::MaximumDev250Ly => Some(250.0),
            RouteMetric::MaximumDev500Ly => Some(500.0),
            _ => None,
        }
    }
}

impl fmt::Display for RouteMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            RouteMetric::NearestWaypoint => "nearest-waypoint",
            RouteMetric::MinDeviationFromPath => "min-deviation",
            RouteMetric::MaximumDev100Ly => "max-dev-100",
            RouteMetric::MaximumDev250Ly => "max-dev-250",
            RouteMetric::MaximumDev500Ly => "max-dev-500",
            RouteMetric::WaypointDeviationHalf => "waypoint-dev-half",
        };
        f.write_str(value)
    }
}

impl FromStr for RouteMetric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        RouteMetric::ALL
            .into_iter()
            .find(|metric| metric.to_string() == wanted)
            .ok_or_else(|| Error::UnknownMetric {
                value: s.to_string(),
            })
    }
}

/// How far a real system may sit from the ideal position and still be
/// accepted as the hop.
///
/// Short hops cannot afford to lose a light-year; long hops tolerate a
/// corridor of `100 + range / 5`, never wider than `range - 1`.
pub fn search_radius(max_range: f64) -> f64 {
    if max_range < 100.0 {
        max_range - 1.0
    } else {
        (max_range - 1.0).min(100.0 + max_range / 5.0)
    }
}

/// Range multiplier for a boost strength: `1 + strength / 4`.
pub fn boost_factor(strength: u32) -> f64 {
    1.0 + f64::from(strength) / 4.0
}

/// Range increase for a boost strength, in percent.
pub fn boost_percentage(strength: u32) -> u32 {
    strength * 25
}

/// Inputs for one plot.
#[derive(Debug, Clone)]
pub struct PlotRequest {
    pub start_name: String,
    pub start: Point3D,
    pub end_name: String,
    pub end: Point3D,
    /// Nominal maximum distance per hop, in light-years.
    pub max_range: f64,
    pub metric: RouteMetric,
    /// Widen range and radius along [`BOOST_LADDER`] when a hop misses.
    pub use_boost: bool,
    /// Systems never to be proposed as a hop.
    pub discard: HashSet<SystemId>,
    /// Candidates the cache considers per query.
    pub candidate_cap: usize,
}

impl PlotRequest {
    pub fn new(
        start_name: impl Into<String>,
        start: Point3D,
        end_name: impl Into<String>,
        end: Point3D,
        max_range: f64,
    ) -> Self {
        Self {
            start_name: start_name.into(),
            start,
            end_name: end_name.into(),
            end,
            max_range,
            metric: RouteMetric::default(),
            use_boost: false,
            discard: HashSet::new(),
            candidate_cap: DEFAULT_CANDIDATE_CAP,
        }
    }

    pub fn with_metric(mut self, metric: RouteMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_boost(mut self, use_boost: bool) -> Self {
        self.use_boost = use_boost;
        self
    }

    pub fn with_discard(mut self, discard: impl IntoIterator<Item = SystemId>) -> Self {
        self.discard = discard.into_iter().collect();
        self
    }

    /// Reject requests the plotter cannot honour.
    pub fn validate(&self) -> Result<()> {
        if !(self.max_range.is_finite() && self.max_range > 0.0) {
            return Err(Error::InvalidRange {
                range: self.max_range,
            });
        }
        if !self.start.is_finite() {
            return Err(Error::InvalidCoordinates { which: "start" });
        }
        if !self.end.is_finite() {
            return Err(Error::InvalidCoordinates { which: "end" });
        }
        if self.start_name.trim().is_empty() {
            return Err(Error::EmptyName { which: "start" });
        }
        if self.end_name.trim().is_empty() {
            return Err(Error::EmptyName { which: "end" });
        }
        Ok(())
    }
}

/// What a [`RouteStep`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// The resolved starting system.
    Start,
    /// A hop landing on a real system.
    System,
    /// A synthetic hop at the ideal position.
    Waypoint,
    /// Distance from start to destination, ignoring the path.
    StraightLine,
    /// Sum of every hop actually flown.
    Travelled,
    /// Arrival at the destination.
    Destination,
}

/// One progress record emitted by the plotter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteStep {
    pub kind: StepKind,
    /// System name, [`WAYPOINT_LABEL`], or a summary caption.
    pub label: String,
    /// Hop number; 0 for the start and the summaries.
    pub hop: usize,
    /// Light-years flown on this hop, or the summary distance.
    pub distance: f64,
    /// Position after the hop.
    pub position: Point3D,
    /// Perpendicular distance of a real system from the ideal travel line.
    pub deviation: f64,
    /// Boost percentage used to find this hop, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boost: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<System>,
}

/// The systems a plot actually visited.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub systems: Vec<System>,
    /// `false` when the plot was stopped before reaching the destination.
    pub arrived: bool,
}
