//! Starplot library entry points.
//!
//! This crate plots greedy point-to-point routes across a 3-D star catalog.
//! It exposes helpers to locate and load the catalog, index it spatially,
//! query external directory services under a shared rate limiter, and run the
//! hop-by-hop plotter. Higher-level consumers (the CLI) should only depend on
//! the functions exported here instead of reimplementing behavior.
//!

#![deny(warnings)]

pub mod cache;
pub mod catalog;
pub mod dataset;
pub mod db;
pub mod directory;
pub mod error;
pub mod geometry;
pub mod output;
pub mod routing;
pub mod spatial;
pub mod stop;
pub mod throttle;

pub use cache::{
    NearestQuery, SpatialCache, StarmapCache, DEFAULT_CANDIDATE_CAP, POSITION_EPSILON,
};
pub use catalog::{create_catalog, insert_system};
pub use dataset::{default_catalog_path, resolve_catalog_path};
pub use db::{load_starmap, Starmap, System, SystemId};
pub use directory::{
    query_centre, select_candidate, DirectoryCandidate, DirectoryConfig, EdsmDirectory,
    LookupMode, SpanshDirectory, SystemDirectory,
};
pub use error::{Error, Result};
pub use geometry::Point3D;
pub use output::{RouteRenderMode, RouteSummary, SummaryStep};
pub use routing::{
    boost_factor, boost_percentage, search_radius, PlotRequest, Route, RouteMetric, RoutePlotter,
    RouteStep, StepKind, BOOST_LADDER, MAX_BOOST_ATTEMPTS, WAYPOINT_LABEL,
};
pub use spatial::SpatialIndex;
pub use stop::StopToken;
pub use throttle::{Clock, ManualClock, RateLimiter, SystemClock};
