//! Stub caches and directories shared by the integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use starplot_lib::{
    create_catalog, DirectoryCandidate, NearestQuery, Point3D, RouteStep, SpatialCache, System,
    SystemDirectory,
};
use tempfile::TempDir;

/// Cache that always has a system sitting exactly on the ideal position.
#[derive(Default)]
pub struct IdealCache {
    next_id: AtomicI64,
}

impl SpatialCache for IdealCache {
    fn find_nearest(&self, query: &NearestQuery<'_>) -> Option<System> {
        let id = 1000 + self.next_id.fetch_add(1, Ordering::SeqCst);
        Some(System::synthetic(format!("Ideal {id}"), query.ideal).with_id(id))
    }

    fn resolve_exact(&self, _name: &str, _position: Point3D) -> Option<System> {
        None
    }
}

/// Cache that never knows anything, counting how often it was asked.
#[derive(Default)]
pub struct EmptyCache {
    pub queries: AtomicUsize,
}

impl SpatialCache for EmptyCache {
    fn find_nearest(&self, _query: &NearestQuery<'_>) -> Option<System> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        None
    }

    fn resolve_exact(&self, _name: &str, _position: Point3D) -> Option<System> {
        None
    }
}

/// Cache that only finds systems once the hop range reaches `min_range`.
pub struct BoostOnlyCache {
    pub min_range: f64,
    next_id: AtomicI64,
}

impl BoostOnlyCache {
    pub fn new(min_range: f64) -> Self {
        Self {
            min_range,
            next_id: AtomicI64::new(0),
        }
    }
}

impl SpatialCache for BoostOnlyCache {
    fn find_nearest(&self, query: &NearestQuery<'_>) -> Option<System> {
        if query.max_range + 1e-9 < self.min_range {
            return None;
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Some(System::synthetic(format!("Far {id}"), query.ideal).with_id(id))
    }

    fn resolve_exact(&self, _name: &str, _position: Point3D) -> Option<System> {
        None
    }
}

type Responder = Box<dyn Fn(Point3D, f64) -> Option<Vec<DirectoryCandidate>> + Send + Sync>;

/// Directory answering from a closure and recording every sphere it was asked.
pub struct StubDirectory {
    name: String,
    interval: Duration,
    responder: Responder,
    pub calls: Mutex<Vec<(Point3D, f64)>>,
}

impl StubDirectory {
    pub fn new<F>(name: &str, interval: Duration, responder: F) -> Self
    where
        F: Fn(Point3D, f64) -> Option<Vec<DirectoryCandidate>> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            interval,
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A directory that answers every query with an empty list.
    pub fn empty(name: &str, interval: Duration) -> Self {
        Self::new(name, interval, |_, _| Some(Vec::new()))
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("calls lock").len()
    }
}

impl SystemDirectory for StubDirectory {
    fn name(&self) -> &str {
        &self.name
    }

    fn min_interval(&self) -> Duration {
        self.interval
    }

    fn sphere_query(&self, centre: Point3D, radius: f64) -> Option<Vec<DirectoryCandidate>> {
        self.calls.lock().expect("calls lock").push((centre, radius));
        (self.responder)(centre, radius)
    }
}

pub fn candidate(name: &str, id: i64, position: Point3D) -> DirectoryCandidate {
    DirectoryCandidate::new(System::synthetic(name, position).with_id(id), position)
}

pub fn labels(steps: &[RouteStep]) -> Vec<&str> {
    steps.iter().map(|step| step.label.as_str()).collect()
}

/// A catalog database written into a fresh temporary directory.
pub struct CatalogFixture {
    _dir: TempDir,
    pub path: PathBuf,
}

impl CatalogFixture {
    pub fn new(systems: &[System]) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("systems.db");
        create_catalog(&path, systems).expect("write catalog");
        Self { _dir: dir, path }
    }

    /// Five systems strung along the x axis, about 9 ly apart.
    pub fn corridor() -> Self {
        Self::new(&corridor_systems())
    }
}

pub fn corridor_systems() -> Vec<System> {
    vec![
        System::synthetic("Sol", Point3D::new(0.0, 0.0, 0.0)).with_id(1),
        System::synthetic("Alpha", Point3D::new(9.0, 1.0, 0.0)).with_id(2),
        System::synthetic("Beta", Point3D::new(18.0, -1.0, 0.0)).with_id(3),
        System::synthetic("Gamma", Point3D::new(27.0, 0.5, 0.0)).with_id(4),
        System::synthetic("Dest", Point3D::new(36.0, 0.0, 0.0)).with_id(5),
    ]
}
