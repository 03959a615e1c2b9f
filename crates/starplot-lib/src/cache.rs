//! Local "nearest known system" lookups.
//!
//! The plotter consults a [`SpatialCache`] before any directory service. The
//! bundled implementation, [`StarmapCache`], answers from a loaded
//! [`Starmap`] through its [`SpatialIndex`].

use std::collections::HashSet;
use std::sync::Arc;

use tracing::trace;

use crate::db::{Starmap, System, SystemId};
use crate::geometry::Point3D;
use crate::routing::RouteMetric;
use crate::spatial::SpatialIndex;

/// Reference number of candidates considered per nearest query.
pub const DEFAULT_CANDIDATE_CAP: usize = 1000;

/// Positions closer than this (light-years) are treated as the same place.
pub const POSITION_EPSILON: f64 = 1e-3;

/// Geometric constraints for a single nearest-system query.
#[derive(Debug, Clone, Copy)]
pub struct NearestQuery<'a> {
    /// Position the hop starts from.
    pub current: Point3D,
    /// Where the hop would land if no real system were involved.
    pub ideal: Point3D,
    /// Candidates farther than this from `current` are unreachable.
    pub max_range: f64,
    /// Candidates farther than this from `ideal` are rejected.
    pub max_deviation: f64,
    pub metric: RouteMetric,
    pub candidate_cap: usize,
    pub discard: &'a HashSet<SystemId>,
}

/// Local catalog lookups used by the plotter.
pub trait SpatialCache: Send + Sync {
    /// Best system satisfying `query`, ranked by its metric.
    fn find_nearest(&self, query: &NearestQuery<'_>) -> Option<System>;

    /// Catalog entry at `position` (preferring one named `name`), if any.
    fn resolve_exact(&self, name: &str, position: Point3D) -> Option<System>;
}

impl<T: SpatialCache + ?Sized> SpatialCache for Arc<T> {
    fn find_nearest(&self, query: &NearestQuery<'_>) -> Option<System> {
        (**self).find_nearest(query)
    }

    fn resolve_exact(&self, name: &str, position: Point3D) -> Option<System> {
        (**self).resolve_exact(name, position)
    }
}

/// [`SpatialCache`] over an in-memory starmap.
#[derive(Debug)]
pub struct StarmapCache {
    starmap: Starmap,
    index: SpatialIndex,
}

impl StarmapCache {
    pub fn new(starmap: Starmap) -> Self {
        let index = SpatialIndex::build(&starmap);
        Self { starmap, index }
    }

    pub fn starmap(&self) -> &Starmap {
        &self.starmap
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    fn position_of(&self, id: SystemId) -> Option<(&System, Point3D)> {
        let system = self.starmap.systems.get(&id)?;
        system.position.map(|position| (system, position))
    }
}

/// Lower scores win. `None` rejects the candidate under this metric.
fn score(metric: RouteMetric, query: &NearestQuery<'_>, position: Point3D) -> Option<f64> {
    let from_ideal_sq = position.distance_squared_to(&query.ideal);
    let from_current_sq = position.distance_squared_to(&query.current);
    match metric {
        RouteMetric::NearestWaypoint => Some(from_ideal_sq),
        RouteMetric::MinDeviationFromPath => {
            let deviation = position.deviation_from_line(&query.current, &query.ideal);
            Some(deviation * deviation)
        }
        RouteMetric::MaximumDev100Ly
        | RouteMetric::MaximumDev250Ly
        | RouteMetric::MaximumDev500Ly => {
            let limit = metric.deviation_limit().unwrap_or(f64::INFINITY);
            let deviation = position.deviation_from_line(&query.current, &query.ideal);
            (deviation <= limit).then_some(-from_current_sq)
        }
        RouteMetric::WaypointDeviationHalf => {
            let half = query.max_deviation / 2.0;
            (from_ideal_sq <= half * half).then_some(-from_current_sq)
        }
    }
}

impl SpatialCache for StarmapCache {
    fn find_nearest(&self, query: &NearestQuery<'_>) -> Option<System> {
        let max_range_sq = query.max_range * query.max_range;
        let candidates =
            self.index
                .nearest_within(query.ideal, query.max_deviation, query.candidate_cap);

        let mut best: Option<(f64, f64, SystemId)> = None;
        for (id, from_ideal) in candidates {
            if query.discard.contains(&id) {
                continue;
            }
            let Some((_, position)) = self.position_of(id) else {
                continue;
            };
            if position.distance_squared_to(&query.current) > max_range_sq {
                continue;
            }
            let Some(score) = score(query.metric, query, position) else {
                continue;
            };

            let better = match best {
                None => true,
                Some((best_score, best_from_ideal, best_id)) => {
                    score < best_score
                        || (score == best_score
                            && (from_ideal < best_from_ideal
                                || (from_ideal == best_from_ideal && id < best_id)))
                }
            };
            if better {
                best = Some((score, from_ideal, id));
            }
        }

        let (_, _, id) = best?;
        let system = self.starmap.systems.get(&id).cloned();
        trace!(id, metric = %query.metric, "cache hit");
        system
    }

    fn resolve_exact(&self, name: &str, position: Point3D) -> Option<System> {
        if let Some(system) = self.starmap.system_by_name(name) {
            if system
                .position
                .is_some_and(|p| p.same_place(&position, POSITION_EPSILON))
            {
                return Some(system.clone());
            }
        }

        self.index
            .nearest(position, 1)
            .into_iter()
            .find(|(_, distance)| *distance <= POSITION_EPSILON)
            .and_then(|(id, _)| self.starmap.systems.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> StarmapCache {
        StarmapCache::new(Starmap::from_systems([
            System::synthetic("Origin", Point3D::ORIGIN).with_id(1),
            System::synthetic("OnLine", Point3D::new(18.0, 0.0, 0.0)).with_id(2),
            System::synthetic("Offset", Point3D::new(19.0, 3.0, 0.0)).with_id(3),
            System::synthetic("Far", Point3D::new(24.0, 0.5, 0.0)).with_id(4),
        ]))
    }

    fn query(metric: RouteMetric, discard: &HashSet<SystemId>) -> NearestQuery<'_> {
        NearestQuery {
            current: Point3D::ORIGIN,
            ideal: Point3D::new(20.0, 0.0, 0.0),
            max_range: 20.0,
            max_deviation: 19.0,
            metric,
            candidate_cap: DEFAULT_CANDIDATE_CAP,
            discard,
        }
    }

    #[test]
    fn nearest_waypoint_prefers_closest_to_ideal() {
        let discard = HashSet::new();
        let hit = cache()
            .find_nearest(&query(RouteMetric::NearestWaypoint, &discard))
            .expect("hit");
        assert_eq!(hit.name, "OnLine");
    }

    #[test]
    fn out_of_range_candidates_are_ignored() {
        let discard = HashSet::new();
        let hit = cache()
            .find_nearest(&query(RouteMetric::NearestWaypoint, &discard))
            .expect("hit");
        // "Far" is 24 ly from the origin and must never be proposed.
        assert_ne!(hit.name, "Far");
    }

    #[test]
    fn discarded_systems_are_skipped() {
        let discard: HashSet<SystemId> = [2].into_iter().collect();
        let hit = cache()
            .find_nearest(&query(RouteMetric::NearestWaypoint, &discard))
            .expect("hit");
        assert_eq!(hit.name, "Offset");
    }

    #[test]
    fn maximum_deviation_metric_prefers_longest_jump() {
        let discard = HashSet::new();
        let hit = cache()
            .find_nearest(&query(RouteMetric::MaximumDev100Ly, &discard))
            .expect("hit");
        // Offset is sqrt(370) ly away, OnLine 18 ly.
        assert_eq!(hit.name, "Offset");
    }

    #[test]
    fn half_deviation_metric_restricts_window() {
        let discard = HashSet::new();
        let mut narrow = query(RouteMetric::WaypointDeviationHalf, &discard);
        narrow.max_deviation = 4.0;
        let hit = cache().find_nearest(&narrow).expect("hit");
        assert_eq!(hit.name, "OnLine");
    }

    #[test]
    fn resolve_exact_matches_by_position() {
        let cache = cache();
        let by_name = cache
            .resolve_exact("online", Point3D::new(18.0, 0.0, 0.0))
            .expect("named match");
        assert_eq!(by_name.id, Some(2));

        let by_position = cache
            .resolve_exact("Start", Point3D::new(19.0, 3.0, 0.0))
            .expect("positional match");
        assert_eq!(by_position.name, "Offset");

        assert!(cache
            .resolve_exact("Start", Point3D::new(19.5, 3.0, 0.0))
            .is_none());
    }
}
