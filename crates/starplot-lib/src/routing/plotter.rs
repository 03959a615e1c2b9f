//! The hop-selection loop.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::cache::{NearestQuery, SpatialCache, POSITION_EPSILON};
use crate::db::{System, SystemId};
use crate::directory::{query_centre, select_candidate, SystemDirectory};
use crate::error::Result;
use crate::geometry::Point3D;
use crate::stop::StopToken;
use crate::throttle::RateLimiter;

use super::{
    boost_factor, boost_percentage, search_radius, PlotRequest, Route, RouteStep, StepKind,
    BOOST_LADDER, MAX_BOOST_ATTEMPTS, WAYPOINT_LABEL,
};

/// Radius used when asking directories whether a system sits exactly on an
/// endpoint.
const ENDPOINT_PROBE_RADIUS: f64 = 1.0;

/// Outcome of looking for a real system around one ideal position.
enum Lookup {
    Hit(System),
    Miss,
    Cancelled,
}

/// Geometric window searched for one hop attempt.
#[derive(Clone, Copy)]
struct Window {
    current: Point3D,
    ideal: Point3D,
    max_range: f64,
    radius: f64,
}

/// A hop chosen by [`RoutePlotter::choose_hop`].
enum Hop {
    System {
        system: System,
        ideal: Point3D,
        boost: Option<u32>,
    },
    Waypoint(Point3D),
    Cancelled,
}

/// Greedy route plotter over a spatial cache and an ordered chain of
/// directory services.
///
/// A plotter holds no per-plot state; it can be shared between threads and
/// reused for any number of plots. Directory calls from every plot sharing
/// the same [`RateLimiter`] are throttled together.
pub struct RoutePlotter {
    cache: Arc<dyn SpatialCache>,
    directories: Vec<Arc<dyn SystemDirectory>>,
    limiter: Arc<RateLimiter>,
}

impl RoutePlotter {
    /// A plotter consulting only the local cache.
    pub fn new(cache: Arc<dyn SpatialCache>) -> Self {
        Self {
            cache,
            directories: Vec::new(),
            limiter: Arc::new(RateLimiter::system()),
        }
    }

    /// Directory services to try, in priority order, when the cache misses.
    pub fn with_directories(mut self, directories: Vec<Arc<dyn SystemDirectory>>) -> Self {
        self.directories = directories;
        self
    }

    /// Share a rate limiter with other plotters.
    pub fn with_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    /// Plot `request`, pushing each progress record to `on_step` as soon as
    /// it is known.
    ///
    /// Records arrive in order: the start, one per hop, then the
    /// straight-line and travelled summaries and finally the destination.
    /// When `stop` fires the plot ends at the last completed hop; no summaries
    /// or destination are emitted and [`Route::arrived`] is `false`.
    ///
    /// Systems already on the route are never proposed again, in addition to
    /// those in [`PlotRequest::discard`]. A hop landing on the destination
    /// ends the loop, so the destination appears once.
    pub fn plot<F>(&self, request: &PlotRequest, stop: &StopToken, mut on_step: F) -> Result<Route>
    where
        F: FnMut(&RouteStep),
    {
        request.validate()?;
        info!(
            start = %request.start_name,
            end = %request.end_name,
            max_range = request.max_range,
            metric = %request.metric,
            boost = request.use_boost,
            directories = self.directories.len(),
            "plotting route"
        );

        let start = self.resolve_endpoint(&request.start_name, request.start, stop);
        on_step(&RouteStep {
            kind: StepKind::Start,
            label: start.name.clone(),
            hop: 0,
            distance: 0.0,
            position: request.start,
            deviation: 0.0,
            boost: None,
            system: Some(start.clone()),
        });

        let mut discard = request.discard.clone();
        discard.extend(start.id);
        let mut systems = vec![start];
        let mut current = request.start;
        let mut travelled = 0.0;
        let mut hop = 0usize;

        loop {
            if stop.is_stopped() {
                return Ok(self.cancelled(systems, hop));
            }

            let remaining = current.distance_to(&request.end);
            if remaining <= request.max_range {
                break;
            }
            let Some(direction) = (request.end - current).unit() else {
                break;
            };

            let step = match self.choose_hop(request, &discard, current, direction, remaining, stop) {
                Hop::Cancelled => return Ok(self.cancelled(systems, hop)),
                Hop::System { system, .. } if arrives_at(&system, request.end) => {
                    debug!(system = %system.name, "hop lands on the destination");
                    break;
                }
                Hop::System {
                    mut system,
                    ideal,
                    boost,
                } => {
                    let position = system.position.unwrap_or(ideal);
                    let deviation = position.deviation_from_line(&current, &ideal);
                    system.tag = Some(hop_tag(deviation, boost));
                    discard.extend(system.id);
                    systems.push(system.clone());
                    RouteStep {
                        kind: StepKind::System,
                        label: system.name.clone(),
                        hop: hop + 1,
                        distance: current.distance_to(&position),
                        position,
                        deviation,
                        boost,
                        system: Some(system),
                    }
                }
                Hop::Waypoint(ideal) => RouteStep {
                    kind: StepKind::Waypoint,
                    label: WAYPOINT_LABEL.to_string(),
                    hop: hop + 1,
                    distance: current.distance_to(&ideal),
                    position: ideal,
                    deviation: 0.0,
                    boost: None,
                    system: None,
                },
            };

            debug!(
                hop = step.hop,
                label = %step.label,
                distance = step.distance,
                deviation = step.deviation,
                boost = step.boost,
                "hop chosen"
            );
            on_step(&step);

            travelled += step.distance;
            current = step.position;
            hop += 1;
        }

        let destination = self.resolve_endpoint(&request.end_name, request.end, stop);
        if stop.is_stopped() {
            return Ok(self.cancelled(systems, hop));
        }
        let final_hop = current.distance_to(&request.end);
        travelled += final_hop;
        systems.push(destination.clone());

        let straight_line = request.start.distance_to(&request.end);
        on_step(&summary_step(
            StepKind::StraightLine,
            "Straight line distance",
            straight_line,
            request.end,
        ));
        on_step(&summary_step(
            StepKind::Travelled,
            "Travelled distance",
            travelled,
            request.end,
        ));
        on_step(&RouteStep {
            kind: StepKind::Destination,
            label: destination.name.clone(),
            hop: hop + 1,
            distance: final_hop,
            position: request.end,
            deviation: 0.0,
            boost: None,
            system: Some(destination),
        });

        info!(hops = hop + 1, travelled, straight_line, "route plotted");
        Ok(Route {
            systems,
            arrived: true,
        })
    }

    /// Pick the next hop from `current`, widening the search along the boost
    /// ladder when enabled.
    fn choose_hop(
        &self,
        request: &PlotRequest,
        discard: &HashSet<SystemId>,
        current: Point3D,
        direction: Point3D,
        remaining: f64,
        stop: &StopToken,
    ) -> Hop {
        let ideal = current + direction * request.max_range;
        let radius = search_radius(request.max_range);

        let window = Window {
            current,
            ideal,
            max_range: request.max_range,
            radius,
        };
        match self.lookup(request, discard, &window, remaining, stop) {
            Lookup::Hit(system) => {
                return Hop::System {
                    system,
                    ideal,
                    boost: None,
                }
            }
            Lookup::Cancelled => return Hop::Cancelled,
            Lookup::Miss => {}
        }

        if request.use_boost {
            for strength in BOOST_LADDER.into_iter().take(MAX_BOOST_ATTEMPTS) {
                let factor = boost_factor(strength);
                let boosted_range = request.max_range * factor;
                let boosted_radius = radius * factor;
                let boosted_ideal = current + direction * boosted_range.min(remaining);
                debug!(strength, boosted_range, boosted_radius, "retrying hop with boost");

                let window = Window {
                    current,
                    ideal: boosted_ideal,
                    max_range: boosted_range,
                    radius: boosted_radius,
                };
                match self.lookup(request, discard, &window, remaining, stop) {
                    Lookup::Hit(system) => {
                        return Hop::System {
                            system,
                            ideal: boosted_ideal,
                            boost: Some(boost_percentage(strength)),
                        }
                    }
                    Lookup::Cancelled => return Hop::Cancelled,
                    Lookup::Miss => {}
                }
            }
        }

        Hop::Waypoint(ideal)
    }

    /// Cache first, then each directory in order.
    ///
    /// A hit that would not bring the route closer to the destination is
    /// treated as a miss, so the hop loop always makes progress.
    fn lookup(
        &self,
        request: &PlotRequest,
        discard: &HashSet<SystemId>,
        window: &Window,
        remaining: f64,
        stop: &StopToken,
    ) -> Lookup {
        let Window {
            current,
            ideal,
            max_range,
            radius,
        } = *window;
        let advances = |system: &System| {
            system
                .position
                .is_some_and(|p| p.distance_to(&request.end) < remaining - POSITION_EPSILON)
        };

        let query = NearestQuery {
            current,
            ideal,
            max_range,
            max_deviation: radius,
            metric: request.metric,
            candidate_cap: request.candidate_cap,
            discard,
        };
        if let Some(system) = self.cache.find_nearest(&query) {
            if advances(&system) {
                return Lookup::Hit(system);
            }
            debug!(system = %system.name, "cache hit does not advance the route");
        }

        if radius <= 0.0 {
            return Lookup::Miss;
        }
        let centre = query_centre(current, ideal, radius);
        for directory in &self.directories {
            if !self
                .limiter
                .acquire(directory.name(), directory.min_interval(), stop)
            {
                return Lookup::Cancelled;
            }
            let Some(candidates) = directory.sphere_query(centre, radius) else {
                continue;
            };
            if let Some(system) =
                select_candidate(candidates, current, ideal, max_range, radius, discard)
                    .filter(|system| advances(system))
            {
                debug!(directory = directory.name(), system = %system.name, "directory hit");
                return Lookup::Hit(system);
            }
        }
        Lookup::Miss
    }

    /// Replace raw endpoint coordinates with a catalog entry at the same
    /// place, if the cache or a directory knows one.
    fn resolve_endpoint(&self, name: &str, position: Point3D, stop: &StopToken) -> System {
        if let Some(system) = self.cache.resolve_exact(name, position) {
            return system;
        }

        for directory in &self.directories {
            if !self
                .limiter
                .acquire(directory.name(), directory.min_interval(), stop)
            {
                debug!(endpoint = name, "endpoint lookup stopped; keeping given coordinates");
                break;
            }
            let found = directory
                .sphere_query(position, ENDPOINT_PROBE_RADIUS)
                .unwrap_or_default()
                .into_iter()
                .filter(|candidate| candidate.position.same_place(&position, POSITION_EPSILON))
                .min_by_key(|candidate| !candidate.system.name.eq_ignore_ascii_case(name));
            if let Some(candidate) = found {
                let mut system = candidate.system;
                system.position = Some(candidate.position);
                return system;
            }
        }

        System::synthetic(name, position)
    }

    fn cancelled(&self, systems: Vec<System>, hops: usize) -> Route {
        info!(hops, "route plotting stopped");
        Route {
            systems,
            arrived: false,
        }
    }
}

impl fmt::Debug for RoutePlotter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutePlotter")
            .field(
                "directories",
                &self
                    .directories
                    .iter()
                    .map(|directory| directory.name().to_string())
                    .collect::<Vec<_>>(),
            )
            .field("limiter", &self.limiter)
            .finish()
    }
}

fn arrives_at(system: &System, end: Point3D) -> bool {
    system
        .position
        .is_some_and(|position| position.same_place(&end, POSITION_EPSILON))
}

fn hop_tag(deviation: f64, boost: Option<u32>) -> String {
    match boost {
        Some(percent) => format!("Deviation: {deviation:.1} ly, Boost: {percent}%"),
        None => format!("Deviation: {deviation:.1} ly"),
    }
}

fn summary_step(kind: StepKind, label: &str, distance: f64, position: Point3D) -> RouteStep {
    RouteStep {
        kind,
        label: label.to_string(),
        hop: 0,
        distance,
        position,
        deviation: 0.0,
        boost: None,
        system: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hop_tags_mention_boost_only_when_used() {
        assert_eq!(hop_tag(1.234, None), "Deviation: 1.2 ly");
        assert_eq!(hop_tag(0.0, Some(50)), "Deviation: 0.0 ly, Boost: 50%");
    }

    #[test]
    fn summary_steps_carry_no_system() {
        let step = summary_step(StepKind::Travelled, "Travelled distance", 12.5, Point3D::ORIGIN);
        assert_eq!(step.kind, StepKind::Travelled);
        assert!(step.system.is_none());
        assert_eq!(step.distance, 12.5);
    }
}
