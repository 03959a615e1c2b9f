use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use once_cell::sync::Lazy;
use starplot_lib::{
    NearestQuery, PlotRequest, Point3D, RouteMetric, RoutePlotter, Starmap, StarmapCache,
    StopToken, System, SpatialCache, DEFAULT_CANDIDATE_CAP,
};

/// A jittered lattice of 27 000 systems spaced about 20 ly apart.
static CACHE: Lazy<Arc<StarmapCache>> = Lazy::new(|| {
    let mut systems = Vec::new();
    let mut id = 0;
    for i in 0..30 {
        for j in 0..30 {
            for k in 0..30 {
                let jitter = ((i * 7 + j * 13 + k * 31) % 17) as f64 / 4.0;
                let position = Point3D::new(
                    f64::from(i) * 20.0 + jitter,
                    f64::from(j) * 20.0 - jitter,
                    f64::from(k) * 20.0 + jitter / 2.0,
                );
                systems.push(System::synthetic(format!("Sys {id}"), position).with_id(id));
                id += 1;
            }
        }
    }
    Arc::new(StarmapCache::new(Starmap::from_systems(systems)))
});

fn benchmark_plotting(c: &mut Criterion) {
    let cache = Arc::clone(&*CACHE);
    let plotter = RoutePlotter::new(cache.clone());

    c.bench_function("nearest_query_r60", |b| {
        let discard = Default::default();
        let query = NearestQuery {
            current: Point3D::new(100.0, 100.0, 100.0),
            ideal: Point3D::new(160.0, 100.0, 100.0),
            max_range: 60.0,
            max_deviation: 59.0,
            metric: RouteMetric::NearestWaypoint,
            candidate_cap: DEFAULT_CANDIDATE_CAP,
            discard: &discard,
        };
        b.iter(|| black_box(cache.find_nearest(&query)));
    });

    for metric in [RouteMetric::NearestWaypoint, RouteMetric::MaximumDev100Ly] {
        let request = PlotRequest::new(
            "Corner",
            Point3D::ORIGIN,
            "Opposite",
            Point3D::new(580.0, 580.0, 580.0),
            45.0,
        )
        .with_metric(metric);
        c.bench_function(&format!("plot_diagonal_{metric}"), |b| {
            b.iter(|| {
                let route = plotter
                    .plot(&request, &StopToken::new(), |_| {})
                    .expect("route plots");
                black_box(route.systems.len())
            });
        });
    }
}

criterion_group!(benches, benchmark_plotting);
criterion_main!(benches);
