use std::sync::Arc;

use rusqlite::Connection;
use starplot_lib::{
    load_starmap, Error, PlotRequest, Point3D, RoutePlotter, Starmap, StarmapCache, StepKind,
    StopToken, System, WAYPOINT_LABEL,
};

mod support;

use support::{labels, CatalogFixture};

fn plotter_for(fixture: &CatalogFixture) -> (RoutePlotter, Arc<StarmapCache>) {
    let starmap = load_starmap(&fixture.path).expect("catalog loads");
    let cache = Arc::new(StarmapCache::new(starmap));
    (RoutePlotter::new(cache.clone()), cache)
}

fn corridor_request(cache: &StarmapCache) -> PlotRequest {
    let starmap = cache.starmap();
    let sol = starmap.require_system("Sol").expect("Sol");
    let dest = starmap.require_system("dest").expect("Dest");
    PlotRequest::new(
        &sol.name,
        sol.position.expect("Sol position"),
        &dest.name,
        dest.position.expect("Dest position"),
        10.0,
    )
}

#[test]
fn corridor_route_visits_every_system() {
    let fixture = CatalogFixture::corridor();
    let (plotter, cache) = plotter_for(&fixture);
    let request = corridor_request(&cache);

    let mut steps = Vec::new();
    let route = plotter
        .plot(&request, &StopToken::new(), |step| steps.push(step.clone()))
        .expect("route plots");

    let names: Vec<&str> = route.systems.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Sol", "Alpha", "Beta", "Gamma", "Dest"]);
    assert_eq!(route.systems[0].id, Some(1));
    assert_eq!(route.systems[4].id, Some(5));
    for step in steps.iter().filter(|s| s.kind == StepKind::System) {
        assert!(step.distance <= 10.0 + 1e-9, "{} too far", step.label);
    }

    let straight = steps.iter().find(|s| s.kind == StepKind::StraightLine);
    let travelled = steps.iter().find(|s| s.kind == StepKind::Travelled);
    let (straight, travelled) = (straight.expect("straight"), travelled.expect("travelled"));
    assert_eq!(straight.distance, 36.0);
    assert!(travelled.distance >= straight.distance);
}

#[test]
fn avoided_systems_are_replaced_by_waypoints() {
    let fixture = CatalogFixture::corridor();
    let (plotter, cache) = plotter_for(&fixture);
    let request = corridor_request(&cache).with_discard([3]);

    let mut steps = Vec::new();
    let route = plotter
        .plot(&request, &StopToken::new(), |step| steps.push(step.clone()))
        .expect("route plots");

    let names: Vec<&str> = route.systems.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Sol", "Alpha", "Gamma", "Dest"]);
    assert!(labels(&steps).contains(&WAYPOINT_LABEL));
    assert!(!labels(&steps).contains(&"Beta"));
}

#[test]
fn raw_coordinates_resolve_to_catalog_entries() {
    let fixture = CatalogFixture::corridor();
    let (plotter, _cache) = plotter_for(&fixture);
    let request = PlotRequest::new(
        "here",
        Point3D::new(0.0, 0.0, 0.0005),
        "there",
        Point3D::new(50.0, 50.0, 50.0),
        100.0,
    );

    let route = plotter
        .plot(&request, &StopToken::new(), |_| {})
        .expect("route plots");
    assert_eq!(route.systems[0].name, "Sol");
    assert_eq!(route.systems[1].name, "there");
    assert_eq!(route.systems[1].id, None);
}

#[test]
fn unknown_names_suggest_close_matches() {
    let fixture = CatalogFixture::corridor();
    let starmap = load_starmap(&fixture.path).expect("catalog loads");
    let err = starmap.require_system("Gamm").expect_err("unknown");
    match err {
        Error::UnknownSystem { suggestions, .. } => {
            assert!(suggestions.contains(&"Gamma".to_string()));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn textual_and_missing_coordinates_are_tolerated() {
    let fixture = CatalogFixture::new(&[]);
    let connection = Connection::open(&fixture.path).expect("open");
    connection
        .execute_batch(
            "INSERT INTO systems (id, name, x, y, z) VALUES (10, 'Texty', '1.5', ' -2 ', '3');
             INSERT INTO systems (id, name, x, y, z) VALUES (11, 'Lost', NULL, 0, 0);
             INSERT INTO systems (id, name, x, y, z) VALUES (12, 'Garbled', 'n/a', 0, 0);",
        )
        .expect("insert rows");
    drop(connection);

    let starmap = load_starmap(&fixture.path).expect("catalog loads");
    assert_eq!(starmap.systems.len(), 3);
    let texty = starmap.system_by_name("texty").expect("Texty");
    assert_eq!(texty.position, Some(Point3D::new(1.5, -2.0, 3.0)));
    assert!(starmap.system_by_name("Lost").expect("Lost").position.is_none());
    assert!(starmap
        .system_by_name("Garbled")
        .expect("Garbled")
        .position
        .is_none());

    // Unpositioned systems never enter the spatial index.
    let cache = StarmapCache::new(starmap);
    assert_eq!(cache.index().len(), 1);
}

#[test]
fn missing_catalog_is_reported() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = load_starmap(&dir.path().join("absent.db")).expect_err("missing");
    assert!(matches!(err, Error::CatalogNotFound { .. }));
}

#[test]
fn foreign_schema_is_rejected() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("other.db");
    Connection::open(&path)
        .expect("open")
        .execute_batch("CREATE TABLE stars (id INTEGER, label TEXT);")
        .expect("create");
    assert!(matches!(
        load_starmap(&path),
        Err(Error::UnsupportedSchema)
    ));
}

#[test]
fn boosted_hop_onto_the_destination_is_not_repeated() {
    let starmap = Starmap::from_systems([
        System::synthetic("Sol", Point3D::ORIGIN).with_id(1),
        System::synthetic("Dest", Point3D::new(22.0, 0.0, 0.0)).with_id(2),
    ]);
    let plotter = RoutePlotter::new(Arc::new(StarmapCache::new(starmap)));
    let request = PlotRequest::new(
        "Sol",
        Point3D::ORIGIN,
        "Dest",
        Point3D::new(22.0, 0.0, 0.0),
        20.0,
    )
    .with_boost(true);

    let mut steps = Vec::new();
    let route = plotter
        .plot(&request, &StopToken::new(), |step| steps.push(step.clone()))
        .expect("route plots");

    let names: Vec<&str> = route.systems.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Sol", "Dest"]);
    assert_eq!(route.systems[1].id, Some(2));
    let kinds: Vec<StepKind> = steps.iter().map(|step| step.kind).collect();
    assert_eq!(
        kinds,
        vec![
            StepKind::Start,
            StepKind::StraightLine,
            StepKind::Travelled,
            StepKind::Destination,
        ]
    );
    assert!((steps[2].distance - 22.0).abs() < 1e-9);
}
