//! `nearest` subcommand: list catalog systems closest to a point.

use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use starplot_lib::{Point3D, SpatialIndex, SystemId};

use starplot_cli::output::OutputFormat;

use super::{load_catalog, resolve_endpoint};

#[derive(Debug, Serialize)]
struct Neighbour {
    id: SystemId,
    name: String,
    position: Point3D,
    distance: f64,
}

/// Print the `count` systems nearest to `near` (a name or `x,y,z`),
/// optionally limited to `radius` light-years.
pub fn handle_nearest_command(
    data_dir: Option<&Path>,
    format: OutputFormat,
    near: &str,
    count: usize,
    radius: Option<f64>,
) -> Result<()> {
    let starmap = load_catalog(data_dir, false)?;
    let origin = resolve_endpoint(near, &starmap)?;
    let index = SpatialIndex::build(&starmap);

    let hits = match radius {
        Some(radius) => index.nearest_within(origin.position, radius, count),
        None => index.nearest(origin.position, count),
    };
    let neighbours: Vec<Neighbour> = hits
        .into_iter()
        .filter_map(|(id, distance)| {
            let system = starmap.systems.get(&id)?;
            Some(Neighbour {
                id,
                name: system.name.clone(),
                position: system.position?,
                distance,
            })
        })
        .collect();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&neighbours)?),
        OutputFormat::Ndjson => {
            for neighbour in &neighbours {
                println!("{}", serde_json::to_string(neighbour)?);
            }
        }
        OutputFormat::Text => {
            println!("Nearest to {} [{}]:", origin.name, origin.position);
            for neighbour in &neighbours {
                println!(
                    "{:>9.2} ly  {} ({})",
                    neighbour.distance, neighbour.name, neighbour.id
                );
            }
        }
    }
    Ok(())
}
