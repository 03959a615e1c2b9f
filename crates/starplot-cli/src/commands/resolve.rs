//! `resolve` subcommand: look a system up by name.

use std::path::Path;

use anyhow::Result;

use starplot_cli::output::OutputFormat;

use super::load_catalog;

pub fn handle_resolve_command(
    data_dir: Option<&Path>,
    format: OutputFormat,
    name: &str,
) -> Result<()> {
    let starmap = load_catalog(data_dir, false)?;
    let system = starmap.require_system(name)?;

    match format {
        OutputFormat::Json | OutputFormat::Ndjson => {
            println!("{}", serde_json::to_string(system)?);
        }
        OutputFormat::Text => match (system.id, system.position) {
            (Some(id), Some(position)) => println!("{} ({id}) [{position}]", system.name),
            (Some(id), None) => println!("{} ({id}) [unknown position]", system.name),
            (None, _) => println!("{}", system.name),
        },
    }
    Ok(())
}
