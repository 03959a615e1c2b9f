//! `route` subcommand: plot a route and stream its progress.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use starplot_lib::{
    LookupMode, PlotRequest, RouteMetric, RoutePlotter, StarmapCache, StopToken, SystemId,
};
use tracing::{info, warn};

use starplot_cli::output::{OutputFormat, StepPrinter};
use starplot_cli::terminal::ColorPalette;

use super::{is_coordinate, load_catalog, resolve_endpoint};

/// Arguments for the route command.
#[derive(Debug, Clone)]
pub struct RouteCommandArgs {
    /// Starting system name or `x,y,z`.
    pub from: String,
    /// Destination system name or `x,y,z`.
    pub to: String,
    /// Maximum hop distance (light-years).
    pub range: f64,
    pub metric: RouteMetric,
    pub boost: bool,
    pub lookup: LookupMode,
    /// Catalog ids never to be used as hops.
    pub avoid: Vec<SystemId>,
    pub candidate_cap: usize,
}

impl RouteCommandArgs {
    /// A catalog is only mandatory when an endpoint is given by name or no
    /// directory service can stand in for it.
    fn catalog_optional(&self) -> bool {
        self.lookup != LookupMode::None && is_coordinate(&self.from) && is_coordinate(&self.to)
    }
}

/// Handle the route subcommand.
///
/// The plot runs on a blocking worker. Ctrl-C fires the stop token; the
/// plot then ends after its current hop and the partial route is printed.
pub async fn handle_route_command(
    data_dir: Option<PathBuf>,
    format: OutputFormat,
    args: RouteCommandArgs,
) -> Result<()> {
    let stop = StopToken::new();
    let worker_stop = stop.clone();
    let mut worker = tokio::task::spawn_blocking(move || {
        plot_route(data_dir.as_deref(), format, &args, &worker_stop)
    });

    let joined = tokio::select! {
        joined = &mut worker => joined,
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for Ctrl-C")?;
            warn!("interrupt received; stopping after the current hop");
            stop.stop();
            worker.await
        }
    };
    joined.context("route worker panicked")?
}

/// Load the catalog, plot and print. Blocking.
pub fn plot_route(
    data_dir: Option<&Path>,
    format: OutputFormat,
    args: &RouteCommandArgs,
    stop: &StopToken,
) -> Result<()> {
    let starmap = load_catalog(data_dir, args.catalog_optional())?;
    let start = resolve_endpoint(&args.from, &starmap).context("invalid --from")?;
    let end = resolve_endpoint(&args.to, &starmap).context("invalid --to")?;

    let directories = args
        .lookup
        .build_chain()
        .context("failed to set up directory services")?;
    let plotter =
        RoutePlotter::new(Arc::new(StarmapCache::new(starmap))).with_directories(directories);

    let mut request = PlotRequest::new(
        start.name,
        start.position,
        end.name,
        end.position,
        args.range,
    )
    .with_metric(args.metric)
    .with_boost(args.boost)
    .with_discard(args.avoid.iter().copied());
    request.candidate_cap = args.candidate_cap;

    let stdout = io::stdout();
    let mut printer = StepPrinter::new(stdout.lock(), format, ColorPalette::detect());
    let route = plotter.plot(&request, stop, |step| printer.record(step))?;
    printer
        .finish(&route, &request.end_name)
        .context("failed to write route output")?;

    info!(
        systems = route.systems.len(),
        arrived = route.arrived,
        lookup = %args.lookup,
        "route command finished"
    );
    Ok(())
}
