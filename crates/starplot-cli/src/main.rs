mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use starplot_lib::{LookupMode, RouteMetric, SystemId, DEFAULT_CANDIDATE_CAP};
use starplot_cli::logging::{init_logging, LoggingConfig};
use starplot_cli::output::OutputFormat;

use crate::commands::route::RouteCommandArgs;

#[derive(Parser, Debug)]
#[command(author, version, about = "Greedy point-to-point route plotting across a star catalog")]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug, Clone)]
struct GlobalOptions {
    /// Catalog file, or a directory containing `systems.db`.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log filter directive (overrides RUST_LOG), e.g. `debug`.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Plot a route between two systems or coordinates.
    Route(RouteArgs),
    /// List the catalog systems closest to a system or coordinates.
    Nearest {
        /// System name or `x,y,z`.
        #[arg(long)]
        near: String,
        /// Number of systems to list.
        #[arg(long, default_value_t = 10)]
        count: usize,
        /// Only list systems within this many light-years.
        #[arg(long)]
        radius: Option<f64>,
    },
    /// Look up a system by name.
    Resolve {
        /// System name (case-insensitive).
        name: String,
    },
}

#[derive(clap::Args, Debug)]
struct RouteArgs {
    /// Starting system name or `x,y,z` coordinates.
    #[arg(long = "from")]
    from: String,
    /// Destination system name or `x,y,z` coordinates.
    #[arg(long = "to")]
    to: String,
    /// Maximum hop distance in light-years.
    #[arg(long)]
    range: f64,
    /// Tie-break policy among systems in the search window.
    #[arg(long, default_value_t = RouteMetric::NearestWaypoint, value_parser = parse_metric)]
    metric: RouteMetric,
    /// Widen range and search radius when a hop finds no system.
    #[arg(long)]
    boost: bool,
    /// Directory services to consult when the catalog has no candidate.
    #[arg(long, default_value_t = LookupMode::None, value_parser = parse_lookup)]
    lookup: LookupMode,
    /// Catalog id of a system never to use as a hop. Repeatable.
    #[arg(long = "avoid")]
    avoid: Vec<SystemId>,
    /// Catalog candidates considered per hop.
    #[arg(long, default_value_t = DEFAULT_CANDIDATE_CAP)]
    candidate_cap: usize,
}

impl From<RouteArgs> for RouteCommandArgs {
    fn from(args: RouteArgs) -> Self {
        Self {
            from: args.from,
            to: args.to,
            range: args.range,
            metric: args.metric,
            boost: args.boost,
            lookup: args.lookup,
            avoid: args.avoid,
            candidate_cap: args.candidate_cap,
        }
    }
}

fn parse_metric(value: &str) -> Result<RouteMetric, String> {
    value.parse().map_err(|error: starplot_lib::Error| {
        let known: Vec<String> = RouteMetric::ALL.iter().map(ToString::to_string).collect();
        format!("{error}; expected one of {}", known.join(", "))
    })
}

fn parse_lookup(value: &str) -> Result<LookupMode, String> {
    value
        .parse()
        .map_err(|error: starplot_lib::Error| error.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&LoggingConfig::from_env(cli.global.log_level.as_deref()))?;

    let GlobalOptions {
        data_dir, format, ..
    } = cli.global;
    match cli.command {
        Command::Route(args) => {
            commands::route::handle_route_command(data_dir, format, args.into()).await
        }
        Command::Nearest {
            near,
            count,
            radius,
        } => commands::nearest::handle_nearest_command(
            data_dir.as_deref(),
            format,
            &near,
            count,
            radius,
        ),
        Command::Resolve { name } => {
            commands::resolve::handle_resolve_command(data_dir.as_deref(), format, &name)
        }
    }
}
