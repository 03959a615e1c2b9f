//! Rendering of plotter progress records.

use std::io::{self, Write};

use clap::ValueEnum;
use starplot_lib::{Route, RouteRenderMode, RouteStep, RouteSummary, StepKind};

use crate::terminal::ColorPalette;

/// How `route` reports its progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One styled line per record, printed as soon as it is known.
    #[default]
    Text,
    /// One JSON object per record, printed as soon as it is known.
    Ndjson,
    /// A single route summary once the plot ends.
    Json,
}

/// Format one progress record as a line of text (without newline).
pub fn format_step(step: &RouteStep, palette: &ColorPalette) -> String {
    let p = palette;
    match step.kind {
        StepKind::Start => format!(
            "{}START{} {}{}{} {}[{}]{}",
            p.tag_start, p.reset, p.white_bold, step.label, p.reset, p.gray, step.position, p.reset
        ),
        StepKind::System => {
            let tag = step
                .system
                .as_ref()
                .and_then(|system| system.tag.as_deref())
                .unwrap_or_default();
            let tag_color = if step.boost.is_some() { p.orange } else { p.gray };
            format!(
                "{}HOP{} {:>3} {}{}{} {}{:.2} ly{} {}({}){}",
                p.tag_system,
                p.reset,
                step.hop,
                p.white_bold,
                step.label,
                p.reset,
                p.green,
                step.distance,
                p.reset,
                tag_color,
                tag,
                p.reset
            )
        }
        StepKind::Waypoint => format!(
            "{}WAYP{} {:>3} {} {}[{}]{} {}{:.2} ly{}",
            p.tag_waypoint,
            p.reset,
            step.hop,
            step.label,
            p.gray,
            step.position,
            p.reset,
            p.green,
            step.distance,
            p.reset
        ),
        StepKind::StraightLine | StepKind::Travelled => {
            format!("{}: {:.2} ly", step.label, step.distance)
        }
        StepKind::Destination => format!(
            "{}GOAL{} {}{}{} {}{:.2} ly{}",
            p.tag_goal, p.reset, p.white_bold, step.label, p.reset, p.green, step.distance, p.reset
        ),
    }
}

/// Streams records to `out` as the plotter produces them and keeps them for
/// the final summary.
pub struct StepPrinter<W: Write> {
    out: W,
    format: OutputFormat,
    palette: ColorPalette,
    steps: Vec<RouteStep>,
    error: Option<io::Error>,
}

impl<W: Write> StepPrinter<W> {
    pub fn new(out: W, format: OutputFormat, palette: ColorPalette) -> Self {
        Self {
            out,
            format,
            palette,
            steps: Vec::new(),
            error: None,
        }
    }

    /// Record one step. Write failures are kept and reported by [`finish`].
    ///
    /// [`finish`]: StepPrinter::finish
    pub fn record(&mut self, step: &RouteStep) {
        self.steps.push(step.clone());
        if self.error.is_some() {
            return;
        }
        let result = match self.format {
            OutputFormat::Text => writeln!(self.out, "{}", format_step(step, &self.palette)),
            OutputFormat::Ndjson => serde_json::to_writer(&mut self.out, step)
                .map_err(io::Error::from)
                .and_then(|()| writeln!(self.out)),
            OutputFormat::Json => Ok(()),
        };
        if let Err(error) = result.and_then(|()| self.out.flush()) {
            self.error = Some(error);
        }
    }

    /// Emit whatever the format prints after the plot ends.
    pub fn finish(mut self, route: &Route, destination: &str) -> io::Result<W> {
        if let Some(error) = self.error.take() {
            return Err(error);
        }
        let summary = RouteSummary::from_steps(&self.steps, route, destination);
        match self.format {
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut self.out, &summary)?;
                writeln!(self.out)?;
            }
            OutputFormat::Text if !route.arrived => {
                writeln!(self.out, "Stopped before reaching {}", summary.destination)?;
            }
            OutputFormat::Text => {
                let compact = summary.render(RouteRenderMode::Compact);
                write!(self.out, "{}{}{}", self.palette.gray, compact.trim_end(), self.palette.reset)?;
                writeln!(self.out)?;
            }
            OutputFormat::Ndjson => {}
        }
        self.out.flush()?;
        Ok(self.out)
    }
}
