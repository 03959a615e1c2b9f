use std::fmt::Write;

use serde::Serialize;

use crate::db::SystemId;
use crate::geometry::Point3D;
use crate::routing::{Route, RouteStep, StepKind};

/// Presentation style for turning a [`RouteSummary`] into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RouteRenderMode {
    /// One line per hop with distance and tag.
    #[default]
    PlainText,
    /// Hop labels joined on a single line.
    Compact,
}

/// One hop of a finished plot.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SummaryStep {
    pub index: usize,
    pub kind: StepKind,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<SystemId>,
    pub position: Point3D,
    pub distance: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

/// Structured representation of a plotted route that higher-level consumers
/// can serialise.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RouteSummary {
    pub start: String,
    pub destination: String,
    pub arrived: bool,
    pub hops: usize,
    pub waypoints: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub straight_line: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub travelled: Option<f64>,
    pub steps: Vec<SummaryStep>,
}

impl RouteSummary {
    /// Fold the records streamed by the plotter into a summary.
    ///
    /// `destination` is the requested destination name, used when the plot
    /// stopped before reaching it.
    pub fn from_steps(steps: &[RouteStep], route: &Route, destination: &str) -> Self {
        let mut summary = Self {
            start: String::new(),
            destination: destination.to_string(),
            arrived: route.arrived,
            hops: 0,
            waypoints: 0,
            straight_line: None,
            travelled: None,
            steps: Vec::new(),
        };

        for step in steps {
            match step.kind {
                StepKind::StraightLine => summary.straight_line = Some(step.distance),
                StepKind::Travelled => summary.travelled = Some(step.distance),
                kind => {
                    if kind == StepKind::Start {
                        summary.start = step.label.clone();
                    } else {
                        summary.hops += 1;
                    }
                    if kind == StepKind::Waypoint {
                        summary.waypoints += 1;
                    }
                    if kind == StepKind::Destination {
                        summary.destination = step.label.clone();
                    }
                    let system = step.system.as_ref();
                    summary.steps.push(SummaryStep {
                        index: summary.steps.len(),
                        kind,
                        name: step.label.clone(),
                        id: system.and_then(|system| system.id),
                        position: step.position,
                        distance: step.distance,
                        tag: system.and_then(|system| system.tag.clone()),
                    });
                }
            }
        }

        summary
    }

    /// Render the summary using the requested textual mode.
    pub fn render(&self, mode: RouteRenderMode) -> String {
        match mode {
            RouteRenderMode::PlainText => self.render_plain(),
            RouteRenderMode::Compact => self.render_compact(),
        }
    }

    fn render_plain(&self) -> String {
        let mut buffer = String::new();
        let _ = writeln!(
            buffer,
            "Route: {} -> {} ({} hops, {} waypoints)",
            self.start, self.destination, self.hops, self.waypoints
        );
        for step in &self.steps {
            let _ = write!(
                buffer,
                "{:>3}: {} [{}] {:.2} ly",
                step.index, step.name, step.position, step.distance
            );
            if let Some(tag) = &step.tag {
                let _ = write!(buffer, " ({tag})");
            }
            buffer.push('\n');
        }
        if let Some(distance) = self.straight_line {
            let _ = writeln!(buffer, "Straight line distance: {distance:.2} ly");
        }
        if let Some(distance) = self.travelled {
            let _ = writeln!(buffer, "Travelled distance: {distance:.2} ly");
        }
        if !self.arrived {
            let _ = writeln!(buffer, "Stopped before reaching {}", self.destination);
        }
        buffer
    }

    fn render_compact(&self) -> String {
        let mut joined = self
            .steps
            .iter()
            .map(|step| step.name.as_str())
            .collect::<Vec<_>>()
            .join(" -> ");
        joined.push('\n');
        joined
    }
}
