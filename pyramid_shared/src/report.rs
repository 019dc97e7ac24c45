//! Metrics reporting.
//!
//! Turns a [`PyramidMetrics`] value into report lines and forwards them to a
//! sink. Computation lives in [`crate::metrics`]; this module only formats
//! and forwards.

use std::fmt;

use serde::Serialize;
use tracing::info;

use crate::metrics::{PyramidMetrics, StepMetrics};

/// One line of a metrics report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum ReportLine {
    Step(StepMetrics),
    Summary {
        total_perimeter: f64,
        total_area: f64,
        total_volume: f64,
    },
}

impl fmt::Display for ReportLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportLine::Step(s) => write!(
                f,
                "step[{}] width={:.3} length={:.3} height={:.3} perimeter={:.3} area={:.3} volume={:.3}",
                s.index, s.width, s.length, s.height, s.perimeter, s.area, s.volume
            ),
            ReportLine::Summary {
                total_perimeter,
                total_area,
                total_volume,
            } => write!(
                f,
                "total perimeter={:.3} area={:.3} volume={:.3}",
                total_perimeter, total_area, total_volume
            ),
        }
    }
}

/// Receives report lines.
pub trait MetricsSink {
    fn emit(&mut self, line: &ReportLine);
}

impl MetricsSink for Vec<ReportLine> {
    fn emit(&mut self, line: &ReportLine) {
        self.push(*line);
    }
}

/// Sink that logs each line as a structured `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl MetricsSink for TracingSink {
    fn emit(&mut self, line: &ReportLine) {
        match line {
            ReportLine::Step(s) => info!(
                target: "pyramid::metrics",
                step = s.index,
                width = s.width,
                length = s.length,
                height = s.height,
                perimeter = s.perimeter,
                area = s.area,
                volume = s.volume,
                "Step"
            ),
            ReportLine::Summary {
                total_perimeter,
                total_area,
                total_volume,
            } => info!(
                target: "pyramid::metrics",
                total_perimeter = *total_perimeter,
                total_area = *total_area,
                total_volume = *total_volume,
                "Pyramid totals"
            ),
        }
    }
}

/// Report lines for `metrics`: one per step, then the totals.
///
/// Empty metrics produce no lines at all.
pub fn report_lines(metrics: &PyramidMetrics) -> Vec<ReportLine> {
    if metrics.is_empty() {
        return Vec::new();
    }
    let mut lines: Vec<ReportLine> = metrics.steps.iter().copied().map(ReportLine::Step).collect();
    lines.push(ReportLine::Summary {
        total_perimeter: metrics.total_perimeter,
        total_area: metrics.total_area,
        total_volume: metrics.total_volume,
    });
    lines
}

/// Forwards every report line to `sink`. Returns the number emitted.
pub fn report_metrics<S: MetricsSink + ?Sized>(metrics: &PyramidMetrics, sink: &mut S) -> usize {
    let lines = report_lines(metrics);
    for line in &lines {
        sink.emit(line);
    }
    lines.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{math::Vec3, metrics::compute_metrics, pyramid::PyramidSpec};

    #[test]
    fn one_line_per_step_plus_summary() {
        let spec = PyramidSpec::from_vectors(
            Vec3::new(6.0, 0.0, 0.0),
            Vec3::new(0.0, 6.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
        );
        let mut sink: Vec<ReportLine> = Vec::new();
        let n = report_metrics(&compute_metrics(&spec), &mut sink);
        assert_eq!(n, 4);
        assert!(matches!(sink[3], ReportLine::Summary { .. }));
        assert_eq!(
            sink[0].to_string(),
            "step[0] width=6.000 length=6.000 height=1.000 perimeter=52.000 area=80.000 volume=36.000"
        );
        assert_eq!(sink[3].to_string(), "total perimeter=108.000 area=120.000 volume=56.000");
    }

    #[test]
    fn empty_metrics_report_nothing() {
        let mut sink: Vec<ReportLine> = Vec::new();
        assert_eq!(report_metrics(&PyramidMetrics::default(), &mut sink), 0);
        assert!(sink.is_empty());
    }
}
