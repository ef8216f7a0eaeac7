use crate::error::ReportError;
use crate::metrics::MetricKind;
use strum::{Display, IntoStaticStr};

/// A step of a metric's pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    /// Navigating to the metric's page and reading it or starting its export.
    Extract,

    /// Waiting for the export artifact to appear.
    Wait,

    /// Validating the extracted data.
    Parse,

    /// Appending records to a workbook.
    Store,

    /// Mirroring a per-metric sheet into the consolidated report.
    Merge,
}

/// A stage error, tagged with the stage it happened in.
#[derive(Debug)]
pub struct StageFailure {
    pub stage: Stage,
    pub error: ReportError,
}

impl StageFailure {
    #[must_use]
    pub const fn new(stage: Stage, error: ReportError) -> Self {
        Self { stage, error }
    }
}

/// How a single metric fared in a run.
#[derive(Debug)]
pub enum StageOutcome {
    /// Records were stored; `rejected` counts rows dropped by validation.
    Completed { stored: usize, rejected: usize },

    /// The metric was skipped for this run.
    Skipped(StageFailure),
}

#[derive(Debug)]
pub struct MetricReport {
    pub kind: MetricKind,
    pub outcome: StageOutcome,
}

impl MetricReport {
    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        matches!(self.outcome, StageOutcome::Skipped(_))
    }
}

/// Outcome of every metric of a run, in processing order.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub metrics: Vec<MetricReport>,
}

impl RunSummary {
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.metrics.iter().filter(|m| m.is_skipped()).count()
    }

    #[must_use]
    pub fn completed(&self) -> usize {
        self.metrics.len() - self.skipped()
    }

    #[must_use]
    pub fn get(&self, kind: MetricKind) -> Option<&MetricReport> {
        self.metrics.iter().find(|m| m.kind == kind)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let summary = RunSummary {
            metrics: vec![
                MetricReport {
                    kind: MetricKind::IndexedPages,
                    outcome: StageOutcome::Completed { stored: 1, rejected: 0 },
                },
                MetricReport {
                    kind: MetricKind::BrokenLinks,
                    outcome: StageOutcome::Skipped(StageFailure::new(
                        Stage::Extract,
                        ReportError::Extraction {
                            kind: MetricKind::BrokenLinks,
                            reason: "export button missing".into(),
                        },
                    )),
                },
            ],
        };

        assert_eq!(summary.completed(), 1);
        assert_eq!(summary.skipped(), 1);
        assert!(summary.get(MetricKind::BrokenLinks).unwrap().is_skipped());
        assert!(summary.get(MetricKind::TotalClicks).is_none());
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::Merge.to_string(), "merge");
        let name: &'static str = Stage::Wait.into();
        assert_eq!(name, "wait");
    }
}
