use std::time::Instant;

/// Status of a step in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StepStatus {
    /// Attempt started but has not returned yet.
    Attempted,
    /// Attempt failed; the step left no effect.
    Failed,
    /// Attempt succeeded and the effect is still in place.
    Live,
    /// Effect was reversed.
    Compensated,
    /// Reversing the effect failed.
    CompensationFailed,
}

/// Record of one step in a run.
#[derive(Debug)]
pub struct StepRecord {
    /// Position of the step in the sequence.
    pub index: usize,
    /// Name of the step.
    pub name: String,
    /// Current status.
    pub status: StepStatus,
    /// When the attempt started.
    pub started_at: Instant,
    /// When the step last changed status (attempt or compensation finished).
    pub completed_at: Option<Instant>,
    /// Description of compensation (set once the attempt succeeds).
    pub compensation_description: Option<String>,
}

/// Audit log tracking every attempt and compensation of a run.
#[derive(Debug, Default)]
pub struct AuditLog {
    records: Vec<StepRecord>,
    compensation_order: Vec<usize>,
}

impl AuditLog {
    /// Create a new empty audit log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_start(&mut self, index: usize, name: &str) {
        self.records.push(StepRecord {
            index,
            name: name.to_string(),
            status: StepStatus::Attempted,
            started_at: Instant::now(),
            completed_at: None,
            compensation_description: None,
        });
    }

    pub(crate) fn record_failure(&mut self, index: usize) {
        self.update(index, StepStatus::Failed);
    }

    pub(crate) fn record_success(&mut self, index: usize, compensation_description: String) {
        if let Some(record) = self.update(index, StepStatus::Live) {
            record.compensation_description = Some(compensation_description);
        }
    }

    pub(crate) fn record_compensated(&mut self, index: usize) {
        self.compensation_order.push(index);
        self.update(index, StepStatus::Compensated);
    }

    pub(crate) fn record_compensation_failed(&mut self, index: usize) {
        self.compensation_order.push(index);
        self.update(index, StepStatus::CompensationFailed);
    }

    fn update(&mut self, index: usize, status: StepStatus) -> Option<&mut StepRecord> {
        let record = self.records.iter_mut().find(|record| record.index == index)?;
        record.status = status;
        record.completed_at = Some(Instant::now());
        Some(record)
    }

    /// Get all records in the audit log, in step order.
    #[must_use]
    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    /// Indices whose compensation was invoked, in invocation order.
    #[must_use]
    pub fn compensation_order(&self) -> &[usize] {
        &self.compensation_order
    }

    /// Indices of steps whose effect is still in place.
    ///
    /// After a step that failed to compensate, its effect is counted as live:
    /// nothing is known to have reversed it.
    #[must_use]
    pub fn live_indices(&self) -> Vec<usize> {
        self.records
            .iter()
            .filter(|record| {
                matches!(
                    record.status,
                    StepStatus::Live | StepStatus::CompensationFailed
                )
            })
            .map(|record| record.index)
            .collect()
    }

    /// Get a summary of the run for display.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        for record in &self.records {
            let status = match record.status {
                StepStatus::Attempted => "…",
                StepStatus::Live => "✓",
                StepStatus::Failed => "✗",
                StepStatus::Compensated => "↩",
                StepStatus::CompensationFailed => "⚠",
            };
            lines.push(format!("{status} {}", record.name));
        }
        lines.join("\n")
    }
}
