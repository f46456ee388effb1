use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{info, warn};

use crate::check::{ConsistencyReport, Severity, Violation};
use crate::types::RecordType;

/// One violation kept verbatim in a [`ConsistencySummary`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Finding {
    /// Kind of the offending record.
    pub record_type: RecordType,
    /// Id of the offending record.
    pub id: u64,
    /// Severity of the violation.
    pub severity: Severity,
    /// The violation, rendered with `Debug`.
    pub violation: String,
}

/// Outcome of a scan.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ConsistencySummary {
    /// Whether the scan found no error-level violations.
    pub consistent: bool,
    /// Number of records visited.
    pub records_checked: u64,
    /// Violation counts per record kind. Always complete.
    pub counts: BTreeMap<RecordType, usize>,
    /// Error-level violations.
    pub errors: usize,
    /// Warning-level violations.
    pub warnings: usize,
    /// The first findings, up to the configured maximum.
    pub findings: Vec<Finding>,
}

impl ConsistencySummary {
    /// Total number of violations.
    pub fn total(&self) -> usize {
        self.errors + self.warnings
    }

    /// Violations counted for `record_type`.
    pub fn count(&self, record_type: RecordType) -> usize {
        self.counts.get(&record_type).copied().unwrap_or(0)
    }
}

/// Accumulates violations into a summary while a scan runs.
#[derive(Debug)]
pub(crate) struct SummaryBuilder {
    max_findings: usize,
    summary: ConsistencySummary,
}

impl SummaryBuilder {
    pub(crate) fn new(max_findings: usize) -> Self {
        Self {
            max_findings,
            summary: ConsistencySummary::default(),
        }
    }

    /// A sink attributing reported violations to one record.
    pub(crate) fn scope(&mut self, record_type: RecordType, id: u64) -> RecordReporter<'_> {
        self.summary.records_checked += 1;
        RecordReporter {
            builder: self,
            record_type,
            id,
        }
    }

    /// A sink for violations found after the record scan, such as orphaned
    /// chains, which does not count as a visited record.
    pub(crate) fn late(&mut self, record_type: RecordType, id: u64) -> RecordReporter<'_> {
        RecordReporter {
            builder: self,
            record_type,
            id,
        }
    }

    fn push(&mut self, record_type: RecordType, id: u64, severity: Severity, violation: String) {
        *self.summary.counts.entry(record_type).or_insert(0) += 1;
        match severity {
            Severity::Error => self.summary.errors += 1,
            Severity::Warning => self.summary.warnings += 1,
        }
        if self.summary.findings.len() < self.max_findings {
            self.summary.findings.push(Finding {
                record_type,
                id,
                severity,
                violation,
            });
        }
    }

    pub(crate) fn finish(mut self) -> ConsistencySummary {
        self.summary.consistent = self.summary.errors == 0;
        info!(
            consistent = self.summary.consistent,
            records = self.summary.records_checked,
            errors = self.summary.errors,
            warnings = self.summary.warnings,
            "consistency.summary"
        );
        self.summary
    }
}

/// Reporter scoped to one record of a scan.
#[derive(Debug)]
pub(crate) struct RecordReporter<'s> {
    builder: &'s mut SummaryBuilder,
    record_type: RecordType,
    id: u64,
}

impl<V: Violation> ConsistencyReport<V> for RecordReporter<'_> {
    fn report(&mut self, violation: V) {
        let severity = violation.severity();
        let rendered = format!("{violation:?}");
        warn!(
            record_type = %self.record_type,
            id = self.id,
            severity = ?severity,
            violation = %rendered,
            "consistency.violation"
        );
        self.builder
            .push(self.record_type, self.id, severity, rendered);
    }
}
