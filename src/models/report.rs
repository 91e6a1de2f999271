//! Per-item execution reports
//!
//! The runner reports one outcome per phase; only the primary (call)
//! phase feeds the run-wide failure flag.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Execution phase of a work item
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Setup,
    Call,
    Teardown,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Setup => "setup",
            Phase::Call => "call",
            Phase::Teardown => "teardown",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Outcome of one phase
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseReport {
    pub phase: Phase,
    pub failed: bool,
}

/// Full report for one executed work item
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemReport {
    phases: Vec<PhaseReport>,
}

impl ItemReport {
    /// A report with every phase passing.
    pub fn passed() -> Self {
        let mut report = Self::default();
        report.record(Phase::Setup, false);
        report.record(Phase::Call, false);
        report.record(Phase::Teardown, false);
        report
    }

    /// A report failing in exactly one phase.
    pub fn failed_in(failed_phase: Phase) -> Self {
        let mut report = Self::default();
        report.record(Phase::Setup, failed_phase == Phase::Setup);
        report.record(Phase::Call, failed_phase == Phase::Call);
        report.record(Phase::Teardown, failed_phase == Phase::Teardown);
        report
    }

    pub fn record(&mut self, phase: Phase, failed: bool) {
        self.phases.push(PhaseReport { phase, failed });
    }

    pub fn phases(&self) -> &[PhaseReport] {
        &self.phases
    }

    /// Whether the primary execution phase failed.
    pub fn call_failed(&self) -> bool {
        self.phases
            .iter()
            .any(|p| p.phase == Phase::Call && p.failed)
    }

    pub fn any_failed(&self) -> bool {
        self.phases.iter().any(|p| p.failed)
    }
}
