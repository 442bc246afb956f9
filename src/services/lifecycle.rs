//! Report state machine.
//!
//! ```text
//! pending  --verify(fake)-->      archived (removed from the live set)
//! pending  --verify(verified)-->  verified
//! verified|assigned --assign-->   assigned
//! assigned|verified|in_progress --advance(in_progress)--> in_progress
//! assigned|verified|in_progress --advance(resolved)-->    resolved
//! ```

use crate::error::{AppError, AppResult};
use crate::models::ReportStatus;
use std::str::FromStr;

/// Outcome a field head picks when reviewing a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyDecision {
    Verified,
    Fake,
}

impl FromStr for VerifyDecision {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "verified" => Ok(VerifyDecision::Verified),
            "fake" => Ok(VerifyDecision::Fake),
            other => Err(AppError::InvalidTransition(format!(
                "verification status must be 'verified' or 'fake', got '{other}'"
            ))),
        }
    }
}

/// Work states a maintainer may move a report into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkStatus {
    InProgress,
    Resolved,
}

impl WorkStatus {
    pub fn status(self) -> ReportStatus {
        match self {
            WorkStatus::InProgress => ReportStatus::InProgress,
            WorkStatus::Resolved => ReportStatus::Resolved,
        }
    }

    /// Phrase used in the reporter notification.
    pub fn describe(self) -> &'static str {
        match self {
            WorkStatus::InProgress => "is being worked on",
            WorkStatus::Resolved => "has been resolved",
        }
    }
}

impl FromStr for WorkStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "in_progress" => Ok(WorkStatus::InProgress),
            "resolved" => Ok(WorkStatus::Resolved),
            other => Err(AppError::InvalidTransition(format!(
                "status must be 'in_progress' or 'resolved', got '{other}'"
            ))),
        }
    }
}

/// Assignment is only meaningful once a report has been verified; an assigned
/// report may be handed to another field head.
pub fn check_assign(current: ReportStatus) -> AppResult<()> {
    match current {
        ReportStatus::Verified | ReportStatus::Assigned => Ok(()),
        other => Err(AppError::InvalidTransition(format!(
            "cannot assign a report in status '{other}'"
        ))),
    }
}

/// Work can only start or finish on reports that passed verification.
pub fn check_advance(current: ReportStatus) -> AppResult<()> {
    match current {
        ReportStatus::Assigned | ReportStatus::Verified | ReportStatus::InProgress => Ok(()),
        other => Err(AppError::InvalidTransition(format!(
            "cannot update a report in status '{other}'"
        ))),
    }
}
