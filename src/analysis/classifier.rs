//! Heuristic classification of environments as unused.
//!
//! Each rule is a pure function over an [`EnvironmentRecord`], the
//! [`Thresholds`] and the evaluation instant. Rules are independent and
//! combined by OR: one match flags the environment, and every match is kept
//! in the rationale.

use chrono::{DateTime, Duration, Utc};

use crate::report::{CandidateKind, CleanupCandidate, EnvironmentRecord, Reason, Safety};

/// Classifier inputs. There is no `Default`: callers always choose them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    /// Projects untouched for longer than this are inactive.
    pub inactivity: Duration,
    /// Environments of unversioned projects below this size are flagged.
    pub small_size_bytes: u64,
    /// Projects with fewer source files than this are flagged.
    pub min_source_files: usize,
}

impl Thresholds {
    pub fn new(inactive_days: u32, small_size_bytes: u64, min_source_files: usize) -> Self {
        Self {
            inactivity: Duration::days(i64::from(inactive_days)),
            small_size_bytes,
            min_source_files,
        }
    }
}

/// Outcome of classifying one environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Usage {
    InUse,
    Unused { reasons: Vec<Reason> },
}

impl Usage {
    pub fn is_unused(&self) -> bool {
        matches!(self, Usage::Unused { .. })
    }

    pub fn reasons(&self) -> &[Reason] {
        match self {
            Usage::InUse => &[],
            Usage::Unused { reasons } => reasons,
        }
    }
}

type Rule = fn(&EnvironmentRecord, &Thresholds, DateTime<Utc>) -> Option<Reason>;

/// Evaluated in this order; the rationale keeps the same order.
const RULES: [Rule; 3] = [inactive, untracked_and_small, few_source_files];

fn inactive(record: &EnvironmentRecord, thresholds: &Thresholds, now: DateTime<Utc>) -> Option<Reason> {
    let idle = now.signed_duration_since(record.last_modified);
    (idle > thresholds.inactivity).then(|| Reason::Inactive {
        days: idle.num_days(),
    })
}

fn untracked_and_small(
    record: &EnvironmentRecord,
    thresholds: &Thresholds,
    _now: DateTime<Utc>,
) -> Option<Reason> {
    (!record.has_version_control && record.size_bytes < thresholds.small_size_bytes).then_some(
        Reason::UntrackedAndSmall {
            size_bytes: record.size_bytes,
        },
    )
}

fn few_source_files(
    record: &EnvironmentRecord,
    thresholds: &Thresholds,
    _now: DateTime<Utc>,
) -> Option<Reason> {
    (record.source_file_count < thresholds.min_source_files).then_some(Reason::FewSourceFiles {
        count: record.source_file_count,
    })
}

/// Apply every rule to `record` as of `now`.
pub fn classify(record: &EnvironmentRecord, thresholds: &Thresholds, now: DateTime<Utc>) -> Usage {
    let reasons: Vec<Reason> = RULES
        .iter()
        .filter_map(|rule| rule(record, thresholds, now))
        .collect();

    if reasons.is_empty() {
        Usage::InUse
    } else {
        Usage::Unused { reasons }
    }
}

/// Cleanup candidate for an unused environment, or `None` when it is in use.
///
/// Removal is rated [`Safety::Safe`] when the project has been inactive and
/// [`Safety::Caution`] when only the size or source-count signals matched.
pub fn environment_candidate(
    record: &EnvironmentRecord,
    thresholds: &Thresholds,
    now: DateTime<Utc>,
) -> Option<CleanupCandidate> {
    let Usage::Unused { reasons } = classify(record, thresholds, now) else {
        return None;
    };

    let safety = if reasons.iter().any(|r| matches!(r, Reason::Inactive { .. })) {
        Safety::Safe
    } else {
        Safety::Caution
    };

    Some(CleanupCandidate {
        kind: CandidateKind::Environment,
        target: record.path.clone(),
        estimated_bytes_freed: record.size_bytes,
        safety,
        rationale: reasons,
    })
}
