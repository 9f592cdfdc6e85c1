//! Plain-text rendering of reports for stdout.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};

use crate::analysis::Recommendation;
use crate::cleanup::CleanupOutcome;
use crate::journal::{CleanupLogEntry, MonitorLogEntry};
use crate::monitor::MonitorSession;
use crate::report::{
    CleanupCandidate, DirectorySizeReport, EnvironmentRecord, PackageSizeEntry, ScanFailure,
};
use crate::units::{format_delta, format_size};

const RULE: &str =
    "--------------------------------------------------------------------------------";

pub(crate) fn cache_report(report: &DirectorySizeReport, top: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Cache: {}", report.path.display());

    if !report.exists() {
        let _ = writeln!(out, "  (not found)");
        return out;
    }

    let _ = writeln!(out, "  Total: {}", format_size(report.size_bytes));
    for (name, size) in report.sorted_breakdown().into_iter().take(top) {
        let _ = writeln!(out, "  {:>12}  {name}", format_size(size));
    }
    out
}

pub(crate) fn environment_table(
    records: &[EnvironmentRecord],
    top: usize,
    now: DateTime<Utc>,
) -> String {
    let mut out = String::new();
    let total: u64 = records.iter().map(|r| r.size_bytes).sum();
    let _ = writeln!(
        out,
        "Environments: {} ({})",
        records.len(),
        format_size(total)
    );

    if records.is_empty() {
        return out;
    }

    let _ = writeln!(
        out,
        "  {:>12}  {:>8}  {:>4}  {:>7}  PATH",
        "SIZE", "IDLE", "VCS", "SOURCES"
    );
    for record in records.iter().take(top) {
        let _ = writeln!(
            out,
            "  {:>12}  {:>7}d  {:>4}  {:>7}  {}",
            format_size(record.size_bytes),
            record.days_since_modified(now),
            if record.has_version_control { "yes" } else { "no" },
            record.source_file_count,
            record.path.display()
        );
    }
    if records.len() > top {
        let _ = writeln!(out, "  ... and {} more", records.len() - top);
    }
    out
}

pub(crate) fn package_table(env: &EnvironmentRecord, packages: &[PackageSizeEntry]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Largest packages in {}:", env.path.display());
    if packages.is_empty() {
        let _ = writeln!(out, "  (no packages found)");
    }
    for package in packages {
        let _ = writeln!(out, "  {:>12}  {}", format_size(package.size_bytes), package.name);
    }
    out
}

pub(crate) fn candidate_table(candidates: &[CleanupCandidate]) -> String {
    let mut out = String::new();
    if candidates.is_empty() {
        let _ = writeln!(out, "Nothing to clean up.");
        return out;
    }

    let total: u64 = candidates.iter().map(|c| c.estimated_bytes_freed).sum();
    for (i, candidate) in candidates.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>3}. [{}] {} {} ({})",
            i + 1,
            candidate.safety,
            candidate.kind,
            candidate.target.display(),
            format_size(candidate.estimated_bytes_freed)
        );
        for reason in &candidate.rationale {
            let _ = writeln!(out, "       - {reason}");
        }
    }
    let _ = writeln!(out, "Potential savings: {}", format_size(total));
    out
}

pub(crate) fn recommendation_list(recommendations: &[Recommendation]) -> String {
    let mut out = String::new();
    if recommendations.is_empty() {
        let _ = writeln!(out, "No recommendations: disk usage looks healthy.");
        return out;
    }

    for (i, rec) in recommendations.iter().enumerate() {
        if rec.potential_savings > 0 {
            let _ = writeln!(
                out,
                "{}. {} (saves {})",
                i + 1,
                rec.action,
                format_size(rec.potential_savings)
            );
        } else {
            let _ = writeln!(out, "{}. {}", i + 1, rec.action);
        }
        let _ = writeln!(out, "   {}", rec.description);
    }
    out
}

pub(crate) fn outcome_line(outcome: &CleanupOutcome) -> String {
    let mut line = if outcome.success {
        format!(
            "{}: freed {}",
            outcome.message,
            format_size(outcome.bytes_freed)
        )
    } else {
        format!("Failed: {}", outcome.message)
    };
    if let Some(files) = outcome.files_removed {
        let _ = write!(line, " ({files} files)");
    }
    if let Some(after) = outcome.size_after {
        let _ = write!(line, ", {} remaining", format_size(after));
    }
    line
}

pub(crate) fn monitor_summary(session: &MonitorSession) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "Command: {}", session.command);
    match session.exit_code() {
        Some(code) => {
            let _ = writeln!(out, "Exit code: {code}");
        }
        None => {
            let _ = writeln!(out, "Exit code: terminated by signal");
        }
    }
    let _ = writeln!(
        out,
        "Cache:        {} -> {} ({})",
        format_size(session.before.cache_bytes),
        format_size(session.after.cache_bytes),
        format_delta(session.cache_delta)
    );
    let _ = writeln!(
        out,
        "Environments: {} -> {} ({})",
        format_size(session.before.environment_bytes),
        format_size(session.after.environment_bytes),
        format_delta(session.environment_delta)
    );
    let _ = writeln!(out, "Total change: {}", format_delta(session.delta_bytes));

    if !session.new_packages.is_empty() {
        let names: Vec<&str> = session.new_packages.iter().map(String::as_str).collect();
        let _ = writeln!(out, "New packages: {}", names.join(", "));
    }
    if !session.removed_packages.is_empty() {
        let names: Vec<&str> = session.removed_packages.iter().map(String::as_str).collect();
        let _ = writeln!(out, "Removed packages: {}", names.join(", "));
    }
    let _ = writeln!(out, "{RULE}");
    out
}

pub(crate) fn cleanup_history(entries: &[CleanupLogEntry]) -> String {
    let mut out = String::new();
    if entries.is_empty() {
        let _ = writeln!(out, "No cleanup history.");
        return out;
    }
    for entry in entries {
        let _ = writeln!(
            out,
            "{}  {:<20}  {:>12}  {}{}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.operation.to_string(),
            format_size(entry.bytes_freed),
            entry.target.display(),
            if entry.success { "" } else { "  (failed)" }
        );
    }
    out
}

pub(crate) fn monitor_history(entries: &[MonitorLogEntry]) -> String {
    let mut out = String::new();
    if entries.is_empty() {
        let _ = writeln!(out, "No monitor history.");
        return out;
    }
    for entry in entries {
        let _ = writeln!(
            out,
            "{}  {:>14}  {}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            format_delta(entry.delta_bytes),
            entry.command
        );
        if !entry.new_packages.is_empty() {
            let _ = writeln!(out, "    + {}", entry.new_packages.join(", "));
        }
    }
    out
}

pub(crate) fn failure_lines(failures: &[ScanFailure]) -> impl Iterator<Item = String> + '_ {
    failures.iter().map(|failure| format!("Skipped {failure}"))
}
