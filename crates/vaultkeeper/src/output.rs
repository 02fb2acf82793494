//! Human and JSON renderings of a [`Report`].

use crate::commands::Report;
use std::fmt::Write as _;
use vaultkeeper_core::{BatchResult, Result, SyncResult, to_json_string};

/// Render a report as pretty JSON or as a short summary
pub fn render(report: &Report, json: bool) -> Result<String> {
    if json {
        return to_json_string(report, "report");
    }
    Ok(summary(report))
}

/// Multi-line human summary
pub fn summary(report: &Report) -> String {
    let mut out = String::new();
    match report {
        Report::GenerateIndex(r) => batch_summary(&mut out, "Index generation", "written", r),
        Report::CleanIndex(r) => batch_summary(&mut out, "Index cleanup", "removed", r),
        Report::EnsureMetadata(r) => {
            batch_summary(&mut out, "Metadata", "modified", &r.batch);
            let s = &r.stats;
            let _ = writeln!(
                out,
                "  tags: {} added, {} removed, {} rejected; fields added: {}",
                s.tags_added, s.tags_removed, s.tags_rejected, s.fields_added
            );
            for warning in &r.warnings {
                let _ = writeln!(out, "  warning {}", warning);
            }
        }
        Report::SyncDirs(r) => sync_summary(&mut out, r),
    }
    out.trim_end().to_string()
}

fn batch_summary(out: &mut String, title: &str, verb: &str, r: &BatchResult) {
    let _ = writeln!(
        out,
        "{}{}: {} processed, {} skipped, {} failed ({} ms)",
        title,
        dry_run_tag(r.dry_run),
        r.processed,
        r.skipped,
        r.failed,
        r.duration_ms
    );
    for path in &r.outputs {
        let _ = writeln!(out, "  {} {}", verb, path.display());
    }
    for error in &r.errors {
        let _ = writeln!(out, "  error {}", error);
    }
}

fn sync_summary(out: &mut String, r: &SyncResult) {
    let _ = writeln!(
        out,
        "Directory sync{}: {} synchronized, {} created in vault, {} created in source, {} skipped, {} failed ({} ms)",
        dry_run_tag(r.dry_run),
        r.synchronized,
        r.created_in_vault,
        r.created_in_source,
        r.skipped,
        r.failed,
        r.duration_ms
    );
    for path in &r.created {
        let _ = writeln!(out, "  created {}", path.display());
    }
    for error in &r.errors {
        let _ = writeln!(out, "  error {}", error);
    }
}

fn dry_run_tag(dry_run: bool) -> &'static str {
    if dry_run { " (dry run)" } else { "" }
}
