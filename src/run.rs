//! Batch orchestration: discover, classify, patch, write, aggregate.
//!
//! Each file is fully read, transformed, and written before the next is
//! considered. Per-file faults are recorded and never abort the batch; the
//! only cross-file state is the read-only rule table and the counters.

use crate::backup::{atomic_overwrite, write_backup};
use crate::discover::{derive_route_path, find_route_files};
use crate::patch::{patch, PatchStatus};
use crate::policy::PolicySelector;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Subdirectory of the project root that holds the route tree.
const API_SUBDIR: &str = "app/api";

/// Final status of one processed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    /// Guard and/or import inserted; backup written, file overwritten.
    Updated {
        policy: String,
        /// Guards were inserted but no import line existed to splice after.
        /// The file references a symbol it never imports.
        import_missing: bool,
    },
    /// The already-patched marker was present.
    AlreadyPatched,
    /// No handlers to guard and nothing to import; file untouched.
    Unchanged,
    /// Read or write fault; the batch continued past it.
    Error(String),
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileStatus::Updated {
                policy,
                import_missing: false,
            } => write!(f, "Updated ({policy})"),
            FileStatus::Updated {
                policy,
                import_missing: true,
            } => write!(f, "Updated ({policy}) - WARNING: no import block found"),
            FileStatus::AlreadyPatched => write!(f, "Already updated"),
            FileStatus::Unchanged => write!(f, "No changes needed"),
            FileStatus::Error(msg) => write!(f, "Error: {msg}"),
        }
    }
}

/// One line of the run report.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub route_path: String,
    pub status: FileStatus,
}

/// Aggregate outcome of a run.
#[derive(Debug, Clone, Default)]
#[must_use = "RunReport carries the error count"]
pub struct RunReport {
    pub files: Vec<FileReport>,
    pub updated: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl RunReport {
    pub fn total(&self) -> usize {
        self.files.len()
    }

    fn record(&mut self, report: FileReport) {
        match report.status {
            FileStatus::Updated { .. } => self.updated += 1,
            FileStatus::AlreadyPatched | FileStatus::Unchanged => self.skipped += 1,
            FileStatus::Error(_) => self.errors += 1,
        }
        self.files.push(report);
    }
}

/// Run the whole batch over `<project_root>/app/api`.
///
/// Infallible at the batch level: per-file faults become
/// [`FileStatus::Error`] entries and processing continues. Zero discovered
/// files is a valid, empty report.
pub fn run(project_root: &Path) -> RunReport {
    let api_dir = project_root.join(API_SUBDIR);
    let selector = PolicySelector::standard();

    let mut report = RunReport::default();
    for file_path in find_route_files(&api_dir) {
        let route_path = derive_route_path(&file_path, project_root);
        let status = process_file(&file_path, &route_path, &selector)
            .unwrap_or_else(|e| FileStatus::Error(e.to_string()));
        report.record(FileReport {
            path: file_path,
            route_path,
            status,
        });
    }
    report
}

/// Read, patch, and (when changed) back up and overwrite one file.
///
/// The backup always lands before the overwrite, so an operator can restore
/// any file the report lists as updated.
fn process_file(
    file_path: &Path,
    route_path: &str,
    selector: &PolicySelector,
) -> anyhow::Result<FileStatus> {
    let original = fs::read_to_string(file_path)?;
    let policy = selector.select(route_path);

    let outcome = patch(&original, policy);
    match outcome.status {
        PatchStatus::AlreadyPatched => Ok(FileStatus::AlreadyPatched),
        PatchStatus::Unchanged => Ok(FileStatus::Unchanged),
        PatchStatus::Updated { import_missing, .. } => {
            write_backup(file_path, &original)?;
            atomic_overwrite(file_path, &outcome.content)?;
            Ok(FileStatus::Updated {
                policy: policy.to_string(),
                import_missing,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROUTE_WITH_HANDLER: &str = r#"import { NextRequest, NextResponse } from 'next/server';

export async function POST(request: NextRequest) {
  return NextResponse.json({ ok: true });
}
"#;

    fn write_route(root: &Path, rel: &str, content: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_run_patches_and_counts() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let ticket = write_route(root, "app/api/tickets/create/route.ts", ROUTE_WITH_HANDLER);
        write_route(root, "app/api/health/route.ts", "export const dynamic = 'auto';\n");

        let report = run(root);

        assert_eq!(report.total(), 2);
        assert_eq!(report.updated, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.errors, 0);

        let patched = fs::read_to_string(&ticket).unwrap();
        assert!(patched.contains("RATE_LIMITS.TICKET_MUTATION"));
    }

    #[test]
    fn test_backup_holds_pre_run_content() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let file = write_route(root, "app/api/auth/login/route.ts", ROUTE_WITH_HANDLER);

        let report = run(root);
        assert_eq!(report.updated, 1);

        let backup = fs::read_to_string(file.with_file_name("route.ts.bak")).unwrap();
        assert_eq!(backup, ROUTE_WITH_HANDLER);
    }

    #[test]
    fn test_policy_selected_from_derived_route() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let file = write_route(
            root,
            "app/api/tickets/[id]/comments/route.ts",
            ROUTE_WITH_HANDLER,
        );

        let report = run(root);
        assert_eq!(
            report.files[0].route_path,
            "/api/tickets/[id]/comments"
        );
        let patched = fs::read_to_string(&file).unwrap();
        assert!(patched.contains("applyRateLimit(request, RATE_LIMITS.TICKET_COMMENT)"));
    }

    #[test]
    fn test_rerun_skips_everything() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let file = write_route(root, "app/api/search/route.ts", ROUTE_WITH_HANDLER);

        let first = run(root);
        assert_eq!(first.updated, 1);
        let after_first = fs::read_to_string(&file).unwrap();

        let second = run(root);
        assert_eq!(second.updated, 0);
        assert_eq!(second.skipped, 1);
        assert_eq!(second.files[0].status, FileStatus::AlreadyPatched);
        assert_eq!(fs::read_to_string(&file).unwrap(), after_first);
    }

    #[test]
    fn test_failure_isolation_continues_past_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        // Invalid UTF-8 makes the read fail for this file only
        let bad = root.join("app/api/ai/route.ts");
        fs::create_dir_all(bad.parent().unwrap()).unwrap();
        fs::write(&bad, [0xff, 0xfe, 0x00]).unwrap();
        let good = write_route(root, "app/api/workflows/execute/route.ts", ROUTE_WITH_HANDLER);

        let report = run(root);

        assert_eq!(report.total(), 2);
        assert_eq!(report.errors, 1);
        assert_eq!(report.updated, 1);
        assert!(matches!(report.files[0].status, FileStatus::Error(_)));
        assert!(fs::read_to_string(&good)
            .unwrap()
            .contains("RATE_LIMITS.WORKFLOW_EXECUTE"));
    }

    #[test]
    fn test_empty_tree_is_a_valid_empty_report() {
        let dir = tempfile::tempdir().unwrap();
        let report = run(dir.path());
        assert_eq!(report.total(), 0);
        assert_eq!(report.updated + report.skipped + report.errors, 0);
    }
}
