//! Route-file discovery and route-path derivation.
//!
//! Handler files follow the Next.js app-router convention: every handler
//! lives in a file literally named `route.ts` somewhere under `app/api`. The
//! file's location *is* its URL, so the logical route path is derived purely
//! from the path string.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Fixed handler-file name (a literal, not a glob).
pub const ROUTE_FILE_NAME: &str = "route.ts";

/// Structural fragment stripped out of derived route paths.
const APP_FRAGMENT: &str = "/app";

/// Recursively find every `route.ts` under `root`, sorted.
///
/// The sorted order makes run-to-run processing (and therefore report
/// ordering) stable. Unreadable entries are skipped rather than failing the
/// scan; an empty result is valid.
pub fn find_route_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file() && entry.file_name() == ROUTE_FILE_NAME
        })
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}

/// Collapse a handler file's location into its logical route path.
///
/// Strips the project-root prefix, then removes every `/app` fragment and
/// `/route.ts` suffix from what remains, e.g.
/// `<root>/app/api/tickets/[id]/comments/route.ts` becomes
/// `/api/tickets/[id]/comments`.
///
/// Best effort by design: if the expected fragments are absent the raw
/// remainder comes back unchanged, and a nonsensical route path in the
/// report is the operator's cue that the tree layout is off.
pub fn derive_route_path(file_path: &Path, root: &Path) -> String {
    let file = file_path.to_string_lossy();
    let root = root.to_string_lossy();
    let trimmed = file.strip_prefix(&*root).unwrap_or(&file);
    trimmed
        .replace(APP_FRAGMENT, "")
        .replace(&format!("/{ROUTE_FILE_NAME}"), "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_find_route_files_recursive_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        for rel in [
            "api/tickets/route.ts",
            "api/auth/login/route.ts",
            "api/tickets/[id]/comments/route.ts",
        ] {
            let path = root.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, "export {}\n").unwrap();
        }
        // Decoys: wrong name, wrong extension
        fs::write(root.join("api/tickets/helpers.ts"), "").unwrap();
        fs::write(root.join("api/route.tsx"), "").unwrap();

        let found = find_route_files(root);
        assert_eq!(
            found,
            vec![
                root.join("api/auth/login/route.ts"),
                root.join("api/tickets/[id]/comments/route.ts"),
                root.join("api/tickets/route.ts"),
            ]
        );
    }

    #[test]
    fn test_find_route_files_empty_tree() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_route_files(dir.path()).is_empty());
    }

    #[test]
    fn test_find_route_files_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(find_route_files(&missing).is_empty());
    }

    #[test]
    fn test_derive_route_path() {
        let root = Path::new("/srv/servicedesk");
        let file = Path::new("/srv/servicedesk/app/api/tickets/[id]/comments/route.ts");
        assert_eq!(
            derive_route_path(file, root),
            "/api/tickets/[id]/comments"
        );
    }

    #[test]
    fn test_derive_route_path_without_expected_fragments() {
        // Best effort: no /app, no route.ts, prefix not present
        let root = Path::new("/srv/servicedesk");
        let file = Path::new("/elsewhere/handlers/thing.ts");
        assert_eq!(derive_route_path(file, root), "/elsewhere/handlers/thing.ts");
    }
}
