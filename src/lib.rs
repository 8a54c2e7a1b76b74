//! Route Limit Patcher: batch insertion of rate-limit guards into Next.js
//! API route handlers.
//!
//! # Architecture
//!
//! A one-directional pipeline over a file tree: discovery finds every
//! `route.ts` under `app/api`, the file's location collapses to a logical
//! route path, an ordered rule table maps that path to a policy token, and a
//! pure text transform splices a guard call (plus its import) into each
//! exported HTTP-verb handler. Changed files get a `.bak` sibling before the
//! atomic overwrite.
//!
//! # Safety
//!
//! - Idempotent: re-running over a patched (or interrupted) tree is a no-op
//! - Backup written before every overwrite
//! - Atomic file writes (tempfile + fsync + rename)
//! - Per-file failure isolation: one bad file never aborts the batch
//!
//! # Example
//!
//! ```no_run
//! use route_limit_patcher::run;
//! use std::path::Path;
//!
//! let report = run(Path::new("/srv/servicedesk"));
//! println!("updated {} of {} files", report.updated, report.total());
//! ```

pub mod backup;
pub mod discover;
pub mod patch;
pub mod policy;
pub mod run;

// Re-exports
pub use backup::{backup_path, write_backup, WriteError, BACKUP_SUFFIX};
pub use discover::{derive_route_path, find_route_files, ROUTE_FILE_NAME};
pub use patch::{patch, PatchOutcome, PatchStatus, LIMITER_MODULE, PATCHED_MARKER};
pub use policy::{PolicyRule, PolicySelector, DEFAULT_POLICY};
pub use run::{run, FileReport, FileStatus, RunReport};
