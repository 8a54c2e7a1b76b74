//! Backup-before-write and the atomic overwrite primitive.
//!
//! Every changed file gets a `.bak` sibling holding its pre-patch content
//! before the original is overwritten. The backup is a manual-recovery
//! artifact for the operator; this tool never reads it back.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Suffix appended to the original filename for the backup sibling.
pub const BACKUP_SUFFIX: &str = ".bak";

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("path has no file name: {0}")]
    NoFileName(PathBuf),

    #[error("path has no parent directory: {0}")]
    NoParent(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Sibling path holding the backup: `route.ts` -> `route.ts.bak`.
pub fn backup_path(file_path: &Path) -> Result<PathBuf, WriteError> {
    let name = file_path
        .file_name()
        .ok_or_else(|| WriteError::NoFileName(file_path.to_path_buf()))?;
    let mut backup_name = name.to_os_string();
    backup_name.push(BACKUP_SUFFIX);
    Ok(file_path.with_file_name(backup_name))
}

/// Persist `original_content` to the backup sibling of `file_path`.
///
/// A second call for the same file overwrites the earlier backup; each file
/// is processed at most once per run, so this only matters across runs.
pub fn write_backup(file_path: &Path, original_content: &str) -> Result<(), WriteError> {
    let path = backup_path(file_path)?;
    fs::write(path, original_content)?;
    Ok(())
}

/// Atomic overwrite: tempfile in the same directory + fsync + rename.
///
/// Either the full write lands or the original file is untouched, so an
/// externally killed run never leaves a half-written handler file behind.
pub fn atomic_overwrite(path: &Path, content: &str) -> Result<(), WriteError> {
    let parent = path
        .parent()
        .ok_or_else(|| WriteError::NoParent(path.to_path_buf()))?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content.as_bytes())?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| WriteError::Io(e.error))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_path_appends_suffix() {
        let path = Path::new("/tree/app/api/tickets/route.ts");
        assert_eq!(
            backup_path(path).unwrap(),
            Path::new("/tree/app/api/tickets/route.ts.bak")
        );
    }

    #[test]
    fn test_write_backup_preserves_original_content() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("route.ts");
        fs::write(&file, "original").unwrap();

        write_backup(&file, "original").unwrap();

        let backup = fs::read_to_string(dir.path().join("route.ts.bak")).unwrap();
        assert_eq!(backup, "original");
    }

    #[test]
    fn test_atomic_overwrite_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("route.ts");
        fs::write(&file, "before").unwrap();

        atomic_overwrite(&file, "after").unwrap();

        assert_eq!(fs::read_to_string(&file).unwrap(), "after");
    }

    #[test]
    fn test_second_backup_overwrites_first() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("route.ts");
        fs::write(&file, "v2").unwrap();

        write_backup(&file, "v1").unwrap();
        write_backup(&file, "v2").unwrap();

        let backup = fs::read_to_string(dir.path().join("route.ts.bak")).unwrap();
        assert_eq!(backup, "v2");
    }
}
