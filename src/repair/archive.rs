use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::filename::LOST_DIR;

/// Move `path` to `lost/` beside it, keeping its name.
///
/// Returns where the file went, or None if it could not be moved. Failure
/// is only logged: the file stays where it was.
pub fn archive_file(path: &Path) -> Option<PathBuf> {
    let Some(name) = path.file_name() else {
        warn!(path = %path.display(), "cannot archive a path without a file name");
        return None;
    };
    let lost = path.parent().unwrap_or_else(|| Path::new(".")).join(LOST_DIR);
    // An existing directory is fine; a real failure shows up in the rename.
    let _ = fs::create_dir(&lost);
    let target = lost.join(name);

    match fs::rename(path, &target) {
        Ok(()) => {
            info!(from = %path.display(), to = %target.display(), "archived");
            Some(target)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "archiving failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moves_into_lost_keeping_name() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("000003.log");
        fs::write(&file, b"data").unwrap();

        let moved = archive_file(&file).unwrap();
        assert_eq!(moved, dir.path().join("lost").join("000003.log"));
        assert!(!file.exists());
        assert_eq!(fs::read(&moved).unwrap(), b"data");
    }

    #[test]
    fn later_archive_replaces_earlier() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("MANIFEST-000001");
        fs::write(&file, b"old").unwrap();
        archive_file(&file).unwrap();
        fs::write(&file, b"new").unwrap();
        let moved = archive_file(&file).unwrap();
        assert_eq!(fs::read(moved).unwrap(), b"new");
    }

    #[test]
    fn missing_file_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        assert!(archive_file(&dir.path().join("000009.sst")).is_none());
        assert!(dir.path().join("lost").is_dir());
    }
}
