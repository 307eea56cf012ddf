//! Per-invocation scratch space for the source and converted files.

use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Prefix of every scratch directory created under the scratch root.
pub const SCRATCH_PREFIX: &str = "heicflow-";

/// A private directory holding `<baseName>` (the fetched source) and
/// `<stem>_converted.jpg` (the transcoded output).
///
/// Each invocation gets its own directory, so concurrent events for the same
/// file name never share scratch files. The directory is removed by
/// [`ScratchSpace::cleanup`] or, failing that, on drop.
#[derive(Debug)]
pub struct ScratchSpace {
    dir: TempDir,
    original: PathBuf,
    converted: PathBuf,
}

impl ScratchSpace {
    pub fn create(root: &Path, file_name: &str, converted_file_name: &str) -> io::Result<Self> {
        std::fs::create_dir_all(root)?;
        let dir = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(root)?;
        let original = dir.path().join(file_name);
        let converted = dir.path().join(converted_file_name);
        Ok(Self {
            dir,
            original,
            converted,
        })
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn original_path(&self) -> &Path {
        &self.original
    }

    pub fn converted_path(&self) -> &Path {
        &self.converted
    }

    /// Remove both scratch files and the directory.
    ///
    /// Files that were never created are ignored. Failures are logged and
    /// swallowed so they never replace the invocation's own result.
    pub fn cleanup(self) {
        for path in [&self.original, &self.converted] {
            match std::fs::remove_file(path) {
                Ok(()) => tracing::debug!(path = %path.display(), "Removed scratch file"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!(
                    error = %e,
                    path = %path.display(),
                    "Failed to remove scratch file"
                ),
            }
        }

        let dir = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            tracing::warn!(error = %e, path = %dir.display(), "Failed to remove scratch directory");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn entries(root: &Path) -> usize {
        std::fs::read_dir(root).unwrap().count()
    }

    #[test]
    fn test_paths_are_deterministic_inside_private_dir() {
        let root = tempdir().unwrap();
        let scratch = ScratchSpace::create(root.path(), "foo.heic", "foo_converted.jpg").unwrap();

        assert!(scratch.dir().starts_with(root.path()));
        assert!(scratch
            .dir()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(SCRATCH_PREFIX));
        assert_eq!(scratch.original_path(), scratch.dir().join("foo.heic"));
        assert_eq!(
            scratch.converted_path(),
            scratch.dir().join("foo_converted.jpg")
        );
    }

    #[test]
    fn test_concurrent_invocations_do_not_collide() {
        let root = tempdir().unwrap();
        let a = ScratchSpace::create(root.path(), "foo.heic", "foo_converted.jpg").unwrap();
        let b = ScratchSpace::create(root.path(), "foo.heic", "foo_converted.jpg").unwrap();
        assert_ne!(a.original_path(), b.original_path());
    }

    #[test]
    fn test_cleanup_removes_everything() {
        let root = tempdir().unwrap();
        let scratch = ScratchSpace::create(root.path(), "foo.heic", "foo_converted.jpg").unwrap();
        std::fs::write(scratch.original_path(), b"heic").unwrap();
        std::fs::write(scratch.converted_path(), b"jpeg").unwrap();

        scratch.cleanup();
        assert_eq!(entries(root.path()), 0);
    }

    #[test]
    fn test_cleanup_tolerates_missing_files() {
        let root = tempdir().unwrap();
        let scratch = ScratchSpace::create(root.path(), "foo.heic", "foo_converted.jpg").unwrap();
        // Failure before transcode: only the original exists
        std::fs::write(scratch.original_path(), b"heic").unwrap();

        scratch.cleanup();
        assert_eq!(entries(root.path()), 0);
    }

    #[test]
    fn test_creates_missing_root() {
        let root = tempdir().unwrap();
        let nested = root.path().join("a").join("b");
        let scratch = ScratchSpace::create(&nested, "x.heif", "x_converted.jpg").unwrap();
        assert!(scratch.dir().starts_with(&nested));
    }
}
