use std::{
    io::Write,
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;

use crate::ExportError;

/// Write `contents` to `path` through a temporary file in the same directory.
///
/// The destination is only replaced once every byte is written, so it either holds the previous
/// content or the new one. The temporary file is removed on failure.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), ExportError> {
    let io_error = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    std::fs::create_dir_all(dir).map_err(io_error)?;

    let mut file = NamedTempFile::new_in(dir).map_err(io_error)?;
    file.write_all(contents).map_err(io_error)?;
    file.as_file().sync_all().map_err(io_error)?;
    file.persist(path).map_err(|err| io_error(err.error))?;

    log::debug!("Wrote {} bytes to {:?}", contents.len(), path);

    Ok(())
}

/// Files of one run, rendered before anything is written.
#[derive(Debug, Default)]
pub(crate) struct OutputBatch {
    files: Vec<(PathBuf, String)>,
}

impl OutputBatch {
    pub fn push(&mut self, path: impl Into<PathBuf>, contents: String) {
        self.files.push((path.into(), contents));
    }

    /// Write every file, in order.
    ///
    /// When a write fails, the files this batch already wrote are removed before the error is
    /// returned.
    pub fn write(self) -> Result<Vec<PathBuf>, ExportError> {
        let mut written = Vec::with_capacity(self.files.len());

        for (path, contents) in self.files {
            if let Err(err) = write_atomic(&path, contents.as_bytes()) {
                for path in written.iter() {
                    if let Err(remove_err) = std::fs::remove_file(path) {
                        log::warn!("Could not remove {:?}: {}", path, remove_err);
                    }
                }
                return Err(err);
            }
            written.push(path);
        }

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.c");
        std::fs::write(&path, "old").unwrap();

        write_atomic(&path, b"new").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("weights.json");

        write_atomic(&path, b"{}").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn failed_batch_removes_written_files() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let first = dir.path().join("weights.json");
        let mut batch = OutputBatch::default();
        batch.push(&first, "{}".to_string());
        batch.push(blocker.join("weights.c"), "// nothing".to_string());

        let err = batch.write().unwrap_err();

        assert!(matches!(err, ExportError::Io { .. }));
        assert!(!first.exists());
    }
}
