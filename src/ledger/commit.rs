//! Temp-file-then-rename persistence of a ledger.
//!
//! The document is written in full to a sibling of the target (same
//! directory, so the rename stays on one filesystem) and only then moved
//! over the target. A failure while writing leaves the target untouched
//! and removes the temp file. When the platform cannot rename over the
//! target, the temp file is copied over it instead, which is not atomic.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::common::{Error, Result};
use crate::ooxml::xlsx::XlsxDocument;

/// Path of the temporary sibling used while committing to `target`.
pub fn temp_path(target: &Path, suffix: &str) -> PathBuf {
    let mut name = target
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("ledger"));
    name.push(suffix);
    target.with_file_name(name)
}

/// Commits documents through a temporary sibling file.
#[derive(Debug, Clone)]
pub struct AtomicCommitter {
    suffix: String,
}

impl AtomicCommitter {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }

    /// Serialize `doc` and replace `target` with it.
    pub fn commit(&self, doc: &XlsxDocument, target: &Path) -> Result<()> {
        self.commit_with(target, |writer| doc.write_to(writer).map(drop))
    }

    /// Replace `target` with whatever `write` produces.
    ///
    /// The temp file is flushed, synced and closed before the rename; on
    /// any failure up to that point it is removed again.
    pub fn commit_with<F>(&self, target: &Path, write: F) -> Result<()>
    where
        F: FnOnce(&mut BufWriter<File>) -> Result<()>,
    {
        let tmp = temp_path(target, &self.suffix);
        debug!(tmp = %tmp.display(), "writing temporary ledger");

        if let Err(e) = write_temp(&tmp, write) {
            if let Err(cleanup) = fs::remove_file(&tmp)
                && cleanup.kind() != io::ErrorKind::NotFound
            {
                warn!(tmp = %tmp.display(), error = %cleanup, "could not remove temporary file");
            }
            return Err(e);
        }

        replace(&tmp, target)
    }
}

impl Default for AtomicCommitter {
    fn default() -> Self {
        Self::new(".tmp")
    }
}

fn write_temp<F>(tmp: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let commit_err = |source| Error::Commit {
        path: tmp.to_path_buf(),
        source,
    };

    let file = File::create(tmp).map_err(commit_err)?;
    let mut writer = BufWriter::new(file);
    write(&mut writer).map_err(|e| match e {
        Error::Io(source) => commit_err(source),
        other => other,
    })?;
    writer.flush().map_err(commit_err)?;
    let file = writer.into_inner().map_err(|e| commit_err(e.into_error()))?;
    file.sync_all().map_err(commit_err)?;
    Ok(())
}

fn replace(tmp: &Path, target: &Path) -> Result<()> {
    match fs::rename(tmp, target) {
        Ok(()) => Ok(()),
        Err(e) if matches!(e.kind(), io::ErrorKind::CrossesDevices | io::ErrorKind::Unsupported) => {
            warn!(
                target = %target.display(),
                error = %e,
                "atomic replace unsupported, copying over the target"
            );
            fs::copy(tmp, target).map_err(|source| Error::Commit {
                path: target.to_path_buf(),
                source,
            })?;
            fs::remove_file(tmp).map_err(|source| Error::Commit {
                path: tmp.to_path_buf(),
                source,
            })
        },
        Err(source) => Err(Error::Commit {
            path: target.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::xlsx::Worksheet;

    #[test]
    fn temp_is_a_sibling() {
        let target = Path::new("/data/registru.xlsx");
        assert_eq!(temp_path(target, ".tmp"), PathBuf::from("/data/registru.xlsx.tmp"));
        assert_eq!(
            temp_path(Path::new("registru.xlsx"), ".partial"),
            PathBuf::from("registru.xlsx.partial")
        );
    }

    #[test]
    fn commit_replaces_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("registru.xlsx");
        fs::write(&target, b"old").unwrap();

        let mut sheet = Worksheet::new("Registru");
        sheet.set_cell_value(0, 0, "nou");
        AtomicCommitter::default()
            .commit(&XlsxDocument::with_sheet(sheet), &target)
            .unwrap();

        let doc = XlsxDocument::open(&target).unwrap();
        assert_eq!(doc.sheet(0).unwrap().cell_text(0, 0), "nou");
        assert!(!temp_path(&target, ".tmp").exists());
    }

    #[test]
    fn failed_write_keeps_original_and_removes_temp() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("registru.xlsx");
        fs::write(&target, b"original bytes").unwrap();

        let err = AtomicCommitter::default()
            .commit_with(&target, |writer| {
                writer.write_all(b"partial")?;
                Err(Error::Io(io::Error::other("disk full")))
            })
            .unwrap_err();

        assert!(matches!(err, Error::Commit { .. }));
        assert_eq!(fs::read(&target).unwrap(), b"original bytes");
        assert!(!temp_path(&target, ".tmp").exists());
    }

    #[test]
    fn missing_directory_is_an_io_failure() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("absent").join("registru.xlsx");

        let err = AtomicCommitter::default()
            .commit_with(&target, |_| Ok(()))
            .unwrap_err();
        assert_eq!(err.kind(), crate::common::ErrorKind::IoFailure);
        assert!(!target.exists());
    }

    #[test]
    fn empty_document_fails_before_touching_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("registru.xlsx");
        fs::write(&target, b"original bytes").unwrap();

        assert!(AtomicCommitter::default().commit(&XlsxDocument::new(), &target).is_err());
        assert_eq!(fs::read(&target).unwrap(), b"original bytes");
        assert!(!temp_path(&target, ".tmp").exists());
    }
}
