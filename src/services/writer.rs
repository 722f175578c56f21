use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::StampError;

/// All-or-nothing writer for the files of one run
///
/// Every file is first written to a temporary file in the destination
/// directory. Nothing becomes visible under its final name until
/// [`commit`](Self::commit); dropping the writer discards the staged files.
#[derive(Debug)]
pub struct StagedOutput {
    dir: PathBuf,
    staged: Vec<(NamedTempFile, PathBuf)>,
}

impl StagedOutput {
    pub fn new(dir: &Path) -> Result<Self, StampError> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            staged: Vec::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Stage `bytes` to be written as `name` inside the output directory
    pub fn stage(&mut self, name: &str, bytes: &[u8]) -> Result<PathBuf, StampError> {
        let target = self.dir.join(name);
        let mut file = NamedTempFile::new_in(&self.dir)?;
        file.write_all(bytes)?;
        file.as_file().sync_all()?;
        self.staged.push((file, target.clone()));
        Ok(target)
    }

    /// Move every staged file to its final name, in staging order
    ///
    /// Renames happen one at a time. If one fails, the files this commit
    /// already moved are deleted, together with any older file still sitting
    /// under a name this commit would have written, so the directory never
    /// mixes new and old outputs. Stage the file readers look for first as
    /// the last one.
    pub fn commit(self) -> Result<Vec<PathBuf>, StampError> {
        let targets: Vec<PathBuf> = self.staged.iter().map(|(_, t)| t.clone()).collect();
        let mut written = Vec::with_capacity(targets.len());
        for (file, target) in self.staged {
            if let Err(e) = file.persist(&target) {
                tracing::warn!(path = %target.display(), error = %e.error, "Commit failed, rolling back");
                for path in &targets {
                    if let Err(err) = remove_stale(path) {
                        tracing::warn!(path = %path.display(), %err, "Could not remove artifact");
                    }
                }
                return Err(StampError::Io(e.error));
            }
            tracing::debug!(path = %target.display(), "Wrote artifact");
            written.push(target);
        }
        Ok(written)
    }
}

/// Delete a leftover file from an earlier run, if present
pub fn remove_stale(path: &Path) -> Result<bool, StampError> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "Removed stale artifact");
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}
