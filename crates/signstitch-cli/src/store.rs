use std::path::{Component, Path, PathBuf};

use log::debug;
use signstitch_core::pose::layout::FileIdentity;

use crate::errors::{RenderError, Result};

/// Serves pose files from a configured root directory.
///
/// Every name is validated before it touches the filesystem: empty names,
/// parent-directory segments, and absolute paths are rejected so a request
/// can never read outside the root.
#[derive(Debug, Clone)]
pub struct PoseStore {
    root: PathBuf,
}

impl PoseStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validates `name` and resolves it under the root directory.
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        validate_filename(name)?;
        Ok(self.root.join(name.trim()))
    }

    /// True when a validly named file exists under the root.
    pub fn exists(&self, name: &str) -> bool {
        self.resolve(name).map(|path| path.is_file()).unwrap_or(false)
    }

    /// Reads a pose file's bytes.
    pub fn read(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.resolve(name)?;
        debug!(target: "signstitch_cli::store", "Reading {}", path.display());
        Ok(std::fs::read(path)?)
    }

    /// Identity of the file on disk (size plus mtime), used to key the
    /// layout cache so a rewritten file is never served a stale layout.
    pub fn identity(&self, name: &str) -> Result<FileIdentity> {
        let path = self.resolve(name)?;
        let metadata = std::fs::metadata(path)?;
        Ok(FileIdentity {
            len: metadata.len(),
            modified: metadata.modified()?,
        })
    }
}

/// Rejects names that could escape a serving root.
pub fn validate_filename(name: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(RenderError::InvalidFilename(name.to_string()));
    }
    if trimmed.starts_with('/') || trimmed.starts_with('\\') {
        return Err(RenderError::InvalidFilename(name.to_string()));
    }
    let path = Path::new(trimmed);
    let escapes = path.components().any(|component| {
        matches!(
            component,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if escapes {
        return Err(RenderError::InvalidFilename(name.to_string()));
    }
    Ok(())
}
