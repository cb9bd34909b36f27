//! Directory store with transforms applied on every read and write.

use crate::error::TransformResult;
use crate::pipeline::TransformPipeline;
use std::io::{Error, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A named-blob store over a directory, with all bytes passing through a
/// [`TransformPipeline`].
///
/// Failure to open or create the directory is fatal and surfaced from
/// [`open`](Self::open); transforms run inline on the calling thread.
#[derive(Debug)]
pub struct TransformStore {
    root: PathBuf,
    pipeline: TransformPipeline,
}

impl TransformStore {
    /// Opens the store, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the path is
    /// not a directory.
    pub fn open(root: &Path, pipeline: TransformPipeline) -> TransformResult<Self> {
        std::fs::create_dir_all(root)?;
        if !root.is_dir() {
            return Err(Error::other(format!("{} is not a directory", root.display())).into());
        }
        debug!(root = %root.display(), transforms = pipeline.len(), "opened transform store");
        Ok(Self {
            root: root.to_path_buf(),
            pipeline,
        })
    }

    /// Returns the backing directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes a named blob through the pipeline.
    ///
    /// The write goes to a temporary file first and is renamed into place,
    /// so a reader never observes a half-written blob.
    pub fn put(&self, name: &str, data: &[u8]) -> TransformResult<()> {
        let encoded = self.pipeline.encode(data)?;
        let path = self.root.join(name);
        let staging = self.root.join(format!("{name}.tmp"));
        std::fs::write(&staging, &encoded)?;
        std::fs::rename(&staging, &path)?;
        Ok(())
    }

    /// Reads a named blob through the pipeline.
    ///
    /// Absence is `Ok(None)`; a blob that fails to decode (corrupt, or
    /// written under a different pipeline) is an error.
    pub fn get(&self, name: &str) -> TransformResult<Option<Vec<u8>>> {
        let path = self.root.join(name);
        let encoded = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(self.pipeline.decode(&encoded)?))
    }

    /// Returns true if a named blob exists.
    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        self.root.join(name).is_file()
    }

    /// Removes a named blob. Returns whether it existed.
    pub fn remove(&self, name: &str) -> TransformResult<bool> {
        match std::fs::remove_file(self.root.join(name)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
