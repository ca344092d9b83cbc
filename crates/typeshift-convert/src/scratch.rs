//! Scratch directory management for conversion jobs.
//!
//! Every request gets its own input and output path inside a shared scratch
//! directory. Names are random UUIDs, so concurrent requests never collide
//! and no coordination is needed. A [`ConversionJob`] owns its two paths and
//! removes them exactly once: explicitly via [`ConversionJob::release`], or
//! when it is dropped.

use crate::format::target_extension;
use crate::Result;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Shared location for transient input and output files.
#[derive(Debug, Clone)]
pub struct ScratchDir {
    root: PathBuf,
}

impl ScratchDir {
    /// Use `root` as the scratch directory, creating it if needed.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Use the system temp directory.
    pub fn system() -> Self {
        Self {
            root: std::env::temp_dir(),
        }
    }

    /// The scratch directory path.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Allocate an unused path `<root>/<uuid>.<extension>`.
    ///
    /// The file is not created. Non-alphanumeric characters are dropped from
    /// the extension so a client-supplied name can never escape the directory.
    pub fn allocate(&self, extension: &str) -> PathBuf {
        let extension: String = extension
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        let id = Uuid::new_v4();
        if extension.is_empty() {
            self.root.join(id.to_string())
        } else {
            self.root.join(format!("{}.{}", id, extension))
        }
    }

    /// Remove each path if present.
    ///
    /// Missing files are fine. Any other failure is logged and swallowed:
    /// cleanup must never fail the request that triggered it.
    pub fn release<I, P>(&self, paths: I)
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        for path in paths {
            remove_quietly(path.as_ref());
        }
    }

    /// Reserve input and output paths for one conversion.
    pub fn begin_job(&self, source_extension: &str, target_format: &str) -> ConversionJob {
        let input = self.allocate(source_extension);
        let output = self.allocate(&target_extension(target_format));
        tracing::debug!(
            input = %input.display(),
            output = %output.display(),
            "Reserved scratch paths"
        );
        ConversionJob {
            input,
            output,
            source_extension: source_extension.to_string(),
            target_format: target_format.to_string(),
            released: false,
        }
    }
}

fn remove_quietly(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "Cleaned up scratch file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to delete scratch file"),
    }
}

/// The input/output file pair of a single conversion request.
///
/// Dropping the job removes both files; `release` does the same eagerly.
/// Either way the removal happens once.
#[derive(Debug)]
pub struct ConversionJob {
    input: PathBuf,
    output: PathBuf,
    source_extension: String,
    target_format: String,
    released: bool,
}

impl ConversionJob {
    /// Path the uploaded bytes are written to.
    pub fn input(&self) -> &Path {
        &self.input
    }

    /// Path the chosen strategy writes its result to.
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Lower-cased source extension.
    pub fn source_extension(&self) -> &str {
        &self.source_extension
    }

    /// Upper-cased target format.
    pub fn target_format(&self) -> &str {
        &self.target_format
    }

    /// Whether the files have already been removed.
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Remove both files now. Later calls and the eventual drop are no-ops.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        remove_quietly(&self.input);
        remove_quietly(&self.output);
    }
}

impl Drop for ConversionJob {
    fn drop(&mut self) {
        self.release();
    }
}
