//! Request-scoped workspace: a temp directory holding inputs and outputs.
//!
//! Every delegate works on files, never on in-memory buffers, so each request
//! gets its own `TempDir`. Inputs are written under neutral names
//! (`input-0.pdf`, `input-1.png`, …) so user-supplied filenames never reach a
//! command line or a path join. Dropping the [`Workspace`] removes the
//! directory and everything a delegate left in it, on success, error, panic
//! or task cancellation alike.

use crate::error::ConvertError;
use crate::operation::extension_of;
use crate::request::InputFile;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

/// Bytes every PDF starts with.
const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// An input written into the workspace.
#[derive(Debug, Clone)]
pub struct StagedInput {
    /// Original filename, for messages and progress.
    pub name: String,
    /// Location inside the workspace.
    pub path: PathBuf,
}

/// A request's private temp directory.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create a fresh, uniquely-named directory under `root` (or the system
    /// temp directory).
    pub fn create(root: Option<&Path>) -> Result<Self, ConvertError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("convertkit-");
        let dir = match root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(ConvertError::workspace)?;
        debug!("Created workspace {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path for an output file inside the workspace.
    pub fn output_path(&self, extension: &str) -> PathBuf {
        self.dir.path().join(format!("output.{extension}"))
    }

    /// Write every input to disk, preserving order.
    pub async fn stage_inputs(&self, inputs: &[InputFile]) -> Result<Vec<StagedInput>, ConvertError> {
        let mut staged = Vec::with_capacity(inputs.len());
        for (idx, input) in inputs.iter().enumerate() {
            let ext = extension_of(&input.name).unwrap_or_else(|| "bin".to_string());
            let path = self.dir.path().join(format!("input-{idx}.{ext}"));
            tokio::fs::write(&path, &input.bytes)
                .await
                .map_err(ConvertError::workspace)?;
            debug!(
                "Staged '{}' ({} bytes) → {}",
                input.name,
                input.bytes.len(),
                path.display()
            );
            staged.push(StagedInput {
                name: input.name.clone(),
                path,
            });
        }
        Ok(staged)
    }

    /// Read a produced file back into memory.
    pub async fn read_output(&self, path: &Path, tool: &str) -> Result<Vec<u8>, ConvertError> {
        match tokio::fs::read(path).await {
            Ok(bytes) if !bytes.is_empty() => Ok(bytes),
            Ok(_) => Err(ConvertError::OutputMissing {
                tool: tool.to_string(),
                expected: path.to_path_buf(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ConvertError::OutputMissing {
                    tool: tool.to_string(),
                    expected: path.to_path_buf(),
                })
            }
            Err(e) => Err(ConvertError::workspace(e)),
        }
    }
}

/// Reject inputs that are obviously not PDFs before any parser sees them.
pub fn ensure_pdf(input: &InputFile) -> Result<(), ConvertError> {
    if input.bytes.starts_with(PDF_MAGIC) {
        return Ok(());
    }
    let magic = input.bytes.iter().take(4).copied().collect();
    Err(ConvertError::NotAPdf {
        name: input.name.clone(),
        magic,
    })
}
