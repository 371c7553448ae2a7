//! Running external converters (office suite, ffmpeg).
//!
//! A [`Tool`] knows its executable names and how to tell the user to install
//! it. [`locate`] resolves the executable (explicit path first, then `PATH`)
//! and [`run`] executes it with piped output and an optional wall-clock
//! limit.
//!
//! On Unix the child leads its own process group. `soffice` is a launcher
//! that forks the real converter (`soffice.bin`), so killing only the direct
//! child would leave the converter writing into a deleted workspace. A
//! timeout or a cancelled request therefore signals the whole group.

use crate::error::ConvertError;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

/// Keep the end of stderr; converters print the actual failure last.
const STDERR_TAIL_CHARS: usize = 2000;

/// An external program a conversion delegates to.
#[derive(Debug, Clone, Copy)]
pub struct Tool {
    /// Name used in messages.
    pub name: &'static str,
    /// Executable names tried on `PATH`, in order.
    candidates: &'static [&'static str],
    /// Installation advice shown when the tool is missing.
    hint: &'static str,
}

/// LibreOffice, for slides-to-pdf.
pub const SOFFICE: Tool = Tool {
    name: "soffice",
    candidates: &["soffice", "libreoffice"],
    hint: "Install LibreOffice: macOS 'brew install --cask libreoffice', \
Linux 'apt install libreoffice', Windows 'winget install LibreOffice.LibreOffice'. \
For a custom location pass --soffice or set CONVERTKIT_SOFFICE.",
};

/// ffmpeg, for video-to-audio.
pub const FFMPEG: Tool = Tool {
    name: "ffmpeg",
    candidates: &["ffmpeg"],
    hint: "Install ffmpeg: macOS 'brew install ffmpeg', Linux 'apt install ffmpeg', \
Windows 'winget install ffmpeg'. \
For a custom location pass --ffmpeg or set CONVERTKIT_FFMPEG.",
};

/// Resolve the executable for `tool`.
pub fn locate(tool: &Tool, explicit: Option<&Path>) -> Result<PathBuf, ConvertError> {
    if let Some(path) = explicit {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        return Err(ConvertError::MissingDependency {
            tool: tool.name.to_string(),
            hint: format!("Configured path '{}' does not exist.\n{}", path.display(), tool.hint),
        });
    }
    for candidate in tool.candidates {
        if let Ok(path) = which::which(candidate) {
            debug!("Found {} at {}", tool.name, path.display());
            return Ok(path);
        }
    }
    Err(ConvertError::MissingDependency {
        tool: tool.name.to_string(),
        hint: tool.hint.to_string(),
    })
}

/// Run `program` with `args`, failing on a non-zero exit.
///
/// `timeout_secs: None` waits indefinitely.
pub async fn run<I, S>(
    tool: &Tool,
    program: &Path,
    args: I,
    timeout_secs: Option<u64>,
) -> Result<Output, ConvertError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    command.process_group(0);
    debug!("Running {:?}", command.as_std());

    let child = command.spawn().map_err(|e| ConvertError::MissingDependency {
        tool: tool.name.to_string(),
        hint: format!("Could not start '{}': {e}\n{}", program.display(), tool.hint),
    })?;
    let mut group = GroupGuard::new(child.id());

    let output = match timeout_secs {
        Some(secs) => match timeout(Duration::from_secs(secs), child.wait_with_output()).await {
            Ok(result) => result,
            Err(_) => {
                // `group` is dropped on return and kills every process left.
                warn!("{} exceeded {}s, killed", tool.name, secs);
                return Err(ConvertError::ProcessTimeout {
                    tool: tool.name.to_string(),
                    secs,
                });
            }
        },
        None => child.wait_with_output().await,
    }
    .map_err(|e| ConvertError::Internal(format!("waiting for {} failed: {e}", tool.name)))?;
    group.disarm();

    if !output.status.success() {
        return Err(ConvertError::ProcessFailed {
            tool: tool.name.to_string(),
            code: output.status.code(),
            stderr: diagnostics(&output),
        });
    }
    Ok(output)
}

/// What the tool said about its run: the tail of stderr, or of stdout when
/// stderr is empty.
pub fn diagnostics(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let text = if stderr.trim().is_empty() {
        String::from_utf8_lossy(&output.stdout)
    } else {
        stderr
    };
    tail(text.trim(), STDERR_TAIL_CHARS)
}

/// Kills the child's process group when dropped while armed.
struct GroupGuard {
    pid: Option<u32>,
}

impl GroupGuard {
    fn new(pid: Option<u32>) -> Self {
        Self { pid }
    }

    fn disarm(&mut self) {
        self.pid = None;
    }
}

impl Drop for GroupGuard {
    fn drop(&mut self) {
        if let Some(pid) = self.pid.take() {
            kill_group(pid);
        }
    }
}

#[cfg(unix)]
fn kill_group(pid: u32) {
    let Ok(pgid) = libc::pid_t::try_from(pid) else {
        return;
    };
    // SAFETY: kill(2) takes no pointers; a negative pid targets the group
    // created by process_group(0), whose id equals the leader's pid.
    let rc = unsafe { libc::kill(-pgid, libc::SIGKILL) };
    if rc != 0 {
        debug!(
            "Process group {} already gone: {}",
            pgid,
            std::io::Error::last_os_error()
        );
    }
}

#[cfg(not(unix))]
fn kill_group(_pid: u32) {
    // kill_on_drop already terminated the direct child.
}

/// The last `max` characters of `s`.
fn tail(s: &str, max: usize) -> String {
    let count = s.chars().count();
    if count <= max {
        return s.to_string();
    }
    let skip = count - max;
    format!("…{}", s.chars().skip(skip).collect::<String>())
}
