//! External tool invocation.
//!
//! Only two binaries are ever spawned: `pngquant` (optional PNG optimizer)
//! and `ffmpeg` (mandatory video encoder, see [`encode_ffmpeg`](crate::encode_ffmpeg)).
//! Both are resolved on `PATH` with the `which` crate before use, so a missing
//! binary is reported as [`ToolError::NotFound`] instead of a spawn failure.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("{tool} not found on PATH")]
    NotFound { tool: String },
    #[error("failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{tool} exited with {status}: {stderr}")]
    Failed {
        tool: String,
        status: String,
        stderr: String,
    },
}

/// Resolve a binary name (or path) to an executable.
pub fn resolve_tool(name: &str) -> Result<PathBuf, ToolError> {
    which::which(name).map_err(|_| ToolError::NotFound {
        tool: name.to_string(),
    })
}

/// Run a resolved tool to completion, turning a non-zero exit into an error
/// carrying its trimmed stderr.
pub fn run_tool(name: &str, binary: &Path, args: &[String]) -> Result<(), ToolError> {
    let output = Command::new(binary)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|source| ToolError::Spawn {
            tool: name.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(ToolError::Failed {
            tool: name.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}

/// Lossy PNG optimization pass over transparent masters.
///
/// Implementations write the optimized image to `output`, leaving `input`
/// untouched. Failure is never fatal to the caller.
pub trait PngOptimizer: Sync {
    fn optimize(&self, input: &Path, output: &Path) -> Result<(), ToolError>;
}

/// `pngquant {args} --output OUT IN`
#[derive(Debug, Clone)]
pub struct Pngquant {
    pub binary: String,
    pub args: Vec<String>,
}

impl Pngquant {
    pub fn new(binary: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            binary: binary.into(),
            args,
        }
    }

    /// Full argument list for one file.
    pub fn command_args(&self, input: &Path, output: &Path) -> Vec<String> {
        let mut args = self.args.clone();
        args.push("--output".to_string());
        args.push(output.to_string_lossy().into_owned());
        args.push(input.to_string_lossy().into_owned());
        args
    }
}

impl PngOptimizer for Pngquant {
    fn optimize(&self, input: &Path, output: &Path) -> Result<(), ToolError> {
        let binary = resolve_tool(&self.binary)?;
        run_tool(&self.binary, &binary, &self.command_args(input, output))
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Optimizer that records calls and copies input to output, or fails on demand.
    #[derive(Default)]
    pub struct MockOptimizer {
        pub calls: Mutex<Vec<(PathBuf, PathBuf)>>,
        pub fail: bool,
    }

    impl MockOptimizer {
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        pub fn get_calls(&self) -> Vec<(PathBuf, PathBuf)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl PngOptimizer for MockOptimizer {
        fn optimize(&self, input: &Path, output: &Path) -> Result<(), ToolError> {
            self.calls
                .lock()
                .unwrap()
                .push((input.to_path_buf(), output.to_path_buf()));
            if self.fail {
                return Err(ToolError::Failed {
                    tool: "mock".into(),
                    status: "exit status: 99".into(),
                    stderr: "quality too low".into(),
                });
            }
            std::fs::copy(input, output).map_err(|source| ToolError::Spawn {
                tool: "mock".into(),
                source,
            })?;
            Ok(())
        }
    }

    #[test]
    fn pngquant_args_follow_template() {
        let q = Pngquant::new("pngquant", vec!["--quality=40-60".into(), "--force".into()]);
        let args = q.command_args(Path::new("in.png"), Path::new("out.png"));
        assert_eq!(
            args,
            vec!["--quality=40-60", "--force", "--output", "out.png", "in.png"]
        );
    }

    #[test]
    fn missing_binary_is_not_found() {
        let result = resolve_tool("definitely-not-a-real-binary-7f3a");
        assert!(matches!(result, Err(ToolError::NotFound { .. })));
    }

    #[test]
    fn optimizer_with_missing_binary_fails_softly() {
        let q = Pngquant::new("definitely-not-a-real-binary-7f3a", vec![]);
        let err = q.optimize(Path::new("a.png"), Path::new("b.png")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[cfg(unix)]
    #[test]
    fn run_tool_reports_non_zero_exit() {
        let sh = resolve_tool("sh").unwrap();
        let args = vec!["-c".to_string(), "echo broken >&2; exit 3".to_string()];
        match run_tool("sh", &sh, &args) {
            Err(ToolError::Failed { stderr, .. }) => assert_eq!(stderr, "broken"),
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn run_tool_success() {
        let sh = resolve_tool("sh").unwrap();
        assert!(run_tool("sh", &sh, &["-c".to_string(), "exit 0".to_string()]).is_ok());
    }
}
