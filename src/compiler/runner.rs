//! reflexc invocation.
//!
//! Runs `reflexc --check <file>` with a timeout and captures the combined
//! output for parsing. Also handles locating the compiler: known install
//! locations per architecture first, then PATH.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::process::Command;

use crate::error::{Result, RfxgenError};

/// Per-check wall clock limit
const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_secs(30);

/// Toolchain install location on ARM64 targets (Jetson and friends)
const AARCH64_COMPILER: &str = "/home/thinkcircuits/Reflexible/Reflexscript/build/reflexc";

/// Toolchain install location on x86_64
const X86_64_COMPILER: &str =
    "/home/thinkcircuits/Reflexible/reflexible-platforms/tools/reflexc/bin/reflexc";

/// Result of one compiler check
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    /// Exit status zero
    pub success: bool,

    /// stdout followed by stderr, trimmed
    pub output: String,

    /// Check hit the wall clock limit
    pub timed_out: bool,
}

/// Runs compiler checks against candidate files
#[derive(Debug, Clone)]
pub struct CheckRunner {
    compiler: PathBuf,
    timeout: Duration,
}

impl CheckRunner {
    /// Create a runner for the given compiler binary
    pub fn new(compiler: impl Into<PathBuf>) -> Self {
        Self {
            compiler: compiler.into(),
            timeout: DEFAULT_CHECK_TIMEOUT,
        }
    }

    /// Set the per-check timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get the compiler path
    pub fn compiler(&self) -> &Path {
        &self.compiler
    }

    /// Verify the compiler is present and executable.
    ///
    /// Called before the first oracle request so a bad path fails the
    /// session without burning any model calls.
    pub fn preflight(&self) -> Result<()> {
        if !self.compiler.exists() || !is_executable(&self.compiler) {
            return Err(RfxgenError::CompilerMissing(
                self.compiler.display().to_string(),
            ));
        }
        Ok(())
    }

    /// Run `reflexc --check` against a source file.
    ///
    /// A timeout is a failed check, not an error; the synthetic output
    /// flows into feedback like any other compiler message. A vanished
    /// or unreadable compiler binary is fatal.
    pub async fn check(&self, source: &Path) -> Result<CheckOutcome> {
        let run = tokio::time::timeout(
            self.timeout,
            Command::new(&self.compiler)
                .arg("--check")
                .arg(source)
                .kill_on_drop(true)
                .output(),
        )
        .await;

        match run {
            Ok(Ok(output)) => {
                let mut combined = String::from_utf8_lossy(&output.stdout).to_string();
                combined.push_str(&String::from_utf8_lossy(&output.stderr));

                Ok(CheckOutcome {
                    success: output.status.success(),
                    output: combined.trim().to_string(),
                    timed_out: false,
                })
            }
            Ok(Err(e))
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied
                ) =>
            {
                Err(RfxgenError::CompilerMissing(
                    self.compiler.display().to_string(),
                ))
            }
            Ok(Err(e)) => Ok(CheckOutcome {
                success: false,
                output: format!("Error running reflexc: {e}"),
                timed_out: false,
            }),
            Err(_) => Ok(CheckOutcome {
                success: false,
                output: format!("Error: reflexc timed out after {:?}", self.timeout),
                timed_out: true,
            }),
        }
    }
}

/// Locate reflexc: architecture-specific install location, then PATH.
pub async fn detect_compiler() -> Option<PathBuf> {
    let installed = if std::env::consts::ARCH == "aarch64" {
        Path::new(AARCH64_COMPILER)
    } else {
        Path::new(X86_64_COMPILER)
    };
    if installed.exists() && is_executable(installed) {
        return Some(installed.to_path_buf());
    }

    let output = Command::new("which").arg("reflexc").output().await.ok()?;
    if !output.status.success() {
        return None;
    }
    let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!path.is_empty()).then(|| PathBuf::from(path))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_script(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        }

        path
    }

    fn write_source(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("candidate.rfx");
        fs::write(&path, "reflex demo {}\n").unwrap();
        path
    }

    #[tokio::test]
    async fn test_check_success() {
        let temp = TempDir::new().unwrap();
        let compiler = write_script(&temp, "reflexc", "echo 'Compilation complete: 0 errors'");
        let source = write_source(&temp);

        let outcome = CheckRunner::new(&compiler).check(&source).await.unwrap();
        assert!(outcome.success);
        assert!(!outcome.timed_out);
        assert!(outcome.output.contains("Compilation complete"));
    }

    #[tokio::test]
    async fn test_check_failure_combines_streams() {
        let temp = TempDir::new().unwrap();
        let compiler = write_script(
            &temp,
            "reflexc",
            "echo 'to stdout'\necho 'main.rfx:1:1: error: expected' >&2\nexit 1",
        );
        let source = write_source(&temp);

        let outcome = CheckRunner::new(&compiler).check(&source).await.unwrap();
        assert!(!outcome.success);
        assert!(outcome.output.contains("to stdout"));
        assert!(outcome.output.contains("error: expected"));
    }

    #[tokio::test]
    async fn test_check_receives_check_flag_and_path() {
        let temp = TempDir::new().unwrap();
        let compiler = write_script(&temp, "reflexc", "echo \"$@\"");
        let source = write_source(&temp);

        let outcome = CheckRunner::new(&compiler).check(&source).await.unwrap();
        assert!(outcome.output.contains("--check"));
        assert!(outcome.output.contains("candidate.rfx"));
    }

    #[tokio::test]
    async fn test_check_timeout() {
        let temp = TempDir::new().unwrap();
        let compiler = write_script(&temp, "reflexc", "sleep 5");
        let source = write_source(&temp);

        let outcome = CheckRunner::new(&compiler)
            .with_timeout(Duration::from_millis(100))
            .check(&source)
            .await
            .unwrap();

        assert!(!outcome.success);
        assert!(outcome.timed_out);
        assert!(outcome.output.contains("timed out"));
    }

    #[tokio::test]
    async fn test_check_missing_compiler_is_fatal() {
        let temp = TempDir::new().unwrap();
        let source = write_source(&temp);

        let result = CheckRunner::new("/nonexistent/reflexc").check(&source).await;
        assert!(matches!(result, Err(RfxgenError::CompilerMissing(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_check_non_executable_compiler_is_fatal() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let compiler = temp.path().join("reflexc");
        fs::write(&compiler, "#!/bin/sh\nexit 0\n").unwrap();
        fs::set_permissions(&compiler, fs::Permissions::from_mode(0o644)).unwrap();
        let source = write_source(&temp);

        let result = CheckRunner::new(&compiler).check(&source).await;
        assert!(matches!(result, Err(RfxgenError::CompilerMissing(_))));
    }

    #[test]
    fn test_preflight_ok() {
        let temp = TempDir::new().unwrap();
        let compiler = write_script(&temp, "reflexc", "exit 0");

        assert!(CheckRunner::new(&compiler).preflight().is_ok());
    }

    #[test]
    fn test_preflight_missing() {
        let result = CheckRunner::new("/nonexistent/reflexc").preflight();
        assert!(matches!(result, Err(RfxgenError::CompilerMissing(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_preflight_non_executable() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let compiler = temp.path().join("reflexc");
        fs::write(&compiler, "not a binary").unwrap();
        fs::set_permissions(&compiler, fs::Permissions::from_mode(0o644)).unwrap();

        let result = CheckRunner::new(&compiler).preflight();
        assert!(matches!(result, Err(RfxgenError::CompilerMissing(_))));
    }

    #[test]
    fn test_runner_defaults() {
        let runner = CheckRunner::new("/usr/bin/reflexc");
        assert_eq!(runner.timeout, DEFAULT_CHECK_TIMEOUT);
        assert_eq!(runner.compiler(), Path::new("/usr/bin/reflexc"));
    }
}
