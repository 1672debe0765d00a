//! Backend that switches user with `su` on the local host.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::types::CommandOutput;
use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;
use wait_timeout::ChildExt;

/// Timeout for the environment lookup done before every saplikey call.
const ENV_TIMEOUT: Duration = Duration::from_secs(10);

/// Backend that runs commands through `su - <user> -c`.
///
/// The login shell of `<sid>adm` sets up the SAP environment
/// (`$DIR_LIBRARY`, `LD_LIBRARY_PATH`, ...), which saplikey needs.
pub struct SuBackend {
    /// Path to the su executable
    su_path: String,
}

impl SuBackend {
    /// Create a backend using `/bin/su`.
    pub fn new() -> Self {
        Self {
            su_path: "/bin/su".to_string(),
        }
    }

    /// Create a backend using a custom su-compatible executable.
    pub fn with_su_path(path: impl Into<String>) -> Self {
        Self {
            su_path: path.into(),
        }
    }

    /// Run a shell snippet as `user` and capture its output.
    fn run_shell(&self, user: &str, script: &str, timeout: Duration) -> Result<CommandOutput> {
        log::trace!("{} - {} -c {:?}", self.su_path, user, script);

        let mut child = Command::new(&self.su_path)
            .args(["-", user, "-c", script])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| Error::Spawn {
                program: self.su_path.clone(),
                source,
            })?;

        // Drain both pipes while waiting so a chatty child cannot block
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let stdout_handle = thread::spawn(move || read_all(stdout));
        let stderr_handle = thread::spawn(move || read_all(stderr));

        let waited = child
            .wait_timeout(timeout)
            .map_err(|e| Error::Other(format!("failed to wait for {script}: {e}")))?;

        let status = match waited {
            Some(status) => status,
            None => {
                log::warn!("{script} timed out after {}s, killing", timeout.as_secs());
                let _ = child.kill();
                let _ = child.wait();
                return Err(Error::Timeout {
                    command: script.to_string(),
                    seconds: timeout.as_secs(),
                });
            }
        };

        let stdout = stdout_handle.join().unwrap_or_default();
        let stderr = stderr_handle.join().unwrap_or_default();

        log::debug!("{script} exited with {:?}", status.code());
        Ok(CommandOutput {
            code: status.code(),
            stdout,
            stderr,
        })
    }
}

impl Default for SuBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for SuBackend {
    fn run_as(
        &self,
        user: &str,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<CommandOutput> {
        let script = command_line(program, args);
        self.run_shell(user, &script, timeout)
    }

    fn env_as(&self, user: &str, var: &str) -> Result<String> {
        if !var.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(Error::Configuration {
                message: format!("invalid environment variable name: {var}"),
            });
        }

        let output = self.run_shell(user, &format!("echo ${var}"), ENV_TIMEOUT)?;
        if !output.is_success() {
            return Err(Error::CommandFailed {
                command: format!("echo ${var}"),
                code: output.code,
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(output.stdout.trim().to_string())
    }
}

fn read_all(stream: Option<impl Read>) -> String {
    let mut buf = Vec::new();
    if let Some(mut stream) = stream {
        let _ = stream.read_to_end(&mut buf);
    }
    String::from_utf8_lossy(&buf).to_string()
}

/// Join a program and its arguments into one shell command line.
pub(crate) fn command_line(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .map(quote)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Quote an argument for `sh -c`, leaving plain words untouched.
///
/// Glob patterns are quoted as well: saplikey expands `*` itself.
fn quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,@+".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}
