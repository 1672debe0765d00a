//! Error types for saplikey operations.
//!
//! Errors are categorized so callers can tell an unusable environment
//! (the tool cannot even be located) apart from a single failed command.
//! Only the former should abort a whole reconciliation run.

use std::path::PathBuf;
use thiserror::Error;

/// Categories of saplikey errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The tool path could not be resolved for the instance user
    Configuration,
    /// The external tool ran and exited non-zero
    ExternalTool,
    /// The external tool did not finish in time
    Timeout,
    /// Reading a file or changing its ownership failed
    Io,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Whether this category means the environment is unusable.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration)
    }

    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Configuration => "saplikey not configured",
            Self::ExternalTool => "saplikey command failed",
            Self::Timeout => "saplikey command timed out",
            Self::Io => "File access failed",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Configuration => "Check that $DIR_LIBRARY is set in the <sid>adm login environment",
            Self::ExternalTool => "Check the saplikey output above for details",
            Self::Timeout => "Check that the instance database is reachable",
            Self::Io => "Check that the file exists and is readable",
            Self::Other => "Check the error details for more information",
        }
    }
}

/// Errors that can occur during saplikey operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The saplikey executable could not be located
    #[error("configuration error: {message}")]
    Configuration {
        /// What could not be resolved
        message: String,
    },

    /// The external command exited with a non-zero status
    #[error("command failed ({code:?}): {command}")]
    CommandFailed {
        /// The command line that was executed
        command: String,
        /// Exit code, if the process was not killed by a signal
        code: Option<i32>,
        /// Standard error output from the failed command
        stderr: String,
    },

    /// The external command exceeded its timeout and was killed
    #[error("command timed out after {seconds}s: {command}")]
    Timeout {
        /// The command line that was executed
        command: String,
        /// Timeout that was exceeded
        seconds: u64,
    },

    /// The external command could not be started
    #[error("failed to execute {program}: {source}")]
    Spawn {
        /// Program that failed to start
        program: String,
        /// Underlying OS error
        source: std::io::Error,
    },

    /// File access failed
    #[error("{}: {source}", .path.display())]
    Io {
        /// Path that was being accessed
        path: PathBuf,
        /// Underlying OS error
        source: std::io::Error,
    },

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Configuration { .. } => ErrorCategory::Configuration,
            Error::CommandFailed { .. } => ErrorCategory::ExternalTool,
            Error::Timeout { .. } => ErrorCategory::Timeout,
            Error::Io { .. } => ErrorCategory::Io,
            Error::Spawn { .. } | Error::Other(_) => ErrorCategory::Other,
        }
    }

    /// Whether this error should abort the whole operation.
    pub fn is_fatal(&self) -> bool {
        self.category().is_fatal()
    }

    /// Captured standard error, for command failures.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Error::CommandFailed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for saplikey operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_configuration_is_fatal() {
        assert!(ErrorCategory::Configuration.is_fatal());
        assert!(!ErrorCategory::ExternalTool.is_fatal());
        assert!(!ErrorCategory::Timeout.is_fatal());
        assert!(!ErrorCategory::Io.is_fatal());
    }

    #[test]
    fn test_command_failed_carries_stderr() {
        let err = Error::CommandFailed {
            command: "saplikey -show".to_string(),
            code: Some(2),
            stderr: "no database connection".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::ExternalTool);
        assert_eq!(err.stderr(), Some("no database connection"));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_io_error_display_names_path() {
        let err = Error::io(
            "/tmp/S4H.txt",
            std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        );
        assert_eq!(err.category(), ErrorCategory::Io);
        assert!(err.to_string().starts_with("/tmp/S4H.txt"));
    }
}
