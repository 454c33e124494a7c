//! Error types for locating, installing and talking to the analyzer.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

/// Longest prefix of request text or raw output kept in a protocol error.
const DIAGNOSTIC_LIMIT: usize = 2000;

/// Setup-time failures. Fatal, never retried.
#[derive(Debug, Error)]
pub enum InstallError {
    /// No archive is published for this OS / pointer width.
    #[error("mystem is not available for {os} ({bits}-bit)")]
    UnsupportedPlatform { os: String, bits: u32 },

    /// Download or archive extraction failed.
    #[error("failed to install mystem from '{url}': {reason}")]
    InstallFailure { url: String, reason: String },
}

/// Errors surfaced by a [`Mystem`](crate::Mystem) session.
#[derive(Debug, Error)]
pub enum MystemError {
    #[error(transparent)]
    Setup(#[from] InstallError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The analyzer binary could not be launched.
    #[error("failed to start '{binary}': {source}")]
    Spawn {
        binary: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The analyzer produced no parseable response for a request.
    #[error("mystem protocol error: {reason}\ntext:\n{request:?}\nout:\n{output:?}")]
    Protocol {
        request: String,
        output: String,
        reason: String,
    },

    /// The pipe broke again after the analyzer was restarted.
    #[error("mystem process failed while handling {request:?}: {source}")]
    ProcessFailed {
        request: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl MystemError {
    /// Build a protocol error, truncating the request and output so the
    /// message stays readable.
    pub fn protocol(request: &str, output: &[u8], reason: impl Into<String>) -> Self {
        MystemError::Protocol {
            request: truncate(request),
            output: truncate(&String::from_utf8_lossy(output)),
            reason: reason.into(),
        }
    }

    /// Whether this error means the analyzer went away under a write.
    pub fn is_broken_pipe(&self) -> bool {
        matches!(self, MystemError::Io(e) if e.kind() == io::ErrorKind::BrokenPipe)
    }
}

fn truncate(s: &str) -> String {
    s.chars().take(DIAGNOSTIC_LIMIT).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broken_pipe_is_classified() {
        let err = MystemError::from(io::Error::from(io::ErrorKind::BrokenPipe));
        assert!(err.is_broken_pipe());

        let err = MystemError::from(io::Error::from(io::ErrorKind::UnexpectedEof));
        assert!(!err.is_broken_pipe());

        let err = MystemError::protocol("text", b"", "timed out");
        assert!(!err.is_broken_pipe());
    }

    #[test]
    fn protocol_error_truncates_diagnostics() {
        let request = "я".repeat(DIAGNOSTIC_LIMIT + 10);
        let output = vec![b'['; DIAGNOSTIC_LIMIT * 2];
        match MystemError::protocol(&request, &output, "stalled") {
            MystemError::Protocol {
                request, output, ..
            } => {
                assert_eq!(request.chars().count(), DIAGNOSTIC_LIMIT);
                assert_eq!(output.len(), DIAGNOSTIC_LIMIT);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unsupported_platform_message() {
        let err = InstallError::UnsupportedPlatform {
            os: "solaris".to_string(),
            bits: 64,
        };
        assert_eq!(err.to_string(), "mystem is not available for solaris (64-bit)");
    }
}
