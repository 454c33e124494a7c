//! The analyzer session.
//!
//! ```text
//!   Unstarted ──start()/first request──▶ Running ──close()/drop──▶ Closed
//!       ▲                                  │  ▲                      │
//!       │        broken pipe: close ───────┘  └── request/response   │
//!       │        + restart + retry once                              │
//!       └──────────────────── next request ──────────────────────────┘
//! ```
//!
//! Requests go through a [`Transport`] chosen once at construction:
//! [`PipelinedTransport`] keeps one process alive and reads with
//! non-blocking pipes, [`SynchronousTransport`] runs a process per request.

mod args;
mod framing;
#[cfg(unix)]
mod pipelined;
mod process;
mod synchronous;
mod transport;

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use args::{build_args, Launch};
pub use framing::{parse_response, FrameError};
#[cfg(unix)]
pub use pipelined::PipelinedTransport;
pub use synchronous::SynchronousTransport;
pub use transport::Transport;

use crate::config::{AnalyzerSettings, Config, Mode, Options};
use crate::error::MystemError;
use crate::locator::Locator;
use crate::record::Record;

/// Environment variable naming a binary to use as-is, skipping the locator.
pub const BIN_ENV_VAR: &str = "MYSTEM_BIN";

/// A session with the mystem analyzer.
///
/// Not meant to be shared: every operation takes `&mut self`. Run one
/// session per worker for parallelism. The process is terminated when the
/// session is closed or dropped.
pub struct Mystem {
    launch: Launch,
    mode: Mode,
    transport: Box<dyn Transport>,
}

impl Mystem {
    /// Session with default settings, locating (and if necessary
    /// installing) the binary through the environment.
    pub fn new(options: Options) -> Result<Self, MystemError> {
        Self::with_settings(options, &AnalyzerSettings::default())
    }

    pub fn from_config(config: &Config) -> Result<Self, MystemError> {
        Self::with_settings(config.options.clone(), &config.analyzer)
    }

    /// Resolve the binary per `settings` and build a session.
    ///
    /// Precedence: `settings.binary` (if executable), `$MYSTEM_BIN` as-is,
    /// then the [`Locator`] search, installing into its directory when
    /// `settings.autoinstall` is set.
    pub fn with_settings(
        options: Options,
        settings: &AnalyzerSettings,
    ) -> Result<Self, MystemError> {
        settings.validate()?;
        options.validate()?;
        let binary = resolve_binary(settings, Locator::from_env())?;
        Ok(Self::with_binary(binary, &options, settings))
    }

    /// Session around a known binary. Nothing is resolved or installed.
    pub fn with_binary(
        binary: impl Into<PathBuf>,
        options: &Options,
        settings: &AnalyzerSettings,
    ) -> Self {
        let launch = Launch::new(binary, options);
        let timeout = Duration::from_secs(settings.response_timeout_seconds);
        let (mode, transport) =
            build_transport(settings.mode.effective(), launch.clone(), timeout);
        Self::with_transport(launch, mode, transport)
    }

    /// Session over a caller-supplied transport.
    pub fn with_transport(launch: Launch, mode: Mode, transport: Box<dyn Transport>) -> Self {
        tracing::debug!(?mode, argv = ?launch.argv(), "Created mystem session");
        Self {
            launch,
            mode,
            transport,
        }
    }

    pub fn binary(&self) -> &Path {
        self.launch.binary()
    }

    /// Arguments passed after the binary.
    pub fn args(&self) -> &[OsString] {
        self.launch.args()
    }

    /// Mode of the transport in use (never `Auto`).
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_running(&self) -> bool {
        self.transport.is_running()
    }

    /// Start the analyzer now instead of on the first request.
    pub fn start(&mut self) -> Result<(), MystemError> {
        self.transport.start()
    }

    /// Terminate the analyzer. A later request starts a new one.
    pub fn close(&mut self) -> Result<(), MystemError> {
        self.transport.close()
    }

    /// Analyze `text` line by line and concatenate the records.
    ///
    /// Lines end at `\n`, `\r\n` or a lone `\r`; empty text is one empty
    /// line. A line never crosses a request boundary. When the pipe to the
    /// analyzer breaks, the process is restarted and that line is retried
    /// once.
    pub fn analyze(&mut self, text: &str) -> Result<Vec<Record>, MystemError> {
        let mut records = Vec::new();
        for line in request_lines(text) {
            records.extend(self.request_with_retry(line)?);
        }
        Ok(records)
    }

    /// Lemmas of `text`: the best hypothesis per token, else its text.
    /// Tokens with neither are dropped.
    pub fn lemmatize(&mut self, text: &str) -> Result<Vec<String>, MystemError> {
        Ok(self
            .analyze(text)?
            .iter()
            .filter_map(Record::lemma)
            .map(str::to_owned)
            .collect())
    }

    /// Analyze a UTF-8 file by handing its path to a one-shot analyzer.
    ///
    /// Leaves the session's own process untouched.
    pub fn analyze_file(&mut self, path: impl AsRef<Path>) -> Result<Vec<Record>, MystemError> {
        synchronous::run_file(&self.launch, path.as_ref())
    }

    fn request_with_retry(&mut self, line: &str) -> Result<Vec<Record>, MystemError> {
        match self.transport.request(line) {
            Err(err) if err.is_broken_pipe() => {
                tracing::warn!(bytes = line.len(), "mystem pipe broke, restarting");
                if let Err(close_err) = self.transport.close() {
                    tracing::debug!(error = %close_err, "Failed to reap dead mystem");
                }
                self.transport.start()?;
                self.transport.request(line).map_err(|err| match err {
                    MystemError::Io(source) if source.kind() == io::ErrorKind::BrokenPipe => {
                        MystemError::ProcessFailed {
                            request: line.to_string(),
                            source,
                        }
                    }
                    other => other,
                })
            }
            result => result,
        }
    }
}

impl Drop for Mystem {
    fn drop(&mut self) {
        let _ = self.transport.close();
    }
}

/// Transport for `mode`, with the mode it actually runs in.
fn build_transport(mode: Mode, launch: Launch, timeout: Duration) -> (Mode, Box<dyn Transport>) {
    match mode {
        #[cfg(unix)]
        Mode::Pipelined | Mode::Auto => {
            let transport: Box<dyn Transport> = Box::new(PipelinedTransport::new(launch, timeout));
            (Mode::Pipelined, transport)
        }
        #[cfg(not(unix))]
        Mode::Pipelined | Mode::Auto => {
            tracing::warn!("pipelined mode needs non-blocking pipes, using synchronous mode");
            let _ = timeout;
            let transport: Box<dyn Transport> = Box::new(SynchronousTransport::new(launch));
            (Mode::Synchronous, transport)
        }
        Mode::Synchronous => {
            let transport: Box<dyn Transport> = Box::new(SynchronousTransport::new(launch));
            (Mode::Synchronous, transport)
        }
    }
}

/// Split `text` into request lines.
fn request_lines(text: &str) -> Vec<&str> {
    if text.is_empty() {
        return vec![""];
    }
    let mut lines = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        match rest.find(&['\n', '\r'][..]) {
            Some(end) => {
                lines.push(&rest[..end]);
                let terminator = if rest[end..].starts_with("\r\n") { 2 } else { 1 };
                rest = &rest[end + terminator..];
            }
            None => {
                lines.push(rest);
                break;
            }
        }
    }
    lines
}

fn resolve_binary(settings: &AnalyzerSettings, locator: Locator) -> Result<PathBuf, MystemError> {
    let mut locator = locator;
    if let Some(dir) = &settings.install_dir {
        locator = locator.with_install_dir(dir);
    }
    match &settings.binary {
        Some(binary) => locator = locator.with_explicit(binary),
        None => {
            if let Some(binary) = std::env::var_os(BIN_ENV_VAR) {
                return Ok(PathBuf::from(binary));
            }
        }
    }
    if settings.autoinstall {
        Ok(locator.autoinstall()?)
    } else {
        Ok(locator.resolve())
    }
}
