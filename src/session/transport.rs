use crate::error::MystemError;
use crate::record::Record;

/// One request/response strategy for talking to the analyzer.
///
/// Implementations own the process handle. `request` starts the process
/// when none is running; a write to a dead process surfaces as an
/// [`MystemError::Io`] with [`std::io::ErrorKind::BrokenPipe`] and leaves
/// the dead handle in place for `close` to reap.
pub trait Transport: Send {
    /// Spawn the analyzer unless it is already running.
    fn start(&mut self) -> Result<(), MystemError>;

    fn is_running(&self) -> bool;

    /// Send one line and return the records printed for it.
    fn request(&mut self, line: &str) -> Result<Vec<Record>, MystemError>;

    /// Terminate the process and release both pipes. Safe to repeat.
    fn close(&mut self) -> Result<(), MystemError>;
}
