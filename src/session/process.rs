use std::io::{self, Read, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, ExitStatus};

use super::args::Launch;
use crate::error::MystemError;

/// A running analyzer with its two pipe ends.
///
/// Dropping the guard terminates the process, closes both pipes and reaps
/// it, so no zombie or descriptor outlives the guard on any path.
pub(crate) struct ChildProcess {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: Option<ChildStdout>,
    status: Option<ExitStatus>,
}

impl ChildProcess {
    pub(crate) fn spawn(launch: &Launch, input: Option<&Path>) -> Result<Self, MystemError> {
        let mut child = launch
            .command(input)
            .spawn()
            .map_err(|source| MystemError::Spawn {
                binary: launch.binary().to_path_buf(),
                source,
            })?;
        tracing::debug!(pid = child.id(), binary = %launch.binary().display(), "Started mystem");

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        Ok(Self {
            child,
            stdin,
            stdout,
            status: None,
        })
    }

    pub(crate) fn id(&self) -> u32 {
        self.child.id()
    }

    /// Write `line` plus the terminator in one call.
    pub(crate) fn write_line(&mut self, line: &str) -> io::Result<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| io::Error::from(io::ErrorKind::BrokenPipe))?;
        let mut payload = Vec::with_capacity(line.len() + 1);
        payload.extend_from_slice(line.as_bytes());
        payload.push(b'\n');
        stdin.write_all(&payload)?;
        stdin.flush()
    }

    #[cfg(unix)]
    pub(crate) fn stdout(&mut self) -> io::Result<&mut ChildStdout> {
        self.stdout
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "stdout already closed"))
    }

    /// Close stdin, read stdout to the end and reap the process.
    pub(crate) fn communicate(mut self) -> io::Result<(Vec<u8>, ExitStatus)> {
        drop(self.stdin.take());
        let mut output = Vec::new();
        if let Some(mut stdout) = self.stdout.take() {
            stdout.read_to_end(&mut output)?;
        }
        let status = self.child.wait()?;
        self.status = Some(status);
        Ok((output, status))
    }

    /// Signal, close stdin, close stdout, then wait. Idempotent.
    pub(crate) fn terminate(&mut self) -> io::Result<()> {
        if self.status.is_some() {
            return Ok(());
        }
        self.signal();
        drop(self.stdin.take());
        drop(self.stdout.take());
        let status = self.child.wait()?;
        tracing::debug!(pid = self.child.id(), %status, "Stopped mystem");
        self.status = Some(status);
        Ok(())
    }

    #[cfg(unix)]
    fn signal(&mut self) {
        let Ok(pid) = libc::pid_t::try_from(self.child.id()) else {
            return;
        };
        // SAFETY: `pid` is our own unreaped child, so it cannot be recycled.
        unsafe {
            libc::kill(pid, libc::SIGTERM);
        }
    }

    #[cfg(not(unix))]
    fn signal(&mut self) {
        let _ = self.child.kill();
    }
}

impl Drop for ChildProcess {
    fn drop(&mut self) {
        let _ = self.terminate();
    }
}
