//! Long-lived analyzer driven over non-blocking pipes.

use std::io::{self, Read};
use std::os::fd::{AsRawFd, RawFd};
use std::time::Duration;

use super::args::Launch;
use super::framing::parse_response;
use super::process::ChildProcess;
use super::transport::Transport;
use crate::error::MystemError;
use crate::record::Record;

const READ_CHUNK: usize = 64 * 1024;

/// Keeps one analyzer alive across requests.
///
/// After writing a request, waits without a deadline for the first bytes
/// (startup latency is unbounded), then reads and re-parses until the buffer
/// holds a complete response. Continuation waits are bounded by
/// `response_timeout`.
pub struct PipelinedTransport {
    launch: Launch,
    response_timeout: Duration,
    process: Option<ChildProcess>,
}

impl PipelinedTransport {
    pub fn new(launch: Launch, response_timeout: Duration) -> Self {
        Self {
            launch,
            response_timeout,
            process: None,
        }
    }

    fn running(&mut self) -> Result<&mut ChildProcess, MystemError> {
        let process = match self.process.take() {
            Some(process) => process,
            None => {
                let mut process = ChildProcess::spawn(&self.launch, None)?;
                set_non_blocking(process.stdout()?.as_raw_fd())?;
                process
            }
        };
        Ok(self.process.insert(process))
    }
}

impl Transport for PipelinedTransport {
    fn start(&mut self) -> Result<(), MystemError> {
        self.running().map(|_| ())
    }

    fn is_running(&self) -> bool {
        self.process.is_some()
    }

    fn request(&mut self, line: &str) -> Result<Vec<Record>, MystemError> {
        let timeout = self.response_timeout;
        let process = self.running()?;
        process.write_line(line)?;

        let pid = process.id();
        let stdout = process.stdout()?;
        let fd = stdout.as_raw_fd();
        let mut buf = Vec::new();

        wait_readable(fd, None)?;
        loop {
            let eof = read_available(stdout, &mut buf)?;
            match parse_response(&buf) {
                Ok(records) => {
                    tracing::trace!(
                        pid,
                        bytes = buf.len(),
                        records = records.len(),
                        "Response complete"
                    );
                    return Ok(records);
                }
                Err(e) if e.is_incomplete() => {}
                Err(e) => return Err(MystemError::protocol(line, &buf, e.to_string())),
            }

            if eof {
                return Err(MystemError::protocol(
                    line,
                    &buf,
                    "mystem closed its output before completing the response",
                ));
            }
            if !wait_readable(fd, Some(timeout))? {
                tracing::warn!(pid, bytes = buf.len(), "mystem stalled mid-response");
                return Err(MystemError::protocol(
                    line,
                    &buf,
                    format!("no output for {}s", timeout.as_secs()),
                ));
            }
        }
    }

    fn close(&mut self) -> Result<(), MystemError> {
        if let Some(mut process) = self.process.take() {
            process.terminate()?;
        }
        Ok(())
    }
}

/// Drain whatever is available without blocking. Returns `true` on EOF.
fn read_available(stdout: &mut impl Read, buf: &mut Vec<u8>) -> io::Result<bool> {
    let mut chunk = [0u8; READ_CHUNK];
    loop {
        match stdout.read(&mut chunk) {
            Ok(0) => return Ok(true),
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(false),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

fn set_non_blocking(fd: RawFd) -> io::Result<()> {
    // SAFETY: `fd` is an open descriptor owned by the child's stdout handle.
    unsafe {
        let flags = libc::fcntl(fd, libc::F_GETFL);
        if flags < 0 {
            return Err(io::Error::last_os_error());
        }
        if libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) < 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

/// Block until `fd` is readable (or hung up). `None` waits forever.
///
/// Returns `false` when the timeout elapsed first.
fn wait_readable(fd: RawFd, timeout: Option<Duration>) -> io::Result<bool> {
    let timeout_ms = match timeout {
        Some(t) => libc::c_int::try_from(t.as_millis()).unwrap_or(libc::c_int::MAX),
        None => -1,
    };
    let mut pollfd = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    loop {
        // SAFETY: `pollfd` is a single valid entry for the duration of the call.
        let ready = unsafe { libc::poll(&mut pollfd, 1, timeout_ms) };
        if ready >= 0 {
            return Ok(ready > 0);
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}
