//! One analyzer process per request, for hosts without non-blocking pipes.

use std::path::Path;
use std::process::ExitStatus;

use super::args::Launch;
use super::framing::parse_response;
use super::process::ChildProcess;
use super::transport::Transport;
use crate::error::MystemError;
use crate::record::Record;

/// Writes the request, closes stdin and collects output until the process
/// exits. The process is spent afterwards, so the next request launches a
/// new one.
pub struct SynchronousTransport {
    launch: Launch,
    process: Option<ChildProcess>,
}

impl SynchronousTransport {
    pub fn new(launch: Launch) -> Self {
        Self {
            launch,
            process: None,
        }
    }

    fn take_or_spawn(&mut self) -> Result<ChildProcess, MystemError> {
        match self.process.take() {
            Some(process) => Ok(process),
            None => ChildProcess::spawn(&self.launch, None),
        }
    }
}

impl Transport for SynchronousTransport {
    fn start(&mut self) -> Result<(), MystemError> {
        let process = self.take_or_spawn()?;
        self.process = Some(process);
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.process.is_some()
    }

    fn request(&mut self, line: &str) -> Result<Vec<Record>, MystemError> {
        let mut process = self.take_or_spawn()?;
        if let Err(e) = process.write_line(line) {
            // Keep the dead handle so `close` reaps it.
            self.process = Some(process);
            return Err(e.into());
        }
        let pid = process.id();
        let (output, status) = process.communicate()?;
        tracing::trace!(pid, bytes = output.len(), %status, "Collected mystem output");
        decode_output(line, &output, status)
    }

    fn close(&mut self) -> Result<(), MystemError> {
        if let Some(mut process) = self.process.take() {
            process.terminate()?;
        }
        Ok(())
    }
}

/// Run the analyzer once over a file and collect everything it prints.
pub(crate) fn run_file(launch: &Launch, path: &Path) -> Result<Vec<Record>, MystemError> {
    let process = ChildProcess::spawn(launch, Some(path))?;
    let (output, status) = process.communicate()?;
    decode_output(&path.display().to_string(), &output, status)
}

/// Parse the complete output of a finished process.
///
/// Blank output from a successful run is an empty response.
fn decode_output(
    request: &str,
    output: &[u8],
    status: ExitStatus,
) -> Result<Vec<Record>, MystemError> {
    match parse_response(output) {
        Ok(records) => Ok(records),
        Err(e) if e.is_incomplete() && output.iter().all(u8::is_ascii_whitespace) => {
            if status.success() {
                Ok(Vec::new())
            } else {
                Err(MystemError::protocol(
                    request,
                    output,
                    format!("mystem exited with {status} and no output"),
                ))
            }
        }
        Err(e) => Err(MystemError::protocol(
            request,
            output,
            format!("{e} (mystem exited with {status})"),
        )),
    }
}
