//! Response framing.
//!
//! mystem does not delimit its responses. A response is one or more
//! newline-separated JSON arrays; the buffer is complete once every
//! non-empty line parses.

use std::str::Utf8Error;

use thiserror::Error;

use crate::record::Record;

#[derive(Debug, Error)]
pub enum FrameError {
    /// Nothing but blank lines so far.
    #[error("no output yet")]
    Empty,

    #[error("output is not valid UTF-8: {0}")]
    Utf8(#[from] Utf8Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl FrameError {
    /// Whether more bytes could turn the buffer into a valid response.
    pub fn is_incomplete(&self) -> bool {
        match self {
            FrameError::Empty => true,
            // A multi-byte character cut at the end of the buffer.
            FrameError::Utf8(e) => e.error_len().is_none(),
            FrameError::Json(e) => e.is_eof(),
        }
    }
}

/// Parse an accumulated buffer into records.
///
/// Splits on line breaks, skips empty lines (a trailing `\r` counts as
/// empty), parses every line as a JSON array and concatenates them.
pub fn parse_response(buf: &[u8]) -> Result<Vec<Record>, FrameError> {
    let text = std::str::from_utf8(buf)?;
    let mut records = Vec::new();
    let mut fragments = 0;
    for line in text.split('\n') {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        let batch: Vec<Record> = serde_json::from_str(line)?;
        records.extend(batch);
        fragments += 1;
    }
    if fragments == 0 {
        return Err(FrameError::Empty);
    }
    Ok(records)
}
