//! JSON-lines activation source.
//!
//! Reads one JSON object per line, e.g. from a compositor hook script piped
//! into stdin:
//!
//! ```text
//! {"caption":"Terminal","resourceClass":"xterm","resourceName":"xterm"}
//! {"caption":"Editor"}
//! ```
//!
//! Missing keys are absent attributes; `""` is a present, empty attribute.
//! Lines that are too long, not UTF-8, or not an event object are skipped;
//! only EOF and I/O errors end the stream.

use async_trait::async_trait;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncRead;
use tokio::io::BufReader;
use tracing::debug;
use tracing::trace;
use tracing::warn;

use super::ActivationSource;
use super::SourceError;
use crate::domain::ActivationEvent;

/// Longest line accepted; longer lines are discarded.
const MAX_LINE_LENGTH: usize = 64 * 1024;

/// One raw line off the reader, without its terminator.
#[derive(Debug, PartialEq, Eq)]
enum RawLine {
    Bytes(Vec<u8>),
    TooLong,
}

/// Activation source reading JSON objects line by line.
pub struct JsonLinesSource<R> {
    reader: BufReader<R>,
}

impl<R> JsonLinesSource<R>
where
    R: AsyncRead + Unpin + Send,
{
    /// Read events from `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
        }
    }

    /// Read up to the next `\n`, keeping at most [`MAX_LINE_LENGTH`] bytes.
    ///
    /// Returns `None` at EOF. An over-long line is consumed in full and
    /// reported as [`RawLine::TooLong`], so reading resumes on the next line.
    async fn read_raw_line(&mut self) -> std::io::Result<Option<RawLine>> {
        let mut line = Vec::new();
        let mut too_long = false;
        let mut read_any = false;

        loop {
            let (used, complete) = {
                let available = self.reader.fill_buf().await?;
                if available.is_empty() {
                    break;
                }
                read_any = true;

                let newline = available.iter().position(|&b| b == b'\n');
                let chunk = &available[..newline.unwrap_or(available.len())];
                if !too_long {
                    if line.len() + chunk.len() > MAX_LINE_LENGTH {
                        too_long = true;
                        line = Vec::new();
                    } else {
                        line.extend_from_slice(chunk);
                    }
                }
                (newline.map_or(available.len(), |i| i + 1), newline.is_some())
            };

            self.reader.consume(used);
            if complete {
                break;
            }
        }

        if !read_any {
            return Ok(None);
        }
        Ok(Some(if too_long {
            RawLine::TooLong
        } else {
            RawLine::Bytes(line)
        }))
    }
}

impl JsonLinesSource<tokio::io::Stdin> {
    /// Read events from the process's standard input.
    pub fn stdin() -> Self {
        Self::new(tokio::io::stdin())
    }
}

#[async_trait]
impl<R> ActivationSource for JsonLinesSource<R>
where
    R: AsyncRead + Unpin + Send,
{
    async fn next_event(&mut self) -> Result<ActivationEvent, SourceError> {
        loop {
            let bytes = match self.read_raw_line().await? {
                None => {
                    debug!("JSON event stream ended (EOF)");
                    return Err(SourceError::Closed);
                }
                Some(RawLine::TooLong) => {
                    warn!("Skipping line longer than {} bytes", MAX_LINE_LENGTH);
                    continue;
                }
                Some(RawLine::Bytes(bytes)) => bytes,
            };

            let line = match String::from_utf8(bytes) {
                Ok(line) => line,
                Err(e) => {
                    warn!("Skipping line that is not valid UTF-8: {}", e.utf8_error());
                    continue;
                }
            };

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            trace!("Received line: {}", line);
            match serde_json::from_str::<ActivationEvent>(line) {
                Ok(event) => return Ok(event),
                Err(e) => warn!("Skipping malformed event {:?}: {}", line, e),
            }
        }
    }
}
