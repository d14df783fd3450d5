//! Line parser for the CLI's stdout.
//!
//! The CLI writes one JSON record per line. [`MessageParser`] frames the byte
//! stream into lines, skips blank ones and decodes the rest into [`Message`]s.
//! Lines are bytes; invalid UTF-8 inside a record does not end the stream.

use futures::{Stream, StreamExt};
use tokio::io::AsyncRead;
use tokio_util::codec::{AnyDelimiterCodec, AnyDelimiterCodecError, FramedRead};

use crate::protocol::{Message, RawLine};
use crate::{Error, Result};

/// Maximum accepted line length: 4 MiB.
pub const MAX_LINE_BYTES: usize = 4 * 1024 * 1024;

/// Decode a single line.
///
/// Returns `Ok(None)` for blank lines. An envelope that is not valid JSON is
/// an [`Error::MalformedLine`]; a known record that fails to decode comes back
/// as [`Message::Unknown`] with its diagnostic.
pub fn parse_line(line: &[u8]) -> Result<Option<Message>> {
    let trimmed = trim_space(line);
    if trimmed.is_empty() {
        return Ok(None);
    }

    let message_type =
        Message::envelope_type(trimmed).map_err(|e| Error::malformed_line(e, trimmed))?;
    Ok(Some(Message::decode(message_type, RawLine::new(trimmed))))
}

/// Trim leading and trailing Unicode whitespace without requiring the whole
/// line to be valid UTF-8.
fn trim_space(line: &[u8]) -> &[u8] {
    let lead = line.utf8_chunks().next().map_or(0, |chunk| {
        chunk.valid().len() - chunk.valid().trim_start().len()
    });
    let rest = &line[lead..];
    let tail = rest
        .utf8_chunks()
        .last()
        .filter(|chunk| chunk.invalid().is_empty())
        .map_or(0, |chunk| chunk.valid().len() - chunk.valid().trim_end().len());
    &rest[..rest.len() - tail]
}

/// Reads [`Message`]s from a newline-delimited byte stream.
pub struct MessageParser<R> {
    lines: FramedRead<R, AnyDelimiterCodec>,
}

impl<R> std::fmt::Debug for MessageParser<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageParser").finish_non_exhaustive()
    }
}

impl<R: AsyncRead + Unpin> MessageParser<R> {
    /// Create a parser over `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            lines: FramedRead::new(
                reader,
                AnyDelimiterCodec::new_with_max_length(b"\n".to_vec(), Vec::new(), MAX_LINE_BYTES),
            ),
        }
    }

    /// Decode a single line. See [`parse_line`].
    pub fn parse_line(line: &[u8]) -> Result<Option<Message>> {
        parse_line(line)
    }

    /// Read the next non-blank line and decode it.
    ///
    /// Returns [`Error::StreamClosed`] at end of input. Malformed envelopes,
    /// over-long lines and I/O failures are returned as errors and leave the
    /// parser unusable.
    pub async fn next(&mut self) -> Result<Message> {
        loop {
            let line = match self.lines.next().await {
                None => return Err(Error::StreamClosed),
                Some(Ok(line)) => line,
                Some(Err(AnyDelimiterCodecError::MaxChunkLengthExceeded)) => {
                    return Err(Error::LineTooLong {
                        limit: MAX_LINE_BYTES,
                    })
                }
                Some(Err(AnyDelimiterCodecError::Io(e))) => return Err(Error::Io(e)),
            };

            if let Some(message) = parse_line(&line)? {
                return Ok(message);
            }
        }
    }

    /// Turn the parser into a stream of messages.
    ///
    /// The stream ends quietly at end of input and after yielding any other
    /// error.
    pub fn into_stream(self) -> impl Stream<Item = Result<Message>> {
        futures::stream::unfold(Some(self), |state| async move {
            let mut parser = state?;
            match parser.next().await {
                Ok(message) => Some((Ok(message), Some(parser))),
                Err(Error::StreamClosed) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
    }
}
