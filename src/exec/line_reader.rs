// src/exec/line_reader.rs

//! Turns one output pipe of a child process into lines for listeners.
//!
//! Each reader runs on its own Tokio task so stdout, stderr and the exit
//! wait all make progress independently; a child blocked on a full stderr
//! pipe while we only read stdout would otherwise never exit.
//!
//! Lines are split on `\n` only and delivered as soon as the terminator is
//! read. A trailing `\r` stays part of the line. Decoding happens per whole
//! line, so a listener never sees half of a multi-byte sequence; invalid
//! UTF-8 is replaced lossily.
//!
//! A line longer than [`MAX_LINE_BYTES`] is delivered in pieces of at most
//! that size, so output without newlines never grows the buffer unbounded.
//! A multi-byte character cut by such a split is replaced in both pieces.

use std::sync::Arc;

use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::errors::{DeferredError, Result, SdkrunError};
use crate::exec::listener::{LineListener, dispatch};
use crate::types::Channel;

/// What a finished reader observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainReport {
    pub channel: Channel,
    /// Lines delivered to the listeners.
    pub lines: u64,
    /// Reading stopped because of cancellation, not end-of-input.
    pub cancelled: bool,
    pub failures: Vec<DeferredError>,
}

impl DrainReport {
    fn new(channel: Channel) -> Self {
        Self {
            channel,
            lines: 0,
            cancelled: false,
            failures: Vec::new(),
        }
    }
}

/// Default cap on the bytes delivered as one line.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

pub struct LineReader {
    channel: Channel,
    listeners: Arc<[Arc<dyn LineListener>]>,
    cancel: CancellationToken,
    max_line: usize,
}

impl LineReader {
    /// Fails with [`SdkrunError::InvalidSetup`] when `listeners` is empty.
    pub fn new(
        channel: Channel,
        listeners: Arc<[Arc<dyn LineListener>]>,
        cancel: CancellationToken,
    ) -> Result<Self> {
        if listeners.is_empty() {
            return Err(SdkrunError::InvalidSetup(format!(
                "line reader for {channel} needs at least one listener"
            )));
        }
        Ok(Self {
            channel,
            listeners,
            cancel,
            max_line: MAX_LINE_BYTES,
        })
    }

    /// Split lines longer than `max` bytes. Values below 1 are treated as 1.
    #[must_use]
    pub fn with_max_line_len(mut self, max: usize) -> Self {
        self.max_line = max.max(1);
        self
    }

    /// Drain `stream` on a new Tokio task.
    pub fn spawn<R>(self, stream: R) -> JoinHandle<DrainReport>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        tokio::spawn(self.drain(stream))
    }

    /// Read `stream` to end-of-input (or cancellation), dispatching each line.
    pub async fn drain<R>(self, stream: R) -> DrainReport
    where
        R: AsyncRead + Unpin,
    {
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::with_capacity(256);
        let mut report = DrainReport::new(self.channel);

        loop {
            buf.clear();

            let read = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    report.cancelled = true;
                    break;
                }
                read = read_line_capped(&mut reader, &mut buf, self.max_line) => read,
            };

            match read {
                Ok(Chunk::Eof) => break,
                Ok(chunk) => {
                    if chunk == Chunk::Split {
                        warn!(
                            channel = %self.channel,
                            max_line = self.max_line,
                            "output line exceeds the maximum length; splitting"
                        );
                    }
                    let line = String::from_utf8_lossy(&buf);
                    trace!(channel = %self.channel, line = %line, "output line");

                    report.lines += 1;
                    let failures = dispatch(&self.listeners[..], self.channel.into(), |listener| {
                        listener.on_line(&line)
                    });
                    report.failures.extend(failures);
                }
                Err(err) => {
                    warn!(channel = %self.channel, error = %err, "reading child output failed");
                    report.failures.push(DeferredError::Read {
                        channel: self.channel,
                        message: err.to_string(),
                    });
                    break;
                }
            }
        }

        debug!(
            channel = %self.channel,
            lines = report.lines,
            cancelled = report.cancelled,
            "line reader finished"
        );
        report
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chunk {
    /// A complete line, or the unterminated tail of the stream.
    Line,
    /// `max` bytes without a newline.
    Split,
    Eof,
}

/// Read up to the next `\n` (dropped) into `buf`, stopping early at `max` bytes.
async fn read_line_capped<R>(reader: &mut R, buf: &mut Vec<u8>, max: usize) -> io::Result<Chunk>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(if buf.is_empty() { Chunk::Eof } else { Chunk::Line });
        }

        let room = max - buf.len();
        // A newline right after a full buffer still ends this line.
        let search = available.len().min(room + 1);
        if let Some(pos) = available[..search].iter().position(|b| *b == b'\n') {
            buf.extend_from_slice(&available[..pos]);
            reader.consume(pos + 1);
            return Ok(Chunk::Line);
        }

        let take = available.len().min(room);
        buf.extend_from_slice(&available[..take]);
        reader.consume(take);
        if buf.len() >= max {
            return Ok(Chunk::Split);
        }
    }
}
