//! Input sources.
//!
//! # Responsibilities
//! - Produce raw lines in order from a local producer (normally piped stdin)
//! - Report end of input as `Ok(None)`, not as an error
//! - Refuse interactive terminals
//!
//! # Design Decisions
//! - Any `AsyncBufRead` can back a source, which keeps tests off real stdin
//! - `next_line` must be cancel safe so the forwarder can race it against shutdown

use std::future::Future;
use std::io::{self, IsTerminal};

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};

#[derive(Debug, Error)]
pub enum SourceError {
    /// stdin is a terminal rather than a pipe.
    #[error("this program reads from stdin (piped input)")]
    Interactive,
}

/// An ordered, possibly unbounded sequence of raw lines.
pub trait Source: Send {
    /// Next line without its terminator, or `None` at end of input.
    fn next_line(&mut self) -> impl Future<Output = io::Result<Option<String>>> + Send;
}

/// Line reader over any buffered async reader.
pub struct LineSource<R> {
    lines: Lines<R>,
}

impl<R: AsyncBufRead + Unpin> LineSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }
}

impl<R: AsyncBufRead + Unpin + Send> Source for LineSource<R> {
    async fn next_line(&mut self) -> io::Result<Option<String>> {
        self.lines.next_line().await
    }
}

/// Source over the process's standard input.
pub fn stdin() -> LineSource<BufReader<Stdin>> {
    LineSource::new(BufReader::new(tokio::io::stdin()))
}

/// Whether the process's stdin is attached to a terminal.
pub fn stdin_is_terminal() -> bool {
    io::stdin().is_terminal()
}

/// Fail when the input is an interactive terminal.
pub fn ensure_piped(interactive: bool) -> Result<(), SourceError> {
    if interactive {
        Err(SourceError::Interactive)
    } else {
        Ok(())
    }
}
