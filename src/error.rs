use rustyline::error::ReadlineError;
use thiserror::Error;

/// Errors that stop the dispatch loop.
///
/// Only terminal failures surface here. History persistence and output
/// writes are best-effort and never produce an `Error`.
#[derive(Debug, Error)]
pub enum Error {
    /// The user pressed the interrupt key while a line was being read.
    #[error("interrupted")]
    Interrupted,
    /// The input stream was closed.
    #[error("end of input")]
    Eof,
    /// A line was requested after the terminal was released.
    #[error("terminal is closed")]
    Closed,
    /// The line editor could not be created or failed while reading.
    #[error("terminal error: {0}")]
    Terminal(#[source] ReadlineError),
}

impl Error {
    /// True for the two ways a user ends a session from the keyboard.
    pub fn is_end_of_input(&self) -> bool {
        matches!(self, Error::Interrupted | Error::Eof)
    }
}

impl From<ReadlineError> for Error {
    fn from(err: ReadlineError) -> Self {
        match err {
            ReadlineError::Interrupted => Error::Interrupted,
            ReadlineError::Eof => Error::Eof,
            other => Error::Terminal(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
