//! Error taxonomy for terminal handles and queries.
//!
//! Only precondition violations and low-level I/O failures are errors.
//! A terminal that answers a query with garbage, or not at all, is not an
//! error: those paths yield zero geometry fields or an absent color.

use std::io;

use thiserror::Error;

/// Errors surfaced by terminal handles.
#[derive(Debug, Error)]
pub enum TtyError {
    /// The descriptor handed to an acquisition is not a terminal device.
    #[error("file descriptor is not a terminal")]
    NotATerminal,
    /// A color slot was neither `fg`, `bg`, nor a palette index in 0-255.
    #[error("invalid color slot {0:?}: expected \"fg\", \"bg\", or 0-255")]
    InvalidColorSlot(String),
    /// Read, write, poll, or attribute call failed on the descriptor.
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, TtyError>;

impl TtyError {
    /// Underlying OS error kind, if this is an I/O failure.
    #[must_use]
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Self::Io(err) => Some(err.kind()),
            _ => None,
        }
    }
}
