#![forbid(unsafe_code)]

//! Core: the escape-sequence protocol spoken with a terminal.
//!
//! # Role in ttyctx
//! `ttyctx-core` owns everything about terminal queries that does not need a
//! file descriptor: the request bytes, the parsers for the replies a terminal
//! sends back, and the typed values those replies decode into. The device
//! layer (`ttyctx-tty`) writes the requests and hands raw reply bytes to the
//! parsers here.
//!
//! # Primary responsibilities
//! - **report**: CSI/OSC request constants and best-effort reply parsers.
//! - **geometry**: window size in cells and pixels, zero meaning unknown.
//! - **config**: query timeout and read chunk size.
//! - **error**: the error taxonomy shared by both crates.
//!
//! Parsers never fail loudly. A reply that does not have the expected shape
//! decodes to `None`, because terminals are free to ignore any query.

pub mod config;
pub mod error;
pub mod geometry;
pub mod report;

pub use config::QueryConfig;
pub use error::{Result, TtyError};
pub use geometry::WindowGeometry;
pub use report::{ColorSlot, Rgb};
