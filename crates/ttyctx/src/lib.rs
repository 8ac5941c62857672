#![forbid(unsafe_code)]

//! ttyctx public facade crate.
//!
//! Re-exports the protocol layer (`ttyctx-core`) and the Unix terminal
//! handle (`ttyctx-tty`) under one name, and hosts the `ttyctx` command.
//!
//! ```no_run
//! use ttyctx::prelude::*;
//!
//! let geometry = with_controlling_terminal(|tty| tty.window_geometry())??;
//! println!("{} x {}", geometry.cols, geometry.rows);
//! # Ok::<(), TtyError>(())
//! ```

// --- Core re-exports -------------------------------------------------------

pub use ttyctx_core::config::{self, QueryConfig};
pub use ttyctx_core::report::{self, ColorSlot, Rgb};
pub use ttyctx_core::{Result, TtyError, WindowGeometry};

// --- Terminal re-exports ---------------------------------------------------

#[cfg(unix)]
pub use ttyctx_tty::{
    CONTROLLING_TERMINAL, CbreakGuard, CustomState, TerminalContext, with_controlling_terminal,
    with_terminal,
};

#[cfg(unix)]
pub mod cli;

/// Everyday imports.
pub mod prelude {
    pub use crate::{ColorSlot, QueryConfig, Rgb, TtyError, WindowGeometry};

    #[cfg(unix)]
    pub use crate::{TerminalContext, with_controlling_terminal, with_terminal};
}
