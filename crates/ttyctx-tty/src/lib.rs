#![forbid(unsafe_code)]
#![doc = "Native Unix terminal handle for ttyctx."]
#![doc = ""]
#![doc = "Owns a terminal descriptor, toggles cbreak mode with guaranteed"]
#![doc = "restoration, and runs the escape-sequence query protocol whose"]
#![doc = "requests and reply parsers live in `ttyctx-core`."]
#![doc = ""]
#![doc = "## Components"]
#![doc = ""]
#![doc = "- [`TerminalContext`]: attribute snapshot, cbreak and custom-state guards, close."]
#![doc = "- Query methods on [`TerminalContext`]: `query`, `write`, `read`,"]
#![doc = "  `window_geometry`, `query_color`."]
#![doc = "- [`with_terminal`] / [`with_controlling_terminal`]: acquire, use, close."]

#[cfg(unix)]
mod context;
#[cfg(unix)]
mod query;
#[cfg(unix)]
mod scope;

#[cfg(unix)]
pub use context::{CONTROLLING_TERMINAL, CbreakGuard, CustomState, TerminalContext};
#[cfg(unix)]
pub use scope::{with_controlling_terminal, with_terminal};

pub use ttyctx_core::{ColorSlot, QueryConfig, Result, Rgb, TtyError, WindowGeometry};
