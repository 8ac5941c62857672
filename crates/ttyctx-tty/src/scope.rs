//! Acquire-use-close helpers.

use std::os::fd::BorrowedFd;

use ttyctx_core::Result;

use crate::context::TerminalContext;

/// Run `f` with the terminal on `fd`, then close it.
///
/// The initial attributes are restored after `f` returns, and during unwinding
/// if `f` panics. `fd` itself stays open.
///
/// # Errors
///
/// [`TtyError::NotATerminal`](ttyctx_core::TtyError::NotATerminal) before `f`
/// runs, or the restore failure after it.
pub fn with_terminal<R, F>(fd: BorrowedFd<'_>, f: F) -> Result<R>
where
    F: FnOnce(&TerminalContext<'_>) -> R,
{
    let tty = TerminalContext::new(fd)?;
    let value = f(&tty);
    tty.close()?;
    Ok(value)
}

/// Run `f` with the controlling terminal, then restore and close it.
pub fn with_controlling_terminal<R, F>(f: F) -> Result<R>
where
    F: FnOnce(&TerminalContext<'static>) -> R,
{
    let tty = TerminalContext::open_controlling()?;
    let value = f(&tty);
    tty.close()?;
    Ok(value)
}
