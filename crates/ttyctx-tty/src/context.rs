#![forbid(unsafe_code)]

//! Terminal handle and mode lifecycle guards.
//!
//! A [`TerminalContext`] snapshots the device's termios attributes the
//! moment it is acquired and puts them back when it is closed or dropped.
//! Mode changes in between are scoped by guards whose [`Drop`] restores the
//! attributes captured at guard creation.
//!
//! # Lifecycle Guarantees
//!
//! 1. **Snapshot before mutation** - the initial attribute set is read once,
//!    at acquisition, after the descriptor passes the terminal check.
//!
//! 2. **Close restores the original** - [`TerminalContext::close`] applies
//!    the acquisition-time attributes, never an intermediate cbreak snapshot.
//!
//! 3. **Guards restore on every exit path** - return, `?`, and panic
//!    unwinding all run [`CbreakGuard`]'s and [`CustomState`]'s `Drop`.
//!
//! 4. **Restoration runs once** - `close` marks the handle so `Drop` does
//!    not restore a second time.
//!
//! # Cbreak Nesting
//!
//! Cbreak state is a single flag, not a counter. Entering cbreak while it is
//! already active yields an inert guard: it neither snapshots nor restores.
//! Only the guard that performed the switch restores, so the terminal returns
//! to the state before the outermost entry.
//!
//! All attribute writes use `TCSADRAIN`: pending output is transmitted before
//! the new attributes take effect.

use std::cell::Cell;
use std::fs::OpenOptions;
use std::io;
use std::marker::PhantomData;
use std::os::fd::{AsFd, BorrowedFd, OwnedFd};
use std::path::{Path, PathBuf};

use nix::sys::termios::{self, LocalFlags, SetArg, SpecialCharacterIndices, Termios};
use ttyctx_core::{QueryConfig, Result, TtyError};

/// Path of the calling process's controlling terminal.
pub const CONTROLLING_TERMINAL: &str = "/dev/tty";

/// Descriptor held by a context: borrowed from the caller, or owned and
/// closed together with the context.
#[derive(Debug)]
enum TtyFd<'fd> {
    Borrowed(BorrowedFd<'fd>),
    Owned(OwnedFd),
}

impl AsFd for TtyFd<'_> {
    fn as_fd(&self) -> BorrowedFd<'_> {
        match self {
            Self::Borrowed(fd) => *fd,
            Self::Owned(fd) => fd.as_fd(),
        }
    }
}

/// An acquired terminal device.
///
/// The context is single-threaded: it is neither `Send`-shared nor locked,
/// and every method takes `&self` so guards and queries can borrow it at
/// the same time.
///
/// # Example
///
/// ```no_run
/// use ttyctx_tty::TerminalContext;
///
/// let tty = TerminalContext::open_controlling()?;
/// {
///     let _cbreak = tty.cbreak()?;
///     // Input now arrives byte-by-byte without echo.
/// }
/// tty.close()?;
/// # Ok::<(), ttyctx_core::TtyError>(())
/// ```
#[derive(Debug)]
pub struct TerminalContext<'fd> {
    fd: TtyFd<'fd>,
    initial_attributes: Termios,
    cbreak: Cell<bool>,
    config: QueryConfig,
    closed: bool,
}

impl<'fd> TerminalContext<'fd> {
    /// Acquire a terminal the caller keeps ownership of.
    ///
    /// # Errors
    ///
    /// [`TtyError::NotATerminal`] if `fd` is not a terminal; the attributes
    /// are not read in that case.
    pub fn new(fd: BorrowedFd<'fd>) -> Result<Self> {
        Self::acquire(TtyFd::Borrowed(fd))
    }

    fn acquire(fd: TtyFd<'fd>) -> Result<Self> {
        if !rustix::termios::isatty(fd.as_fd()) {
            return Err(TtyError::NotATerminal);
        }
        let initial_attributes = termios::tcgetattr(fd.as_fd()).map_err(io::Error::from)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            owned = matches!(fd, TtyFd::Owned(_)),
            "terminal acquired, attributes captured"
        );

        Ok(Self {
            fd,
            initial_attributes,
            cbreak: Cell::new(false),
            config: QueryConfig::default(),
            closed: false,
        })
    }

    /// Replace the query configuration.
    #[must_use]
    pub fn with_config(mut self, config: QueryConfig) -> Self {
        self.config = config;
        self
    }

    /// The query configuration in effect.
    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Whether the context closes its descriptor.
    pub fn owns_fd(&self) -> bool {
        matches!(self.fd, TtyFd::Owned(_))
    }

    /// The attribute set captured at acquisition.
    pub fn initial_attributes(&self) -> &Termios {
        &self.initial_attributes
    }

    /// Read the device's current attributes.
    pub fn attributes(&self) -> Result<Termios> {
        Ok(termios::tcgetattr(self.fd.as_fd()).map_err(io::Error::from)?)
    }

    /// Path of the terminal device, e.g. `/dev/pts/3`.
    pub fn tty_name(&self) -> Result<PathBuf> {
        Ok(nix::unistd::ttyname(self.fd.as_fd()).map_err(io::Error::from)?)
    }

    /// Whether a cbreak scope is currently active.
    pub fn is_cbreak(&self) -> bool {
        self.cbreak.get()
    }

    /// Enter cbreak mode until the returned guard drops.
    ///
    /// Echo and canonical line editing are turned off, reads return after a
    /// single byte, and signal characters keep working. If cbreak is already
    /// active the guard is inert.
    ///
    /// # Errors
    ///
    /// Fails if the attributes cannot be read or written. A failed switch
    /// still reapplies the snapshot before returning.
    pub fn cbreak(&self) -> Result<CbreakGuard<'_>> {
        if self.cbreak.get() {
            #[cfg(feature = "tracing")]
            tracing::trace!("cbreak already active, nested scope is inert");
            return Ok(CbreakGuard {
                fd: self.fd.as_fd(),
                active: &self.cbreak,
                saved: None,
            });
        }

        let saved = self.attributes()?;
        let cbreak = cbreak_attributes(&saved);
        let guard = CbreakGuard {
            fd: self.fd.as_fd(),
            active: &self.cbreak,
            saved: Some(saved),
        };
        termios::tcsetattr(self.fd.as_fd(), SetArg::TCSADRAIN, &cbreak).map_err(io::Error::from)?;
        self.cbreak.set(true);

        #[cfg(feature = "tracing")]
        tracing::debug!("cbreak mode entered");

        Ok(guard)
    }

    /// Enter a caller-defined terminal state.
    ///
    /// `undo` runs when the returned guard drops, on every exit path. Use it
    /// to layer modes this type knows nothing about (alternate screen,
    /// mouse reporting, ...) with the same cleanup guarantee.
    ///
    /// ```no_run
    /// # use ttyctx_tty::TerminalContext;
    /// # let tty = TerminalContext::open_controlling()?;
    /// tty.write("\x1b[?1049h")?;
    /// let _alt = tty.custom_state(Some(|| {
    ///     let _ = tty.write("\x1b[?1049l");
    /// }));
    /// # Ok::<(), ttyctx_core::TtyError>(())
    /// ```
    pub fn custom_state<F>(&self, undo: Option<F>) -> CustomState<'_, F>
    where
        F: FnOnce(),
    {
        CustomState {
            undo,
            _context: PhantomData,
        }
    }

    /// Restore the acquisition-time attributes and release the descriptor.
    ///
    /// An owned descriptor is closed; a borrowed one is left open.
    ///
    /// # Errors
    ///
    /// Returns the failure of the final `tcsetattr`. The descriptor is
    /// released either way.
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        self.restore_initial()
    }

    fn restore_initial(&self) -> Result<()> {
        termios::tcsetattr(
            self.fd.as_fd(),
            SetArg::TCSADRAIN,
            &self.initial_attributes,
        )
        .map_err(io::Error::from)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(owned = self.owns_fd(), "initial terminal attributes restored");

        Ok(())
    }
}

impl TerminalContext<'static> {
    /// Acquire a terminal and take ownership of its descriptor.
    pub fn from_owned(fd: OwnedFd) -> Result<Self> {
        Self::acquire(TtyFd::Owned(fd))
    }

    /// Open the controlling terminal read/write and acquire it.
    pub fn open_controlling() -> Result<Self> {
        Self::open_path(CONTROLLING_TERMINAL)
    }

    /// Open a terminal device by path read/write and acquire it.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Self::from_owned(OwnedFd::from(file))
    }
}

impl AsFd for TerminalContext<'_> {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

impl Drop for TerminalContext<'_> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(_err) = self.restore_initial() {
            #[cfg(feature = "tracing")]
            tracing::warn!(error = %_err, "failed to restore terminal attributes on drop");
        }
    }
}

/// Attributes for cbreak mode derived from `base`.
fn cbreak_attributes(base: &Termios) -> Termios {
    let mut attrs = base.clone();
    attrs.local_flags.remove(LocalFlags::ECHO | LocalFlags::ICANON);
    attrs.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
    attrs.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;
    attrs
}

/// Active cbreak scope. Dropping it restores the attributes it replaced.
#[must_use = "cbreak mode ends as soon as the guard is dropped"]
#[derive(Debug)]
pub struct CbreakGuard<'a> {
    fd: BorrowedFd<'a>,
    active: &'a Cell<bool>,
    saved: Option<Termios>,
}

impl CbreakGuard<'_> {
    /// Whether this guard performed the switch (and will undo it).
    pub fn is_outermost(&self) -> bool {
        self.saved.is_some()
    }

    /// Leave the scope now, reporting a failed restore instead of logging it.
    pub fn restore(mut self) -> Result<()> {
        self.restore_saved()
    }

    fn restore_saved(&mut self) -> Result<()> {
        let Some(saved) = self.saved.take() else {
            return Ok(());
        };
        self.active.set(false);
        termios::tcsetattr(self.fd, SetArg::TCSADRAIN, &saved).map_err(io::Error::from)?;

        #[cfg(feature = "tracing")]
        tracing::debug!("cbreak mode left");

        Ok(())
    }
}

impl Drop for CbreakGuard<'_> {
    fn drop(&mut self) {
        if let Err(_err) = self.restore_saved() {
            #[cfg(feature = "tracing")]
            tracing::warn!(error = %_err, "failed to leave cbreak mode");
        }
    }
}

/// Caller-defined terminal state; runs its undo callback on drop.
#[must_use = "the undo callback runs as soon as the guard is dropped"]
pub struct CustomState<'a, F>
where
    F: FnOnce(),
{
    undo: Option<F>,
    _context: PhantomData<&'a ()>,
}

impl<F> CustomState<'_, F>
where
    F: FnOnce(),
{
    /// Whether an undo callback is still pending.
    pub fn has_undo(&self) -> bool {
        self.undo.is_some()
    }
}

impl<F> Drop for CustomState<'_, F>
where
    F: FnOnce(),
{
    fn drop(&mut self) {
        if let Some(undo) = self.undo.take() {
            undo();
        }
    }
}
