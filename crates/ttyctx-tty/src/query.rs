//! Query protocol: write a request, wait a bounded time, read one reply.
//!
//! Every query runs inside a cbreak scope so the terminal's reply is
//! delivered byte-by-byte and is not echoed back. A terminal that does not
//! answer is not an error: the read simply yields no bytes once the timeout
//! expires, and the typed queries report the value as unknown.

use std::io;
use std::os::fd::AsFd;
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::poll::{PollFd, PollFlags, PollTimeout, poll};
use ttyctx_core::report::{
    self, PIXEL_SIZE_QUERY, TEXT_AREA_QUERY, parse_pixel_size_report, parse_text_area_report,
};
use ttyctx_core::{ColorSlot, Result, Rgb, WindowGeometry};

use crate::context::TerminalContext;

impl TerminalContext<'_> {
    /// Write `text` to the terminal, unbuffered, until every byte is sent.
    ///
    /// Does not change the terminal mode.
    ///
    /// # Errors
    ///
    /// The OS error of a failed write, or [`io::ErrorKind::WriteZero`] if
    /// the device accepts no more bytes.
    pub fn write(&self, text: &str) -> Result<()> {
        self.write_bytes(text.as_bytes())
    }

    /// Send `request` and return the reply read within the configured timeout.
    pub fn query(&self, request: &str) -> Result<Vec<u8>> {
        self.query_with_timeout(request, Some(self.config().timeout))
    }

    /// Send `request` and return at most one chunk of reply.
    ///
    /// Waits up to `timeout` for the terminal to become readable (`None`
    /// waits indefinitely). An expired wait returns an empty vector.
    pub fn query_with_timeout(&self, request: &str, timeout: Option<Duration>) -> Result<Vec<u8>> {
        let cbreak = self.cbreak()?;
        self.write_bytes(request.as_bytes())?;
        let reply = self.read_ready(self.config().chunk_size, timeout)?;
        cbreak.restore()?;

        #[cfg(feature = "tracing")]
        tracing::trace!(
            request = ?request,
            reply_len = reply.len(),
            complete = report::is_report_complete(&reply),
            "terminal query"
        );

        Ok(reply)
    }

    /// A single unbuffered read of up to `amount` bytes in cbreak mode.
    ///
    /// `None` blocks until input arrives; otherwise an expired wait returns
    /// an empty vector.
    pub fn read(&self, amount: usize, timeout: Option<Duration>) -> Result<Vec<u8>> {
        let cbreak = self.cbreak()?;
        let bytes = self.read_ready(amount, timeout)?;
        cbreak.restore()?;
        Ok(bytes)
    }

    /// Window size in cells and pixels.
    ///
    /// `TIOCGWINSZ` is consulted first. Missing cell dimensions are then
    /// requested with `CSI 18 t`, missing pixel dimensions with `CSI 14 t`.
    /// Each fallback is independent; whatever stays unknown is `0`.
    ///
    /// # Errors
    ///
    /// Only I/O failures of the fallback queries. A failing ioctl or an
    /// unusable reply degrades to zeros.
    pub fn window_geometry(&self) -> Result<WindowGeometry> {
        let mut geometry = match rustix::termios::tcgetwinsize(self.as_fd()) {
            Ok(ws) => WindowGeometry::new(ws.ws_col, ws.ws_row, ws.ws_xpixel, ws.ws_ypixel),
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(error = %_err, "TIOCGWINSZ failed, falling back to queries");
                WindowGeometry::default()
            }
        };

        if !geometry.has_text_area() {
            let reply = self.query(TEXT_AREA_QUERY)?;
            match parse_text_area_report(&reply) {
                Some((rows, cols)) => {
                    geometry.rows = rows;
                    geometry.cols = cols;
                }
                None => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(reply_len = reply.len(), "no usable text-area report");
                }
            }
        }

        if !geometry.has_pixel_size() {
            let reply = self.query(PIXEL_SIZE_QUERY)?;
            match parse_pixel_size_report(&reply) {
                Some((ypixel, xpixel)) => {
                    geometry.ypixel = ypixel;
                    geometry.xpixel = xpixel;
                }
                None => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(reply_len = reply.len(), "no usable pixel-size report");
                }
            }
        }

        Ok(geometry)
    }

    /// Ask the terminal for the color in `slot`.
    ///
    /// `Ok(None)` when the terminal stays silent or answers in a form other
    /// than `rgb:RRRR/GGGG/BBBB`.
    pub fn query_color(&self, slot: ColorSlot) -> Result<Option<Rgb>> {
        let reply = self.query(&slot.request())?;
        let color = report::parse_color_report(slot, &reply);

        #[cfg(feature = "tracing")]
        {
            if color.is_none() && !reply.is_empty() {
                tracing::debug!(
                    %slot,
                    truncated = !report::is_report_complete(&reply),
                    "unrecognized color report"
                );
            }
        }

        Ok(color)
    }

    fn write_bytes(&self, mut pending: &[u8]) -> Result<()> {
        while !pending.is_empty() {
            match rustix::io::write(self.as_fd(), pending) {
                Ok(0) => return Err(io::Error::from(io::ErrorKind::WriteZero).into()),
                Ok(sent) => pending = &pending[sent..],
                Err(rustix::io::Errno::INTR) => {}
                Err(err) => return Err(io::Error::from(err).into()),
            }
        }
        Ok(())
    }

    /// Wait for readability, then read once. Empty if the wait expired.
    fn read_ready(&self, amount: usize, timeout: Option<Duration>) -> Result<Vec<u8>> {
        if !self.wait_readable(timeout)? {
            #[cfg(feature = "tracing")]
            tracing::trace!(?timeout, "terminal read timed out");
            return Ok(Vec::new());
        }
        let mut buf = vec![0u8; amount];
        let read = loop {
            match rustix::io::read(self.as_fd(), &mut buf[..]) {
                Ok(read) => break read,
                Err(rustix::io::Errno::INTR) => {}
                Err(err) => return Err(io::Error::from(err).into()),
            }
        };
        buf.truncate(read);
        Ok(buf)
    }

    /// Poll for input. Interrupted polls resume with the time that is left,
    /// so the total wait never exceeds `timeout`.
    fn wait_readable(&self, timeout: Option<Duration>) -> Result<bool> {
        let deadline = timeout.map(|timeout| Instant::now() + timeout);
        let mut wait = timeout;
        loop {
            let poll_timeout = match wait {
                None => PollTimeout::NONE,
                Some(wait) => {
                    PollTimeout::try_from(ceil_millis(wait)).unwrap_or(PollTimeout::MAX)
                }
            };
            let mut fds = [PollFd::new(self.as_fd(), PollFlags::POLLIN)];
            match poll(&mut fds, poll_timeout) {
                Ok(0) => return Ok(false),
                Ok(_) => return Ok(true),
                Err(Errno::EINTR) => {
                    wait = deadline.map(|deadline| deadline.saturating_duration_since(Instant::now()));
                }
                Err(err) => return Err(io::Error::from(err).into()),
            }
        }
    }
}

/// Round `wait` up to whole milliseconds, the resolution of `poll(2)`, so a
/// sub-millisecond timeout still waits instead of polling once.
fn ceil_millis(wait: Duration) -> Duration {
    let millis = wait.as_nanos().div_ceil(1_000_000);
    Duration::from_millis(u64::try_from(millis).unwrap_or(u64::MAX))
}
