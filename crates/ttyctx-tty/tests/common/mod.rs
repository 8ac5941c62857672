#![allow(dead_code)]

//! PTY harness shared by the integration tests.
//!
//! The slave side plays the terminal device handed to `TerminalContext`;
//! the test (or a `Responder` thread) plays the terminal emulator on the
//! master side.

use std::os::fd::{AsFd, OwnedFd};
use std::thread;
use std::time::{Duration, Instant};

use nix::poll::{PollFd, PollFlags, PollTimeout, poll};
use nix::pty::{OpenptyResult, Winsize, openpty};
use nix::sys::termios::{Termios, tcgetattr};

pub struct Pty {
    pub master: OwnedFd,
    pub slave: OwnedFd,
}

/// Open a pseudo-terminal reporting the given window size.
pub fn open_pty(cols: u16, rows: u16, xpixel: u16, ypixel: u16) -> Pty {
    let winsize = Winsize {
        ws_row: rows,
        ws_col: cols,
        ws_xpixel: xpixel,
        ws_ypixel: ypixel,
    };
    let OpenptyResult { master, slave } =
        openpty(Some(&winsize), None::<&Termios>).expect("openpty");
    Pty { master, slave }
}

/// Current attributes of `fd`.
pub fn attrs(fd: impl AsFd) -> Termios {
    tcgetattr(fd).expect("tcgetattr")
}

/// Compare the parts of two attribute sets that mode changes touch.
pub fn same_mode(a: &Termios, b: &Termios) -> bool {
    a.input_flags == b.input_flags
        && a.output_flags == b.output_flags
        && a.control_flags == b.control_flags
        && a.local_flags == b.local_flags
        && a.control_chars == b.control_chars
}

/// Write to the master, i.e. type into the terminal.
pub fn type_in(master: &OwnedFd, bytes: &[u8]) {
    let mut pending = bytes;
    while !pending.is_empty() {
        let sent = rustix::io::write(master, pending).expect("write to pty master");
        pending = &pending[sent..];
    }
}

/// Read from the master until `want` bytes arrived or `timeout` passed.
pub fn drain(master: &OwnedFd, want: usize, timeout: Duration) -> Vec<u8> {
    let deadline = Instant::now() + timeout;
    let mut captured = Vec::new();
    let mut buf = [0u8; 4096];
    while captured.len() < want && Instant::now() < deadline {
        if !readable(master, Duration::from_millis(20)) {
            continue;
        }
        match rustix::io::read(master, &mut buf[..]) {
            Ok(0) | Err(_) => break,
            Ok(n) => captured.extend_from_slice(&buf[..n]),
        }
    }
    captured
}

fn readable(fd: &OwnedFd, wait: Duration) -> bool {
    let mut fds = [PollFd::new(fd.as_fd(), PollFlags::POLLIN)];
    let timeout = PollTimeout::try_from(wait).unwrap_or(PollTimeout::MAX);
    matches!(poll(&mut fds, timeout), Ok(n) if n > 0)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Scripted terminal emulator on the master side.
///
/// Answers each `(request, reply)` pair in order as soon as the request is
/// seen, and records every byte the slave wrote. Stops once it has been idle
/// for `idle` with nothing left to answer.
pub struct Responder {
    handle: thread::JoinHandle<Vec<u8>>,
}

impl Responder {
    pub fn spawn(master: OwnedFd, script: Vec<(&'static str, &'static str)>, idle: Duration) -> Self {
        let handle = thread::Builder::new()
            .name("pty-responder".into())
            .spawn(move || {
                let mut captured = Vec::new();
                let mut cursor = 0;
                let mut next = 0;
                let mut last_activity = Instant::now();
                let mut buf = [0u8; 1024];
                loop {
                    if last_activity.elapsed() > idle {
                        break;
                    }
                    if !readable(&master, Duration::from_millis(10)) {
                        continue;
                    }
                    match rustix::io::read(&master, &mut buf[..]) {
                        Ok(0) | Err(_) => break,
                        Ok(n) => captured.extend_from_slice(&buf[..n]),
                    }
                    last_activity = Instant::now();
                    while let Some((request, reply)) = script.get(next) {
                        let Some(pos) = find(&captured[cursor..], request.as_bytes()) else {
                            break;
                        };
                        cursor += pos + request.len();
                        next += 1;
                        type_in(&master, reply.as_bytes());
                    }
                }
                captured
            })
            .expect("spawn responder");
        Self { handle }
    }

    /// Everything the slave wrote while the responder ran.
    pub fn finish(self) -> Vec<u8> {
        self.handle.join().expect("responder panicked")
    }
}

pub fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    find(haystack, needle).is_some()
}
