#![forbid(unsafe_code)]

//! Terminal reports: the requests we send and the replies we accept.
//!
//! Only a fixed set of replies is recognized, each one produced by a
//! request this crate sent itself. Parsing is fail-open: a reply that is
//! empty, truncated, or shaped differently decodes to `None` and the caller
//! treats the value as unknown.
//!
//! | Purpose | Request | Reply |
//! |---|---|---|
//! | Text-area size | `CSI 18 t` | `CSI 8 ; rows ; cols t` |
//! | Pixel size | `CSI 14 t` | `CSI 4 ; ypixel ; xpixel t` |
//! | Foreground | `OSC 10 ; ? ST` | `OSC 10 ; rgb:RRRR/GGGG/BBBB ST` |
//! | Background | `OSC 11 ; ? ST` | `OSC 11 ; rgb:RRRR/GGGG/BBBB ST` |
//! | Palette `N` | `OSC 4 ; N ; ? ST` | `OSC 4 ; N ; rgb:RRRR/GGGG/BBBB ST` |
//!
//! Replies may end in either `ESC \` or `BEL`.

use std::fmt;
use std::str::FromStr;

use crate::error::TtyError;

const ESC: u8 = 0x1b;
const BEL: u8 = 0x07;

const OSC_PREFIX: &[u8] = b"\x1b]";
const ST: &[u8] = b"\x1b\\";

// --- Text-area size ---
//
// Query:    ESC [ 18 t
// Response: ESC [ 8 ; rows ; cols t

/// Request for the text-area size in characters.
pub const TEXT_AREA_QUERY: &str = "\x1b[18t";

const TEXT_AREA_PREFIX: &[u8] = b"\x1b[8;";

/// Parse a `CSI 8 ; rows ; cols t` reply into `(rows, cols)`.
#[must_use]
pub fn parse_text_area_report(bytes: &[u8]) -> Option<(u16, u16)> {
    parse_csi_pair(bytes, TEXT_AREA_PREFIX)
}

// --- Pixel size ---
//
// Query:    ESC [ 14 t
// Response: ESC [ 4 ; height ; width t

/// Request for the text-area size in pixels.
pub const PIXEL_SIZE_QUERY: &str = "\x1b[14t";

const PIXEL_SIZE_PREFIX: &[u8] = b"\x1b[4;";

/// Parse a `CSI 4 ; ypixel ; xpixel t` reply into `(ypixel, xpixel)`.
#[must_use]
pub fn parse_pixel_size_report(bytes: &[u8]) -> Option<(u16, u16)> {
    parse_csi_pair(bytes, PIXEL_SIZE_PREFIX)
}

/// Two decimal parameters between `prefix` and a final `t`.
fn parse_csi_pair(bytes: &[u8], prefix: &[u8]) -> Option<(u16, u16)> {
    let params = bytes.strip_prefix(prefix)?.strip_suffix(b"t")?;
    let mut parts = params.split(|&b| b == b';');
    let first = parse_decimal(parts.next()?)?;
    let second = parse_decimal(parts.next()?)?;
    if parts.next().is_some() {
        return None;
    }
    Some((first, second))
}

fn parse_decimal(chunk: &[u8]) -> Option<u16> {
    std::str::from_utf8(chunk).ok()?.trim().parse().ok()
}

// --- Dynamic colors ---
//
// Query:    ESC ] 10 ; ? ESC \          (foreground)
//           ESC ] 11 ; ? ESC \          (background)
//           ESC ] 4 ; N ; ? ESC \       (palette entry N)
// Response: ESC ] <code> ; rgb:RRRR/GGGG/BBBB ST

/// Which color a query asks the terminal about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSlot {
    /// Default foreground (OSC 10).
    Foreground,
    /// Default background (OSC 11).
    Background,
    /// Palette entry (OSC 4).
    Palette(u8),
}

impl ColorSlot {
    /// OSC parameter prefix identifying this slot, e.g. `10` or `4;12`.
    #[must_use]
    pub fn code(&self) -> String {
        match self {
            Self::Foreground => "10".to_string(),
            Self::Background => "11".to_string(),
            Self::Palette(index) => format!("4;{index}"),
        }
    }

    /// The complete OSC query for this slot, terminated by `ESC \`.
    #[must_use]
    pub fn request(&self) -> String {
        format!("\x1b]{};?\x1b\\", self.code())
    }
}

impl FromStr for ColorSlot {
    type Err = TtyError;

    /// Accepts `fg`, `bg`, or a palette index `0`-`255`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fg" => Ok(Self::Foreground),
            "bg" => Ok(Self::Background),
            _ if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => s
                .parse::<u8>()
                .map(Self::Palette)
                .map_err(|_| TtyError::InvalidColorSlot(s.to_string())),
            _ => Err(TtyError::InvalidColorSlot(s.to_string())),
        }
    }
}

impl fmt::Display for ColorSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Foreground => f.write_str("fg"),
            Self::Background => f.write_str("bg"),
            Self::Palette(index) => write!(f, "{index}"),
        }
    }
}

/// A 24-bit color. Displays as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Lowercase `#rrggbb`.
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Parse an OSC color reply for `slot`.
///
/// Each channel is read as a 16-bit value and only its high byte is kept,
/// so `rgb:3232/6464/9696` becomes `#326496`.
#[must_use]
pub fn parse_color_report(slot: ColorSlot, bytes: &[u8]) -> Option<Rgb> {
    let body = bytes.strip_prefix(OSC_PREFIX)?;
    let body = body
        .strip_suffix(ST)
        .or_else(|| body.strip_suffix(&[BEL]))?;
    let body = body.strip_prefix(slot.code().as_bytes())?;
    let rgb = body.strip_prefix(b";")?.strip_prefix(b"rgb:")?;

    let mut channels = rgb.split(|&b| b == b'/');
    let r = parse_channel(channels.next()?)?;
    let g = parse_channel(channels.next()?)?;
    let b = parse_channel(channels.next()?)?;
    if channels.next().is_some() {
        return None;
    }
    Some(Rgb::new(r, g, b))
}

fn parse_channel(chunk: &[u8]) -> Option<u8> {
    let s = std::str::from_utf8(chunk).ok()?;
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let value = u16::from_str_radix(s, 16).ok()?;
    Some((value >> 8) as u8)
}

// --- Completeness ---

/// Check whether `buf` holds a finished reply.
///
/// Recognizes:
/// - CSI replies: `ESC [ ... <alpha>`
/// - OSC replies: `ESC ] ... BEL` or `ESC ] ... ESC \`
///
/// A query reads a single chunk, so a `false` here after a read means the
/// terminal split its reply and the tail was left unread.
#[must_use]
pub fn is_report_complete(buf: &[u8]) -> bool {
    if buf.len() < 3 || buf[0] != ESC {
        return false;
    }
    let last = buf[buf.len() - 1];
    match buf[1] {
        b'[' => last.is_ascii_alphabetic(),
        b']' => last == BEL || (buf.len() >= 4 && buf.ends_with(ST)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- Text-area parsing tests ---

    #[test]
    fn parse_text_area_basic() {
        assert_eq!(parse_text_area_report(b"\x1b[8;40;120t"), Some((40, 120)));
    }

    #[test]
    fn parse_text_area_tolerates_padding() {
        assert_eq!(parse_text_area_report(b"\x1b[8; 24 ;80t"), Some((24, 80)));
    }

    #[test]
    fn parse_text_area_empty_response() {
        assert!(parse_text_area_report(b"").is_none());
    }

    #[test]
    fn parse_text_area_wrong_report() {
        // A pixel report is not a text-area report.
        assert!(parse_text_area_report(b"\x1b[4;800;1600t").is_none());
    }

    #[test]
    fn parse_text_area_no_terminator() {
        assert!(parse_text_area_report(b"\x1b[8;40;120").is_none());
    }

    #[test]
    fn parse_text_area_wrong_arity() {
        assert!(parse_text_area_report(b"\x1b[8;40t").is_none());
        assert!(parse_text_area_report(b"\x1b[8;40;120;7t").is_none());
    }

    #[test]
    fn parse_text_area_non_numeric() {
        assert!(parse_text_area_report(b"\x1b[8;forty;120t").is_none());
        assert!(parse_text_area_report(b"\x1b[8;-1;120t").is_none());
    }

    #[test]
    fn parse_text_area_overflow() {
        assert!(parse_text_area_report(b"\x1b[8;70000;120t").is_none());
    }

    // --- Pixel parsing tests ---

    #[test]
    fn parse_pixel_size_height_first() {
        assert_eq!(parse_pixel_size_report(b"\x1b[4;800;1600t"), Some((800, 1600)));
    }

    #[test]
    fn parse_pixel_size_trailing_garbage() {
        assert!(parse_pixel_size_report(b"\x1b[4;800;1600tjunk").is_none());
    }

    // --- Color slot tests ---

    #[test]
    fn slot_from_str() {
        assert_eq!("fg".parse::<ColorSlot>().unwrap(), ColorSlot::Foreground);
        assert_eq!("bg".parse::<ColorSlot>().unwrap(), ColorSlot::Background);
        assert_eq!("0".parse::<ColorSlot>().unwrap(), ColorSlot::Palette(0));
        assert_eq!("255".parse::<ColorSlot>().unwrap(), ColorSlot::Palette(255));
        assert_eq!("007".parse::<ColorSlot>().unwrap(), ColorSlot::Palette(7));
    }

    #[test]
    fn slot_from_str_rejects_out_of_range() {
        for bad in ["256", "-1", "+5", " 5", "", "FG", "red"] {
            let err = bad.parse::<ColorSlot>().unwrap_err();
            assert!(matches!(err, TtyError::InvalidColorSlot(ref s) if s == bad));
        }
    }

    #[test]
    fn slot_requests() {
        assert_eq!(ColorSlot::Foreground.request(), "\x1b]10;?\x1b\\");
        assert_eq!(ColorSlot::Background.request(), "\x1b]11;?\x1b\\");
        assert_eq!(ColorSlot::Palette(12).request(), "\x1b]4;12;?\x1b\\");
    }

    #[test]
    fn slot_display_matches_input_form() {
        assert_eq!(ColorSlot::Foreground.to_string(), "fg");
        assert_eq!(ColorSlot::Palette(7).to_string(), "7");
    }

    // --- Color parsing tests ---

    #[test]
    fn parse_foreground_st() {
        let rgb = parse_color_report(
            ColorSlot::Foreground,
            b"\x1b]10;rgb:3232/6464/9696\x1b\\",
        )
        .unwrap();
        assert_eq!(rgb.to_string(), "#326496");
    }

    #[test]
    fn parse_foreground_bel() {
        let rgb =
            parse_color_report(ColorSlot::Foreground, b"\x1b]10;rgb:3232/6464/9696\x07").unwrap();
        assert_eq!(rgb.to_hex(), "#326496");
    }

    #[test]
    fn parse_background_white() {
        let rgb =
            parse_color_report(ColorSlot::Background, b"\x1b]11;rgb:ffff/ffff/ffff\x1b\\").unwrap();
        assert_eq!(rgb, Rgb::new(0xff, 0xff, 0xff));
    }

    #[test]
    fn parse_palette_entry() {
        let rgb =
            parse_color_report(ColorSlot::Palette(12), b"\x1b]4;12;rgb:0a0a/ABAB/0000\x07").unwrap();
        assert_eq!(rgb.to_string(), "#0aab00");
    }

    #[test]
    fn parse_color_missing_rgb_marker() {
        assert!(parse_color_report(ColorSlot::Foreground, b"\x1b]10;3232/6464/9696\x1b\\").is_none());
    }

    #[test]
    fn parse_color_missing_terminator() {
        assert!(parse_color_report(ColorSlot::Foreground, b"\x1b]10;rgb:3232/6464/9696").is_none());
    }

    #[test]
    fn parse_color_wrong_slot() {
        assert!(
            parse_color_report(ColorSlot::Background, b"\x1b]10;rgb:3232/6464/9696\x1b\\")
                .is_none()
        );
        assert!(
            parse_color_report(ColorSlot::Palette(1), b"\x1b]4;12;rgb:3232/6464/9696\x1b\\")
                .is_none()
        );
    }

    #[test]
    fn parse_color_wrong_channel_count() {
        assert!(parse_color_report(ColorSlot::Foreground, b"\x1b]10;rgb:3232/6464\x1b\\").is_none());
        assert!(
            parse_color_report(ColorSlot::Foreground, b"\x1b]10;rgb:1/2/3/4\x1b\\").is_none()
        );
    }

    #[test]
    fn parse_color_bad_hex() {
        assert!(
            parse_color_report(ColorSlot::Foreground, b"\x1b]10;rgb:zzzz/6464/9696\x1b\\")
                .is_none()
        );
        assert!(
            parse_color_report(ColorSlot::Foreground, b"\x1b]10;rgb:12345/6464/9696\x1b\\")
                .is_none()
        );
    }

    #[test]
    fn parse_color_short_channels_keep_high_byte() {
        // Two-digit channels are still read as 16-bit values.
        let rgb = parse_color_report(ColorSlot::Foreground, b"\x1b]10;rgb:ff/ff/ff\x07").unwrap();
        assert_eq!(rgb, Rgb::new(0, 0, 0));
    }

    #[test]
    fn parse_color_empty() {
        assert!(parse_color_report(ColorSlot::Foreground, b"").is_none());
    }

    // --- Completeness ---

    #[test]
    fn complete_csi() {
        assert!(is_report_complete(b"\x1b[8;24;80t"));
        assert!(!is_report_complete(b"\x1b[8;24;80"));
    }

    #[test]
    fn complete_osc() {
        assert!(is_report_complete(b"\x1b]11;rgb:0/0/0\x07"));
        assert!(is_report_complete(b"\x1b]11;rgb:0/0/0\x1b\\"));
        assert!(!is_report_complete(b"\x1b]11;rgb:0/0/0\x1b"));
    }

    #[test]
    fn complete_rejects_noise() {
        assert!(!is_report_complete(b""));
        assert!(!is_report_complete(b"abc"));
        assert!(!is_report_complete(b"\x1bP1$r\x1b\\"));
    }
}
