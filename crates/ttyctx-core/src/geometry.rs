#![forbid(unsafe_code)]

//! Window geometry.

/// Size of the terminal window in character cells and in pixels.
///
/// Every field uses `0` for "could not be determined". A zero is never a
/// real measurement, so callers test fields rather than trusting them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct WindowGeometry {
    /// Text-area width in cells.
    pub cols: u16,
    /// Text-area height in cells.
    pub rows: u16,
    /// Text-area width in pixels.
    pub xpixel: u16,
    /// Text-area height in pixels.
    pub ypixel: u16,
}

impl WindowGeometry {
    /// Create a geometry value.
    #[inline]
    pub const fn new(cols: u16, rows: u16, xpixel: u16, ypixel: u16) -> Self {
        Self {
            cols,
            rows,
            xpixel,
            ypixel,
        }
    }

    /// Both cell dimensions are known.
    #[inline]
    pub const fn has_text_area(&self) -> bool {
        self.cols != 0 && self.rows != 0
    }

    /// Both pixel dimensions are known.
    #[inline]
    pub const fn has_pixel_size(&self) -> bool {
        self.xpixel != 0 && self.ypixel != 0
    }

    /// `(cols, rows, xpixel, ypixel)`.
    #[inline]
    pub const fn as_tuple(&self) -> (u16, u16, u16, u16) {
        (self.cols, self.rows, self.xpixel, self.ypixel)
    }

    /// Pixel size of a single cell as `(width, height)`, rounded down.
    ///
    /// `None` unless all four fields are known.
    pub fn cell_size(&self) -> Option<(u16, u16)> {
        if !self.has_text_area() || !self.has_pixel_size() {
            return None;
        }
        Some((self.xpixel / self.cols, self.ypixel / self.rows))
    }
}

impl From<WindowGeometry> for (u16, u16, u16, u16) {
    fn from(geometry: WindowGeometry) -> Self {
        geometry.as_tuple()
    }
}
