//! Clamped neighborhood bounds.
//!
//! Windows are cut off at the image border, never wrapped or mirrored, so a
//! window near an edge holds fewer pixels than `(2 * radius + 1)^2`.

use super::ImageInfo;

/// Inclusive range of coordinates along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// Span of `c - radius ..= c + radius` clamped to `0 ..= n - 1`.
    ///
    /// Returns `None` for an empty axis (`n == 0`).
    pub fn around(c: usize, radius: usize, n: usize) -> Option<Span> {
        if n == 0 {
            return None;
        }
        let start = if c < radius { 0 } else { c - radius };
        let end = if c.saturating_add(radius) >= n {
            n - 1
        } else {
            c + radius
        };
        Some(Span { start, end })
    }

    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }
}

/// Rectangle of pixels contributing to one output pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub rows: Span,
    pub cols: Span,
}

impl Window {
    /// Window around linear index `idx`, or `None` if `idx` lies outside the image.
    pub fn around(info: &ImageInfo, radius: usize, idx: usize) -> Option<Window> {
        if info.is_empty() || idx >= info.len() {
            return None;
        }
        let (row, col) = info.coords(idx);
        Some(Window {
            rows: Span::around(row, radius, info.height)?,
            cols: Span::around(col, radius, info.width)?,
        })
    }

    /// Number of in-bounds pixels, the divisor of the mean.
    pub fn count(&self) -> usize {
        self.rows.len() * self.cols.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_clamps_without_underflow() {
        assert_eq!(Span::around(1, 3, 10), Some(Span { start: 0, end: 4 }));
        assert_eq!(Span::around(8, 3, 10), Some(Span { start: 5, end: 9 }));
        assert_eq!(Span::around(5, 0, 10), Some(Span { start: 5, end: 5 }));
        assert_eq!(Span::around(0, usize::MAX, 4), Some(Span { start: 0, end: 3 }));
    }

    #[test]
    fn span_rejects_empty_axis() {
        assert_eq!(Span::around(0, 1, 0), None);
    }

    #[test]
    fn corner_window_is_truncated() {
        for &(w, h, r) in &[(7, 5, 2), (3, 3, 10), (1, 9, 4), (6, 6, 0)] {
            let info = ImageInfo::new(w, h);
            let window = Window::around(&info, r, 0).unwrap();
            let expected = (r.min(h - 1) + 1) * (r.min(w - 1) + 1);
            assert_eq!(window.count(), expected, "{}x{} r={}", w, h, r);
        }
    }

    #[test]
    fn interior_window_is_full() {
        let info = ImageInfo::new(9, 9);
        let window = Window::around(&info, 2, info.offset(4, 4)).unwrap();
        assert_eq!(window.count(), 25);
    }

    #[test]
    fn window_outside_image() {
        let info = ImageInfo::new(4, 4);
        assert!(Window::around(&info, 1, 16).is_none());
        assert!(Window::around(&ImageInfo::new(0, 4), 1, 0).is_none());
    }
}
