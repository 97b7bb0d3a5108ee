/// Viewport rectangle in framebuffer pixels.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Viewport {
    #[inline]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Viewport covering a whole `width` x `height` surface.
    #[inline]
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, clamp_dim(width), clamp_dim(height))
    }

    /// True when both extents are non-positive.
    ///
    /// Such a viewport is never sent to the device; it usually means the state
    /// was never initialized.
    #[inline]
    pub fn is_degenerate(self) -> bool {
        self.width <= 0 && self.height <= 0
    }
}

#[inline]
fn clamp_dim(v: u32) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_starts_at_origin() {
        assert_eq!(Viewport::full(640, 480), Viewport::new(0, 0, 640, 480));
    }

    #[test]
    fn full_saturates_huge_extents() {
        assert_eq!(Viewport::full(u32::MAX, 1).width, i32::MAX);
    }

    #[test]
    fn degenerate_requires_both_extents() {
        assert!(Viewport::new(0, 0, 0, 0).is_degenerate());
        assert!(Viewport::new(5, 5, -1, 0).is_degenerate());
        assert!(!Viewport::new(0, 0, 0, 10).is_degenerate());
        assert!(!Viewport::new(0, 0, 10, 0).is_degenerate());
    }
}
