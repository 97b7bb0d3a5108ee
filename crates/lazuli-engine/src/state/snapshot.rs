use crate::coords::{Mat4, Viewport};

use super::BlendMode;

/// Complete render state compared by the diffing engine before every draw.
///
/// Equality is field by field; there is no byte-level comparison, so padding
/// never influences whether a state change is issued.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Snapshot {
    pub blend_mode: BlendMode,
    pub transform: Mat4,
    pub projection: Mat4,
    pub viewport: Viewport,
    pub line_width: f32,
}

impl Snapshot {
    pub const DEFAULT_LINE_WIDTH: f32 = 1.0;

    /// Default state for a surface whose full extent is `viewport`.
    pub fn new(viewport: Viewport) -> Self {
        Self {
            blend_mode: BlendMode::default(),
            transform: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            viewport,
            line_width: Self::DEFAULT_LINE_WIDTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let s = Snapshot::new(Viewport::full(320, 200));
        assert_eq!(s.blend_mode, BlendMode::ALPHA);
        assert_eq!(s.transform, Mat4::IDENTITY);
        assert_eq!(s.projection, Mat4::IDENTITY);
        assert_eq!(s.viewport, Viewport::new(0, 0, 320, 200));
        assert_eq!(s.line_width, 1.0);
    }

    #[test]
    fn equality_is_per_field() {
        let a = Snapshot::new(Viewport::full(10, 10));
        let mut b = a;
        assert_eq!(a, b);

        b.line_width = 2.0;
        assert_ne!(a, b);

        b = a;
        b.transform.0[12] = 1.0;
        assert_ne!(a, b);
    }
}
