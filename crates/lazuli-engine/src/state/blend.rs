/// Source/destination multiplier in the blend equation.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    DstColor,
    OneMinusDstColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
    SrcAlphaSaturate,
}

/// How weighted source and destination are combined.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BlendEquation {
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

/// Separate color/alpha blend configuration.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct BlendMode {
    pub color_src: BlendFactor,
    pub alpha_src: BlendFactor,
    pub color_dst: BlendFactor,
    pub alpha_dst: BlendFactor,
    pub color_equation: BlendEquation,
    pub alpha_equation: BlendEquation,
}

impl BlendMode {
    /// Straight-alpha "over" compositing. This is the default.
    pub const ALPHA: BlendMode = BlendMode::separate(
        BlendFactor::SrcAlpha,
        BlendFactor::One,
        BlendFactor::OneMinusSrcAlpha,
        BlendFactor::OneMinusSrcAlpha,
        BlendEquation::Add,
    );

    /// "Over" for colors already multiplied by alpha.
    pub const PREMULTIPLIED: BlendMode =
        BlendMode::uniform(BlendFactor::One, BlendFactor::OneMinusSrcAlpha, BlendEquation::Add);

    pub const ADDITIVE: BlendMode = BlendMode::separate(
        BlendFactor::SrcAlpha,
        BlendFactor::One,
        BlendFactor::One,
        BlendFactor::One,
        BlendEquation::Add,
    );

    pub const MULTIPLY: BlendMode =
        BlendMode::uniform(BlendFactor::DstColor, BlendFactor::Zero, BlendEquation::Add);

    /// Source overwrites destination.
    pub const REPLACE: BlendMode =
        BlendMode::uniform(BlendFactor::One, BlendFactor::Zero, BlendEquation::Add);

    /// Same factors and equation for color and alpha.
    pub const fn uniform(src: BlendFactor, dst: BlendFactor, equation: BlendEquation) -> Self {
        Self::separate(src, src, dst, dst, equation)
    }

    const fn separate(
        color_src: BlendFactor,
        alpha_src: BlendFactor,
        color_dst: BlendFactor,
        alpha_dst: BlendFactor,
        equation: BlendEquation,
    ) -> Self {
        Self {
            color_src,
            alpha_src,
            color_dst,
            alpha_dst,
            color_equation: equation,
            alpha_equation: equation,
        }
    }
}

impl Default for BlendMode {
    fn default() -> Self {
        Self::ALPHA
    }
}
