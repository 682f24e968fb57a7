//! GPU render state and the state diff engine.
//!
//! Each pass owns six state blocks: [`PolygonState`], [`MultisampleState`],
//! [`ColorState`], [`DepthState`], [`StencilState`], and [`BlendState`].
//! Every block keeps a small fixed field set together with the precomputed
//! backend command encoding of each field, so the hot-path diff never
//! re-derives an encoding.
//!
//! # Diffing
//!
//! `apply(previous, backend)` emits only the backend calls needed to move
//! from `previous`'s encoded values to this block's. `apply(None)` is the
//! first activation and emits the full call set. The "previous" value is
//! not hidden global state - the frame driver threads the previously bound
//! pass through the traversal and hands its blocks in here.
//!
//! Scalar fields compare by encoded value. Compound parameters (polygon
//! offset, stencil function, blend function, ...) are held as `Arc` and
//! compare by pointer identity: setters always install a fresh `Arc`, so
//! replacing a compound parameter replaces the whole sub-object and is
//! re-emitted as a unit. There is no deep structural comparison.
//!
//! Two transition rules matter for correctness:
//!
//! - Toggling a test between disabled and enabled re-emits the
//!   enable/disable call every time, in addition to any comparator update;
//!   changing only the comparator while enabled emits only the comparator
//!   call. This holds for the depth and stencil tests alike.
//! - [`BlendState`]'s `enabled` flag has inverted polarity; see its docs.

mod blend;
mod color;
mod depth;
mod multisample;
mod polygon;
mod stencil;

pub use blend::{BlendEquationState, BlendFuncState, BlendState};
pub use color::{ColorState, ColorWrite};
pub use depth::{DepthRange, DepthState};
pub use multisample::{MultisampleState, SampleCoverage};
pub use polygon::{PolygonOffset, PolygonState};
pub use stencil::{StencilFuncState, StencilOpState, StencilState};

/// The six render state categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderStateKind {
    /// Face culling, winding, polygon offset.
    Polygon,
    /// Sample coverage and alpha-to-coverage.
    Multisample,
    /// Color write mask and clear color.
    Color,
    /// Depth test, write, range, clear value.
    Depth,
    /// Stencil test, ops, masks, clear value.
    Stencil,
    /// Blending.
    Blend,
}

/// Comparison function for depth and stencil tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    /// Never passes.
    Never,
    /// Passes when incoming < stored.
    Less,
    /// Passes when incoming == stored.
    Equal,
    /// Passes when incoming <= stored.
    LessEqual,
    /// Passes when incoming > stored.
    Greater,
    /// Passes when incoming != stored.
    NotEqual,
    /// Passes when incoming >= stored.
    GreaterEqual,
    /// Always passes.
    Always,
}

impl Comparison {
    /// Backend command encoding.
    pub const fn encode(self) -> u32 {
        match self {
            Self::Never => 0x0200,
            Self::Less => 0x0201,
            Self::Equal => 0x0202,
            Self::LessEqual => 0x0203,
            Self::Greater => 0x0204,
            Self::NotEqual => 0x0205,
            Self::GreaterEqual => 0x0206,
            Self::Always => 0x0207,
        }
    }
}

/// Which faces are culled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CullFace {
    /// Cull front faces.
    Front,
    /// Cull back faces.
    Back,
    /// Cull both; only points and lines draw.
    FrontAndBack,
}

impl CullFace {
    /// Backend command encoding.
    pub const fn encode(self) -> u32 {
        match self {
            Self::Front => 0x0404,
            Self::Back => 0x0405,
            Self::FrontAndBack => 0x0408,
        }
    }
}

/// Winding order that counts as front-facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrontFace {
    /// Clockwise.
    Cw,
    /// Counter-clockwise.
    Ccw,
}

impl FrontFace {
    /// Backend command encoding.
    pub const fn encode(self) -> u32 {
        match self {
            Self::Cw => 0x0900,
            Self::Ccw => 0x0901,
        }
    }
}

/// Stencil buffer update operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StencilOp {
    /// Keep the stored value.
    Keep,
    /// Set the stored value to zero.
    Zero,
    /// Replace with the reference value.
    Replace,
    /// Increment, clamping at maximum.
    Increment,
    /// Decrement, clamping at zero.
    Decrement,
    /// Bitwise invert.
    Invert,
    /// Increment with wrap.
    IncrementWrap,
    /// Decrement with wrap.
    DecrementWrap,
}

impl StencilOp {
    /// Backend command encoding.
    pub const fn encode(self) -> u32 {
        match self {
            Self::Keep => 0x1E00,
            Self::Zero => 0,
            Self::Replace => 0x1E01,
            Self::Increment => 0x1E02,
            Self::Decrement => 0x1E03,
            Self::Invert => 0x150A,
            Self::IncrementWrap => 0x8507,
            Self::DecrementWrap => 0x8508,
        }
    }
}

/// Blend factor for blending operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendFactor {
    /// 0.0
    #[default]
    Zero,
    /// 1.0
    One,
    /// Source color
    Src,
    /// 1 - source color
    OneMinusSrc,
    /// Source alpha
    SrcAlpha,
    /// 1 - source alpha
    OneMinusSrcAlpha,
    /// Destination color
    Dst,
    /// 1 - destination color
    OneMinusDst,
    /// Destination alpha
    DstAlpha,
    /// 1 - destination alpha
    OneMinusDstAlpha,
    /// min(source alpha, 1 - destination alpha)
    SrcAlphaSaturated,
    /// Constant color
    Constant,
    /// 1 - constant color
    OneMinusConstant,
}

impl BlendFactor {
    /// Backend command encoding.
    pub const fn encode(self) -> u32 {
        match self {
            Self::Zero => 0,
            Self::One => 1,
            Self::Src => 0x0300,
            Self::OneMinusSrc => 0x0301,
            Self::SrcAlpha => 0x0302,
            Self::OneMinusSrcAlpha => 0x0303,
            Self::DstAlpha => 0x0304,
            Self::OneMinusDstAlpha => 0x0305,
            Self::Dst => 0x0306,
            Self::OneMinusDst => 0x0307,
            Self::SrcAlphaSaturated => 0x0308,
            Self::Constant => 0x8001,
            Self::OneMinusConstant => 0x8002,
        }
    }
}

/// Blend operation for combining source and destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendOperation {
    /// source + destination
    #[default]
    Add,
    /// source - destination
    Subtract,
    /// destination - source
    ReverseSubtract,
    /// min(source, destination)
    Min,
    /// max(source, destination)
    Max,
}

impl BlendOperation {
    /// Backend command encoding.
    pub const fn encode(self) -> u32 {
        match self {
            Self::Add => 0x8006,
            Self::Min => 0x8007,
            Self::Max => 0x8008,
            Self::Subtract => 0x800A,
            Self::ReverseSubtract => 0x800B,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparison_encodings_are_distinct() {
        let all = [
            Comparison::Never,
            Comparison::Less,
            Comparison::Equal,
            Comparison::LessEqual,
            Comparison::Greater,
            Comparison::NotEqual,
            Comparison::GreaterEqual,
            Comparison::Always,
        ];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a.encode(), b.encode());
            }
        }
    }

    #[test]
    fn test_blend_factor_constant_encoding() {
        assert_eq!(BlendFactor::Constant.encode(), 0x8001);
        assert_eq!(BlendFactor::Zero.encode(), 0);
        assert_eq!(BlendFactor::One.encode(), 1);
    }
}
