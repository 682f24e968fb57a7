//! Blend state: enable flag, constant color, equations, and factors.

use std::sync::Arc;

use vermeil_core::color::Color;

use crate::backend::RenderBackend;

use super::{BlendFactor, BlendOperation};

/// Blend equations for the color and alpha channels.
///
/// Held behind `Arc`; the diff compares by pointer identity. Raw
/// encodings are precomputed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct BlendEquationState {
    rgb: BlendOperation,
    alpha: BlendOperation,
    rgb_raw: u32,
    alpha_raw: u32,
}

impl BlendEquationState {
    /// Create a blend equation description.
    pub fn new(rgb: BlendOperation, alpha: BlendOperation) -> Self {
        Self {
            rgb,
            alpha,
            rgb_raw: rgb.encode(),
            alpha_raw: alpha.encode(),
        }
    }

    /// The color channel equation.
    pub fn rgb(&self) -> BlendOperation {
        self.rgb
    }

    /// The alpha channel equation.
    pub fn alpha(&self) -> BlendOperation {
        self.alpha
    }
}

/// Blend factors for the color and alpha channels.
///
/// Held behind `Arc`; the diff compares by pointer identity. Raw
/// encodings are precomputed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct BlendFuncState {
    src_rgb: BlendFactor,
    dst_rgb: BlendFactor,
    src_alpha: BlendFactor,
    dst_alpha: BlendFactor,
    raw: [u32; 4],
}

impl BlendFuncState {
    /// Create a blend factor description.
    pub fn new(
        src_rgb: BlendFactor,
        dst_rgb: BlendFactor,
        src_alpha: BlendFactor,
        dst_alpha: BlendFactor,
    ) -> Self {
        Self {
            src_rgb,
            dst_rgb,
            src_alpha,
            dst_alpha,
            raw: [
                src_rgb.encode(),
                dst_rgb.encode(),
                src_alpha.encode(),
                dst_alpha.encode(),
            ],
        }
    }

    /// Standard alpha blending (src over dst).
    pub fn over() -> Self {
        Self::new(
            BlendFactor::SrcAlpha,
            BlendFactor::OneMinusSrcAlpha,
            BlendFactor::SrcAlpha,
            BlendFactor::OneMinusSrcAlpha,
        )
    }

    /// Source color factor.
    pub fn src_rgb(&self) -> BlendFactor {
        self.src_rgb
    }

    /// Destination color factor.
    pub fn dst_rgb(&self) -> BlendFactor {
        self.dst_rgb
    }

    /// Source alpha factor.
    pub fn src_alpha(&self) -> BlendFactor {
        self.src_alpha
    }

    /// Destination alpha factor.
    pub fn dst_alpha(&self) -> BlendFactor {
        self.dst_alpha
    }
}

/// Blending configuration.
///
/// # The `enabled` flag is inverted
///
/// For behavioral compatibility with the system this engine replaces,
/// the stored flag has the opposite of its apparent meaning:
/// `set_enabled(false)` turns blending ON at the backend and
/// `set_enabled(true)` turns it OFF. The default of `true` therefore
/// means blending starts disabled, which matches backend defaults.
/// Callers relying on the historical behavior depend on this mapping;
/// do not "fix" it here.
///
/// Defaults: `enabled` flag `true` (blending off), transparent black
/// constant color, `Add` equations, `One/Zero` factors.
#[derive(Debug, Clone)]
pub struct BlendState {
    enabled: bool,
    color: Arc<Color>,
    equation: Arc<BlendEquationState>,
    func: Arc<BlendFuncState>,
}

impl Default for BlendState {
    fn default() -> Self {
        Self {
            enabled: true,
            color: Arc::new(Color::TRANSPARENT),
            equation: Arc::new(BlendEquationState::new(
                BlendOperation::Add,
                BlendOperation::Add,
            )),
            func: Arc::new(BlendFuncState::new(
                BlendFactor::One,
                BlendFactor::Zero,
                BlendFactor::One,
                BlendFactor::Zero,
            )),
        }
    }
}

impl BlendState {
    /// Reset to defaults; chainable.
    pub fn reset(&mut self) -> &mut Self {
        *self = Self::default();
        self
    }

    /// The stored enable flag (inverted polarity, see type docs).
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Set the stored enable flag (inverted polarity, see type docs);
    /// chainable.
    pub fn set_enabled(&mut self, enabled: bool) -> &mut Self {
        self.enabled = enabled;
        self
    }

    /// The constant blend color.
    pub fn color(&self) -> Arc<Color> {
        self.color.clone()
    }

    /// Set the constant blend color; chainable.
    pub fn set_color(&mut self, color: Color) -> &mut Self {
        self.color = Arc::new(color);
        self
    }

    /// The blend equation description.
    pub fn equation(&self) -> Arc<BlendEquationState> {
        self.equation.clone()
    }

    /// Set the blend equations; chainable.
    pub fn set_equation(&mut self, rgb: BlendOperation, alpha: BlendOperation) -> &mut Self {
        self.equation = Arc::new(BlendEquationState::new(rgb, alpha));
        self
    }

    /// The blend factor description.
    pub fn func(&self) -> Arc<BlendFuncState> {
        self.func.clone()
    }

    /// Set the blend factors; chainable.
    pub fn set_func(
        &mut self,
        src_rgb: BlendFactor,
        dst_rgb: BlendFactor,
        src_alpha: BlendFactor,
        dst_alpha: BlendFactor,
    ) -> &mut Self {
        self.func = Arc::new(BlendFuncState::new(src_rgb, dst_rgb, src_alpha, dst_alpha));
        self
    }

    /// Emit the backend calls needed to move from `previous` to this state.
    ///
    /// The backend enable call receives the negated flag (see type docs).
    pub fn apply(&self, previous: Option<&Self>, backend: &dyn RenderBackend) {
        match previous {
            None => {
                backend.set_blend_enabled(!self.enabled);
                let c = *self.color;
                backend.set_blend_color(c.r, c.g, c.b, c.a);
                backend.set_blend_equation(self.equation.rgb_raw, self.equation.alpha_raw);
                backend.set_blend_func(
                    self.func.raw[0],
                    self.func.raw[1],
                    self.func.raw[2],
                    self.func.raw[3],
                );
            }
            Some(prev) => {
                if self.enabled != prev.enabled {
                    backend.set_blend_enabled(!self.enabled);
                }
                if !Arc::ptr_eq(&self.color, &prev.color) {
                    let c = *self.color;
                    backend.set_blend_color(c.r, c.g, c.b, c.a);
                }
                if !Arc::ptr_eq(&self.equation, &prev.equation) {
                    backend.set_blend_equation(self.equation.rgb_raw, self.equation.alpha_raw);
                }
                if !Arc::ptr_eq(&self.func, &prev.func) {
                    backend.set_blend_func(
                        self.func.raw[0],
                        self.func.raw[1],
                        self.func.raw[2],
                        self.func.raw[3],
                    );
                }
            }
        }
    }
}
