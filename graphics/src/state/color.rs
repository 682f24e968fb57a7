//! Color state: write mask and clear color.

use std::sync::Arc;

use bitflags::bitflags;
use vermeil_core::color::Color;

use crate::backend::RenderBackend;

bitflags! {
    /// Which color channels are written.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ColorWrite: u32 {
        /// Red channel.
        const RED = 1 << 0;
        /// Green channel.
        const GREEN = 1 << 1;
        /// Blue channel.
        const BLUE = 1 << 2;
        /// Alpha channel.
        const ALPHA = 1 << 3;
        /// All channels.
        const ALL = Self::RED.bits() | Self::GREEN.bits() | Self::BLUE.bits() | Self::ALPHA.bits();
    }
}

/// Color write mask and clear color.
///
/// Defaults: all channels written, transparent black clear color.
#[derive(Debug, Clone)]
pub struct ColorState {
    write_mask: ColorWrite,
    clear_color: Arc<Color>,
}

impl Default for ColorState {
    fn default() -> Self {
        Self {
            write_mask: ColorWrite::ALL,
            clear_color: Arc::new(Color::TRANSPARENT),
        }
    }
}

impl ColorState {
    /// Reset to defaults; chainable.
    pub fn reset(&mut self) -> &mut Self {
        *self = Self::default();
        self
    }

    /// The color write mask.
    pub fn write_mask(&self) -> ColorWrite {
        self.write_mask
    }

    /// Set the color write mask; chainable.
    pub fn set_write_mask(&mut self, mask: ColorWrite) -> &mut Self {
        self.write_mask = mask;
        self
    }

    /// The clear color.
    pub fn clear_color(&self) -> Arc<Color> {
        self.clear_color.clone()
    }

    /// Set the clear color; chainable.
    ///
    /// Always installs a fresh color object, so the next diff emits it.
    pub fn set_clear_color(&mut self, color: Color) -> &mut Self {
        self.clear_color = Arc::new(color);
        self
    }

    /// Emit the backend calls needed to move from `previous` to this state.
    pub fn apply(&self, previous: Option<&Self>, backend: &dyn RenderBackend) {
        let emit_mask = previous.map_or(true, |prev| self.write_mask != prev.write_mask);
        let emit_clear =
            previous.map_or(true, |prev| !Arc::ptr_eq(&self.clear_color, &prev.clear_color));

        if emit_mask {
            backend.set_color_mask(
                self.write_mask.contains(ColorWrite::RED),
                self.write_mask.contains(ColorWrite::GREEN),
                self.write_mask.contains(ColorWrite::BLUE),
                self.write_mask.contains(ColorWrite::ALPHA),
            );
        }
        if emit_clear {
            let c = *self.clear_color;
            backend.set_clear_color(c.r, c.g, c.b, c.a);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendCall, TraceBackend};

    #[test]
    fn test_first_activation() {
        let backend = TraceBackend::new();
        ColorState::default().apply(None, &backend);
        assert_eq!(
            backend.calls(),
            vec![
                BackendCall::ColorMask(true, true, true, true),
                BackendCall::ClearColor(0.0, 0.0, 0.0, 0.0),
            ]
        );
    }

    #[test]
    fn test_mask_diff_only() {
        let backend = TraceBackend::new();
        let prev = ColorState::default();
        let mut state = prev.clone();
        state.set_write_mask(ColorWrite::RED | ColorWrite::ALPHA);

        state.apply(Some(&prev), &backend);
        assert_eq!(
            backend.calls(),
            vec![BackendCall::ColorMask(true, false, false, true)]
        );
    }

    #[test]
    fn test_clear_color_replacement() {
        let backend = TraceBackend::new();
        let prev = ColorState::default();
        let mut state = prev.clone();
        state.set_clear_color(Color::rgb(1.0, 0.0, 0.0));

        state.apply(Some(&prev), &backend);
        assert_eq!(backend.calls(), vec![BackendCall::ClearColor(1.0, 0.0, 0.0, 1.0)]);
    }

    #[test]
    fn test_shared_clear_color_not_reemitted() {
        let backend = TraceBackend::new();
        let prev = ColorState::default();
        let state = prev.clone();
        state.apply(Some(&prev), &backend);
        assert_eq!(backend.call_count(), 0);
    }
}
