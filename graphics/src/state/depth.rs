//! Depth state: test, write mask, range, and clear value.

use std::sync::Arc;

use crate::backend::RenderBackend;

use super::Comparison;

/// Depth range mapping.
///
/// Held behind `Arc`; the diff compares by pointer identity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthRange {
    /// Near mapping, usually 0.
    pub near: f32,
    /// Far mapping, usually 1.
    pub far: f32,
}

/// Depth test, write mask, range, and clear value.
///
/// Defaults: test enabled with [`Comparison::LessEqual`], writes enabled,
/// range `[0, 1]`, clear depth 1.
#[derive(Debug, Clone)]
pub struct DepthState {
    test_enabled: bool,
    func: Comparison,
    func_raw: u32,
    write: bool,
    range: Arc<DepthRange>,
    clear_depth: f32,
}

impl Default for DepthState {
    fn default() -> Self {
        Self {
            test_enabled: true,
            func: Comparison::LessEqual,
            func_raw: Comparison::LessEqual.encode(),
            write: true,
            range: Arc::new(DepthRange { near: 0.0, far: 1.0 }),
            clear_depth: 1.0,
        }
    }
}

impl DepthState {
    /// Reset to defaults; chainable.
    pub fn reset(&mut self) -> &mut Self {
        *self = Self::default();
        self
    }

    /// Whether the depth test is enabled.
    pub fn test_enabled(&self) -> bool {
        self.test_enabled
    }

    /// Enable or disable the depth test; chainable.
    pub fn set_test_enabled(&mut self, enabled: bool) -> &mut Self {
        self.test_enabled = enabled;
        self
    }

    /// The depth comparison function.
    pub fn func(&self) -> Comparison {
        self.func
    }

    /// Set the depth comparison function; chainable.
    pub fn set_func(&mut self, func: Comparison) -> &mut Self {
        self.func = func;
        self.func_raw = func.encode();
        self
    }

    /// Whether depth writes are enabled.
    pub fn write(&self) -> bool {
        self.write
    }

    /// Enable or disable depth writes; chainable.
    pub fn set_write(&mut self, enabled: bool) -> &mut Self {
        self.write = enabled;
        self
    }

    /// The depth range mapping.
    pub fn range(&self) -> Arc<DepthRange> {
        self.range.clone()
    }

    /// Set the depth range mapping; chainable.
    ///
    /// Always installs a fresh range object, so the next diff emits it.
    pub fn set_range(&mut self, near: f32, far: f32) -> &mut Self {
        self.range = Arc::new(DepthRange { near, far });
        self
    }

    /// The depth clear value.
    pub fn clear_depth(&self) -> f32 {
        self.clear_depth
    }

    /// Set the depth clear value; chainable.
    pub fn set_clear_depth(&mut self, value: f32) -> &mut Self {
        self.clear_depth = value;
        self
    }

    /// Emit the backend calls needed to move from `previous` to this state.
    ///
    /// Toggling the test between disabled and enabled always emits the
    /// enable/disable call; changing only the comparator while the test
    /// stays enabled emits only the comparator call.
    pub fn apply(&self, previous: Option<&Self>, backend: &dyn RenderBackend) {
        match previous {
            None => {
                backend.set_depth_test_enabled(self.test_enabled);
                backend.set_depth_func(self.func_raw);
                backend.set_depth_write(self.write);
                backend.set_depth_range(self.range.near, self.range.far);
                backend.set_clear_depth(self.clear_depth);
            }
            Some(prev) => {
                if self.test_enabled != prev.test_enabled {
                    backend.set_depth_test_enabled(self.test_enabled);
                }
                if self.func_raw != prev.func_raw {
                    backend.set_depth_func(self.func_raw);
                }
                if self.write != prev.write {
                    backend.set_depth_write(self.write);
                }
                if !Arc::ptr_eq(&self.range, &prev.range) {
                    backend.set_depth_range(self.range.near, self.range.far);
                }
                if self.clear_depth != prev.clear_depth {
                    backend.set_clear_depth(self.clear_depth);
                }
            }
        }
    }
}
