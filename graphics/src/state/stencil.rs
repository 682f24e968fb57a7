//! Stencil state: test, function, operations, masks, and clear value.

use std::sync::Arc;

use crate::backend::RenderBackend;

use super::{Comparison, StencilOp};

/// Stencil comparison function with reference and read mask.
///
/// Held behind `Arc`; the diff compares by pointer identity. The raw
/// encoding of the comparison is precomputed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct StencilFuncState {
    func: Comparison,
    func_raw: u32,
    reference: i32,
    read_mask: u32,
}

impl StencilFuncState {
    /// Create a stencil function description.
    pub fn new(func: Comparison, reference: i32, read_mask: u32) -> Self {
        Self {
            func,
            func_raw: func.encode(),
            reference,
            read_mask,
        }
    }

    /// The comparison function.
    pub fn func(&self) -> Comparison {
        self.func
    }

    /// The reference value.
    pub fn reference(&self) -> i32 {
        self.reference
    }

    /// The read mask.
    pub fn read_mask(&self) -> u32 {
        self.read_mask
    }
}

/// Stencil operations for the three outcome slots.
///
/// Held behind `Arc`; the diff compares by pointer identity. Raw
/// encodings are precomputed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct StencilOpState {
    stencil_fail: StencilOp,
    depth_fail: StencilOp,
    pass: StencilOp,
    raw: [u32; 3],
}

impl StencilOpState {
    /// Create a stencil operation description.
    pub fn new(stencil_fail: StencilOp, depth_fail: StencilOp, pass: StencilOp) -> Self {
        Self {
            stencil_fail,
            depth_fail,
            pass,
            raw: [stencil_fail.encode(), depth_fail.encode(), pass.encode()],
        }
    }

    /// Operation when the stencil test fails.
    pub fn stencil_fail(&self) -> StencilOp {
        self.stencil_fail
    }

    /// Operation when the stencil test passes but the depth test fails.
    pub fn depth_fail(&self) -> StencilOp {
        self.depth_fail
    }

    /// Operation when both tests pass.
    pub fn pass(&self) -> StencilOp {
        self.pass
    }
}

/// Stencil test, operations, write mask, and clear value.
///
/// Defaults: test disabled, `Always/0/0xFFFFFFFF` function, `Keep` for
/// every operation, full write mask, clear value 0.
#[derive(Debug, Clone)]
pub struct StencilState {
    test_enabled: bool,
    func: Arc<StencilFuncState>,
    op: Arc<StencilOpState>,
    write_mask: u32,
    clear_stencil: i32,
}

impl Default for StencilState {
    fn default() -> Self {
        Self {
            test_enabled: false,
            func: Arc::new(StencilFuncState::new(Comparison::Always, 0, u32::MAX)),
            op: Arc::new(StencilOpState::new(
                StencilOp::Keep,
                StencilOp::Keep,
                StencilOp::Keep,
            )),
            write_mask: u32::MAX,
            clear_stencil: 0,
        }
    }
}

impl StencilState {
    /// Reset to defaults; chainable.
    pub fn reset(&mut self) -> &mut Self {
        *self = Self::default();
        self
    }

    /// Whether the stencil test is enabled.
    pub fn test_enabled(&self) -> bool {
        self.test_enabled
    }

    /// Enable or disable the stencil test; chainable.
    pub fn set_test_enabled(&mut self, enabled: bool) -> &mut Self {
        self.test_enabled = enabled;
        self
    }

    /// The stencil function description.
    pub fn func(&self) -> Arc<StencilFuncState> {
        self.func.clone()
    }

    /// Set the stencil function; chainable.
    ///
    /// Always installs a fresh function object, so the next diff emits it.
    pub fn set_func(&mut self, func: Comparison, reference: i32, read_mask: u32) -> &mut Self {
        self.func = Arc::new(StencilFuncState::new(func, reference, read_mask));
        self
    }

    /// The stencil operation description.
    pub fn op(&self) -> Arc<StencilOpState> {
        self.op.clone()
    }

    /// Set the stencil operations; chainable.
    ///
    /// Always installs a fresh operation object, so the next diff emits it.
    pub fn set_op(
        &mut self,
        stencil_fail: StencilOp,
        depth_fail: StencilOp,
        pass: StencilOp,
    ) -> &mut Self {
        self.op = Arc::new(StencilOpState::new(stencil_fail, depth_fail, pass));
        self
    }

    /// The stencil write mask.
    pub fn write_mask(&self) -> u32 {
        self.write_mask
    }

    /// Set the stencil write mask; chainable.
    pub fn set_write_mask(&mut self, mask: u32) -> &mut Self {
        self.write_mask = mask;
        self
    }

    /// The stencil clear value.
    pub fn clear_stencil(&self) -> i32 {
        self.clear_stencil
    }

    /// Set the stencil clear value; chainable.
    pub fn set_clear_stencil(&mut self, value: i32) -> &mut Self {
        self.clear_stencil = value;
        self
    }

    /// Emit the backend calls needed to move from `previous` to this state.
    ///
    /// The enable/disable rule matches the depth test: toggling always
    /// emits the enable call, comparator-only changes emit only the
    /// function call.
    pub fn apply(&self, previous: Option<&Self>, backend: &dyn RenderBackend) {
        match previous {
            None => {
                backend.set_stencil_test_enabled(self.test_enabled);
                backend.set_stencil_func(self.func.func_raw, self.func.reference, self.func.read_mask);
                backend.set_stencil_op(self.op.raw[0], self.op.raw[1], self.op.raw[2]);
                backend.set_stencil_mask(self.write_mask);
                backend.set_clear_stencil(self.clear_stencil);
            }
            Some(prev) => {
                if self.test_enabled != prev.test_enabled {
                    backend.set_stencil_test_enabled(self.test_enabled);
                }
                if !Arc::ptr_eq(&self.func, &prev.func) {
                    backend.set_stencil_func(
                        self.func.func_raw,
                        self.func.reference,
                        self.func.read_mask,
                    );
                }
                if !Arc::ptr_eq(&self.op, &prev.op) {
                    backend.set_stencil_op(self.op.raw[0], self.op.raw[1], self.op.raw[2]);
                }
                if self.write_mask != prev.write_mask {
                    backend.set_stencil_mask(self.write_mask);
                }
                if self.clear_stencil != prev.clear_stencil {
                    backend.set_clear_stencil(self.clear_stencil);
                }
            }
        }
    }
}
