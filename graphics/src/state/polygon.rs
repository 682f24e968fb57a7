//! Polygon state: face culling, winding, and depth offset.

use std::sync::Arc;

use crate::backend::RenderBackend;

use super::{CullFace, FrontFace};

/// Polygon depth offset parameters.
///
/// Held behind `Arc`; the diff compares by pointer identity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolygonOffset {
    /// Slope-scaled factor.
    pub factor: f32,
    /// Constant units.
    pub units: f32,
}

/// Face culling, front-face winding, and polygon offset.
///
/// Defaults: culling enabled, back faces culled, counter-clockwise front
/// faces, no polygon offset.
#[derive(Debug, Clone)]
pub struct PolygonState {
    cull_enabled: bool,
    cull_face: CullFace,
    cull_face_raw: u32,
    front_face: FrontFace,
    front_face_raw: u32,
    offset: Option<Arc<PolygonOffset>>,
}

impl Default for PolygonState {
    fn default() -> Self {
        Self {
            cull_enabled: true,
            cull_face: CullFace::Back,
            cull_face_raw: CullFace::Back.encode(),
            front_face: FrontFace::Ccw,
            front_face_raw: FrontFace::Ccw.encode(),
            offset: None,
        }
    }
}

impl PolygonState {
    /// Reset to defaults; chainable.
    pub fn reset(&mut self) -> &mut Self {
        *self = Self::default();
        self
    }

    /// Whether face culling is enabled.
    pub fn cull_enabled(&self) -> bool {
        self.cull_enabled
    }

    /// Enable or disable face culling; chainable.
    pub fn set_cull_enabled(&mut self, enabled: bool) -> &mut Self {
        self.cull_enabled = enabled;
        self
    }

    /// Which faces are culled.
    pub fn cull_face(&self) -> CullFace {
        self.cull_face
    }

    /// Select which faces are culled; chainable.
    pub fn set_cull_face(&mut self, face: CullFace) -> &mut Self {
        self.cull_face = face;
        self.cull_face_raw = face.encode();
        self
    }

    /// The front-face winding.
    pub fn front_face(&self) -> FrontFace {
        self.front_face
    }

    /// Select the front-face winding; chainable.
    pub fn set_front_face(&mut self, winding: FrontFace) -> &mut Self {
        self.front_face = winding;
        self.front_face_raw = winding.encode();
        self
    }

    /// The polygon offset, if enabled.
    pub fn offset(&self) -> Option<Arc<PolygonOffset>> {
        self.offset.clone()
    }

    /// Enable polygon offset with the given parameters; chainable.
    ///
    /// Always installs a fresh parameter object, so the next diff emits it.
    pub fn set_offset(&mut self, factor: f32, units: f32) -> &mut Self {
        self.offset = Some(Arc::new(PolygonOffset { factor, units }));
        self
    }

    /// Disable polygon offset; chainable.
    pub fn clear_offset(&mut self) -> &mut Self {
        self.offset = None;
        self
    }

    /// Emit the backend calls needed to move from `previous` to this state.
    pub fn apply(&self, previous: Option<&Self>, backend: &dyn RenderBackend) {
        match previous {
            None => {
                backend.set_cull_enabled(self.cull_enabled);
                backend.set_cull_face(self.cull_face_raw);
                backend.set_front_face(self.front_face_raw);
                match &self.offset {
                    Some(offset) => {
                        backend.set_polygon_offset_enabled(true);
                        backend.set_polygon_offset(offset.factor, offset.units);
                    }
                    None => backend.set_polygon_offset_enabled(false),
                }
            }
            Some(prev) => {
                if self.cull_enabled != prev.cull_enabled {
                    backend.set_cull_enabled(self.cull_enabled);
                }
                if self.cull_face_raw != prev.cull_face_raw {
                    backend.set_cull_face(self.cull_face_raw);
                }
                if self.front_face_raw != prev.front_face_raw {
                    backend.set_front_face(self.front_face_raw);
                }
                match (&self.offset, &prev.offset) {
                    (Some(offset), None) => {
                        backend.set_polygon_offset_enabled(true);
                        backend.set_polygon_offset(offset.factor, offset.units);
                    }
                    (None, Some(_)) => backend.set_polygon_offset_enabled(false),
                    (Some(offset), Some(prev_offset)) => {
                        if !Arc::ptr_eq(offset, prev_offset) {
                            backend.set_polygon_offset(offset.factor, offset.units);
                        }
                    }
                    (None, None) => {}
                }
            }
        }
    }
}
