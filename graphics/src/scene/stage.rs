//! Rendering stages.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use vermeil_core::color::Color;
use vermeil_core::math::{Frustum, Mat4, mat4_max_scale, mat4_translation};

use crate::backend::RenderBackend;
use crate::pass::Pass;
use crate::resources::{ArenaEntry, RenderTarget};
use crate::uniform::UniformValue;

use super::instance::Instance;

/// An ordered rendering phase with its own output target, view and
/// projection, clear configuration, and visibility test.
///
/// Created by `RenderDevice::stage`, which upserts by name.
#[derive(Debug)]
pub struct Stage {
    name: String,
    target: RwLock<Option<Arc<RenderTarget>>>,
    view: RwLock<Mat4>,
    projection: RwLock<Mat4>,
    clear_color: RwLock<Option<Color>>,
    clear_depth: RwLock<Option<f32>>,
    clear_stencil: RwLock<Option<i32>>,
    frustum: RwLock<Option<Frustum>>,
    culling_enabled: AtomicBool,
    uniforms: RwLock<HashMap<String, UniformValue>>,
    index: AtomicUsize,
}

impl Stage {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: RwLock::new(None),
            view: RwLock::new(Mat4::identity()),
            projection: RwLock::new(Mat4::identity()),
            clear_color: RwLock::new(Some(Color::TRANSPARENT)),
            clear_depth: RwLock::new(Some(1.0)),
            clear_stencil: RwLock::new(None),
            frustum: RwLock::new(None),
            culling_enabled: AtomicBool::new(true),
            uniforms: RwLock::new(HashMap::new()),
            index: AtomicUsize::new(usize::MAX),
        }
    }

    /// The stage name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The output target; `None` renders to the device's default target.
    pub fn target(&self) -> Option<Arc<RenderTarget>> {
        self.target.read().ok().and_then(|t| t.clone())
    }

    /// Set the output target; `None` selects the device's default target.
    pub fn set_target(&self, target: Option<Arc<RenderTarget>>) {
        if let Ok(mut t) = self.target.write() {
            *t = target;
        }
    }

    /// The view matrix.
    pub fn view(&self) -> Mat4 {
        self.view.read().map(|v| *v).unwrap_or_else(|_| Mat4::identity())
    }

    /// Set the view matrix.
    pub fn set_view(&self, view: Mat4) {
        if let Ok(mut v) = self.view.write() {
            *v = view;
        }
    }

    /// The projection matrix.
    pub fn projection(&self) -> Mat4 {
        self.projection
            .read()
            .map(|p| *p)
            .unwrap_or_else(|_| Mat4::identity())
    }

    /// Set the projection matrix.
    pub fn set_projection(&self, projection: Mat4) {
        if let Ok(mut p) = self.projection.write() {
            *p = projection;
        }
    }

    /// Set the color clear value; `None` skips clearing color.
    pub fn set_clear_color(&self, color: Option<Color>) {
        if let Ok(mut c) = self.clear_color.write() {
            *c = color;
        }
    }

    /// Set the depth clear value; `None` skips clearing depth.
    pub fn set_clear_depth(&self, depth: Option<f32>) {
        if let Ok(mut d) = self.clear_depth.write() {
            *d = depth;
        }
    }

    /// Set the stencil clear value; `None` skips clearing stencil.
    pub fn set_clear_stencil(&self, stencil: Option<i32>) {
        if let Ok(mut s) = self.clear_stencil.write() {
            *s = stencil;
        }
    }

    /// Whether frustum culling is applied to instances with culling on.
    pub fn culling_enabled(&self) -> bool {
        self.culling_enabled.load(Ordering::Relaxed)
    }

    /// Enable or disable frustum culling for this stage.
    pub fn set_culling_enabled(&self, enabled: bool) {
        self.culling_enabled.store(enabled, Ordering::Relaxed);
    }

    /// Set a stage-scope uniform.
    pub fn set_uniform(&self, name: impl Into<String>, value: UniformValue) {
        if let Ok(mut uniforms) = self.uniforms.write() {
            uniforms.insert(name.into(), value);
        }
    }

    /// Remove a stage-scope uniform.
    pub fn clear_uniform(&self, name: &str) {
        if let Ok(mut uniforms) = self.uniforms.write() {
            uniforms.remove(name);
        }
    }

    /// Begin the stage: bind its target, set the viewport, clear, and
    /// refresh the culling frustum from the current view-projection.
    pub fn begin(&self, default_target: &Arc<RenderTarget>, backend: &dyn RenderBackend) {
        log::trace!("begin stage {:?}", self.name);
        let target = self.target().unwrap_or_else(|| default_target.clone());
        target.bind(backend);
        backend.viewport(0, 0, target.width(), target.height());

        let clear_color = self.clear_color.read().map(|c| *c).unwrap_or(None);
        let clear_depth = self.clear_depth.read().map(|d| *d).unwrap_or(None);
        let clear_stencil = self.clear_stencil.read().map(|s| *s).unwrap_or(None);
        if clear_color.is_some() || clear_depth.is_some() || clear_stencil.is_some() {
            backend.clear(
                clear_color.is_some(),
                clear_depth.is_some(),
                clear_stencil.is_some(),
            );
        }

        if let Ok(mut frustum) = self.frustum.write() {
            *frustum = Some(Frustum::from_matrix(&(self.projection() * self.view())));
        }
    }

    /// End the stage.
    pub fn end(&self) {
        log::trace!("end stage {:?}", self.name);
    }

    /// Classify an instance's visibility for this stage.
    ///
    /// Instances with culling off are always visible. Otherwise the
    /// instance's bounding sphere (mesh radius scaled by its transform)
    /// is tested against the stage frustum.
    pub fn is_visible(&self, instance: &Instance) -> bool {
        if !instance.culling() || !self.culling_enabled() {
            return true;
        }
        let frustum = match self.frustum.read() {
            Ok(f) => *f,
            Err(_) => None,
        };
        match frustum {
            Some(frustum) => {
                let transform = instance.transform();
                let center = mat4_translation(&transform);
                let radius = instance.mesh().bounding_radius() * mat4_max_scale(&transform);
                frustum.intersects_sphere(&center, radius)
            }
            None => true,
        }
    }

    /// Stage the stage-scope uniforms onto a pass: view and projection
    /// matrices plus any custom uniforms.
    pub fn bind_uniforms(&self, pass: &Pass) {
        pass.uniform("u_view", UniformValue::mat4(&self.view()));
        pass.uniform("u_projection", UniformValue::mat4(&self.projection()));
        if let Ok(uniforms) = self.uniforms.read() {
            for (name, value) in uniforms.iter() {
                pass.uniform(name.clone(), value.clone());
            }
        }
    }
}

impl ArenaEntry for Stage {
    fn arena_index(&self) -> usize {
        self.index.load(Ordering::Relaxed)
    }

    fn set_arena_index(&self, index: usize) {
        self.index.store(index, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendCall, TraceBackend};
    use vermeil_core::math::{Vec3, look_at_rh, mat4_from_translation, perspective_rh};
    use vermeil_core::mesh::generators::generate_quad;

    fn test_instance(backend: &TraceBackend, position: Vec3, culling: bool) -> Instance {
        let mesh = Arc::new(crate::resources::Mesh::new(generate_quad(1.0, 1.0), backend).unwrap());
        Instance::new(
            "m".to_string(),
            mesh,
            Some(mat4_from_translation(position)),
            culling,
        )
    }

    fn looking_at_origin(stage: &Stage) {
        stage.set_view(look_at_rh(
            &Vec3::new(0.0, 0.0, 5.0),
            &Vec3::new(0.0, 0.0, 0.0),
            &Vec3::y(),
        ));
        stage.set_projection(perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 100.0));
    }

    #[test]
    fn test_begin_binds_viewport_and_clears() {
        let backend = TraceBackend::new();
        let default_target = Arc::new(RenderTarget::surface(300, 150, None));
        let stage = Stage::new("main");
        stage.begin(&default_target, &backend);

        let calls = backend.calls();
        assert_eq!(calls[0], BackendCall::BindFramebuffer(None));
        assert_eq!(calls[1], BackendCall::Viewport(0, 0, 300, 150));
        assert_eq!(calls[2], BackendCall::Clear(true, true, false));
    }

    #[test]
    fn test_visibility_respects_culling_flag() {
        let backend = TraceBackend::new();
        let default_target = Arc::new(RenderTarget::surface(300, 150, None));
        let stage = Stage::new("main");
        looking_at_origin(&stage);
        stage.begin(&default_target, &backend);

        let far_away = test_instance(&backend, Vec3::new(1000.0, 0.0, 0.0), true);
        assert!(!stage.is_visible(&far_away));

        let culling_off = test_instance(&backend, Vec3::new(1000.0, 0.0, 0.0), false);
        assert!(stage.is_visible(&culling_off));

        let in_front = test_instance(&backend, Vec3::new(0.0, 0.0, 0.0), true);
        assert!(stage.is_visible(&in_front));
    }

    #[test]
    fn test_visible_before_first_begin() {
        let backend = TraceBackend::new();
        let stage = Stage::new("main");
        // No frustum yet: everything passes.
        let instance = test_instance(&backend, Vec3::new(1000.0, 0.0, 0.0), true);
        assert!(stage.is_visible(&instance));
    }
}
