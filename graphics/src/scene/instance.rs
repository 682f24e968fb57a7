//! Draw instances.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use vermeil_core::math::Mat4;

use crate::pass::Pass;
use crate::resources::{ArenaEntry, Mesh};
use crate::uniform::UniformValue;

/// A (mesh, transform, culling flag) tuple bound to a material; the
/// source of draw calls.
///
/// Created by `RenderDevice::instance` and stored in the owning
/// material's bin; the arena back-index makes removal O(1).
#[derive(Debug)]
pub struct Instance {
    material_name: String,
    mesh: Arc<Mesh>,
    transform: RwLock<Mat4>,
    culling: AtomicBool,
    uniforms: RwLock<HashMap<String, UniformValue>>,
    index: AtomicUsize,
}

impl Instance {
    pub(crate) fn new(
        material_name: String,
        mesh: Arc<Mesh>,
        transform: Option<Mat4>,
        culling: bool,
    ) -> Self {
        Self {
            material_name,
            mesh,
            transform: RwLock::new(transform.unwrap_or_else(Mat4::identity)),
            culling: AtomicBool::new(culling),
            uniforms: RwLock::new(HashMap::new()),
            index: AtomicUsize::new(usize::MAX),
        }
    }

    /// Name of the owning material.
    pub fn material_name(&self) -> &str {
        &self.material_name
    }

    /// The instanced mesh.
    pub fn mesh(&self) -> &Arc<Mesh> {
        &self.mesh
    }

    /// The world transform.
    pub fn transform(&self) -> Mat4 {
        self.transform
            .read()
            .map(|t| *t)
            .unwrap_or_else(|_| Mat4::identity())
    }

    /// Set the world transform.
    pub fn set_transform(&self, transform: Mat4) {
        if let Ok(mut t) = self.transform.write() {
            *t = transform;
        }
    }

    /// Whether this instance participates in visibility culling.
    pub fn culling(&self) -> bool {
        self.culling.load(Ordering::Relaxed)
    }

    /// Enable or disable visibility culling for this instance.
    pub fn set_culling(&self, enabled: bool) {
        self.culling.store(enabled, Ordering::Relaxed);
    }

    /// Set an instance-scope uniform.
    pub fn set_uniform(&self, name: impl Into<String>, value: UniformValue) {
        if let Ok(mut uniforms) = self.uniforms.write() {
            uniforms.insert(name.into(), value);
        }
    }

    /// Remove an instance-scope uniform.
    pub fn clear_uniform(&self, name: &str) {
        if let Ok(mut uniforms) = self.uniforms.write() {
            uniforms.remove(name);
        }
    }

    /// Stage the instance-scope uniforms onto a pass: the model matrix
    /// plus any custom uniforms.
    pub fn bind_uniforms(&self, pass: &Pass) {
        pass.uniform("u_model", UniformValue::mat4(&self.transform()));
        if let Ok(uniforms) = self.uniforms.read() {
            for (name, value) in uniforms.iter() {
                pass.uniform(name.clone(), value.clone());
            }
        }
    }
}

impl ArenaEntry for Instance {
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
    use crate::pass::{PassDescriptor, ShaderSource};
    use vermeil_core::math::{Vec3, mat4_from_translation};
    use vermeil_core::mesh::generators::generate_quad;

    #[test]
    fn test_instance_defaults() {
        let backend = TraceBackend::new();
        let mesh = Arc::new(Mesh::new(generate_quad(1.0, 1.0), &backend).unwrap());
        let instance = Instance::new("m".to_string(), mesh, None, true);
        assert!(instance.culling());
        assert_eq!(instance.transform(), Mat4::identity());
    }

    #[test]
    fn test_bind_uniforms_stages_model_matrix() {
        let backend = TraceBackend::new();
        let mesh = Arc::new(Mesh::new(generate_quad(1.0, 1.0), &backend).unwrap());
        let instance = Instance::new(
            "m".to_string(),
            mesh,
            Some(mat4_from_translation(Vec3::new(1.0, 2.0, 3.0))),
            true,
        );
        let pass = Pass::new(
            PassDescriptor::new(
                ShaderSource::vertex(b"vs".to_vec(), "main"),
                ShaderSource::fragment(b"fs".to_vec(), "main"),
            ),
            &backend,
        )
        .unwrap();
        backend.take_calls();

        instance.set_uniform("u_tint", UniformValue::Float(1.0));
        instance.bind_uniforms(&pass);
        pass.apply_uniforms(&backend);

        let calls = backend.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().any(
            |c| matches!(c, BackendCall::SetUniform(name, UniformValue::Mat4(_)) if name == "u_model")
        ));
    }
}
