//! Materials: named {stage → pass} bindings with a uniform scope.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::pass::Pass;
use crate::resources::ArenaEntry;
use crate::uniform::UniformValue;

/// A named binding from stages to passes, plus a material uniform scope.
///
/// Created by `RenderDevice::material`, which upserts by name. The
/// device keeps one ordered bin of instances per material.
#[derive(Debug)]
pub struct Material {
    name: String,
    passes: RwLock<HashMap<String, Arc<Pass>>>,
    uniforms: RwLock<HashMap<String, UniformValue>>,
    index: AtomicUsize,
}

impl Material {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passes: RwLock::new(HashMap::new()),
            uniforms: RwLock::new(HashMap::new()),
            index: AtomicUsize::new(usize::MAX),
        }
    }

    /// The material name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The pass bound for a stage, if any.
    pub fn pass(&self, stage_name: &str) -> Option<Arc<Pass>> {
        self.passes
            .read()
            .ok()
            .and_then(|passes| passes.get(stage_name).cloned())
    }

    /// Bind a pass for a stage, replacing any previous binding.
    pub fn set_pass(&self, stage_name: impl Into<String>, pass: Arc<Pass>) {
        if let Ok(mut passes) = self.passes.write() {
            passes.insert(stage_name.into(), pass);
        }
    }

    /// Remove the pass binding for a stage.
    pub fn clear_pass(&self, stage_name: &str) {
        if let Ok(mut passes) = self.passes.write() {
            passes.remove(stage_name);
        }
    }

    /// Set a material-scope uniform.
    pub fn set_uniform(&self, name: impl Into<String>, value: UniformValue) {
        if let Ok(mut uniforms) = self.uniforms.write() {
            uniforms.insert(name.into(), value);
        }
    }

    /// Remove a material-scope uniform.
    pub fn clear_uniform(&self, name: &str) {
        if let Ok(mut uniforms) = self.uniforms.write() {
            uniforms.remove(name);
        }
    }

    /// Stage the material-scope uniforms onto a pass.
    pub fn bind_uniforms(&self, pass: &Pass) {
        if let Ok(uniforms) = self.uniforms.read() {
            for (name, value) in uniforms.iter() {
                pass.uniform(name.clone(), value.clone());
            }
        }
    }
}

impl ArenaEntry for Material {
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
    use crate::backend::TraceBackend;
    use crate::pass::{PassDescriptor, ShaderSource};

    fn test_pass(backend: &TraceBackend) -> Arc<Pass> {
        Arc::new(
            Pass::new(
                PassDescriptor::new(
                    ShaderSource::vertex(b"vs".to_vec(), "main"),
                    ShaderSource::fragment(b"fs".to_vec(), "main"),
                ),
                backend,
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_pass_binding_per_stage() {
        let backend = TraceBackend::new();
        let material = Material::new("wood");
        let pass = test_pass(&backend);

        assert!(material.pass("main").is_none());
        material.set_pass("main", pass.clone());
        assert!(Arc::ptr_eq(&material.pass("main").unwrap(), &pass));
        assert!(material.pass("shadow").is_none());

        material.clear_pass("main");
        assert!(material.pass("main").is_none());
    }
}
