//! GPU passes: a compiled program plus its six state blocks.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::backend::{ProgramHandle, RenderBackend};
use crate::error::RenderError;
use crate::resources::{ArenaEntry, Mesh};
use crate::state::{
    BlendState, ColorState, DepthState, MultisampleState, PolygonState, StencilState,
};
use crate::uniform::UniformValue;

/// Shader stage in the graphics pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex shader.
    Vertex,
    /// Fragment shader.
    Fragment,
}

/// Shader source for a pass.
#[derive(Debug, Clone)]
pub struct ShaderSource {
    /// The shader stage.
    pub stage: ShaderStage,
    /// Shader source code (backend dependent, handed over opaquely).
    pub source: Vec<u8>,
    /// Entry point function name.
    pub entry_point: String,
}

impl ShaderSource {
    /// Create a new shader source.
    pub fn new(
        stage: ShaderStage,
        source: impl Into<Vec<u8>>,
        entry_point: impl Into<String>,
    ) -> Self {
        Self {
            stage,
            source: source.into(),
            entry_point: entry_point.into(),
        }
    }

    /// Create a vertex shader source.
    pub fn vertex(source: impl Into<Vec<u8>>, entry_point: impl Into<String>) -> Self {
        Self::new(ShaderStage::Vertex, source, entry_point)
    }

    /// Create a fragment shader source.
    pub fn fragment(source: impl Into<Vec<u8>>, entry_point: impl Into<String>) -> Self {
        Self::new(ShaderStage::Fragment, source, entry_point)
    }
}

/// Descriptor for creating a pass.
#[derive(Debug, Clone)]
pub struct PassDescriptor {
    /// Vertex shader.
    pub vertex: ShaderSource,
    /// Fragment shader.
    pub fragment: ShaderSource,
    /// Optional label for logging.
    pub label: Option<String>,
}

impl PassDescriptor {
    /// Create a descriptor from vertex and fragment sources.
    pub fn new(vertex: ShaderSource, fragment: ShaderSource) -> Self {
        Self {
            vertex,
            fragment,
            label: None,
        }
    }

    /// Set a label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// The six state blocks owned by a pass.
///
/// Created with type-specific defaults alongside the pass and destroyed
/// with it; blocks are never handed out independently of their pass.
#[derive(Debug, Clone, Default)]
pub struct PassStates {
    /// Face culling, winding, polygon offset.
    pub polygon: PolygonState,
    /// Sample coverage and alpha-to-coverage.
    pub multisample: MultisampleState,
    /// Color write mask and clear color.
    pub color: ColorState,
    /// Depth test, write, range, clear value.
    pub depth: DepthState,
    /// Stencil test, ops, masks, clear value.
    pub stencil: StencilState,
    /// Blending.
    pub blend: BlendState,
}

impl PassStates {
    /// Diff every block against `previous` and emit the required calls.
    pub fn apply_all(&self, previous: Option<&Self>, backend: &dyn RenderBackend) {
        self.polygon.apply(previous.map(|p| &p.polygon), backend);
        self.multisample
            .apply(previous.map(|p| &p.multisample), backend);
        self.color.apply(previous.map(|p| &p.color), backend);
        self.depth.apply(previous.map(|p| &p.depth), backend);
        self.stencil.apply(previous.map(|p| &p.stencil), backend);
        self.blend.apply(previous.map(|p| &p.blend), backend);
    }
}

/// A compiled GPU program plus its render state blocks and per-draw
/// uniform scope.
///
/// A pass's begin/end window is managed by the frame driver: it spans
/// the maximal contiguous run of materials using the pass in grid
/// order, across stage boundaries. [`begin`](Self::begin) receives the
/// previously bound pass so the state diff engine can skip redundant
/// backend calls.
#[derive(Debug)]
pub struct Pass {
    label: Option<String>,
    vertex: ShaderSource,
    fragment: ShaderSource,
    states: RwLock<PassStates>,
    program: RwLock<Option<ProgramHandle>>,
    staged: RwLock<HashMap<String, UniformValue>>,
    index: AtomicUsize,
}

impl Pass {
    pub(crate) fn new(
        descriptor: PassDescriptor,
        backend: &dyn RenderBackend,
    ) -> Result<Self, RenderError> {
        let program =
            backend.create_program(&descriptor.vertex.source, &descriptor.fragment.source)?;
        Ok(Self {
            label: descriptor.label,
            vertex: descriptor.vertex,
            fragment: descriptor.fragment,
            states: RwLock::new(PassStates::default()),
            program: RwLock::new(Some(program)),
            staged: RwLock::new(HashMap::new()),
            index: AtomicUsize::new(usize::MAX),
        })
    }

    /// Label, if set.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// The compiled program handle, if currently allocated.
    pub fn program(&self) -> Option<ProgramHandle> {
        self.program.read().ok().and_then(|p| *p)
    }

    /// Snapshot of the six state blocks.
    pub fn states(&self) -> PassStates {
        self.states
            .read()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// Mutate the state blocks through a closure.
    ///
    /// ```ignore
    /// pass.configure(|states| {
    ///     states.depth.set_func(Comparison::Less);
    ///     states.blend.set_enabled(false); // note the inverted polarity
    /// });
    /// ```
    pub fn configure<R>(&self, f: impl FnOnce(&mut PassStates) -> R) -> Option<R> {
        self.states.write().ok().map(|mut s| f(&mut s))
    }

    /// Begin this pass: bind the program and diff all state blocks
    /// against the previously bound pass.
    pub fn begin(&self, previous: Option<&Pass>, backend: &dyn RenderBackend) {
        log::trace!("begin pass {:?}", self.label);
        if let Some(program) = self.program() {
            backend.bind_program(program);
        }
        if let Ok(states) = self.states.read() {
            match previous {
                Some(prev) => {
                    if let Ok(prev_states) = prev.states.read() {
                        states.apply_all(Some(&prev_states), backend);
                    }
                }
                None => states.apply_all(None, backend),
            }
        }
    }

    /// End this pass.
    pub fn end(&self) {
        log::trace!("end pass {:?}", self.label);
    }

    /// Clear the per-draw uniform scope.
    pub fn reset_uniforms(&self) {
        if let Ok(mut staged) = self.staged.write() {
            staged.clear();
        }
    }

    /// Stage a uniform for the next flush; later stages override earlier
    /// ones by name.
    pub fn uniform(&self, name: impl Into<String>, value: UniformValue) {
        if let Ok(mut staged) = self.staged.write() {
            staged.insert(name.into(), value);
        }
    }

    /// Flush every staged uniform to the backend.
    pub fn apply_uniforms(&self, backend: &dyn RenderBackend) {
        if let Ok(staged) = self.staged.read() {
            for (name, value) in staged.iter() {
                backend.set_uniform(name, value);
            }
        }
    }

    /// Bind a mesh's vertex and index buffers.
    pub fn bind_mesh(&self, mesh: &Mesh, backend: &dyn RenderBackend) {
        if let Some(buffers) = mesh.buffers() {
            backend.bind_vertex_buffer(buffers.vertex);
            backend.bind_index_buffer(buffers.index);
        }
    }

    /// Release the program. Idempotent.
    pub fn free(&self, backend: &dyn RenderBackend) {
        let taken = self.program.write().ok().and_then(|mut p| p.take());
        if let Some(program) = taken {
            backend.destroy_program(program);
        }
    }

    /// Recompile the program after a context restore.
    pub fn restore(&self, backend: &dyn RenderBackend) -> Result<(), RenderError> {
        let program = backend.create_program(&self.vertex.source, &self.fragment.source)?;
        if let Ok(mut p) = self.program.write() {
            *p = Some(program);
        }
        Ok(())
    }
}

impl ArenaEntry for Pass {
    fn arena_index(&self) -> usize {
        self.index.load(Ordering::Relaxed)
    }

    fn set_arena_index(&self, index: usize) {
        self.index.store(index, Ordering::Relaxed);
    }
}
