//! The render device.
//!
//! [`RenderDevice`] owns every GPU resource for one graphics context,
//! organizes draw submission as a stage×material grid, and executes one
//! deterministic frame per [`frame`](RenderDevice::frame) call while
//! minimizing redundant backend state changes. It also governs the
//! resource lifecycle across backend-initiated context loss/restore.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use vermeil_core::math::Mat4;
use vermeil_core::mesh::MeshData;

use crate::backend::{self, RenderBackend};
use crate::caps::{DeviceCapabilities, Extensions};
use crate::error::RenderError;
use crate::events::{DeviceEvent, EventListeners};
use crate::frame::{FrameClock, FrameStats};
use crate::pass::{Pass, PassDescriptor};
use crate::resources::{
    Arena, ArenaEntry, DepthBuffer, DepthFormat, Mesh, RenderTarget, Texture, TextureDescriptor,
    TextureFormat,
};
use crate::scene::{Instance, Material, Stage};
use crate::uniform::UniformValue;

/// Descriptor for creating a render device.
#[derive(Debug, Clone)]
pub struct DeviceDescriptor {
    /// Color format of the default target.
    pub color_format: TextureFormat,
    /// Depth format of the default target; `None` for no depth buffer.
    pub depth_format: Option<DepthFormat>,
}

impl Default for DeviceDescriptor {
    fn default() -> Self {
        Self {
            color_format: TextureFormat::Rgba8,
            depth_format: Some(DepthFormat::Depth16),
        }
    }
}

/// Selects a material by name or by reference.
pub trait MaterialRef {
    /// The material's registered name.
    fn material_name(&self) -> &str;
}

impl MaterialRef for &str {
    fn material_name(&self) -> &str {
        self
    }
}

impl MaterialRef for String {
    fn material_name(&self) -> &str {
        self
    }
}

impl MaterialRef for &String {
    fn material_name(&self) -> &str {
        self
    }
}

impl MaterialRef for &Material {
    fn material_name(&self) -> &str {
        self.name()
    }
}

impl MaterialRef for &Arc<Material> {
    fn material_name(&self) -> &str {
        self.name()
    }
}

/// The retained-mode rendering device for one graphics context.
///
/// # Frame model
///
/// [`frame`](Self::frame) is synchronous, deterministic, and never
/// reentrant - the exclusive borrow makes reentrant invocation
/// unrepresentable. Loss/restore notifications are delivered between
/// frames by the host, never mid-frame.
///
/// # Context loss
///
/// While lost, `frame()` only resets counters and advances timers; it
/// never touches the backend and never panics. Resource creation stays
/// available while lost - only drawing, resizing, and the error check
/// are suspended.
pub struct RenderDevice {
    backend: Arc<dyn RenderBackend>,
    caps: DeviceCapabilities,
    extensions: Extensions,

    meshes: Arena<Mesh>,
    textures: Arena<Texture>,
    depths: Arena<DepthBuffer>,
    targets: Arena<RenderTarget>,
    passes: Arena<Pass>,
    default_target: Arc<RenderTarget>,
    backing_size: (u32, u32),

    stages: Vec<Arc<Stage>>,
    materials: Vec<Arc<Material>>,
    bins: HashMap<String, Arena<Instance>>,
    uniforms: HashMap<String, UniformValue>,

    stats: FrameStats,
    clock: FrameClock,
    lost: bool,
    last_backend_error: Option<String>,
    events: EventListeners,
    visible_scratch: Vec<Arc<Instance>>,
}

impl RenderDevice {
    /// Create a device on the default backend.
    pub fn new(descriptor: DeviceDescriptor) -> Result<Self, RenderError> {
        Self::with_backend(backend::create_backend(), descriptor)
    }

    /// Create a device on an explicit backend.
    pub fn with_backend(
        backend: Arc<dyn RenderBackend>,
        descriptor: DeviceDescriptor,
    ) -> Result<Self, RenderError> {
        log::info!(
            "creating render device on {} backend ({:?} color, {:?} depth)",
            backend.name(),
            descriptor.color_format,
            descriptor.depth_format
        );
        let caps = backend.capabilities();
        let extensions = Extensions::new(backend.extensions());
        let backing_size = backend.surface_size();

        let mut depths = Arena::new();
        let default_depth = match descriptor.depth_format {
            Some(format) => {
                let depth = Arc::new(DepthBuffer::new(
                    backing_size.0,
                    backing_size.1,
                    format,
                    &*backend,
                )?);
                depths.push(depth.clone());
                Some(depth)
            }
            None => None,
        };

        let default_target = Arc::new(RenderTarget::surface(
            backing_size.0,
            backing_size.1,
            default_depth,
        ));
        let mut targets = Arena::new();
        targets.push(default_target.clone());

        Ok(Self {
            backend,
            caps,
            extensions,
            meshes: Arena::new(),
            textures: Arena::new(),
            depths,
            targets,
            passes: Arena::new(),
            default_target,
            backing_size,
            stages: Vec::new(),
            materials: Vec::new(),
            bins: HashMap::new(),
            uniforms: HashMap::new(),
            stats: FrameStats::default(),
            clock: FrameClock::new(),
            lost: false,
            last_backend_error: None,
            events: EventListeners::new(),
            visible_scratch: Vec::new(),
        })
    }

    // ===== Queries =====

    /// Cached device capabilities.
    pub fn caps(&self) -> &DeviceCapabilities {
        &self.caps
    }

    /// Cached backend extensions.
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// The surface-backed default target.
    pub fn target(&self) -> &Arc<RenderTarget> {
        &self.default_target
    }

    /// Whether the context is currently lost.
    pub fn is_lost(&self) -> bool {
        self.lost
    }

    /// Result of the last aggregated backend error check.
    pub fn backend_error(&self) -> Option<&str> {
        self.last_backend_error.as_deref()
    }

    /// Register a listener for device events.
    pub fn on_event(&self, listener: impl Fn(&DeviceEvent) + Send + Sync + 'static) {
        self.events.on(listener);
    }

    /// Change the FPS averaging window.
    pub fn set_fps_window(&mut self, window: Duration) {
        self.clock.set_window(window);
    }

    /// Number of live meshes.
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Number of live textures.
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Number of live depth buffers.
    pub fn depth_count(&self) -> usize {
        self.depths.len()
    }

    /// Number of live render targets (including the default target).
    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    /// Number of live passes.
    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    /// Number of instances in a material's bin.
    pub fn bin_len(&self, material: impl MaterialRef) -> usize {
        self.bins
            .get(material.material_name())
            .map_or(0, Arena::len)
    }

    // ===== Resource factories =====

    /// Create a mesh and upload its buffers.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Configuration`] when the mesh data is
    /// inconsistent; nothing is registered in that case.
    pub fn make_mesh(&mut self, data: MeshData) -> Result<Arc<Mesh>, RenderError> {
        data.validate().map_err(RenderError::Configuration)?;
        let mesh = Arc::new(Mesh::new(data, &*self.backend)?);
        self.meshes.push(mesh.clone());
        log::trace!(
            "RenderDevice: created mesh ({} vertices, {} primitives)",
            mesh.vertex_count(),
            mesh.primitive_count()
        );
        Ok(mesh)
    }

    /// Create a texture.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Configuration`] for zero or oversized
    /// dimensions or mismatched pixel data; nothing is registered.
    pub fn make_texture(
        &mut self,
        descriptor: TextureDescriptor,
    ) -> Result<Arc<Texture>, RenderError> {
        if descriptor.width == 0 || descriptor.height == 0 {
            return Err(RenderError::Configuration(
                "texture dimensions cannot be zero".to_string(),
            ));
        }
        let max_dim = self.caps.max_texture_dimension;
        if descriptor.width > max_dim || descriptor.height > max_dim {
            return Err(RenderError::Configuration(format!(
                "texture dimension exceeds maximum {max_dim}"
            )));
        }
        if let Some(pixels) = &descriptor.pixels {
            let expected = descriptor.width as usize
                * descriptor.height as usize
                * descriptor.format.bytes_per_pixel();
            if pixels.len() != expected {
                return Err(RenderError::Configuration(format!(
                    "pixel data is {} bytes, expected {expected}",
                    pixels.len()
                )));
            }
        }

        let texture = Arc::new(Texture::new(descriptor, &*self.backend)?);
        self.textures.push(texture.clone());
        log::trace!(
            "RenderDevice: created texture {:?} ({}x{})",
            texture.label(),
            texture.width(),
            texture.height()
        );
        Ok(texture)
    }

    /// Create a depth buffer.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Configuration`] for zero or oversized
    /// dimensions; nothing is registered.
    pub fn make_depth(
        &mut self,
        width: u32,
        height: u32,
        format: DepthFormat,
    ) -> Result<Arc<DepthBuffer>, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::Configuration(
                "depth buffer dimensions cannot be zero".to_string(),
            ));
        }
        let max_dim = self.caps.max_renderbuffer_dimension;
        if width > max_dim || height > max_dim {
            return Err(RenderError::Configuration(format!(
                "depth buffer dimension exceeds maximum {max_dim}"
            )));
        }

        let depth = Arc::new(DepthBuffer::new(width, height, format, &*self.backend)?);
        self.depths.push(depth.clone());
        Ok(depth)
    }

    /// Create an offscreen render target.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Configuration`] when the depth buffer size
    /// does not match the color texture; nothing is registered.
    pub fn make_target(
        &mut self,
        color: Arc<Texture>,
        depth: Option<Arc<DepthBuffer>>,
    ) -> Result<Arc<RenderTarget>, RenderError> {
        if let Some(depth) = &depth {
            if depth.width() != color.width() || depth.height() != color.height() {
                return Err(RenderError::Configuration(format!(
                    "depth buffer {}x{} does not match color texture {}x{}",
                    depth.width(),
                    depth.height(),
                    color.width(),
                    color.height()
                )));
            }
        }

        let target = Arc::new(RenderTarget::offscreen(color, depth, &*self.backend)?);
        self.targets.push(target.clone());
        Ok(target)
    }

    /// Create a pass from shader sources.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Configuration`] for empty sources or entry
    /// points; nothing is registered.
    pub fn make_pass(&mut self, descriptor: PassDescriptor) -> Result<Arc<Pass>, RenderError> {
        if descriptor.vertex.source.is_empty() || descriptor.fragment.source.is_empty() {
            return Err(RenderError::Configuration(
                "shader source cannot be empty".to_string(),
            ));
        }
        if descriptor.vertex.entry_point.is_empty() || descriptor.fragment.entry_point.is_empty() {
            return Err(RenderError::Configuration(
                "shader entry point cannot be empty".to_string(),
            ));
        }

        let pass = Arc::new(Pass::new(descriptor, &*self.backend)?);
        self.passes.push(pass.clone());
        log::trace!("RenderDevice: created pass {:?}", pass.label());
        Ok(pass)
    }

    /// Free a mesh and remove it from its arena. Returns `false` when the
    /// mesh is not owned by this device.
    pub fn remove_mesh(&mut self, mesh: &Arc<Mesh>) -> bool {
        match self.meshes.remove(mesh) {
            Some(removed) => {
                removed.free(&*self.backend);
                true
            }
            None => false,
        }
    }

    /// Free a texture and remove it from its arena.
    pub fn remove_texture(&mut self, texture: &Arc<Texture>) -> bool {
        match self.textures.remove(texture) {
            Some(removed) => {
                removed.free(&*self.backend);
                true
            }
            None => false,
        }
    }

    /// Free a depth buffer and remove it from its arena.
    pub fn remove_depth(&mut self, depth: &Arc<DepthBuffer>) -> bool {
        match self.depths.remove(depth) {
            Some(removed) => {
                removed.free(&*self.backend);
                true
            }
            None => false,
        }
    }

    /// Free a render target and remove it from its arena. The default
    /// target cannot be removed.
    pub fn remove_target(&mut self, target: &Arc<RenderTarget>) -> bool {
        if Arc::ptr_eq(target, &self.default_target) {
            return false;
        }
        match self.targets.remove(target) {
            Some(removed) => {
                removed.free(&*self.backend);
                true
            }
            None => false,
        }
    }

    /// Free a pass and remove it from its arena.
    pub fn remove_pass(&mut self, pass: &Arc<Pass>) -> bool {
        match self.passes.remove(pass) {
            Some(removed) => {
                removed.free(&*self.backend);
                true
            }
            None => false,
        }
    }

    // ===== Grid =====

    /// Upsert a stage by name.
    ///
    /// An existing name returns the same stage unchanged and does not
    /// reorder the grid. Otherwise the stage is spliced before `before`
    /// (when given and found) or appended.
    pub fn stage(&mut self, name: &str, before: Option<&str>) -> Arc<Stage> {
        if let Some(existing) = self.stages.iter().find(|s| s.name() == name) {
            return existing.clone();
        }
        let stage = Arc::new(Stage::new(name));
        let index = before
            .and_then(|b| self.stages.iter().position(|s| s.name() == b))
            .unwrap_or(self.stages.len());
        self.stages.insert(index, stage.clone());
        Self::reindex(&self.stages, index);
        log::debug!("added stage {name:?} at index {index}");
        stage
    }

    /// Upsert a material by name; seeds an empty bin for new names.
    pub fn material(&mut self, name: &str, before: Option<&str>) -> Arc<Material> {
        if let Some(existing) = self.materials.iter().find(|m| m.name() == name) {
            return existing.clone();
        }
        let material = Arc::new(Material::new(name));
        let index = before
            .and_then(|b| self.materials.iter().position(|m| m.name() == b))
            .unwrap_or(self.materials.len());
        self.materials.insert(index, material.clone());
        Self::reindex(&self.materials, index);
        self.bins.entry(name.to_string()).or_default();
        log::debug!("added material {name:?} at index {index}");
        material
    }

    /// Remove a stage from the grid, preserving grid order.
    pub fn remove_stage(&mut self, stage: &Arc<Stage>) -> bool {
        let index = stage.arena_index();
        if self
            .stages
            .get(index)
            .is_none_or(|s| !Arc::ptr_eq(s, stage))
        {
            return false;
        }
        self.stages.remove(index);
        Self::reindex(&self.stages, index);
        true
    }

    /// Remove a material, its bin, and its grid slot, preserving order.
    pub fn remove_material(&mut self, material: &Arc<Material>) -> bool {
        let index = material.arena_index();
        if self
            .materials
            .get(index)
            .is_none_or(|m| !Arc::ptr_eq(m, material))
        {
            return false;
        }
        self.materials.remove(index);
        Self::reindex(&self.materials, index);
        self.bins.remove(material.name());
        true
    }

    fn reindex<T: ArenaEntry>(list: &[Arc<T>], from: usize) {
        for (i, entry) in list.iter().enumerate().skip(from) {
            entry.set_arena_index(i);
        }
    }

    /// Stage names in grid order.
    pub fn stage_order(&self) -> Vec<String> {
        self.stages.iter().map(|s| s.name().to_string()).collect()
    }

    /// Material names in grid order.
    pub fn material_order(&self) -> Vec<String> {
        self.materials
            .iter()
            .map(|m| m.name().to_string())
            .collect()
    }

    /// Create an instance of `mesh` in a material's bin.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Lookup`] when the material is not in the
    /// grid; no bin is touched in that case.
    pub fn instance(
        &mut self,
        material: impl MaterialRef,
        mesh: &Arc<Mesh>,
        transform: Option<Mat4>,
        culling: bool,
    ) -> Result<Arc<Instance>, RenderError> {
        let name = material.material_name();
        if !self.materials.iter().any(|m| m.name() == name) {
            return Err(RenderError::Lookup(format!(
                "material {name:?} is not registered with the device"
            )));
        }
        let instance = Arc::new(Instance::new(
            name.to_string(),
            mesh.clone(),
            transform,
            culling,
        ));
        self.bins
            .entry(name.to_string())
            .or_default()
            .push(instance.clone());
        Ok(instance)
    }

    /// Remove an instance from its material's bin.
    pub fn remove_instance(&mut self, instance: &Arc<Instance>) -> bool {
        self.bins
            .get_mut(instance.material_name())
            .and_then(|bin| bin.remove(instance))
            .is_some()
    }

    // ===== Uniform registry =====

    /// Read a device-global uniform.
    pub fn uniform(&self, name: &str) -> Option<UniformValue> {
        self.uniforms.get(name).cloned()
    }

    /// Upsert a device-global uniform.
    ///
    /// [`UniformValue::Time`] and [`UniformValue::DeltaTime`] are stored
    /// as placeholders and resolved to live numbers at bind time.
    pub fn set_uniform(&mut self, name: impl Into<String>, value: UniformValue) {
        self.uniforms.insert(name.into(), value);
    }

    /// Delete a device-global uniform.
    pub fn clear_uniform(&mut self, name: &str) {
        self.uniforms.remove(name);
    }

    // ===== Frame driver =====

    /// Execute one frame and return its statistics.
    ///
    /// Runs synchronously to completion:
    ///
    /// 1. Reset the per-frame counters.
    /// 2. When not lost, compare the backing size to the backend surface
    ///    size; on mismatch resize the default target's buffers and emit
    ///    [`DeviceEvent::Resize`] before any draw.
    /// 3. Traverse the stage×material grid in order, coalescing pass
    ///    begin/end windows across contiguous runs, and draw every bin.
    /// 4. When not lost, perform one aggregated backend error check.
    /// 5. Advance the frame clock (even while lost).
    /// 6. Return the stats snapshot.
    pub fn frame(&mut self) -> FrameStats {
        self.stats.reset_counters();

        if !self.lost {
            self.check_resize();
            self.traverse();
            self.last_backend_error = self.backend.check_error();
            if let Some(error) = &self.last_backend_error {
                log::error!("backend error after frame: {error}");
            }
        }

        self.clock.tick(Instant::now());
        self.stats.fps = self.clock.fps();
        self.stats
    }

    fn check_resize(&mut self) {
        let (width, height) = self.backend.surface_size();
        if (width, height) == self.backing_size || width == 0 || height == 0 {
            return;
        }
        self.backing_size = (width, height);
        self.default_target.resize(width, height, &*self.backend);
        self.events.emit(&DeviceEvent::Resize { width, height });
    }

    fn traverse(&mut self) {
        let stages = self.stages.clone();
        let materials = self.materials.clone();
        let mut bound: Option<Arc<Pass>> = None;

        for stage in &stages {
            stage.begin(&self.default_target, &*self.backend);
            for material in &materials {
                let Some(pass) = material.pass(stage.name()) else {
                    continue;
                };
                if self
                    .bins
                    .get(material.name())
                    .is_none_or(|bin| bin.is_empty())
                {
                    continue;
                }
                // A pass window spans the maximal contiguous run of
                // materials using it, across stage boundaries.
                if bound.as_ref().is_none_or(|b| !Arc::ptr_eq(b, &pass)) {
                    if let Some(previous) = &bound {
                        previous.end();
                    }
                    pass.begin(bound.as_deref(), &*self.backend);
                    bound = Some(pass.clone());
                }
                self.draw_bin(stage, material, &pass);
            }
            stage.end();
        }

        if let Some(pass) = &bound {
            pass.end();
        }
    }

    fn draw_bin(&mut self, stage: &Arc<Stage>, material: &Arc<Material>, pass: &Arc<Pass>) {
        self.visible_scratch.clear();

        if let Some(bin) = self.bins.get(material.name()) {
            for instance in bin.iter() {
                let vertices = u64::from(instance.mesh().vertex_count());
                let primitives = u64::from(instance.mesh().primitive_count());
                self.stats.vertex_total += vertices;
                self.stats.primitive_total += primitives;
                self.stats.instance_total += 1;
                if stage.is_visible(instance) {
                    self.stats.vertex_drawn += vertices;
                    self.stats.primitive_drawn += primitives;
                    self.stats.instance_drawn += 1;
                    self.visible_scratch.push(instance.clone());
                }
            }
        }

        // Descending mesh arena index: a stable batching proxy keyed on
        // creation order, so consecutive same-mesh instances share bound
        // buffers.
        self.visible_scratch
            .sort_by(|a, b| b.mesh().arena_index().cmp(&a.mesh().arena_index()));

        let globals = self.resolved_globals();
        let mut last_mesh: Option<Arc<Mesh>> = None;

        for instance in &self.visible_scratch {
            pass.reset_uniforms();
            for (name, value) in &globals {
                pass.uniform(name.clone(), value.clone());
            }
            stage.bind_uniforms(pass);
            material.bind_uniforms(pass);
            instance.bind_uniforms(pass);
            pass.apply_uniforms(&*self.backend);

            let mesh = instance.mesh();
            if last_mesh.as_ref().is_none_or(|m| !Arc::ptr_eq(m, mesh)) {
                pass.bind_mesh(mesh, &*self.backend);
                last_mesh = Some(mesh.clone());
            }
            self.backend
                .draw(mesh.topology_raw(), mesh.element_count(), mesh.indexed());
        }
    }

    /// Device-global uniforms with the time placeholders resolved.
    fn resolved_globals(&self) -> Vec<(String, UniformValue)> {
        self.uniforms
            .iter()
            .map(|(name, value)| {
                let resolved = match value {
                    UniformValue::Time => UniformValue::Float(self.clock.time()),
                    UniformValue::DeltaTime => UniformValue::Float(self.clock.delta()),
                    other => other.clone(),
                };
                (name.clone(), resolved)
            })
            .collect()
    }

    // ===== Context loss/restore =====

    /// Handle an externally delivered context loss notification.
    ///
    /// Idempotent per cycle. Emits [`DeviceEvent::Lose`].
    pub fn notify_context_lost(&mut self) {
        if self.lost {
            return;
        }
        self.lost = true;
        log::warn!("render context lost");
        self.events.emit(&DeviceEvent::Lose);
    }

    /// Handle an externally delivered context restore notification.
    ///
    /// Re-queries capabilities and extensions (they may differ on the
    /// restored context), then invokes each owned resource's restore hook
    /// in fixed order: meshes, textures, depths, targets, passes. No-op
    /// when the context is not lost. Emits [`DeviceEvent::Restore`].
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Backend`] when a restore hook fails; the
    /// device stays lost in that case.
    pub fn notify_context_restored(&mut self) -> Result<(), RenderError> {
        if !self.lost {
            return Ok(());
        }
        self.caps = self.backend.capabilities();
        self.extensions = Extensions::new(self.backend.extensions());

        for mesh in self.meshes.iter() {
            mesh.restore(&*self.backend)?;
        }
        for texture in self.textures.iter() {
            texture.restore(&*self.backend)?;
        }
        for depth in self.depths.iter() {
            depth.restore(&*self.backend)?;
        }
        for target in self.targets.iter() {
            target.restore(&*self.backend)?;
        }
        for pass in self.passes.iter() {
            pass.restore(&*self.backend)?;
        }

        self.lost = false;
        log::info!("render context restored");
        self.events.emit(&DeviceEvent::Restore);
        Ok(())
    }
}

impl std::fmt::Debug for RenderDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderDevice")
            .field("backend", &self.backend.name())
            .field("lost", &self.lost)
            .field("stages", &self.stage_order())
            .field("materials", &self.material_order())
            .finish()
    }
}

// The device crosses the backend seam; keep it shareable.
static_assertions::assert_impl_all!(RenderDevice: Send, Sync);
