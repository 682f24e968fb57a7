//! Recording backend for tests and headless development.
//!
//! [`TraceBackend`] performs no GPU work. Every call is recorded as a
//! [`BackendCall`] value so tests can assert exactly which commands the
//! frame driver and the state diff engine emitted, and in what order.
//! The surface size is configurable to drive resize detection, and an
//! error can be injected to exercise the aggregated end-of-frame check.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::caps::DeviceCapabilities;
use crate::error::RenderError;
use crate::uniform::UniformValue;

use super::{
    BufferHandle, BufferKind, FramebufferHandle, ProgramHandle, RenderBackend, RenderbufferHandle,
    TextureHandle,
};

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    /// A buffer was created.
    CreateBuffer(BufferKind, usize, BufferHandle),
    /// A buffer was destroyed.
    DestroyBuffer(BufferHandle),
    /// A texture was created.
    CreateTexture(u32, u32, u32, TextureHandle),
    /// A texture was destroyed.
    DestroyTexture(TextureHandle),
    /// A renderbuffer was created.
    CreateRenderbuffer(u32, u32, u32, RenderbufferHandle),
    /// A renderbuffer was destroyed.
    DestroyRenderbuffer(RenderbufferHandle),
    /// A renderbuffer's storage was reallocated.
    ResizeRenderbuffer(RenderbufferHandle, u32, u32),
    /// A framebuffer was created.
    CreateFramebuffer(Option<TextureHandle>, Option<RenderbufferHandle>, FramebufferHandle),
    /// A framebuffer was destroyed.
    DestroyFramebuffer(FramebufferHandle),
    /// A program was compiled and linked.
    CreateProgram(ProgramHandle),
    /// A program was destroyed.
    DestroyProgram(ProgramHandle),
    /// A framebuffer was bound (`None` = default surface).
    BindFramebuffer(Option<FramebufferHandle>),
    /// The viewport was set.
    Viewport(i32, i32, u32, u32),
    /// Attachments were cleared (color, depth, stencil).
    Clear(bool, bool, bool),
    /// A program was bound.
    BindProgram(ProgramHandle),
    /// A vertex buffer was bound.
    BindVertexBuffer(BufferHandle),
    /// An index buffer was bound or unbound.
    BindIndexBuffer(Option<BufferHandle>),
    /// A uniform was set on the bound program.
    SetUniform(String, UniformValue),
    /// A draw call was issued (topology, element count, indexed).
    Draw(u32, u32, bool),
    /// Face culling toggled.
    CullEnabled(bool),
    /// Cull face selected.
    CullFace(u32),
    /// Front-face winding selected.
    FrontFace(u32),
    /// Polygon offset toggled.
    PolygonOffsetEnabled(bool),
    /// Polygon offset parameters.
    PolygonOffset(f32, f32),
    /// Sample coverage toggled.
    SampleCoverageEnabled(bool),
    /// Sample coverage parameters.
    SampleCoverage(f32, bool),
    /// Alpha-to-coverage toggled.
    AlphaToCoverageEnabled(bool),
    /// Color write mask.
    ColorMask(bool, bool, bool, bool),
    /// Clear color.
    ClearColor(f32, f32, f32, f32),
    /// Depth test toggled.
    DepthTestEnabled(bool),
    /// Depth comparison function.
    DepthFunc(u32),
    /// Depth write mask.
    DepthWrite(bool),
    /// Depth range mapping.
    DepthRange(f32, f32),
    /// Depth clear value.
    ClearDepth(f32),
    /// Stencil test toggled.
    StencilTestEnabled(bool),
    /// Stencil function, reference, and read mask.
    StencilFunc(u32, i32, u32),
    /// Stencil operations.
    StencilOp(u32, u32, u32),
    /// Stencil write mask.
    StencilMask(u32),
    /// Stencil clear value.
    ClearStencil(i32),
    /// Blending toggled.
    BlendEnabled(bool),
    /// Constant blend color.
    BlendColor(f32, f32, f32, f32),
    /// Blend equations for color and alpha.
    BlendEquation(u32, u32),
    /// Blend factors for color and alpha.
    BlendFunc(u32, u32, u32, u32),
}

/// Recording no-GPU backend.
pub struct TraceBackend {
    next_handle: AtomicU64,
    calls: Mutex<Vec<BackendCall>>,
    surface_size: Mutex<(u32, u32)>,
    pending_error: Mutex<Option<String>>,
    capabilities: DeviceCapabilities,
    extensions: Mutex<Vec<String>>,
}

impl TraceBackend {
    /// Create a trace backend with a 300x150 surface (the historical
    /// default canvas size).
    pub fn new() -> Self {
        Self::with_surface_size(300, 150)
    }

    /// Create a trace backend with the given surface size.
    pub fn with_surface_size(width: u32, height: u32) -> Self {
        Self {
            next_handle: AtomicU64::new(1),
            calls: Mutex::new(Vec::new()),
            surface_size: Mutex::new((width, height)),
            pending_error: Mutex::new(None),
            capabilities: DeviceCapabilities::default(),
            extensions: Mutex::new(vec!["OES_element_index_uint".to_string()]),
        }
    }

    fn next(&self) -> u64 {
        self.next_handle.fetch_add(1, Ordering::Relaxed)
    }

    fn record(&self, call: BackendCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    /// Change the reported surface size (simulates a canvas resize).
    pub fn set_surface_size(&self, width: u32, height: u32) {
        if let Ok(mut size) = self.surface_size.lock() {
            *size = (width, height);
        }
    }

    /// Queue an error for the next [`check_error`](RenderBackend::check_error).
    pub fn inject_error(&self, message: impl Into<String>) {
        if let Ok(mut pending) = self.pending_error.lock() {
            *pending = Some(message.into());
        }
    }

    /// Replace the reported extension list (simulates a restored context
    /// coming back with different extensions).
    pub fn set_extensions(&self, names: Vec<String>) {
        if let Ok(mut extensions) = self.extensions.lock() {
            *extensions = names;
        }
    }

    /// Snapshot of all recorded calls.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Drain and return all recorded calls.
    pub fn take_calls(&self) -> Vec<BackendCall> {
        self.calls.lock().map(|mut c| std::mem::take(&mut *c)).unwrap_or_default()
    }

    /// Number of recorded calls.
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Number of recorded calls matching a predicate.
    pub fn count_matching(&self, predicate: impl Fn(&BackendCall) -> bool) -> usize {
        self.calls
            .lock()
            .map(|c| c.iter().filter(|call| predicate(call)).count())
            .unwrap_or(0)
    }

    /// Number of recorded draw calls.
    pub fn draw_count(&self) -> usize {
        self.count_matching(|call| matches!(call, BackendCall::Draw(..)))
    }
}

impl Default for TraceBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderBackend for TraceBackend {
    fn name(&self) -> &'static str {
        "Trace"
    }

    fn capabilities(&self) -> DeviceCapabilities {
        self.capabilities
    }

    fn extensions(&self) -> Vec<String> {
        self.extensions.lock().map(|e| e.clone()).unwrap_or_default()
    }

    fn surface_size(&self) -> (u32, u32) {
        self.surface_size.lock().map(|s| *s).unwrap_or((0, 0))
    }

    fn create_buffer(&self, kind: BufferKind, data: &[u8]) -> Result<BufferHandle, RenderError> {
        let handle = BufferHandle(self.next());
        log::trace!("TraceBackend: create {kind:?} buffer, {} bytes", data.len());
        self.record(BackendCall::CreateBuffer(kind, data.len(), handle));
        Ok(handle)
    }

    fn destroy_buffer(&self, buffer: BufferHandle) {
        self.record(BackendCall::DestroyBuffer(buffer));
    }

    fn create_texture(
        &self,
        width: u32,
        height: u32,
        format_raw: u32,
        _pixels: Option<&[u8]>,
    ) -> Result<TextureHandle, RenderError> {
        let handle = TextureHandle(self.next());
        log::trace!("TraceBackend: create texture {width}x{height}");
        self.record(BackendCall::CreateTexture(width, height, format_raw, handle));
        Ok(handle)
    }

    fn destroy_texture(&self, texture: TextureHandle) {
        self.record(BackendCall::DestroyTexture(texture));
    }

    fn create_renderbuffer(
        &self,
        width: u32,
        height: u32,
        format_raw: u32,
    ) -> Result<RenderbufferHandle, RenderError> {
        let handle = RenderbufferHandle(self.next());
        self.record(BackendCall::CreateRenderbuffer(width, height, format_raw, handle));
        Ok(handle)
    }

    fn destroy_renderbuffer(&self, renderbuffer: RenderbufferHandle) {
        self.record(BackendCall::DestroyRenderbuffer(renderbuffer));
    }

    fn resize_renderbuffer(&self, renderbuffer: RenderbufferHandle, width: u32, height: u32) {
        self.record(BackendCall::ResizeRenderbuffer(renderbuffer, width, height));
    }

    fn create_framebuffer(
        &self,
        color: Option<TextureHandle>,
        depth: Option<RenderbufferHandle>,
    ) -> Result<FramebufferHandle, RenderError> {
        let handle = FramebufferHandle(self.next());
        self.record(BackendCall::CreateFramebuffer(color, depth, handle));
        Ok(handle)
    }

    fn destroy_framebuffer(&self, framebuffer: FramebufferHandle) {
        self.record(BackendCall::DestroyFramebuffer(framebuffer));
    }

    fn create_program(
        &self,
        vertex_src: &[u8],
        fragment_src: &[u8],
    ) -> Result<ProgramHandle, RenderError> {
        let handle = ProgramHandle(self.next());
        log::trace!(
            "TraceBackend: create program ({} + {} bytes)",
            vertex_src.len(),
            fragment_src.len()
        );
        self.record(BackendCall::CreateProgram(handle));
        Ok(handle)
    }

    fn destroy_program(&self, program: ProgramHandle) {
        self.record(BackendCall::DestroyProgram(program));
    }

    fn bind_framebuffer(&self, framebuffer: Option<FramebufferHandle>) {
        self.record(BackendCall::BindFramebuffer(framebuffer));
    }

    fn viewport(&self, x: i32, y: i32, width: u32, height: u32) {
        self.record(BackendCall::Viewport(x, y, width, height));
    }

    fn clear(&self, color: bool, depth: bool, stencil: bool) {
        self.record(BackendCall::Clear(color, depth, stencil));
    }

    fn bind_program(&self, program: ProgramHandle) {
        self.record(BackendCall::BindProgram(program));
    }

    fn bind_vertex_buffer(&self, buffer: BufferHandle) {
        self.record(BackendCall::BindVertexBuffer(buffer));
    }

    fn bind_index_buffer(&self, buffer: Option<BufferHandle>) {
        self.record(BackendCall::BindIndexBuffer(buffer));
    }

    fn set_uniform(&self, name: &str, value: &UniformValue) {
        self.record(BackendCall::SetUniform(name.to_string(), value.clone()));
    }

    fn draw(&self, topology_raw: u32, element_count: u32, indexed: bool) {
        self.record(BackendCall::Draw(topology_raw, element_count, indexed));
    }

    fn check_error(&self) -> Option<String> {
        self.pending_error.lock().ok().and_then(|mut pending| pending.take())
    }

    fn set_cull_enabled(&self, enabled: bool) {
        self.record(BackendCall::CullEnabled(enabled));
    }

    fn set_cull_face(&self, face_raw: u32) {
        self.record(BackendCall::CullFace(face_raw));
    }

    fn set_front_face(&self, winding_raw: u32) {
        self.record(BackendCall::FrontFace(winding_raw));
    }

    fn set_polygon_offset_enabled(&self, enabled: bool) {
        self.record(BackendCall::PolygonOffsetEnabled(enabled));
    }

    fn set_polygon_offset(&self, factor: f32, units: f32) {
        self.record(BackendCall::PolygonOffset(factor, units));
    }

    fn set_sample_coverage_enabled(&self, enabled: bool) {
        self.record(BackendCall::SampleCoverageEnabled(enabled));
    }

    fn set_sample_coverage(&self, value: f32, invert: bool) {
        self.record(BackendCall::SampleCoverage(value, invert));
    }

    fn set_alpha_to_coverage_enabled(&self, enabled: bool) {
        self.record(BackendCall::AlphaToCoverageEnabled(enabled));
    }

    fn set_color_mask(&self, r: bool, g: bool, b: bool, a: bool) {
        self.record(BackendCall::ColorMask(r, g, b, a));
    }

    fn set_clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        self.record(BackendCall::ClearColor(r, g, b, a));
    }

    fn set_depth_test_enabled(&self, enabled: bool) {
        self.record(BackendCall::DepthTestEnabled(enabled));
    }

    fn set_depth_func(&self, func_raw: u32) {
        self.record(BackendCall::DepthFunc(func_raw));
    }

    fn set_depth_write(&self, enabled: bool) {
        self.record(BackendCall::DepthWrite(enabled));
    }

    fn set_depth_range(&self, near: f32, far: f32) {
        self.record(BackendCall::DepthRange(near, far));
    }

    fn set_clear_depth(&self, value: f32) {
        self.record(BackendCall::ClearDepth(value));
    }

    fn set_stencil_test_enabled(&self, enabled: bool) {
        self.record(BackendCall::StencilTestEnabled(enabled));
    }

    fn set_stencil_func(&self, func_raw: u32, reference: i32, mask: u32) {
        self.record(BackendCall::StencilFunc(func_raw, reference, mask));
    }

    fn set_stencil_op(&self, stencil_fail_raw: u32, depth_fail_raw: u32, pass_raw: u32) {
        self.record(BackendCall::StencilOp(stencil_fail_raw, depth_fail_raw, pass_raw));
    }

    fn set_stencil_mask(&self, mask: u32) {
        self.record(BackendCall::StencilMask(mask));
    }

    fn set_clear_stencil(&self, value: i32) {
        self.record(BackendCall::ClearStencil(value));
    }

    fn set_blend_enabled(&self, enabled: bool) {
        self.record(BackendCall::BlendEnabled(enabled));
    }

    fn set_blend_color(&self, r: f32, g: f32, b: f32, a: f32) {
        self.record(BackendCall::BlendColor(r, g, b, a));
    }

    fn set_blend_equation(&self, rgb_raw: u32, alpha_raw: u32) {
        self.record(BackendCall::BlendEquation(rgb_raw, alpha_raw));
    }

    fn set_blend_func(&self, src_rgb_raw: u32, dst_rgb_raw: u32, src_alpha_raw: u32, dst_alpha_raw: u32) {
        self.record(BackendCall::BlendFunc(src_rgb_raw, dst_rgb_raw, src_alpha_raw, dst_alpha_raw));
    }
}
