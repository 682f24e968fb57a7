//! GPU backend abstraction layer.
//!
//! The rendering orchestrator never talks to a graphics API directly;
//! everything flows through the [`RenderBackend`] trait. State-setting
//! methods take the raw command encodings precomputed by the state
//! types, so a backend forwards them without re-deriving anything.
//!
//! # Available Backends
//!
//! - [`TraceBackend`] - records every call without touching a GPU; used
//!   for tests and as the fallback when no real backend is wired.
//!
//! A real backend binds these calls to one graphics context. Uniform
//! and mesh binding calls apply to the most recently bound program and
//! buffers, matching how such contexts behave.

pub mod trace;

use std::sync::Arc;

use crate::caps::DeviceCapabilities;
use crate::error::RenderError;
use crate::uniform::UniformValue;

pub use trace::{BackendCall, TraceBackend};

/// Handle to a GPU buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u64);

/// Handle to a GPU texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

/// Handle to a GPU renderbuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderbufferHandle(pub u64);

/// Handle to a GPU framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FramebufferHandle(pub u64);

/// Handle to a compiled GPU program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u64);

/// What a buffer holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    /// Vertex attribute data.
    Vertex,
    /// Index data.
    Index,
}

/// GPU backend trait for one graphics context.
pub trait RenderBackend: Send + Sync + 'static {
    /// Get the backend name.
    fn name(&self) -> &'static str;

    /// Query device capabilities.
    fn capabilities(&self) -> DeviceCapabilities;

    /// Query available extensions.
    fn extensions(&self) -> Vec<String>;

    /// Current client/display size of the surface.
    fn surface_size(&self) -> (u32, u32);

    // ===== Resources =====

    /// Create a buffer and upload `data`.
    fn create_buffer(&self, kind: BufferKind, data: &[u8]) -> Result<BufferHandle, RenderError>;

    /// Destroy a buffer.
    fn destroy_buffer(&self, buffer: BufferHandle);

    /// Create a texture, optionally uploading pixel data.
    fn create_texture(
        &self,
        width: u32,
        height: u32,
        format_raw: u32,
        pixels: Option<&[u8]>,
    ) -> Result<TextureHandle, RenderError>;

    /// Destroy a texture.
    fn destroy_texture(&self, texture: TextureHandle);

    /// Create a renderbuffer.
    fn create_renderbuffer(
        &self,
        width: u32,
        height: u32,
        format_raw: u32,
    ) -> Result<RenderbufferHandle, RenderError>;

    /// Destroy a renderbuffer.
    fn destroy_renderbuffer(&self, renderbuffer: RenderbufferHandle);

    /// Reallocate a renderbuffer's storage at a new size.
    fn resize_renderbuffer(&self, renderbuffer: RenderbufferHandle, width: u32, height: u32);

    /// Create a framebuffer with the given attachments.
    fn create_framebuffer(
        &self,
        color: Option<TextureHandle>,
        depth: Option<RenderbufferHandle>,
    ) -> Result<FramebufferHandle, RenderError>;

    /// Destroy a framebuffer.
    fn destroy_framebuffer(&self, framebuffer: FramebufferHandle);

    /// Compile and link a program from vertex and fragment sources.
    fn create_program(
        &self,
        vertex_src: &[u8],
        fragment_src: &[u8],
    ) -> Result<ProgramHandle, RenderError>;

    /// Destroy a program.
    fn destroy_program(&self, program: ProgramHandle);

    // ===== Frame =====

    /// Bind a framebuffer; `None` binds the default surface.
    fn bind_framebuffer(&self, framebuffer: Option<FramebufferHandle>);

    /// Set the viewport.
    fn viewport(&self, x: i32, y: i32, width: u32, height: u32);

    /// Clear the bound framebuffer's attachments.
    fn clear(&self, color: bool, depth: bool, stencil: bool);

    /// Bind a program for subsequent uniform and draw calls.
    fn bind_program(&self, program: ProgramHandle);

    /// Bind a vertex buffer.
    fn bind_vertex_buffer(&self, buffer: BufferHandle);

    /// Bind an index buffer; `None` unbinds.
    fn bind_index_buffer(&self, buffer: Option<BufferHandle>);

    /// Set a uniform on the bound program.
    fn set_uniform(&self, name: &str, value: &UniformValue);

    /// Issue a draw call.
    fn draw(&self, topology_raw: u32, element_count: u32, indexed: bool);

    /// Aggregated error check; returns the first pending error, if any.
    fn check_error(&self) -> Option<String>;

    // ===== Polygon state =====

    /// Enable or disable face culling.
    fn set_cull_enabled(&self, enabled: bool);

    /// Select which faces are culled.
    fn set_cull_face(&self, face_raw: u32);

    /// Select the front-face winding.
    fn set_front_face(&self, winding_raw: u32);

    /// Enable or disable polygon depth offset.
    fn set_polygon_offset_enabled(&self, enabled: bool);

    /// Set the polygon depth offset parameters.
    fn set_polygon_offset(&self, factor: f32, units: f32);

    // ===== Multisample state =====

    /// Enable or disable sample coverage.
    fn set_sample_coverage_enabled(&self, enabled: bool);

    /// Set the sample coverage parameters.
    fn set_sample_coverage(&self, value: f32, invert: bool);

    /// Enable or disable alpha-to-coverage.
    fn set_alpha_to_coverage_enabled(&self, enabled: bool);

    // ===== Color state =====

    /// Set the color write mask.
    fn set_color_mask(&self, r: bool, g: bool, b: bool, a: bool);

    /// Set the clear color.
    fn set_clear_color(&self, r: f32, g: f32, b: f32, a: f32);

    // ===== Depth state =====

    /// Enable or disable the depth test.
    fn set_depth_test_enabled(&self, enabled: bool);

    /// Set the depth comparison function.
    fn set_depth_func(&self, func_raw: u32);

    /// Enable or disable depth writes.
    fn set_depth_write(&self, enabled: bool);

    /// Set the depth range mapping.
    fn set_depth_range(&self, near: f32, far: f32);

    /// Set the depth clear value.
    fn set_clear_depth(&self, value: f32);

    // ===== Stencil state =====

    /// Enable or disable the stencil test.
    fn set_stencil_test_enabled(&self, enabled: bool);

    /// Set the stencil comparison function, reference, and read mask.
    fn set_stencil_func(&self, func_raw: u32, reference: i32, mask: u32);

    /// Set the stencil operations.
    fn set_stencil_op(&self, stencil_fail_raw: u32, depth_fail_raw: u32, pass_raw: u32);

    /// Set the stencil write mask.
    fn set_stencil_mask(&self, mask: u32);

    /// Set the stencil clear value.
    fn set_clear_stencil(&self, value: i32);

    // ===== Blend state =====

    /// Enable or disable blending.
    fn set_blend_enabled(&self, enabled: bool);

    /// Set the constant blend color.
    fn set_blend_color(&self, r: f32, g: f32, b: f32, a: f32);

    /// Set the blend equations for color and alpha.
    fn set_blend_equation(&self, rgb_raw: u32, alpha_raw: u32);

    /// Set the blend factors for color and alpha.
    fn set_blend_func(&self, src_rgb_raw: u32, dst_rgb_raw: u32, src_alpha_raw: u32, dst_alpha_raw: u32);
}

/// Create the default backend.
///
/// Falls back to the recording [`TraceBackend`] when no real backend is
/// available, mirroring how a headless or test environment runs.
pub fn create_backend() -> Arc<dyn RenderBackend> {
    log::info!("Using trace backend");
    Arc::new(TraceBackend::new())
}
