//! # Vermeil Graphics
//!
//! Retained-mode rendering orchestrator for Vermeil Engine.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`RenderDevice`] - owns all render resources for one context and
//!   drives one deterministic frame per [`RenderDevice::frame`] call
//! - [`state`] - the six-kind GPU state diff engine
//! - [`scene`] - the stage×material grid and its instances
//! - [`backend`] - the backend trait seam plus a recording trace backend
//!
//! ## Example
//!
//! ```
//! use vermeil_graphics::{DeviceDescriptor, RenderDevice};
//! use vermeil_core::mesh::generators::generate_cube;
//!
//! let mut device = RenderDevice::new(DeviceDescriptor::default())?;
//! let mesh = device.make_mesh(generate_cube(1.0))?;
//! device.stage("main", None);
//! device.material("solid", None);
//! device.instance("solid", &mesh, None, true)?;
//! let stats = device.frame();
//! assert_eq!(stats.instance_total, 1);
//! # Ok::<(), vermeil_graphics::RenderError>(())
//! ```

pub mod backend;
pub mod caps;
pub mod device;
pub mod error;
pub mod events;
pub mod frame;
pub mod pass;
pub mod resources;
pub mod scene;
pub mod state;
pub mod uniform;

// Re-export main types for convenience
pub use backend::{RenderBackend, TraceBackend};
pub use caps::{DeviceCapabilities, Extensions};
pub use device::{DeviceDescriptor, MaterialRef, RenderDevice};
pub use error::RenderError;
pub use events::DeviceEvent;
pub use frame::FrameStats;
pub use pass::{Pass, PassDescriptor, ShaderSource, ShaderStage};
pub use resources::{DepthBuffer, DepthFormat, Mesh, RenderTarget, Texture, TextureDescriptor, TextureFormat};
pub use scene::{Instance, Material, Stage};
pub use uniform::UniformValue;

/// Graphics library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the graphics library version.
pub fn init() {
    log::info!("Vermeil Graphics v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_trace_backend_name() {
        let backend = TraceBackend::new();
        assert_eq!(RenderBackend::name(&backend), "Trace");
    }
}
