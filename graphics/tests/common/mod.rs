#![allow(dead_code)] // not every test binary uses every helper

//! Shared helpers for integration tests.
//!
//! Every test runs against the recording [`TraceBackend`], so the exact
//! backend call sequences emitted by the frame driver and the state diff
//! engine can be asserted without GPU hardware.

use std::sync::Arc;

use vermeil_core::mesh::MeshData;
use vermeil_graphics::backend::TraceBackend;
use vermeil_graphics::pass::{Pass, PassDescriptor, ShaderSource};
use vermeil_graphics::{DeviceDescriptor, RenderDevice};

/// Initialize test logging once.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A device on a fresh trace backend with the default descriptor
/// (RGBA color, 16-bit depth).
pub fn test_device() -> (Arc<TraceBackend>, RenderDevice) {
    test_device_with_surface(300, 200)
}

/// A device on a trace backend reporting the given surface size.
pub fn test_device_with_surface(width: u32, height: u32) -> (Arc<TraceBackend>, RenderDevice) {
    init_logging();
    let backend = Arc::new(TraceBackend::with_surface_size(width, height));
    let device = RenderDevice::with_backend(backend.clone(), DeviceDescriptor::default())
        .expect("device creation should succeed");
    (backend, device)
}

/// A minimal non-indexed triangle mesh.
pub fn triangle() -> MeshData {
    MeshData::from_positions(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]])
}

/// Create a pass with placeholder shader sources.
pub fn make_test_pass(device: &mut RenderDevice, label: &str) -> Arc<Pass> {
    device
        .make_pass(
            PassDescriptor::new(
                ShaderSource::vertex(b"void main() {}".to_vec(), "main"),
                ShaderSource::fragment(b"void main() {}".to_vec(), "main"),
            )
            .with_label(label),
        )
        .expect("pass creation should succeed")
}
