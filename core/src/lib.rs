//! # Vermeil Engine Core
//!
//! GPU-agnostic support types for Vermeil Engine: f32 math aliases and
//! helpers, CPU-side mesh data with generators for common shapes, and
//! color values. These types are re-exported by `vermeil-graphics` for
//! convenience.

pub mod color;
pub mod math;
pub mod mesh;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the core library version.
pub fn init() {
    log::info!("Vermeil Core v{} initialized", VERSION);
}
