//! CPU-side mesh types and generators.
//!
//! This module provides GPU-agnostic mesh data structures:
//!
//! - [`PrimitiveTopology`] - How vertices are assembled into primitives
//! - [`MeshData`] - CPU-side mesh data (positions, normals, uvs, indices)
//! - Generators for common shapes (quad, cube)
//!
//! These types are re-exported by `vermeil-graphics` for convenience.

mod data;
pub mod generators;

pub use data::{MeshData, PrimitiveTopology};
