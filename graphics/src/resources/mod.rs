//! Device-owned GPU resources and their arenas.
//!
//! Every owned resource type follows the same contract: an idempotent
//! `free`, a `restore` hook that reconstructs backend handles after a
//! context restore, and a stable arena back-index for O(1) removal (the
//! [`ArenaEntry`] trait).

mod arena;
mod depth;
mod mesh;
mod target;
mod texture;

pub use arena::{Arena, ArenaEntry};
pub use depth::{DepthBuffer, DepthFormat};
pub use mesh::{Mesh, MeshBuffers};
pub use target::RenderTarget;
pub use texture::{Texture, TextureDescriptor, TextureFormat};
