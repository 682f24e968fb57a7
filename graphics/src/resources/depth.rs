//! Depth renderbuffers.

use std::sync::RwLock;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use crate::backend::{RenderBackend, RenderbufferHandle};
use crate::error::RenderError;

use super::arena::ArenaEntry;

/// Depth buffer storage format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DepthFormat {
    /// 16-bit depth.
    #[default]
    Depth16,
    /// 24-bit depth.
    Depth24,
    /// 24-bit depth with 8-bit stencil.
    Depth24Stencil8,
}

impl DepthFormat {
    /// Backend command encoding.
    pub const fn encode(self) -> u32 {
        match self {
            Self::Depth16 => 0x81A5,
            Self::Depth24 => 0x81A6,
            Self::Depth24Stencil8 => 0x88F0,
        }
    }

    /// Whether this format carries stencil bits.
    pub const fn has_stencil(self) -> bool {
        matches!(self, Self::Depth24Stencil8)
    }
}

/// A device-owned depth (or depth-stencil) renderbuffer.
///
/// The default target's depth buffer tracks the surface size, so its
/// dimensions are mutable through [`resize`](Self::resize).
#[derive(Debug)]
pub struct DepthBuffer {
    width: AtomicU32,
    height: AtomicU32,
    format: DepthFormat,
    gpu: RwLock<Option<RenderbufferHandle>>,
    index: AtomicUsize,
}

impl DepthBuffer {
    pub(crate) fn new(
        width: u32,
        height: u32,
        format: DepthFormat,
        backend: &dyn RenderBackend,
    ) -> Result<Self, RenderError> {
        let handle = backend.create_renderbuffer(width, height, format.encode())?;
        Ok(Self {
            width: AtomicU32::new(width),
            height: AtomicU32::new(height),
            format,
            gpu: RwLock::new(Some(handle)),
            index: AtomicUsize::new(usize::MAX),
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width.load(Ordering::Relaxed)
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height.load(Ordering::Relaxed)
    }

    /// Storage format.
    pub fn format(&self) -> DepthFormat {
        self.format
    }

    /// GPU handle, if currently allocated.
    pub fn handle(&self) -> Option<RenderbufferHandle> {
        self.gpu.read().ok().and_then(|gpu| *gpu)
    }

    /// Reallocate storage at a new size.
    pub fn resize(&self, width: u32, height: u32, backend: &dyn RenderBackend) {
        self.width.store(width, Ordering::Relaxed);
        self.height.store(height, Ordering::Relaxed);
        if let Some(handle) = self.handle() {
            backend.resize_renderbuffer(handle, width, height);
        }
    }

    /// Release the renderbuffer. Idempotent.
    pub fn free(&self, backend: &dyn RenderBackend) {
        let taken = self.gpu.write().ok().and_then(|mut gpu| gpu.take());
        if let Some(handle) = taken {
            backend.destroy_renderbuffer(handle);
        }
    }

    /// Reconstruct the renderbuffer after a context restore.
    pub fn restore(&self, backend: &dyn RenderBackend) -> Result<(), RenderError> {
        let handle =
            backend.create_renderbuffer(self.width(), self.height(), self.format.encode())?;
        if let Ok(mut gpu) = self.gpu.write() {
            *gpu = Some(handle);
        }
        Ok(())
    }
}

impl ArenaEntry for DepthBuffer {
    fn arena_index(&self) -> usize {
        self.index.load(Ordering::Relaxed)
    }

    fn set_arena_index(&self, index: usize) {
        self.index.store(index, Ordering::Relaxed);
    }
}
