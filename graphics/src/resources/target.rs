//! Render targets.

use std::sync::{Arc, RwLock};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::backend::{FramebufferHandle, RenderBackend};
use crate::error::RenderError;

use super::arena::ArenaEntry;
use super::depth::DepthBuffer;
use super::texture::Texture;

/// What a target renders into.
#[derive(Debug)]
enum TargetKind {
    /// The default surface (backing buffer of the context).
    Surface {
        size: RwLock<(u32, u32)>,
        depth: Option<Arc<DepthBuffer>>,
    },
    /// An offscreen framebuffer backed by a color texture.
    Offscreen {
        color: Arc<Texture>,
        depth: Option<Arc<DepthBuffer>>,
        gpu: RwLock<Option<FramebufferHandle>>,
    },
}

/// A device-owned render target.
///
/// The default target wraps the surface; its buffers are resized by the
/// frame driver when the client size changes. Offscreen targets wrap a
/// color texture plus an optional depth buffer.
#[derive(Debug)]
pub struct RenderTarget {
    kind: TargetKind,
    index: AtomicUsize,
}

impl RenderTarget {
    /// Create the surface-backed default target.
    pub(crate) fn surface(width: u32, height: u32, depth: Option<Arc<DepthBuffer>>) -> Self {
        Self {
            kind: TargetKind::Surface {
                size: RwLock::new((width, height)),
                depth,
            },
            index: AtomicUsize::new(usize::MAX),
        }
    }

    /// Create an offscreen target.
    pub(crate) fn offscreen(
        color: Arc<Texture>,
        depth: Option<Arc<DepthBuffer>>,
        backend: &dyn RenderBackend,
    ) -> Result<Self, RenderError> {
        let framebuffer =
            backend.create_framebuffer(color.handle(), depth.as_ref().and_then(|d| d.handle()))?;
        Ok(Self {
            kind: TargetKind::Offscreen {
                color,
                depth,
                gpu: RwLock::new(Some(framebuffer)),
            },
            index: AtomicUsize::new(usize::MAX),
        })
    }

    /// Whether this is the surface-backed default target.
    pub fn is_surface(&self) -> bool {
        matches!(self.kind, TargetKind::Surface { .. })
    }

    /// Current width in pixels.
    pub fn width(&self) -> u32 {
        match &self.kind {
            TargetKind::Surface { size, .. } => size.read().map(|s| s.0).unwrap_or(0),
            TargetKind::Offscreen { color, .. } => color.width(),
        }
    }

    /// Current height in pixels.
    pub fn height(&self) -> u32 {
        match &self.kind {
            TargetKind::Surface { size, .. } => size.read().map(|s| s.1).unwrap_or(0),
            TargetKind::Offscreen { color, .. } => color.height(),
        }
    }

    /// The attached depth buffer, if any.
    pub fn depth(&self) -> Option<Arc<DepthBuffer>> {
        match &self.kind {
            TargetKind::Surface { depth, .. } | TargetKind::Offscreen { depth, .. } => {
                depth.clone()
            }
        }
    }

    /// The color texture of an offscreen target.
    pub fn color(&self) -> Option<Arc<Texture>> {
        match &self.kind {
            TargetKind::Surface { .. } => None,
            TargetKind::Offscreen { color, .. } => Some(color.clone()),
        }
    }

    /// Bind this target for rendering.
    pub fn bind(&self, backend: &dyn RenderBackend) {
        match &self.kind {
            TargetKind::Surface { .. } => backend.bind_framebuffer(None),
            TargetKind::Offscreen { gpu, .. } => {
                let framebuffer = gpu.read().ok().and_then(|g| *g);
                backend.bind_framebuffer(framebuffer);
            }
        }
    }

    /// Resize the surface target's buffers.
    ///
    /// No-op for offscreen targets; their size is fixed by the color
    /// texture.
    pub fn resize(&self, width: u32, height: u32, backend: &dyn RenderBackend) {
        if let TargetKind::Surface { size, depth } = &self.kind {
            if let Ok(mut s) = size.write() {
                *s = (width, height);
            }
            if let Some(depth) = depth {
                depth.resize(width, height, backend);
            }
            log::debug!("surface target resized to {width}x{height}");
        }
    }

    /// Release the framebuffer. Idempotent; surface targets own no
    /// framebuffer object.
    pub fn free(&self, backend: &dyn RenderBackend) {
        if let TargetKind::Offscreen { gpu, .. } = &self.kind {
            let taken = gpu.write().ok().and_then(|mut g| g.take());
            if let Some(framebuffer) = taken {
                backend.destroy_framebuffer(framebuffer);
            }
        }
    }

    /// Reconstruct the framebuffer after a context restore.
    ///
    /// Attachments are restored before targets in the device's restore
    /// order, so their handles are valid here.
    pub fn restore(&self, backend: &dyn RenderBackend) -> Result<(), RenderError> {
        if let TargetKind::Offscreen { color, depth, gpu } = &self.kind {
            let framebuffer = backend
                .create_framebuffer(color.handle(), depth.as_ref().and_then(|d| d.handle()))?;
            if let Ok(mut g) = gpu.write() {
                *g = Some(framebuffer);
            }
        }
        Ok(())
    }
}

impl ArenaEntry for RenderTarget {
    fn arena_index(&self) -> usize {
        self.index.load(Ordering::Relaxed)
    }

    fn set_arena_index(&self, index: usize) {
        self.index.store(index, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendCall, TraceBackend};
    use crate::resources::depth::DepthFormat;
    use crate::resources::texture::{TextureDescriptor, TextureFormat};

    #[test]
    fn test_surface_resize_tracks_size_and_depth() {
        let backend = TraceBackend::new();
        let depth = Arc::new(DepthBuffer::new(300, 150, DepthFormat::Depth16, &backend).unwrap());
        let target = RenderTarget::surface(300, 150, Some(depth.clone()));

        target.resize(800, 600, &backend);
        assert_eq!((target.width(), target.height()), (800, 600));
        assert_eq!((depth.width(), depth.height()), (800, 600));
    }

    #[test]
    fn test_offscreen_binds_framebuffer() {
        let backend = TraceBackend::new();
        let color = Arc::new(
            Texture::new(TextureDescriptor::new(64, 64, TextureFormat::Rgba8), &backend).unwrap(),
        );
        let target = RenderTarget::offscreen(color, None, &backend).unwrap();

        target.bind(&backend);
        assert_eq!(
            backend.count_matching(|c| matches!(c, BackendCall::BindFramebuffer(Some(_)))),
            1
        );
        assert_eq!((target.width(), target.height()), (64, 64));
    }

    #[test]
    fn test_surface_binds_default() {
        let backend = TraceBackend::new();
        let target = RenderTarget::surface(300, 150, None);
        target.bind(&backend);
        assert_eq!(backend.calls(), vec![BackendCall::BindFramebuffer(None)]);
    }
}
