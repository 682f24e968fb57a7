//! GPU textures.

use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::backend::{RenderBackend, TextureHandle};
use crate::error::RenderError;

use super::arena::ArenaEntry;

/// Texture pixel format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureFormat {
    /// 8-bit RGBA.
    #[default]
    Rgba8,
    /// 8-bit RGB.
    Rgb8,
    /// 8-bit single channel.
    Alpha8,
}

impl TextureFormat {
    /// Backend command encoding.
    pub const fn encode(self) -> u32 {
        match self {
            Self::Alpha8 => 0x1906,
            Self::Rgb8 => 0x1907,
            Self::Rgba8 => 0x1908,
        }
    }

    /// Bytes per pixel.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Alpha8 => 1,
            Self::Rgb8 => 3,
            Self::Rgba8 => 4,
        }
    }
}

/// Descriptor for creating a texture.
#[derive(Debug, Clone, Default)]
pub struct TextureDescriptor {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel format.
    pub format: TextureFormat,
    /// Initial pixel data, tightly packed (`None` leaves contents undefined).
    pub pixels: Option<Vec<u8>>,
    /// Optional label for logging.
    pub label: Option<String>,
}

impl TextureDescriptor {
    /// Create a descriptor for a 2D texture.
    pub fn new(width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            width,
            height,
            format,
            pixels: None,
            label: None,
        }
    }

    /// Set the initial pixel data.
    pub fn with_pixels(mut self, pixels: Vec<u8>) -> Self {
        self.pixels = Some(pixels);
        self
    }

    /// Set a label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// A device-owned texture.
#[derive(Debug)]
pub struct Texture {
    descriptor: TextureDescriptor,
    gpu: RwLock<Option<TextureHandle>>,
    index: AtomicUsize,
}

impl Texture {
    pub(crate) fn new(
        descriptor: TextureDescriptor,
        backend: &dyn RenderBackend,
    ) -> Result<Self, RenderError> {
        let handle = Self::upload(&descriptor, backend)?;
        Ok(Self {
            descriptor,
            gpu: RwLock::new(Some(handle)),
            index: AtomicUsize::new(usize::MAX),
        })
    }

    fn upload(
        descriptor: &TextureDescriptor,
        backend: &dyn RenderBackend,
    ) -> Result<TextureHandle, RenderError> {
        backend.create_texture(
            descriptor.width,
            descriptor.height,
            descriptor.format.encode(),
            descriptor.pixels.as_deref(),
        )
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.descriptor.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.descriptor.height
    }

    /// Pixel format.
    pub fn format(&self) -> TextureFormat {
        self.descriptor.format
    }

    /// Label, if set.
    pub fn label(&self) -> Option<&str> {
        self.descriptor.label.as_deref()
    }

    /// GPU handle, if currently allocated.
    pub fn handle(&self) -> Option<TextureHandle> {
        self.gpu.read().ok().and_then(|gpu| *gpu)
    }

    /// Release the GPU texture. Idempotent.
    pub fn free(&self, backend: &dyn RenderBackend) {
        let taken = self.gpu.write().ok().and_then(|mut gpu| gpu.take());
        if let Some(handle) = taken {
            backend.destroy_texture(handle);
        }
    }

    /// Reconstruct the GPU texture after a context restore.
    pub fn restore(&self, backend: &dyn RenderBackend) -> Result<(), RenderError> {
        let handle = Self::upload(&self.descriptor, backend)?;
        if let Ok(mut gpu) = self.gpu.write() {
            *gpu = Some(handle);
        }
        Ok(())
    }
}

impl ArenaEntry for Texture {
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
    use crate::backend::TraceBackend;

    #[test]
    fn test_create_and_free() {
        let backend = TraceBackend::new();
        let texture =
            Texture::new(TextureDescriptor::new(64, 64, TextureFormat::Rgba8), &backend).unwrap();
        assert!(texture.handle().is_some());
        texture.free(&backend);
        texture.free(&backend);
        assert!(texture.handle().is_none());
    }

    #[test]
    fn test_format_sizes() {
        assert_eq!(TextureFormat::Rgba8.bytes_per_pixel(), 4);
        assert_eq!(TextureFormat::Rgb8.bytes_per_pixel(), 3);
        assert_eq!(TextureFormat::Alpha8.bytes_per_pixel(), 1);
    }
}
