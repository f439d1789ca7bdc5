//! Render Target Importer
//!
//! Persistent GPU images live across frames and are owned by the subsystem
//! that created them. Each frame they are *imported* into the render graph,
//! which needs to know the state the image was left in so that the first
//! transition of the frame is correct and no redundant barrier is inserted.
//!
//! [`RenderTarget`] remembers its last usage. The graph writes the final
//! usage back after execution, so importing without an explicit usage
//! always matches the image's real state.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::errors::Result;
use crate::renderer::core::device::{GpuDevice, TextureDesc};
use crate::renderer::core::gpu::{BufferView, TextureHandle, TextureView};
use crate::renderer::graph::resource::{BufferUsage, TextureUsage};

/// A persistent, fixed-size GPU image tracked by the render graph.
#[derive(Debug)]
pub struct RenderTarget {
    texture: TextureHandle,
    desc: TextureDesc,
    last_usage: AtomicU32,
}

impl RenderTarget {
    #[must_use]
    pub fn new(texture: TextureHandle, desc: TextureDesc, initial_usage: TextureUsage) -> Self {
        Self {
            texture,
            desc,
            last_usage: AtomicU32::new(initial_usage.bits()),
        }
    }

    #[inline]
    #[must_use]
    pub fn texture(&self) -> TextureHandle {
        self.texture
    }

    #[inline]
    #[must_use]
    pub fn view(&self) -> TextureView {
        TextureView::all(self.texture)
    }

    #[inline]
    #[must_use]
    pub fn desc(&self) -> &TextureDesc {
        &self.desc
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.desc.label
    }

    /// Usage the image was left in by the last executed graph.
    #[inline]
    #[must_use]
    pub fn last_usage(&self) -> TextureUsage {
        TextureUsage::from_bits_retain(self.last_usage.load(Ordering::Acquire))
    }

    pub(crate) fn set_last_usage(&self, usage: TextureUsage) {
        self.last_usage.store(usage.bits(), Ordering::Release);
    }
}

/// Creates a texture (cleared by the device) and wraps it as a render target
/// whose tracked usage starts at `initial_usage`.
pub fn create_and_clear_render_target(
    device: &dyn GpuDevice,
    desc: TextureDesc,
    initial_usage: TextureUsage,
) -> Result<Arc<RenderTarget>> {
    let texture = device.create_texture(&desc)?;
    log::debug!(
        "Created render target '{}' ({}x{}, {:?})",
        desc.label,
        desc.width,
        desc.height,
        desc.format
    );
    Ok(Arc::new(RenderTarget::new(texture, desc, initial_usage)))
}

// ─── Import records ───────────────────────────────────────────────────────────

/// A render target as seen by one frame's graph.
#[derive(Debug, Clone)]
pub(crate) struct ImportedTexture {
    pub target: Arc<RenderTarget>,
    pub initial_usage: TextureUsage,
}

impl ImportedTexture {
    /// Resolves the usage the image is in when the frame starts.
    ///
    /// `None` trusts the tracked usage. An explicit usage is the caller's
    /// statement of the current state and wins.
    pub fn new(target: Arc<RenderTarget>, usage: Option<TextureUsage>) -> Self {
        let tracked = target.last_usage();
        let initial_usage = match usage {
            Some(explicit) => {
                if explicit != tracked {
                    log::trace!(
                        "Render target '{}' imported as {explicit:?}, last recorded {tracked:?}",
                        target.name()
                    );
                }
                explicit
            }
            None => tracked,
        };
        Self {
            target,
            initial_usage,
        }
    }
}

/// A persistent buffer range as seen by one frame's graph.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ImportedBuffer {
    pub view: BufferView,
    pub initial_usage: BufferUsage,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(usage: TextureUsage) -> Arc<RenderTarget> {
        Arc::new(RenderTarget::new(
            TextureHandle(1),
            TextureDesc::new_2d(
                4,
                4,
                wgpu::TextureFormat::Rgba16Unorm,
                TextureUsage::ALL_COMPUTE,
                "Test",
            ),
            usage,
        ))
    }

    #[test]
    fn implicit_import_uses_tracked_usage() {
        let rt = target(TextureUsage::SAMPLED_FRAGMENT);
        let imported = ImportedTexture::new(rt, None);
        assert_eq!(imported.initial_usage, TextureUsage::SAMPLED_FRAGMENT);
    }

    #[test]
    fn explicit_import_overrides_tracked_usage() {
        let rt = target(TextureUsage::SAMPLED_FRAGMENT);
        let imported = ImportedTexture::new(rt, Some(TextureUsage::ALL_COMPUTE));
        assert_eq!(imported.initial_usage, TextureUsage::ALL_COMPUTE);
    }

    #[test]
    fn last_usage_round_trips_through_atomic() {
        let rt = target(TextureUsage::empty());
        rt.set_last_usage(TextureUsage::STORAGE_COMPUTE_WRITE | TextureUsage::SAMPLED_FRAGMENT);
        assert_eq!(
            rt.last_usage(),
            TextureUsage::STORAGE_COMPUTE_WRITE | TextureUsage::SAMPLED_FRAGMENT
        );
    }
}
