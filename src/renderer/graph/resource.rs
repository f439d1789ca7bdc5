//! Graph Resource Types
//!
//! Usage masks and frame-local handles for resources tracked by the render
//! graph. A usage is both the *access mode* a pass declares and the *state*
//! a resource is left in afterwards; the graph inserts a barrier whenever
//! consecutive usages of a resource disagree.

use bitflags::bitflags;

use crate::renderer::core::gpu::{BufferHandle, TextureHandle};

bitflags! {
    /// How a texture is accessed by a pass.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
    pub struct TextureUsage: u32 {
        const SAMPLED_GEOMETRY       = 1 << 0;
        const SAMPLED_FRAGMENT       = 1 << 1;
        const SAMPLED_COMPUTE        = 1 << 2;
        const STORAGE_GEOMETRY_READ  = 1 << 3;
        const STORAGE_FRAGMENT_READ  = 1 << 4;
        const STORAGE_FRAGMENT_WRITE = 1 << 5;
        const STORAGE_COMPUTE_READ   = 1 << 6;
        const STORAGE_COMPUTE_WRITE  = 1 << 7;
        const FRAMEBUFFER_READ       = 1 << 8;
        const FRAMEBUFFER_WRITE      = 1 << 9;
        const TRANSFER_DESTINATION   = 1 << 10;

        const ALL_SAMPLED = Self::SAMPLED_GEOMETRY.bits()
            | Self::SAMPLED_FRAGMENT.bits()
            | Self::SAMPLED_COMPUTE.bits();
        const ALL_COMPUTE = Self::SAMPLED_COMPUTE.bits()
            | Self::STORAGE_COMPUTE_READ.bits()
            | Self::STORAGE_COMPUTE_WRITE.bits();
        const ALL_WRITE = Self::STORAGE_FRAGMENT_WRITE.bits()
            | Self::STORAGE_COMPUTE_WRITE.bits()
            | Self::FRAMEBUFFER_WRITE.bits()
            | Self::TRANSFER_DESTINATION.bits();
    }
}

impl TextureUsage {
    /// The usage writes to the texture (and therefore orders later readers).
    #[inline]
    #[must_use]
    pub fn is_write(self) -> bool {
        self.intersects(Self::ALL_WRITE)
    }
}

bitflags! {
    /// How a buffer is accessed by a pass.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
    pub struct BufferUsage: u32 {
        const UNIFORM_GEOMETRY       = 1 << 0;
        const UNIFORM_FRAGMENT       = 1 << 1;
        const UNIFORM_COMPUTE        = 1 << 2;
        const STORAGE_GEOMETRY_READ  = 1 << 3;
        const STORAGE_FRAGMENT_READ  = 1 << 4;
        const STORAGE_COMPUTE_READ   = 1 << 5;
        const STORAGE_COMPUTE_WRITE  = 1 << 6;
        const INDIRECT_DRAW          = 1 << 7;
        const INDIRECT_COMPUTE       = 1 << 8;
        const VERTEX                 = 1 << 9;
        const INDEX                  = 1 << 10;
        const TRANSFER_DESTINATION   = 1 << 11;

        const ALL_WRITE = Self::STORAGE_COMPUTE_WRITE.bits()
            | Self::TRANSFER_DESTINATION.bits();
    }
}

impl BufferUsage {
    #[inline]
    #[must_use]
    pub fn is_write(self) -> bool {
        self.intersects(Self::ALL_WRITE)
    }
}

// ─── Frame-local handles ──────────────────────────────────────────────────────

/// A texture imported into the current frame's graph.
///
/// Valid only for the graph that produced it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct RenderTargetHandle(pub(crate) u32);

/// A buffer imported into the current frame's graph.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct GraphBufferHandle(pub(crate) u32);

/// A pass declared in the current frame's graph.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct PassHandle(pub(crate) u32);

impl PassHandle {
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

// ─── Barriers ─────────────────────────────────────────────────────────────────

/// A texture state transition recorded before a pass.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TextureBarrier {
    pub texture: TextureHandle,
    pub before: TextureUsage,
    pub after: TextureUsage,
}

/// A buffer state transition recorded before a pass.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BufferBarrier {
    pub buffer: BufferHandle,
    pub before: BufferUsage,
    pub after: BufferUsage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_compute_counts_as_write() {
        assert!(TextureUsage::ALL_COMPUTE.is_write());
        assert!(!TextureUsage::SAMPLED_COMPUTE.is_write());
        assert!(TextureUsage::STORAGE_COMPUTE_WRITE.is_write());
    }

    #[test]
    fn indirect_args_are_read_only() {
        assert!(!BufferUsage::INDIRECT_DRAW.is_write());
        assert!(BufferUsage::STORAGE_COMPUTE_WRITE.is_write());
    }
}
