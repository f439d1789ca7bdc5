//! GPU Object Vocabulary
//!
//! Opaque handles and lightweight views over backend objects. The backend
//! itself (allocation, submission) lives behind [`GpuDevice`](super::GpuDevice)
//! and [`CommandRecorder`](super::CommandRecorder); this module only defines
//! the values that flow between the renderer core and that backend.

use std::fmt;

// ─── Handles ──────────────────────────────────────────────────────────────────

macro_rules! gpu_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
        pub struct $name(pub u64);

        impl $name {
            /// Returns the raw backend id.
            #[inline]
            #[must_use]
            pub const fn id(self) -> u64 {
                self.0
            }
        }
    };
}

gpu_handle!(
    /// Backend texture object.
    TextureHandle
);
gpu_handle!(
    /// Backend buffer object.
    BufferHandle
);
gpu_handle!(
    /// Backend sampler object.
    SamplerHandle
);
gpu_handle!(
    /// A linked, ready-to-bind shader program variant.
    ShaderProgramHandle
);
gpu_handle!(
    /// A GPU pipeline statistics query.
    PipelineQueryHandle
);

// ─── Buffer View ──────────────────────────────────────────────────────────────

/// A byte range of a GPU buffer.
///
/// Views are plain values: slicing never touches the GPU. The builder-style
/// helpers mirror how indirect argument slots and per-bucket instance slices
/// are carved out of larger buffers.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct BufferView {
    pub buffer: BufferHandle,
    pub offset: u64,
    pub range: u64,
}

impl BufferView {
    #[inline]
    #[must_use]
    pub const fn new(buffer: BufferHandle, offset: u64, range: u64) -> Self {
        Self {
            buffer,
            offset,
            range,
        }
    }

    /// Moves the start of the view forward, shrinking the range accordingly.
    ///
    /// # Panics
    ///
    /// Panics if `delta` is larger than the current range.
    #[inline]
    #[must_use]
    pub fn increment_offset(mut self, delta: u64) -> Self {
        assert!(
            delta <= self.range,
            "Offset increment {delta} exceeds view range {}",
            self.range
        );
        self.offset += delta;
        self.range -= delta;
        self
    }

    /// Narrows the range of the view.
    ///
    /// # Panics
    ///
    /// Panics if `range` is larger than the current range.
    #[inline]
    #[must_use]
    pub fn set_range(mut self, range: u64) -> Self {
        assert!(
            range <= self.range,
            "New range {range} exceeds view range {}",
            self.range
        );
        self.range = range;
        self
    }

    /// One past the last byte covered by the view.
    #[inline]
    #[must_use]
    pub const fn end(&self) -> u64 {
        self.offset + self.range
    }
}

// ─── Texture View ─────────────────────────────────────────────────────────────

/// A full-subresource view of a GPU texture.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TextureView {
    pub texture: TextureHandle,
}

impl TextureView {
    #[inline]
    #[must_use]
    pub const fn all(texture: TextureHandle) -> Self {
        Self { texture }
    }
}

// ─── Shader Registers ─────────────────────────────────────────────────────────

/// Register class of a shader binding slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum RegisterKind {
    /// `t#`: sampled textures, read-only structured and texel buffers.
    ShaderResource,
    /// `u#`: storage textures and read-write buffers.
    UnorderedAccess,
    /// `b#`: uniform buffers.
    Uniform,
    /// `s#`: samplers.
    Sampler,
}

/// A shader binding slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Register {
    pub kind: RegisterKind,
    pub index: u32,
    pub space: u32,
}

impl Register {
    #[must_use]
    pub const fn t(index: u32) -> Self {
        Self {
            kind: RegisterKind::ShaderResource,
            index,
            space: 0,
        }
    }

    #[must_use]
    pub const fn u(index: u32) -> Self {
        Self {
            kind: RegisterKind::UnorderedAccess,
            index,
            space: 0,
        }
    }

    #[must_use]
    pub const fn b(index: u32) -> Self {
        Self {
            kind: RegisterKind::Uniform,
            index,
            space: 0,
        }
    }

    #[must_use]
    pub const fn s(index: u32) -> Self {
        Self {
            kind: RegisterKind::Sampler,
            index,
            space: 0,
        }
    }
}

impl fmt::Debug for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.kind {
            RegisterKind::ShaderResource => 't',
            RegisterKind::UnorderedAccess => 'u',
            RegisterKind::Uniform => 'b',
            RegisterKind::Sampler => 's',
        };
        if self.space == 0 {
            write!(f, "{prefix}{}", self.index)
        } else {
            write!(f, "{prefix}{}:space{}", self.index, self.space)
        }
    }
}

// ─── Device Capabilities ──────────────────────────────────────────────────────

/// Frame-invariant device capabilities queried once at startup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeviceCapabilities {
    /// Native task/mesh shader pipelines are available.
    pub mesh_shaders: bool,
    /// Pipeline statistics queries are available.
    pub pipeline_query: bool,
}

/// Kind of pipeline statistics query.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum PipelineQueryType {
    PrimitivesPassedClipping,
}

/// Texel formats the unified geometry buffer is viewed through.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TexelFormat {
    R32Sfloat,
    R32G32Sfloat,
    R32G32B32Sfloat,
    R32G32B32A32Sfloat,
    R16G16B16A16Unorm,
    R8G8B8A8Unorm,
    R8G8B8A8Uint,
}

impl TexelFormat {
    /// Size of one texel in bytes.
    #[must_use]
    pub const fn texel_size(self) -> u64 {
        match self {
            Self::R32Sfloat | Self::R8G8B8A8Unorm | Self::R8G8B8A8Uint => 4,
            Self::R32G32Sfloat | Self::R16G16B16A16Unorm => 8,
            Self::R32G32B32Sfloat => 12,
            Self::R32G32B32A32Sfloat => 16,
        }
    }
}

/// Rounds `value` down to a multiple of `alignment` (which need not be a
/// power of two, e.g. 12-byte texels).
#[inline]
#[must_use]
pub const fn aligned_round_down(alignment: u64, value: u64) -> u64 {
    (value / alignment) * alignment
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_view_slicing_accumulates_offset() {
        let view = BufferView::new(BufferHandle(7), 64, 1024)
            .increment_offset(20 * 3)
            .set_range(20 * 4);
        assert_eq!(view.offset, 124);
        assert_eq!(view.range, 80);
        assert_eq!(view.end(), 204);
    }

    #[test]
    #[should_panic(expected = "exceeds view range")]
    fn buffer_view_rejects_out_of_range_slice() {
        let _ = BufferView::new(BufferHandle(1), 0, 16).set_range(32);
    }

    #[test]
    fn round_down_handles_non_power_of_two_texels() {
        assert_eq!(aligned_round_down(12, 100), 96);
        assert_eq!(aligned_round_down(16, 100), 96);
        assert_eq!(aligned_round_down(4, 100), 100);
    }

    #[test]
    fn register_debug_format() {
        assert_eq!(format!("{:?}", Register::u(0)), "u0");
        assert_eq!(format!("{:?}", Register::s(3)), "s3");
    }
}
