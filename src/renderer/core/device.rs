//! GPU Device Interface
//!
//! Object creation entry points the renderer core needs from the backend:
//! shader program loading, persistent textures and buffers, samplers and
//! pipeline queries. Pipeline queries are created while recording; the rest
//! runs at initialization.

use crate::errors::Result;
use crate::renderer::core::gpu::{
    BufferHandle, DeviceCapabilities, PipelineQueryHandle, PipelineQueryType, SamplerHandle,
    ShaderProgramHandle, TextureHandle,
};
use crate::renderer::graph::resource::{BufferUsage, TextureUsage};

/// Descriptor for a persistent 2D texture.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureDesc {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
    pub usage: TextureUsage,
}

impl TextureDesc {
    #[must_use]
    pub fn new_2d(
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        usage: TextureUsage,
        label: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            width,
            height,
            format,
            usage,
        }
    }
}

/// Descriptor for a persistent buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BufferDesc {
    pub label: String,
    pub size: u64,
    pub usage: BufferUsage,
}

/// Descriptor for a sampler object.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SamplerDesc {
    pub label: &'static str,
    pub mag_filter: wgpu::FilterMode,
    pub min_filter: wgpu::FilterMode,
    pub mipmap_filter: wgpu::FilterMode,
    pub address_mode: wgpu::AddressMode,
}

/// The GPU device as seen by the renderer core.
///
/// Implementations must be shareable across recording threads.
pub trait GpuDevice: Send + Sync {
    /// Capabilities are frame-invariant; callers may cache the result.
    fn capabilities(&self) -> DeviceCapabilities;

    /// Loads one technique of a compiled program binary.
    fn load_shader_program(&self, binary: &str, technique: &str) -> Result<ShaderProgramHandle>;

    /// Creates a texture and clears it to zero.
    fn create_texture(&self, desc: &TextureDesc) -> Result<TextureHandle>;

    fn create_buffer(&self, desc: &BufferDesc) -> Result<BufferHandle>;

    fn create_sampler(&self, desc: &SamplerDesc) -> Result<SamplerHandle>;

    fn new_pipeline_query(
        &self,
        name: &str,
        query_type: PipelineQueryType,
    ) -> Result<PipelineQueryHandle>;
}

/// Samplers shared by every pass of the renderer.
#[derive(Clone, Copy, Debug)]
pub struct Samplers {
    pub trilinear_clamp: SamplerHandle,
    pub trilinear_repeat: SamplerHandle,
    pub nearest_nearest_clamp: SamplerHandle,
}

impl Samplers {
    pub fn new(device: &dyn GpuDevice) -> Result<Self> {
        let trilinear_clamp = device.create_sampler(&SamplerDesc {
            label: "TrilinearClamp",
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            address_mode: wgpu::AddressMode::ClampToEdge,
        })?;

        let trilinear_repeat = device.create_sampler(&SamplerDesc {
            label: "TrilinearRepeat",
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            address_mode: wgpu::AddressMode::Repeat,
        })?;

        let nearest_nearest_clamp = device.create_sampler(&SamplerDesc {
            label: "NearestNearestClamp",
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            address_mode: wgpu::AddressMode::ClampToEdge,
        })?;

        Ok(Self {
            trilinear_clamp,
            trilinear_repeat,
            nearest_nearest_clamp,
        })
    }
}
