//! GPU Backend Seam
//!
//! - [`gpu`]: handles, buffer/texture views, shader registers, capabilities
//! - [`device`]: object creation ([`GpuDevice`])
//! - [`command`]: command recording ([`CommandRecorder`])
//! - [`transient`]: frame-scoped uniform allocation

pub mod command;
pub mod device;
pub mod gpu;
pub mod transient;

pub use command::{CommandRecorder, VertexAttributeSemantic, dispatch_pp_compute};
pub use device::{BufferDesc, GpuDevice, SamplerDesc, Samplers, TextureDesc};
pub use gpu::{
    BufferHandle, BufferView, DeviceCapabilities, PipelineQueryHandle, PipelineQueryType, Register,
    RegisterKind, SamplerHandle, ShaderProgramHandle, TexelFormat, TextureHandle, TextureView,
};
pub use transient::TransientUniformPool;
