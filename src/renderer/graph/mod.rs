//! Render Graph
//!
//! Per-frame pass scheduling with explicit resource dependencies:
//!
//! - [`RenderGraphBuilder`]: imports persistent resources, declares passes
//! - [`PassBuilder`]: dependencies and the deferred work closure of one pass
//! - [`CompiledRenderGraph`]: execution order, barriers, recording
//! - [`RenderingContext`] / [`PassWorkContext`]: declaration and record phases
//! - [`passes`]: the subsystems that populate the graph (sky, MDI)

pub mod builder;
pub mod context;
pub mod graph;
pub mod import;
pub mod pass;
pub mod passes;
pub mod resource;
pub mod topological_sort;

pub use builder::RenderGraphBuilder;
pub use context::{PassWorkContext, RenderingContext};
pub use graph::{CompiledPass, CompiledRenderGraph};
pub use import::{RenderTarget, create_and_clear_render_target};
pub use pass::{PassBuilder, PassKind, PassWork};
pub use resource::{
    BufferBarrier, BufferUsage, GraphBufferHandle, PassHandle, RenderTargetHandle,
    TextureBarrier, TextureUsage,
};
