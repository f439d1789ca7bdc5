//! # Orrery
//!
//! Render-graph core of a GPU-driven renderer:
//!
//! - **Render graph**: persistent render targets imported with tracked usage,
//!   compute and graphics passes with declared dependencies, dependency-ordered
//!   execution with planned barriers.
//! - **Sky**: atmospheric lookup textures regenerated only when the sun
//!   changes, plus a per-frame sun color.
//! - **Drawer**: binds the GPU scene and records one indirect draw per
//!   render-state bucket (mesh shader, software meshlet or multi-draw with a
//!   GPU count).
//!
//! The GPU backend is reached through two traits,
//! [`GpuDevice`](renderer::core::GpuDevice) and
//! [`CommandRecorder`](renderer::core::CommandRecorder).
//!
//! ```rust,ignore
//! use orrery::{Renderer, RendererSettings, RenderingContext};
//!
//! let mut renderer = Renderer::new(device, scene_buffers, RendererSettings::default())?;
//!
//! let mut ctx = RenderingContext::new(global_uniforms_view);
//! renderer.queue_mdi_pass(MdiPassRequest::new("GBuffer", args));
//! renderer.populate_render_graph(&mut ctx, &lighting, &buckets);
//! ctx.into_graph().compile()?.execute(&mut recorder);
//! renderer.end_frame();
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod errors;
pub mod renderer;
pub mod scene;

pub use errors::{OrreryError, Result};
pub use renderer::Renderer;
pub use renderer::drawer::{DrawerArguments, GpuSceneBuffers, RenderableDrawer};
pub use renderer::graph::passes::{MdiPassRequest, Sky};
pub use renderer::graph::{CompiledRenderGraph, RenderGraphBuilder, RenderingContext};
pub use renderer::settings::{RendererSettings, SkySettings};
pub use scene::{RenderStateBucketContainer, RenderingTechnique, SceneLighting};
