//! Render Graph Contexts
//!
//! Two phase-separated contexts:
//!
//! - [`RenderingContext`]: the **declaration** phase. Owns this frame's
//!   [`RenderGraphBuilder`] and the frame-wide resources every subsystem may
//!   depend on (the global rendering uniforms buffer).
//!
//! - [`PassWorkContext`]: the **record** phase. Handed to each pass's work
//!   closure while the compiled graph executes. Resolves graph handles to
//!   concrete views and exposes the command recorder.
//!
//! # Frame-wide resources
//!
//! | Field | Usage at import | Written by |
//! |-------|-----------------|------------|
//! | `global_rendering_uniforms` | `TRANSFER_DESTINATION` | CPU upload, `ComputeSunColor` |

use crate::renderer::core::command::CommandRecorder;
use crate::renderer::core::gpu::{BufferView, Register, TextureView};
use crate::renderer::graph::builder::RenderGraphBuilder;
use crate::renderer::graph::import::{ImportedBuffer, ImportedTexture};
use crate::renderer::graph::resource::{BufferUsage, GraphBufferHandle, RenderTargetHandle};

// ─── Declaration Phase ────────────────────────────────────────────────────────

/// Per-frame declaration state shared by every subsystem that adds passes.
pub struct RenderingContext {
    /// This frame's graph under construction.
    pub graph: RenderGraphBuilder,
    /// Persistent buffer holding the global rendering uniforms.
    pub global_rendering_uniforms: GraphBufferHandle,
    global_rendering_uniforms_view: BufferView,
}

impl RenderingContext {
    /// Starts a frame. The global uniforms buffer is imported as freshly
    /// uploaded by the CPU.
    #[must_use]
    pub fn new(global_rendering_uniforms: BufferView) -> Self {
        let mut graph = RenderGraphBuilder::new();
        let handle =
            graph.import_buffer(global_rendering_uniforms, BufferUsage::TRANSFER_DESTINATION);
        Self {
            graph,
            global_rendering_uniforms: handle,
            global_rendering_uniforms_view: global_rendering_uniforms,
        }
    }

    #[inline]
    #[must_use]
    pub fn global_rendering_uniforms_view(&self) -> BufferView {
        self.global_rendering_uniforms_view
    }

    /// Ends declaration, handing the builder over for compilation.
    #[must_use]
    pub fn into_graph(self) -> RenderGraphBuilder {
        self.graph
    }
}

// ─── Record Phase ─────────────────────────────────────────────────────────────

/// Imported resources of a compiled graph.
pub(crate) struct GraphResources {
    pub textures: Vec<ImportedTexture>,
    pub buffers: Vec<ImportedBuffer>,
}

/// Context passed to a pass's work closure.
pub struct PassWorkContext<'a> {
    cmdb: &'a mut dyn CommandRecorder,
    resources: &'a GraphResources,
    pass_name: &'a str,
}

impl<'a> PassWorkContext<'a> {
    pub(crate) fn new(
        cmdb: &'a mut dyn CommandRecorder,
        resources: &'a GraphResources,
        pass_name: &'a str,
    ) -> Self {
        Self {
            cmdb,
            resources,
            pass_name,
        }
    }

    /// The recorder this pass writes into.
    #[inline]
    pub fn command_buffer(&mut self) -> &mut dyn CommandRecorder {
        &mut *self.cmdb
    }

    #[inline]
    #[must_use]
    pub fn pass_name(&self) -> &str {
        self.pass_name
    }

    /// Resolves an imported render target.
    ///
    /// # Panics
    ///
    /// Panics if `handle` was produced by a different graph.
    #[must_use]
    pub fn texture_view(&self, handle: RenderTargetHandle) -> TextureView {
        self.resources.textures[handle.0 as usize].target.view()
    }

    /// Resolves an imported buffer.
    ///
    /// # Panics
    ///
    /// Panics if `handle` was produced by a different graph.
    #[must_use]
    pub fn buffer_view(&self, handle: GraphBufferHandle) -> BufferView {
        self.resources.buffers[handle.0 as usize].view
    }

    /// Binds an imported render target at `reg` (sampled or storage,
    /// depending on the register class).
    pub fn bind_texture(&mut self, reg: Register, handle: RenderTargetHandle) {
        let view = self.texture_view(handle);
        self.cmdb.bind_texture(reg, view);
    }

    pub fn bind_uniform_buffer(&mut self, reg: Register, handle: GraphBufferHandle) {
        let view = self.buffer_view(handle);
        self.cmdb.bind_uniform_buffer(reg, view);
    }

    pub fn bind_storage_buffer(&mut self, reg: Register, handle: GraphBufferHandle) {
        let view = self.buffer_view(handle);
        self.cmdb.bind_storage_buffer(reg, view);
    }
}
