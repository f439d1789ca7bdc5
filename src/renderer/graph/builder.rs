//! Render Graph Builder
//!
//! Per-frame declaration API. Subsystems import the persistent resources they
//! touch, then declare passes against the returned handles:
//!
//! ```ignore
//! let lut = builder.import_render_target(&sky_lut, None);
//! builder
//!     .new_compute_pass("SkyLut")
//!     .new_texture_dependency(lut, TextureUsage::STORAGE_COMPUTE_WRITE)
//!     .set_work(move |ctx| { /* record */ });
//!
//! let graph = builder.compile()?;
//! graph.execute(&mut recorder);
//! ```
//!
//! Declaration order does not decide execution order; declared dependencies
//! do (see [`compile`](RenderGraphBuilder::compile)).

use std::sync::Arc;

use crate::errors::{OrreryError, Result};
use crate::renderer::core::gpu::BufferView;
use crate::renderer::graph::graph::CompiledRenderGraph;
use crate::renderer::graph::import::{ImportedBuffer, ImportedTexture, RenderTarget};
use crate::renderer::graph::pass::{PassBuilder, PassKind};
use crate::renderer::graph::resource::{
    BufferUsage, GraphBufferHandle, PassHandle, RenderTargetHandle, TextureUsage,
};

pub struct RenderGraphBuilder {
    pub(crate) textures: Vec<ImportedTexture>,
    pub(crate) buffers: Vec<ImportedBuffer>,
    pub(crate) passes: Vec<PassBuilder>,
    pub(crate) explicit_edges: Vec<(PassHandle, PassHandle)>,
}

impl Default for RenderGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderGraphBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            textures: Vec::new(),
            buffers: Vec::new(),
            passes: Vec::new(),
            explicit_edges: Vec::new(),
        }
    }

    // ── Resources ──────────────────────────────────────────────────────────

    /// Imports a persistent render target into this frame.
    ///
    /// With `None` the target's last recorded usage is used. With `Some` the
    /// caller states the usage the image is currently in.
    ///
    /// Importing the same target twice returns the existing handle; an
    /// explicit usage on the second import is ignored.
    pub fn import_render_target(
        &mut self,
        target: &Arc<RenderTarget>,
        usage: Option<TextureUsage>,
    ) -> RenderTargetHandle {
        if let Some(index) = self
            .textures
            .iter()
            .position(|t| Arc::ptr_eq(&t.target, target))
        {
            return RenderTargetHandle(index as u32);
        }

        let handle = RenderTargetHandle(self.textures.len() as u32);
        let imported = ImportedTexture::new(Arc::clone(target), usage);
        log::trace!(
            "Import '{}' as {:?} ({:?})",
            target.name(),
            handle,
            imported.initial_usage
        );
        self.textures.push(imported);
        handle
    }

    /// Imports a persistent buffer range in the given current usage.
    pub fn import_buffer(&mut self, view: BufferView, usage: BufferUsage) -> GraphBufferHandle {
        if let Some(index) = self.buffers.iter().position(|b| b.view == view) {
            return GraphBufferHandle(index as u32);
        }

        let handle = GraphBufferHandle(self.buffers.len() as u32);
        self.buffers.push(ImportedBuffer {
            view,
            initial_usage: usage,
        });
        handle
    }

    // ── Passes ─────────────────────────────────────────────────────────────

    pub fn new_compute_pass(&mut self, name: impl Into<String>) -> &mut PassBuilder {
        self.new_pass(name.into(), PassKind::Compute)
    }

    pub fn new_graphics_pass(&mut self, name: impl Into<String>) -> &mut PassBuilder {
        self.new_pass(name.into(), PassKind::Graphics)
    }

    fn new_pass(&mut self, name: String, kind: PassKind) -> &mut PassBuilder {
        let handle = PassHandle(self.passes.len() as u32);
        self.passes.push(PassBuilder::new(handle, name, kind));
        let index = self.passes.len() - 1;
        &mut self.passes[index]
    }

    /// Re-opens a declared pass, e.g. to attach work after the fact.
    pub fn pass_mut(&mut self, handle: PassHandle) -> Option<&mut PassBuilder> {
        self.passes.get_mut(handle.index())
    }

    /// Orders `before` ahead of `after` regardless of their resources.
    ///
    /// For passes that communicate through something the graph does not
    /// track.
    pub fn add_pass_dependency(&mut self, before: PassHandle, after: PassHandle) -> Result<()> {
        for handle in [before, after] {
            if handle.index() >= self.passes.len() {
                return Err(OrreryError::InvalidPassHandle(handle.0));
            }
        }
        self.explicit_edges.push((before, after));
        Ok(())
    }

    #[must_use]
    pub fn pass(&self, handle: PassHandle) -> Option<&PassBuilder> {
        self.passes.get(handle.index())
    }

    // ── Introspection ──────────────────────────────────────────────────────

    #[inline]
    #[must_use]
    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    /// Pass names in declaration order.
    pub fn pass_names(&self) -> impl Iterator<Item = &str> {
        self.passes.iter().map(PassBuilder::name)
    }

    pub fn passes(&self) -> impl Iterator<Item = &PassBuilder> {
        self.passes.iter()
    }

    /// First declared pass with the given name.
    #[must_use]
    pub fn find_pass(&self, name: &str) -> Option<&PassBuilder> {
        self.passes.iter().find(|p| p.name() == name)
    }

    #[inline]
    #[must_use]
    pub fn render_target_count(&self) -> usize {
        self.textures.len()
    }

    /// Usage an imported target is in when the frame starts.
    #[must_use]
    pub fn imported_usage(&self, handle: RenderTargetHandle) -> Option<TextureUsage> {
        self.textures
            .get(handle.0 as usize)
            .map(|t| t.initial_usage)
    }

    #[must_use]
    pub fn render_target(&self, handle: RenderTargetHandle) -> Option<&Arc<RenderTarget>> {
        self.textures.get(handle.0 as usize).map(|t| &t.target)
    }

    /// Orders the passes and plans barriers.
    ///
    /// # Errors
    ///
    /// - [`OrreryError::InvalidResourceHandle`] if a pass depends on a handle
    ///   this builder did not produce
    /// - [`OrreryError::CyclicPassDependency`] if the dependencies cannot be
    ///   satisfied by any order
    ///
    /// [`OrreryError::InvalidResourceHandle`]: crate::errors::OrreryError::InvalidResourceHandle
    /// [`OrreryError::CyclicPassDependency`]: crate::errors::OrreryError::CyclicPassDependency
    pub fn compile(self) -> Result<CompiledRenderGraph> {
        CompiledRenderGraph::compile(self)
    }
}
