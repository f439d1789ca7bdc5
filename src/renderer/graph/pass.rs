//! Pass Declaration
//!
//! A [`PassBuilder`] is what subsystems receive from
//! [`RenderGraphBuilder::new_compute_pass`](super::RenderGraphBuilder::new_compute_pass)
//! and its graphics counterpart. It collects:
//!
//! - the resources the pass touches and *how* (usage masks)
//! - a deferred work closure, run later when the compiled graph executes
//!
//! Declaration is pure bookkeeping. Nothing is recorded on the GPU until
//! [`CompiledRenderGraph::execute`](super::CompiledRenderGraph::execute).

use std::fmt;

use smallvec::SmallVec;

use crate::renderer::graph::context::PassWorkContext;
use crate::renderer::graph::resource::{
    BufferUsage, GraphBufferHandle, PassHandle, RenderTargetHandle, TextureUsage,
};

/// Deferred pass body.
///
/// Owns everything it needs: graph handles (plain `Copy` values) and `Arc`s
/// to long-lived subsystems. It may be sent to a recording thread.
pub type PassWork = Box<dyn FnOnce(&mut PassWorkContext<'_>) + Send + 'static>;

/// Queue class of a pass.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum PassKind {
    Compute,
    Graphics,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) struct TextureDependency {
    pub handle: RenderTargetHandle,
    pub usage: TextureUsage,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) struct BufferDependency {
    pub handle: GraphBufferHandle,
    pub usage: BufferUsage,
}

pub struct PassBuilder {
    handle: PassHandle,
    name: String,
    kind: PassKind,
    pub(crate) texture_deps: SmallVec<[TextureDependency; 4]>,
    pub(crate) buffer_deps: SmallVec<[BufferDependency; 4]>,
    pub(crate) work: Option<PassWork>,
}

impl PassBuilder {
    pub(crate) fn new(handle: PassHandle, name: String, kind: PassKind) -> Self {
        Self {
            handle,
            name,
            kind,
            texture_deps: SmallVec::new(),
            buffer_deps: SmallVec::new(),
            work: None,
        }
    }

    /// Declares that the pass accesses `target` with `usage`.
    ///
    /// Declaring the same target twice merges the usages.
    pub fn new_texture_dependency(
        &mut self,
        target: RenderTargetHandle,
        usage: TextureUsage,
    ) -> &mut Self {
        if let Some(dep) = self.texture_deps.iter_mut().find(|d| d.handle == target) {
            dep.usage |= usage;
        } else {
            self.texture_deps.push(TextureDependency {
                handle: target,
                usage,
            });
        }
        self
    }

    /// Declares that the pass accesses `buffer` with `usage`.
    pub fn new_buffer_dependency(
        &mut self,
        buffer: GraphBufferHandle,
        usage: BufferUsage,
    ) -> &mut Self {
        if let Some(dep) = self.buffer_deps.iter_mut().find(|d| d.handle == buffer) {
            dep.usage |= usage;
        } else {
            self.buffer_deps.push(BufferDependency {
                handle: buffer,
                usage,
            });
        }
        self
    }

    /// Sets the deferred work. A second call replaces the first.
    pub fn set_work<F>(&mut self, work: F) -> &mut Self
    where
        F: FnOnce(&mut PassWorkContext<'_>) + Send + 'static,
    {
        if self.work.is_some() {
            log::warn!("Pass '{}' work callback replaced", self.name);
        }
        self.work = Some(Box::new(work));
        self
    }

    #[inline]
    #[must_use]
    pub fn handle(&self) -> PassHandle {
        self.handle
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> PassKind {
        self.kind
    }

    #[inline]
    #[must_use]
    pub fn has_work(&self) -> bool {
        self.work.is_some()
    }

    /// Usage declared for `target`, if any.
    #[must_use]
    pub fn texture_usage(&self, target: RenderTargetHandle) -> Option<TextureUsage> {
        self.texture_deps
            .iter()
            .find(|d| d.handle == target)
            .map(|d| d.usage)
    }

    /// Usage declared for `buffer`, if any.
    #[must_use]
    pub fn buffer_usage(&self, buffer: GraphBufferHandle) -> Option<BufferUsage> {
        self.buffer_deps
            .iter()
            .find(|d| d.handle == buffer)
            .map(|d| d.usage)
    }

    /// Whether any declared dependency writes.
    #[must_use]
    pub fn writes_anything(&self) -> bool {
        self.texture_deps.iter().any(|d| d.usage.is_write())
            || self.buffer_deps.iter().any(|d| d.usage.is_write())
    }
}

impl fmt::Debug for PassBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PassBuilder")
            .field("handle", &self.handle)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("texture_deps", &self.texture_deps)
            .field("buffer_deps", &self.buffer_deps)
            .field("has_work", &self.work.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_dependency_merges_usage() {
        let mut pass = PassBuilder::new(PassHandle(0), "Test".into(), PassKind::Compute);
        let rt = RenderTargetHandle(0);
        pass.new_texture_dependency(rt, TextureUsage::SAMPLED_COMPUTE)
            .new_texture_dependency(rt, TextureUsage::STORAGE_COMPUTE_WRITE);

        assert_eq!(pass.texture_deps.len(), 1);
        assert_eq!(
            pass.texture_usage(rt),
            Some(TextureUsage::SAMPLED_COMPUTE | TextureUsage::STORAGE_COMPUTE_WRITE)
        );
        assert!(pass.writes_anything());
    }

    #[test]
    fn pass_without_work_is_valid() {
        let pass = PassBuilder::new(PassHandle(3), "Anchor".into(), PassKind::Graphics);
        assert!(!pass.has_work());
        assert_eq!(pass.handle().index(), 3);
        assert!(!pass.writes_anything());
    }
}
