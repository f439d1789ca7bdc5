//! Render Graph Compilation & Execution
//!
//! ```text
//!  RenderGraphBuilder ──compile()──► CompiledRenderGraph ──execute()──► recorder
//!        │                                 │
//!        │ imports + passes                │ order, barriers per pass
//!        ▼                                 ▼
//!  edges per resource  ──Kahn sort──►  usage walk in execution order
//! ```
//!
//! # Ordering rules (per resource)
//!
//! Accesses are classified as writes (any write bit in the merged usage) or
//! reads. Writers are chained in declaration order. A reader consumes the
//! output of the last writer declared before it, or the imported contents
//! when no writer precedes it. A writer runs after every reader of the
//! previous version.
//!
//! Explicit edges added with
//! [`RenderGraphBuilder::add_pass_dependency`] are honored as well; they are
//! the only way to order a pass before one declared earlier, and the only
//! way to create a cycle.
//!
//! Each compiled pass also carries a dependency *level* (longest path from a
//! root). Passes sharing a level have no ordering constraint between them
//! and may be recorded concurrently.
//!
//! # Barriers
//!
//! Starting from the imported usage, a barrier is recorded before a pass
//! whenever its usage differs from the current one, or when both are writes.
//! After execution the final usage of each imported render target is
//! written back so the next frame's import starts from the true state.

use smallvec::SmallVec;

use crate::errors::{OrreryError, Result};
use crate::renderer::core::command::CommandRecorder;
use crate::renderer::graph::builder::RenderGraphBuilder;
use crate::renderer::graph::context::{GraphResources, PassWorkContext};
use crate::renderer::graph::pass::{PassKind, PassWork};
use crate::renderer::graph::resource::{
    BufferBarrier, BufferUsage, PassHandle, TextureBarrier, TextureUsage,
};
use crate::renderer::graph::topological_sort::topological_sort;

/// One pass, ready to record.
pub struct CompiledPass {
    handle: PassHandle,
    name: String,
    kind: PassKind,
    level: u32,
    texture_barriers: SmallVec<[TextureBarrier; 4]>,
    buffer_barriers: SmallVec<[BufferBarrier; 4]>,
    work: Option<PassWork>,
}

impl CompiledPass {
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

    /// Longest dependency chain leading to this pass.
    #[inline]
    #[must_use]
    pub fn level(&self) -> u32 {
        self.level
    }

    #[inline]
    #[must_use]
    pub fn texture_barriers(&self) -> &[TextureBarrier] {
        &self.texture_barriers
    }

    #[inline]
    #[must_use]
    pub fn buffer_barriers(&self) -> &[BufferBarrier] {
        &self.buffer_barriers
    }
}

pub struct CompiledRenderGraph {
    resources: GraphResources,
    passes: Vec<CompiledPass>,
    final_texture_usages: Vec<TextureUsage>,
}

/// Per-resource access list in declaration order: `(pass, is_write)`.
type AccessList = SmallVec<[(usize, bool); 8]>;

impl CompiledRenderGraph {
    pub(crate) fn compile(builder: RenderGraphBuilder) -> Result<Self> {
        let RenderGraphBuilder {
            textures,
            buffers,
            passes,
            explicit_edges,
        } = builder;

        // Validate handles and collect accesses per resource.
        let mut texture_accesses: Vec<AccessList> = vec![AccessList::new(); textures.len()];
        let mut buffer_accesses: Vec<AccessList> = vec![AccessList::new(); buffers.len()];

        for (index, pass) in passes.iter().enumerate() {
            for dep in &pass.texture_deps {
                let accesses = texture_accesses
                    .get_mut(dep.handle.0 as usize)
                    .ok_or(OrreryError::InvalidResourceHandle(dep.handle.0))?;
                accesses.push((index, dep.usage.is_write()));
            }
            for dep in &pass.buffer_deps {
                let accesses = buffer_accesses
                    .get_mut(dep.handle.0 as usize)
                    .ok_or(OrreryError::InvalidResourceHandle(dep.handle.0))?;
                accesses.push((index, dep.usage.is_write()));
            }
        }

        let mut edges = Vec::new();
        for accesses in texture_accesses.iter().chain(buffer_accesses.iter()) {
            resource_edges(accesses, &mut edges);
        }
        edges.extend(
            explicit_edges
                .iter()
                .map(|(before, after)| (before.index(), after.index())),
        );

        let order = topological_sort(passes.len(), edges.iter().copied()).map_err(|cycle| {
            let pass = passes[cycle.node].name().to_owned();
            log::warn!("Render graph cycle through pass '{pass}', nothing will be recorded");
            OrreryError::CyclicPassDependency { pass }
        })?;

        let levels = dependency_levels(passes.len(), &order, &edges);

        // Walk usages in execution order.
        let mut texture_state: Vec<TextureUsage> =
            textures.iter().map(|t| t.initial_usage).collect();
        let mut buffer_state: Vec<BufferUsage> = buffers.iter().map(|b| b.initial_usage).collect();

        let mut slots: Vec<Option<_>> = passes.into_iter().map(Some).collect();
        let mut compiled = Vec::with_capacity(order.len());

        for index in order {
            let Some(pass) = slots[index].take() else {
                continue;
            };

            let mut texture_barriers = SmallVec::new();
            for dep in &pass.texture_deps {
                let slot = dep.handle.0 as usize;
                let current = texture_state[slot];
                if needs_transition(current, dep.usage, TextureUsage::is_write) {
                    texture_barriers.push(TextureBarrier {
                        texture: textures[slot].target.texture(),
                        before: current,
                        after: dep.usage,
                    });
                }
                texture_state[slot] = dep.usage;
            }

            let mut buffer_barriers = SmallVec::new();
            for dep in &pass.buffer_deps {
                let slot = dep.handle.0 as usize;
                let current = buffer_state[slot];
                if needs_transition(current, dep.usage, BufferUsage::is_write) {
                    buffer_barriers.push(BufferBarrier {
                        buffer: buffers[slot].view.buffer,
                        before: current,
                        after: dep.usage,
                    });
                }
                buffer_state[slot] = dep.usage;
            }

            let handle = pass.handle();
            let name = pass.name().to_owned();
            let kind = pass.kind();
            compiled.push(CompiledPass {
                handle,
                name,
                kind,
                level: levels[index],
                texture_barriers,
                buffer_barriers,
                work: pass.work,
            });
        }

        log::debug!(
            "Render graph compiled: {} passes, {} render targets, {} buffers",
            compiled.len(),
            textures.len(),
            buffers.len()
        );

        Ok(Self {
            resources: GraphResources { textures, buffers },
            passes: compiled,
            final_texture_usages: texture_state,
        })
    }

    /// Passes in execution order.
    #[must_use]
    pub fn passes(&self) -> &[CompiledPass] {
        &self.passes
    }

    /// Pass names in execution order.
    pub fn execution_order(&self) -> impl Iterator<Item = &str> {
        self.passes.iter().map(CompiledPass::name)
    }

    #[must_use]
    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    /// Records every pass into `cmdb` and updates the tracked usage of all
    /// imported render targets.
    pub fn execute(self, cmdb: &mut dyn CommandRecorder) {
        let Self {
            resources,
            passes,
            final_texture_usages,
        } = self;

        for pass in passes {
            if !pass.texture_barriers.is_empty() || !pass.buffer_barriers.is_empty() {
                cmdb.set_pipeline_barrier(&pass.texture_barriers, &pass.buffer_barriers);
            }

            let Some(work) = pass.work else {
                continue;
            };

            log::trace!("Recording pass '{}'", pass.name);
            cmdb.push_debug_marker(&pass.name);
            {
                let mut ctx = PassWorkContext::new(&mut *cmdb, &resources, &pass.name);
                work(&mut ctx);
            }
            cmdb.pop_debug_marker();
        }

        for (imported, usage) in resources.textures.iter().zip(final_texture_usages) {
            imported.target.set_last_usage(usage);
        }
    }
}

fn needs_transition<U: PartialEq + Copy>(current: U, next: U, is_write: fn(U) -> bool) -> bool {
    current != next || (is_write(current) && is_write(next))
}

fn dependency_levels(node_count: usize, order: &[usize], edges: &[(usize, usize)]) -> Vec<u32> {
    let mut children: Vec<SmallVec<[usize; 4]>> = vec![SmallVec::new(); node_count];
    for &(parent, child) in edges {
        children[parent].push(child);
    }

    let mut levels = vec![0u32; node_count];
    for &node in order {
        let next = levels[node] + 1;
        for &child in &children[node] {
            levels[child] = levels[child].max(next);
        }
    }
    levels
}

/// Appends the ordering edges one resource imposes.
fn resource_edges(accesses: &[(usize, bool)], edges: &mut Vec<(usize, usize)>) {
    let mut last_writer: Option<usize> = None;
    let mut readers: SmallVec<[usize; 8]> = SmallVec::new();

    for &(pass, write) in accesses {
        if write {
            if let Some(writer) = last_writer {
                edges.push((writer, pass));
            }
            edges.extend(readers.drain(..).map(|reader| (reader, pass)));
            last_writer = Some(pass);
        } else {
            if let Some(writer) = last_writer {
                edges.push((writer, pass));
            }
            readers.push(pass);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readers_follow_their_producer() {
        let mut edges = Vec::new();
        // pass 0 reads the imported contents, pass 1 writes, pass 2 reads
        resource_edges(&[(0, false), (1, true), (2, false)], &mut edges);
        assert_eq!(edges, vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn second_writer_waits_for_readers_of_first() {
        let mut edges = Vec::new();
        resource_edges(&[(0, true), (1, false), (2, true)], &mut edges);
        assert!(edges.contains(&(0, 1)));
        assert!(edges.contains(&(0, 2)));
        assert!(edges.contains(&(1, 2)));
        assert_eq!(edges.len(), 3);
    }

    #[test]
    fn read_only_resource_adds_no_edges() {
        let mut edges = Vec::new();
        resource_edges(&[(0, false), (1, false)], &mut edges);
        assert!(edges.is_empty());
    }

    #[test]
    fn levels_follow_longest_chain() {
        // 0 -> 1 -> 3, 0 -> 2 -> 3, 2 -> 4
        let edges = [(0, 1), (1, 3), (0, 2), (2, 3), (2, 4)];
        let order = topological_sort(5, edges).unwrap();
        assert_eq!(dependency_levels(5, &order, &edges), vec![0, 1, 1, 2, 2]);
    }

    #[test]
    fn transition_rules() {
        let is_write = TextureUsage::is_write;
        assert!(!needs_transition(
            TextureUsage::SAMPLED_FRAGMENT,
            TextureUsage::SAMPLED_FRAGMENT,
            is_write
        ));
        assert!(needs_transition(
            TextureUsage::SAMPLED_COMPUTE,
            TextureUsage::STORAGE_COMPUTE_WRITE,
            is_write
        ));
        assert!(needs_transition(
            TextureUsage::STORAGE_COMPUTE_WRITE,
            TextureUsage::STORAGE_COMPUTE_WRITE,
            is_write
        ));
    }
}
