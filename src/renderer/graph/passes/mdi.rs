//! MDI Pass
//!
//! Wraps one [`RenderableDrawer::draw_mdi`] call into a graphics pass.
//!
//! The pass declares every GPU buffer the batch reads, so that culling
//! passes writing indirect arguments and instance lists are ordered first and
//! the right transitions are inserted:
//!
//! | Buffer                         | Usage                   |
//! |--------------------------------|-------------------------|
//! | renderable / meshlet instances | `VERTEX`                |
//! | indirect args, draw counts     | `INDIRECT_DRAW`         |
//! | meshlet group instances        | `STORAGE_GEOMETRY_READ` |
//! | HZB (optional render target)   | `SAMPLED_GEOMETRY`      |
//!
//! Imported buffers start in [`MdiPassRequest::entry_buffer_usage`]. The
//! default is `STORAGE_COMPUTE_WRITE`, the state a GPU culling pass leaves
//! them in. A batch drawn again without culling passes `None`, so each buffer
//! is taken to be in the usage this pass declares and no transition is
//! recorded.

use std::sync::Arc;

use crate::renderer::core::gpu::BufferView;
use crate::renderer::drawer::{DrawerArguments, RenderableDrawer};
use crate::renderer::graph::context::RenderingContext;
use crate::renderer::graph::import::RenderTarget;
use crate::renderer::graph::resource::{BufferUsage, PassHandle, TextureUsage};
use crate::scene::RenderStateBucketContainer;

const CULLED_BUFFER_USAGE: BufferUsage = BufferUsage::STORAGE_COMPUTE_WRITE;

/// One batch to be drawn inside the render graph.
#[derive(Debug, Clone)]
pub struct MdiPassRequest {
    pub name: String,
    /// `hzb_texture` is filled in from `hzb` at record time.
    pub args: DrawerArguments,
    /// Persistent HZB the batch tests against.
    pub hzb: Option<Arc<RenderTarget>>,
    /// Usage the batch buffers are in when the frame starts. `None` means
    /// they already sit in the usage this pass reads them with.
    pub entry_buffer_usage: Option<BufferUsage>,
}

impl MdiPassRequest {
    #[must_use]
    pub fn new(name: impl Into<String>, args: DrawerArguments) -> Self {
        Self {
            name: name.into(),
            args,
            hzb: None,
            entry_buffer_usage: Some(CULLED_BUFFER_USAGE),
        }
    }

    #[must_use]
    pub fn with_hzb(mut self, hzb: Arc<RenderTarget>) -> Self {
        self.hzb = Some(hzb);
        self
    }

    #[must_use]
    pub fn with_entry_buffer_usage(mut self, usage: Option<BufferUsage>) -> Self {
        self.entry_buffer_usage = usage;
        self
    }
}

/// Declares a graphics pass that draws `request` with `drawer`.
///
/// `buckets` is captured as a snapshot; later scene changes do not affect
/// this frame.
pub fn populate_mdi_pass(
    ctx: &mut RenderingContext,
    drawer: &Arc<RenderableDrawer>,
    buckets: &Arc<RenderStateBucketContainer>,
    request: MdiPassRequest,
) -> PassHandle {
    let MdiPassRequest {
        name,
        mut args,
        hzb,
        entry_buffer_usage,
    } = request;
    let rgraph = &mut ctx.graph;

    let buffer_deps = batch_buffer_dependencies(&args);
    let imported: Vec<_> = buffer_deps
        .into_iter()
        .map(|(view, usage)| {
            let entry = entry_buffer_usage.unwrap_or(usage);
            (rgraph.import_buffer(view, entry), usage)
        })
        .collect();
    let hzb_rt = hzb.map(|target| rgraph.import_render_target(&target, None));

    let drawer = Arc::clone(drawer);
    let buckets = Arc::clone(buckets);

    let pass = rgraph.new_graphics_pass(name);
    for (handle, usage) in imported {
        pass.new_buffer_dependency(handle, usage);
    }
    if let Some(hzb_rt) = hzb_rt {
        pass.new_texture_dependency(hzb_rt, TextureUsage::SAMPLED_GEOMETRY);
    }

    pass.set_work(move |rgraph_ctx| {
        if let Some(hzb_rt) = hzb_rt {
            args.hzb_texture = Some(rgraph_ctx.texture_view(hzb_rt));
        }
        let pass_name = rgraph_ctx.pass_name().to_owned();
        if let Err(e) = drawer.draw_mdi(&args, &buckets, rgraph_ctx.command_buffer()) {
            log::error!("MDI pass '{pass_name}' failed: {e}");
        }
    });

    pass.handle()
}

/// Buffers of every geometry source present in `args`, with their usage.
fn batch_buffer_dependencies(args: &DrawerArguments) -> Vec<(BufferView, BufferUsage)> {
    let mut deps = Vec::new();

    if let Some(legacy) = &args.legacy {
        deps.push((legacy.renderable_instances_buffer, BufferUsage::VERTEX));
        deps.push((legacy.draw_indexed_indirect_args_buffer, BufferUsage::INDIRECT_DRAW));
        deps.push((legacy.mdi_draw_counts_buffer, BufferUsage::INDIRECT_DRAW));
    }
    if let Some(software_mesh) = &args.software_mesh {
        deps.push((software_mesh.meshlet_instances_buffer, BufferUsage::VERTEX));
        deps.push((software_mesh.draw_indirect_args_buffer, BufferUsage::INDIRECT_DRAW));
    }
    if let Some(mesh) = &args.mesh {
        deps.push((mesh.task_shader_indirect_args_buffer, BufferUsage::INDIRECT_DRAW));
        if let Some(groups) = mesh.meshlet_group_instances_buffer {
            deps.push((groups, BufferUsage::STORAGE_GEOMETRY_READ));
        }
    }

    deps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::core::gpu::{BufferHandle, SamplerHandle};
    use crate::renderer::drawer::{InstanceRange, LegacyGeometry, MeshShaderGeometry};
    use crate::scene::RenderingTechnique;
    use glam::UVec4;

    fn view(id: u64) -> BufferView {
        BufferView::new(BufferHandle(id), 0, 4096)
    }

    #[test]
    fn legacy_and_mesh_sources_declare_their_buffers() {
        let args = DrawerArguments::new(
            RenderingTechnique::GBuffer,
            UVec4::new(0, 0, 64, 64),
            SamplerHandle(0),
        )
        .with_legacy(LegacyGeometry {
            renderable_instances_buffer: view(1),
            draw_indexed_indirect_args_buffer: view(2),
            mdi_draw_counts_buffer: view(3),
            bucket_renderable_instance_ranges: vec![InstanceRange::new(0, 1)],
        })
        .with_mesh(MeshShaderGeometry {
            meshlet_group_instances_buffer: None,
            task_shader_indirect_args_buffer: view(4),
            bucket_meshlet_group_instance_ranges: vec![],
        });

        let deps = batch_buffer_dependencies(&args);
        assert_eq!(
            deps,
            vec![
                (view(1), BufferUsage::VERTEX),
                (view(2), BufferUsage::INDIRECT_DRAW),
                (view(3), BufferUsage::INDIRECT_DRAW),
                (view(4), BufferUsage::INDIRECT_DRAW),
            ]
        );
    }
}
