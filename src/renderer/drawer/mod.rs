//! Renderable Drawer
//!
//! Records one rendering technique's batch of renderables with multi-draw
//! indirect:
//!
//! ```text
//! draw_mdi(args, buckets, cmdb)
//!   ├─ bucket count == 0 → return
//!   ├─ begin "Drawer" pipeline query      (statistics + device support)
//!   ├─ set_state                          (global uniforms, GPU scene, samplers, index buffer)
//!   ├─ Misc0 = Uint32x4 @ binding 0
//!   ├─ for bucket in performance order:
//!   │     user_count == 0 → skip
//!   │     bind program
//!   │     HardwareMeshShader │ SoftwareMeshlet │ LegacyIndexed │ LegacyNonIndexed
//!   └─ end pipeline query                 (whenever begun)
//! ```
//!
//! The bucket slot selects every per-bucket GPU record: indirect argument
//! records of the meshlet paths, the GPU draw count of the legacy paths and
//! the instance range of all of them.

pub mod args;
pub mod strategy;
pub mod uniforms;

use std::sync::Arc;

use parking_lot::Mutex;

use crate::errors::Result;
use crate::renderer::core::command::{CommandRecorder, VertexAttributeSemantic};
use crate::renderer::core::device::{GpuDevice, Samplers};
use crate::renderer::core::gpu::{
    BufferView, DeviceCapabilities, PipelineQueryHandle, PipelineQueryType, TexelFormat,
    TextureView, aligned_round_down,
};
use crate::renderer::core::transient::TransientUniformPool;
use crate::scene::{RenderStateBucket, RenderStateBucketContainer};

pub use args::{
    DrawerArguments, InstanceRange, LegacyGeometry, MeshShaderGeometry, SoftwareMeshletGeometry,
    instance_ranges_disjoint,
};
pub use strategy::DrawStrategy;
pub use uniforms::{
    GpuSceneMeshletInstance, GpuSceneRenderableInstance, Mat3x4, MaterialGlobalUniforms,
};

use uniforms::{
    DISPATCH_INDIRECT_ARGS_SIZE, DRAW_INDEXED_INDIRECT_ARGS_SIZE, DRAW_INDIRECT_ARGS_SIZE,
    MDI_DRAW_COUNT_SIZE, MESHLET_INSTANCE_STRIDE, RENDERABLE_INSTANCE_STRIDE,
};

/// Binding slots of the material shader interface.
pub mod material_registers {
    use crate::renderer::core::gpu::{Register, TexelFormat};

    pub const GLOBAL_UNIFORMS: Register = Register::b(0);
    pub const TRILINEAR_REPEAT_SAMPLER: Register = Register::s(0);
    pub const NEAREST_CLAMP_SAMPLER: Register = Register::s(1);
    pub const GPU_SCENE: Register = Register::t(0);

    /// Typed views of the unified geometry buffer.
    pub const UNIFIED_GEOMETRY: [(TexelFormat, Register); 7] = [
        (TexelFormat::R32Sfloat, Register::t(1)),
        (TexelFormat::R32G32Sfloat, Register::t(2)),
        (TexelFormat::R32G32B32Sfloat, Register::t(3)),
        (TexelFormat::R32G32B32A32Sfloat, Register::t(4)),
        (TexelFormat::R16G16B16A16Unorm, Register::t(5)),
        (TexelFormat::R8G8B8A8Unorm, Register::t(6)),
        (TexelFormat::R8G8B8A8Uint, Register::t(7)),
    ];

    pub const MESHLET_BOUNDING_VOLUMES: Register = Register::t(8);
    pub const MESHLET_GEOMETRY_DESCRIPTORS: Register = Register::t(9);
    pub const MESHLET_GROUPS: Register = Register::t(10);
    pub const RENDERABLES: Register = Register::t(11);
    pub const MESH_LODS: Register = Register::t(12);
    pub const TRANSFORMS: Register = Register::t(13);
    pub const HZB_TEXTURE: Register = Register::t(14);
}

/// GPU-scene resident buffers bound by [`RenderableDrawer::set_state`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GpuSceneBuffers {
    pub gpu_scene: BufferView,
    /// Vertex, index and meshlet data of every mesh, 16-bit indices.
    pub unified_geometry: BufferView,
    pub renderables: BufferView,
    pub mesh_lods: BufferView,
    pub transforms: BufferView,
}

pub struct RenderableDrawer {
    device: Arc<dyn GpuDevice>,
    capabilities: DeviceCapabilities,
    scene_buffers: GpuSceneBuffers,
    samplers: Samplers,
    dummy_texture: TextureView,
    transient: Arc<TransientUniformPool>,
    statistics: bool,
    pipeline_queries: Mutex<Vec<PipelineQueryHandle>>,
}

impl RenderableDrawer {
    #[must_use]
    pub fn new(
        device: Arc<dyn GpuDevice>,
        scene_buffers: GpuSceneBuffers,
        samplers: Samplers,
        dummy_texture: TextureView,
        transient: Arc<TransientUniformPool>,
        statistics: bool,
    ) -> Self {
        let capabilities = device.capabilities();
        Self {
            device,
            capabilities,
            scene_buffers,
            samplers,
            dummy_texture,
            transient,
            statistics,
            pipeline_queries: Mutex::new(Vec::new()),
        }
    }

    #[inline]
    #[must_use]
    pub fn capabilities(&self) -> DeviceCapabilities {
        self.capabilities
    }

    #[inline]
    #[must_use]
    pub fn scene_buffers(&self) -> &GpuSceneBuffers {
        &self.scene_buffers
    }

    /// Pipeline queries created since the last call, in creation order.
    pub fn drain_pipeline_queries(&self) -> Vec<PipelineQueryHandle> {
        std::mem::take(&mut *self.pipeline_queries.lock())
    }

    // ─── State Setter ────────────────────────────────────────────────────────

    /// Binds everything an indirect draw of this batch needs, except the
    /// program and the per-bucket instance stream.
    ///
    /// # Panics
    ///
    /// Panics if the viewport has a zero width or height.
    pub fn set_state(&self, args: &DrawerArguments, cmdb: &mut dyn CommandRecorder) -> Result<()> {
        assert!(
            args.has_valid_viewport(),
            "Drawer viewport must be non-zero, got {:?}",
            args.viewport
        );

        // Global uniforms
        {
            let globals = MaterialGlobalUniforms {
                view_projection_matrix: args.view_projection_matrix,
                previous_view_projection_matrix: args.previous_view_projection_matrix,
                view_transform: Mat3x4::from_mat4(args.view_matrix),
                camera_transform: Mat3x4::from_mat4(args.camera_transform),
                viewport: args.viewport.as_vec4(),
                enable_hzb_testing: u32::from(args.hzb_texture.is_some()),
                _padding: [0; 3],
            };
            let token = self.transient.allocate_frame(&globals)?;
            cmdb.bind_uniform_buffer(material_registers::GLOBAL_UNIFORMS, token);
        }

        // More globals
        cmdb.bind_sampler(material_registers::TRILINEAR_REPEAT_SAMPLER, args.sampler);
        cmdb.bind_storage_buffer(material_registers::GPU_SCENE, self.scene_buffers.gpu_scene);

        let geometry = self.scene_buffers.unified_geometry;
        for (format, reg) in material_registers::UNIFIED_GEOMETRY {
            cmdb.bind_texel_buffer(reg, unified_geometry_texel_view(geometry, format), format);
        }

        cmdb.bind_storage_buffer(material_registers::MESHLET_BOUNDING_VOLUMES, geometry);
        cmdb.bind_storage_buffer(material_registers::MESHLET_GEOMETRY_DESCRIPTORS, geometry);
        if let Some(groups) = args
            .mesh
            .as_ref()
            .and_then(|mesh| mesh.meshlet_group_instances_buffer)
        {
            cmdb.bind_storage_buffer(material_registers::MESHLET_GROUPS, groups);
        }
        cmdb.bind_storage_buffer(material_registers::RENDERABLES, self.scene_buffers.renderables);
        cmdb.bind_storage_buffer(material_registers::MESH_LODS, self.scene_buffers.mesh_lods);
        cmdb.bind_storage_buffer(material_registers::TRANSFORMS, self.scene_buffers.transforms);
        cmdb.bind_texture(
            material_registers::HZB_TEXTURE,
            args.hzb_texture.unwrap_or(self.dummy_texture),
        );
        cmdb.bind_sampler(
            material_registers::NEAREST_CLAMP_SAMPLER,
            self.samplers.nearest_nearest_clamp,
        );

        // Misc
        cmdb.bind_index_buffer(geometry, wgpu::IndexFormat::Uint16);

        Ok(())
    }

    // ─── Indirect Multi-Draw Dispatcher ──────────────────────────────────────

    /// Records one indirect draw per non-empty bucket of the technique.
    ///
    /// # Errors
    ///
    /// Fails only if the global uniforms cannot be allocated; nothing but the
    /// pipeline query (closed again) has been recorded in that case.
    pub fn draw_mdi(
        &self,
        args: &DrawerArguments,
        buckets: &RenderStateBucketContainer,
        cmdb: &mut dyn CommandRecorder,
    ) -> Result<()> {
        let technique = args.rendering_technique;
        if buckets.bucket_count(technique) == 0 {
            return Ok(());
        }

        let query = self.begin_pipeline_query(cmdb);
        let result = self.record_buckets(args, buckets, cmdb);
        if let Some(query) = query {
            cmdb.end_pipeline_query(query);
        }
        result
    }

    fn begin_pipeline_query(&self, cmdb: &mut dyn CommandRecorder) -> Option<PipelineQueryHandle> {
        if !self.statistics || !self.capabilities.pipeline_query {
            return None;
        }

        match self
            .device
            .new_pipeline_query("Drawer", PipelineQueryType::PrimitivesPassedClipping)
        {
            Ok(query) => {
                self.pipeline_queries.lock().push(query);
                cmdb.begin_pipeline_query(query);
                Some(query)
            }
            Err(e) => {
                log::warn!("Drawer statistics unavailable: {e}");
                None
            }
        }
    }

    fn record_buckets(
        &self,
        args: &DrawerArguments,
        buckets: &RenderStateBucketContainer,
        cmdb: &mut dyn CommandRecorder,
    ) -> Result<()> {
        debug_assert!(
            args.legacy
                .as_ref()
                .is_none_or(|g| instance_ranges_disjoint(&g.bucket_renderable_instance_ranges)),
            "Legacy instance ranges overlap"
        );
        debug_assert!(
            args.software_mesh
                .as_ref()
                .is_none_or(|g| instance_ranges_disjoint(&g.bucket_meshlet_instance_ranges)),
            "Meshlet instance ranges overlap"
        );
        debug_assert!(
            args.mesh
                .as_ref()
                .is_none_or(|g| instance_ranges_disjoint(&g.bucket_meshlet_group_instance_ranges)),
            "Meshlet group instance ranges overlap"
        );

        self.set_state(args, cmdb)?;

        cmdb.set_vertex_attribute(
            VertexAttributeSemantic::Misc0,
            0,
            wgpu::VertexFormat::Uint32x4,
            0,
        );

        for (bucket_index, bucket) in buckets.buckets_performance_order(args.rendering_technique) {
            if bucket.user_count == 0 {
                continue;
            }
            self.draw_bucket(args, bucket_index, bucket, cmdb);
        }

        Ok(())
    }

    fn draw_bucket(
        &self,
        args: &DrawerArguments,
        bucket_index: u32,
        bucket: &RenderStateBucket,
        cmdb: &mut dyn CommandRecorder,
    ) {
        let strategy = DrawStrategy::for_bucket(bucket, self.capabilities);
        let slot = u64::from(bucket_index);

        match strategy {
            DrawStrategy::HardwareMeshShader => {
                let Some(mesh) = args.mesh.as_ref() else {
                    log::warn!("Bucket {bucket_index} needs mesh shader geometry, none supplied");
                    return;
                };
                let Some(range) =
                    bucket_range(&mesh.bucket_meshlet_group_instance_ranges, bucket_index)
                else {
                    return;
                };
                cmdb.bind_shader_program(bucket.state.program);

                let first_payload = glam::UVec4::splat(range.first_instance());
                cmdb.set_push_constants(bytemuck::bytes_of(&first_payload));

                let indirect_args = mesh
                    .task_shader_indirect_args_buffer
                    .increment_offset(DISPATCH_INDIRECT_ARGS_SIZE * slot)
                    .set_range(DISPATCH_INDIRECT_ARGS_SIZE);
                cmdb.draw_mesh_tasks_indirect(indirect_args);
            }
            DrawStrategy::SoftwareMeshlet => {
                let Some(software_mesh) = args.software_mesh.as_ref() else {
                    log::warn!("Bucket {bucket_index} needs software meshlet geometry, none supplied");
                    return;
                };
                let Some(range) =
                    bucket_range(&software_mesh.bucket_meshlet_instance_ranges, bucket_index)
                else {
                    return;
                };
                cmdb.bind_shader_program(bucket.state.program);

                let vert_buffer_view = instance_slice(
                    software_mesh.meshlet_instances_buffer,
                    range,
                    MESHLET_INSTANCE_STRIDE,
                );
                cmdb.bind_vertex_buffer(
                    0,
                    vert_buffer_view,
                    MESHLET_INSTANCE_STRIDE,
                    wgpu::VertexStepMode::Instance,
                );

                let indirect_args = software_mesh
                    .draw_indirect_args_buffer
                    .increment_offset(DRAW_INDIRECT_ARGS_SIZE * slot)
                    .set_range(DRAW_INDIRECT_ARGS_SIZE);
                cmdb.draw_indirect(wgpu::PrimitiveTopology::TriangleList, indirect_args);
            }
            DrawStrategy::LegacyIndexed | DrawStrategy::LegacyNonIndexed => {
                let Some(legacy) = args.legacy.as_ref() else {
                    log::warn!("Bucket {bucket_index} needs legacy geometry, none supplied");
                    return;
                };
                let Some(range) =
                    bucket_range(&legacy.bucket_renderable_instance_ranges, bucket_index)
                else {
                    return;
                };
                cmdb.bind_shader_program(bucket.state.program);

                let max_draw_count = range.instance_count();

                let vert_buffer_view = instance_slice(
                    legacy.renderable_instances_buffer,
                    range,
                    RENDERABLE_INSTANCE_STRIDE,
                );
                cmdb.bind_vertex_buffer(
                    0,
                    vert_buffer_view,
                    RENDERABLE_INSTANCE_STRIDE,
                    wgpu::VertexStepMode::Instance,
                );

                // Both variants read DrawIndexedIndirectArgs records.
                let indirect_args = instance_slice(
                    legacy.draw_indexed_indirect_args_buffer,
                    range,
                    DRAW_INDEXED_INDIRECT_ARGS_SIZE,
                );
                let count = legacy
                    .mdi_draw_counts_buffer
                    .increment_offset(MDI_DRAW_COUNT_SIZE * slot)
                    .set_range(MDI_DRAW_COUNT_SIZE);
                let topology = bucket.state.primitive_topology;
                let stride = DRAW_INDEXED_INDIRECT_ARGS_SIZE as u32;

                if strategy == DrawStrategy::LegacyIndexed {
                    cmdb.draw_indexed_indirect_count(
                        topology,
                        indirect_args,
                        stride,
                        count,
                        max_draw_count,
                    );
                } else {
                    cmdb.draw_indirect_count(topology, indirect_args, stride, count, max_draw_count);
                }
            }
        }
    }
}

/// Range of the bucket at `bucket_index`, or `None` if the arguments were
/// built before the bucket existed.
fn bucket_range(ranges: &[InstanceRange], bucket_index: u32) -> Option<InstanceRange> {
    let range = ranges.get(bucket_index as usize).copied();
    if range.is_none() {
        log::warn!(
            "Bucket {bucket_index} has no instance range ({} supplied), skipped",
            ranges.len()
        );
    }
    range
}

/// The records of `range` within an array of `stride`-sized elements.
fn instance_slice(buffer: BufferView, range: InstanceRange, stride: u64) -> BufferView {
    buffer
        .increment_offset(u64::from(range.first_instance()) * stride)
        .set_range(u64::from(range.instance_count()) * stride)
}

/// Whole unified geometry buffer, truncated to a multiple of the texel size.
fn unified_geometry_texel_view(geometry: BufferView, format: TexelFormat) -> BufferView {
    let range = aligned_round_down(format.texel_size(), geometry.range);
    geometry.set_range(range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::core::gpu::BufferHandle;

    #[test]
    fn instance_slice_scales_by_stride() {
        let buffer = BufferView::new(BufferHandle(5), 64, 20 * 100);
        let view = instance_slice(buffer, InstanceRange::new(3, 4), 20);
        assert_eq!(view.offset, 64 + 60);
        assert_eq!(view.range, 80);
    }

    #[test]
    fn texel_views_round_down_to_texel_size() {
        let geometry = BufferView::new(BufferHandle(1), 0, 1000);
        assert_eq!(
            unified_geometry_texel_view(geometry, TexelFormat::R32G32B32Sfloat).range,
            996
        );
        assert_eq!(
            unified_geometry_texel_view(geometry, TexelFormat::R32G32B32A32Sfloat).range,
            992
        );
        assert_eq!(unified_geometry_texel_view(geometry, TexelFormat::R32Sfloat).range, 1000);
    }
}
