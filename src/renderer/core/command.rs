//! Command Recording Interface
//!
//! [`CommandRecorder`] is the seam between the renderer core and a concrete
//! GPU backend. It exposes the register-based binding model and the indirect
//! draw variants the drawer needs. Implementations are expected to forward
//! each call into a real command buffer; tests substitute a recorder that
//! logs the call stream instead.

use crate::renderer::core::gpu::{
    BufferView, PipelineQueryHandle, Register, SamplerHandle, ShaderProgramHandle, TexelFormat,
    TextureView,
};
use crate::renderer::graph::resource::{BufferBarrier, TextureBarrier};

/// Semantic slot of a vertex attribute.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum VertexAttributeSemantic {
    Position,
    Normal,
    TexCoord,
    /// Generic per-instance payload (packed instance indices).
    Misc0,
}

/// A command buffer in the recording state.
///
/// All calls are fire-and-forget: GPU-side failures are not observable from
/// the recording thread.
pub trait CommandRecorder {
    // ── Pipeline state ─────────────────────────────────────────────────────

    fn bind_shader_program(&mut self, program: ShaderProgramHandle);

    fn bind_texture(&mut self, reg: Register, view: TextureView);

    fn bind_sampler(&mut self, reg: Register, sampler: SamplerHandle);

    fn bind_uniform_buffer(&mut self, reg: Register, view: BufferView);

    fn bind_storage_buffer(&mut self, reg: Register, view: BufferView);

    fn bind_texel_buffer(&mut self, reg: Register, view: BufferView, format: TexelFormat);

    fn bind_index_buffer(&mut self, view: BufferView, format: wgpu::IndexFormat);

    fn bind_vertex_buffer(
        &mut self,
        binding: u32,
        view: BufferView,
        stride: u64,
        step_mode: wgpu::VertexStepMode,
    );

    fn set_vertex_attribute(
        &mut self,
        semantic: VertexAttributeSemantic,
        binding: u32,
        format: wgpu::VertexFormat,
        relative_offset: u64,
    );

    /// Uploads push constants for the currently bound program.
    fn set_push_constants(&mut self, data: &[u8]);

    // ── Work ───────────────────────────────────────────────────────────────

    fn dispatch_compute(&mut self, group_count_x: u32, group_count_y: u32, group_count_z: u32);

    /// Task/mesh shader dispatch with a single `DispatchIndirectArgs` record.
    fn draw_mesh_tasks_indirect(&mut self, args: BufferView);

    /// Non-indexed indirect draw with a single `DrawIndirectArgs` record.
    fn draw_indirect(&mut self, topology: wgpu::PrimitiveTopology, args: BufferView);

    /// Multi-draw indexed indirect. The number of draws is read from `count`
    /// on the GPU and clamped to `max_draw_count`.
    fn draw_indexed_indirect_count(
        &mut self,
        topology: wgpu::PrimitiveTopology,
        args: BufferView,
        args_stride: u32,
        count: BufferView,
        max_draw_count: u32,
    );

    /// Multi-draw non-indexed indirect with a GPU-side draw count.
    fn draw_indirect_count(
        &mut self,
        topology: wgpu::PrimitiveTopology,
        args: BufferView,
        args_stride: u32,
        count: BufferView,
        max_draw_count: u32,
    );

    // ── Synchronization & instrumentation ─────────────────────────────────

    fn set_pipeline_barrier(&mut self, textures: &[TextureBarrier], buffers: &[BufferBarrier]);

    fn begin_pipeline_query(&mut self, query: PipelineQueryHandle);

    fn end_pipeline_query(&mut self, query: PipelineQueryHandle);

    fn push_debug_marker(&mut self, name: &str);

    fn pop_debug_marker(&mut self);
}

/// Dispatches one thread group per `tile_width × tile_height` tile of a
/// `width × height` output (post-process style).
pub fn dispatch_pp_compute(
    cmdb: &mut dyn CommandRecorder,
    tile_width: u32,
    tile_height: u32,
    width: u32,
    height: u32,
) {
    cmdb.dispatch_compute(width.div_ceil(tile_width), height.div_ceil(tile_height), 1);
}
