//! Shared test doubles: a GPU device handing out sequential handles and a
//! command recorder that logs every call.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::{Mat4, UVec4};
use parking_lot::Mutex;

use orrery::errors::{OrreryError, Result};
use orrery::renderer::core::device::{BufferDesc, GpuDevice, SamplerDesc, TextureDesc};
use orrery::renderer::core::gpu::{
    BufferHandle, BufferView, DeviceCapabilities, PipelineQueryHandle, PipelineQueryType,
    Register, SamplerHandle, ShaderProgramHandle, TexelFormat, TextureHandle, TextureView,
};
use orrery::renderer::core::{CommandRecorder, VertexAttributeSemantic};
use orrery::renderer::drawer::GpuSceneBuffers;
use orrery::renderer::graph::{BufferBarrier, TextureBarrier};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ============================================================================
// Mock Device
// ============================================================================

#[derive(Default)]
pub struct MockDevice {
    pub caps: DeviceCapabilities,
    /// Technique whose program load fails.
    pub failing_technique: Option<&'static str>,
    /// Query creation fails.
    pub fail_queries: bool,
    pub next_id: AtomicU64,
    pub programs: Mutex<Vec<(String, ShaderProgramHandle)>>,
    pub textures: Mutex<Vec<(TextureDesc, TextureHandle)>>,
    pub buffers: Mutex<Vec<(BufferDesc, BufferHandle)>>,
    pub samplers: Mutex<Vec<(&'static str, SamplerHandle)>>,
    pub queries: Mutex<Vec<(String, PipelineQueryHandle)>>,
}

impl MockDevice {
    pub fn new(caps: DeviceCapabilities) -> Self {
        Self {
            caps,
            ..Default::default()
        }
    }

    fn next(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1000
    }

    pub fn program(&self, technique: &str) -> ShaderProgramHandle {
        self.programs
            .lock()
            .iter()
            .find(|(t, _)| t == technique)
            .map(|(_, h)| *h)
            .unwrap_or_else(|| panic!("program '{technique}' was not loaded"))
    }

    pub fn texture(&self, label: &str) -> TextureHandle {
        self.textures
            .lock()
            .iter()
            .find(|(d, _)| d.label == label)
            .map(|(_, h)| *h)
            .unwrap_or_else(|| panic!("texture '{label}' was not created"))
    }

    pub fn sampler(&self, label: &str) -> SamplerHandle {
        self.samplers
            .lock()
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, h)| *h)
            .unwrap_or_else(|| panic!("sampler '{label}' was not created"))
    }
}

impl GpuDevice for MockDevice {
    fn capabilities(&self) -> DeviceCapabilities {
        self.caps
    }

    fn load_shader_program(&self, binary: &str, technique: &str) -> Result<ShaderProgramHandle> {
        if self.failing_technique == Some(technique) {
            return Err(OrreryError::ShaderProgramLoad {
                program: binary.to_owned(),
                technique: technique.to_owned(),
                reason: "mock failure".to_owned(),
            });
        }
        let handle = ShaderProgramHandle(self.next());
        self.programs.lock().push((technique.to_owned(), handle));
        Ok(handle)
    }

    fn create_texture(&self, desc: &TextureDesc) -> Result<TextureHandle> {
        let handle = TextureHandle(self.next());
        self.textures.lock().push((desc.clone(), handle));
        Ok(handle)
    }

    fn create_buffer(&self, desc: &BufferDesc) -> Result<BufferHandle> {
        let handle = BufferHandle(self.next());
        self.buffers.lock().push((desc.clone(), handle));
        Ok(handle)
    }

    fn create_sampler(&self, desc: &SamplerDesc) -> Result<SamplerHandle> {
        let handle = SamplerHandle(self.next());
        self.samplers.lock().push((desc.label, handle));
        Ok(handle)
    }

    fn new_pipeline_query(
        &self,
        name: &str,
        _query_type: PipelineQueryType,
    ) -> Result<PipelineQueryHandle> {
        if self.fail_queries {
            return Err(OrreryError::ResourceCreation {
                name: name.to_owned(),
                reason: "mock failure".to_owned(),
            });
        }
        let handle = PipelineQueryHandle(self.next());
        self.queries.lock().push((name.to_owned(), handle));
        Ok(handle)
    }
}

pub fn device(mesh_shaders: bool, pipeline_query: bool) -> Arc<MockDevice> {
    Arc::new(MockDevice::new(DeviceCapabilities {
        mesh_shaders,
        pipeline_query,
    }))
}

// ============================================================================
// Recording Command Buffer
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    BindProgram(ShaderProgramHandle),
    BindTexture(Register, TextureView),
    BindSampler(Register, SamplerHandle),
    BindUniformBuffer(Register, BufferView),
    BindStorageBuffer(Register, BufferView),
    BindTexelBuffer(Register, BufferView, TexelFormat),
    BindIndexBuffer(BufferView, wgpu::IndexFormat),
    BindVertexBuffer {
        binding: u32,
        view: BufferView,
        stride: u64,
        step_mode: wgpu::VertexStepMode,
    },
    SetVertexAttribute {
        semantic: VertexAttributeSemantic,
        binding: u32,
        format: wgpu::VertexFormat,
        offset: u64,
    },
    PushConstants(Vec<u8>),
    Dispatch(u32, u32, u32),
    DrawMeshTasksIndirect(BufferView),
    DrawIndirect(wgpu::PrimitiveTopology, BufferView),
    DrawIndexedIndirectCount {
        topology: wgpu::PrimitiveTopology,
        args: BufferView,
        stride: u32,
        count: BufferView,
        max_draw_count: u32,
    },
    DrawIndirectCount {
        topology: wgpu::PrimitiveTopology,
        args: BufferView,
        stride: u32,
        count: BufferView,
        max_draw_count: u32,
    },
    Barrier(Vec<TextureBarrier>, Vec<BufferBarrier>),
    BeginQuery(PipelineQueryHandle),
    EndQuery(PipelineQueryHandle),
    PushMarker(String),
    PopMarker,
}

impl Command {
    pub fn is_draw(&self) -> bool {
        matches!(
            self,
            Self::DrawMeshTasksIndirect(_)
                | Self::DrawIndirect(..)
                | Self::DrawIndexedIndirectCount { .. }
                | Self::DrawIndirectCount { .. }
        )
    }
}

#[derive(Default, Debug)]
pub struct RecordingCommandBuffer {
    pub commands: Vec<Command>,
}

impl RecordingCommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draws(&self) -> Vec<&Command> {
        self.commands.iter().filter(|c| c.is_draw()).collect()
    }

    pub fn programs(&self) -> Vec<ShaderProgramHandle> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::BindProgram(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    pub fn dispatches(&self) -> Vec<(u32, u32, u32)> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::Dispatch(x, y, z) => Some((*x, *y, *z)),
                _ => None,
            })
            .collect()
    }

    /// Names of the debug markers pushed, i.e. the recorded passes in order.
    pub fn markers(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::PushMarker(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Commands recorded between `PushMarker(name)` and its pop.
    pub fn pass_commands(&self, name: &str) -> Vec<&Command> {
        let Some(start) = self
            .commands
            .iter()
            .position(|c| matches!(c, Command::PushMarker(n) if n == name))
        else {
            return Vec::new();
        };
        self.commands[start + 1..]
            .iter()
            .take_while(|c| !matches!(c, Command::PopMarker))
            .collect()
    }

    pub fn barriers(&self) -> Vec<(&[TextureBarrier], &[BufferBarrier])> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::Barrier(t, b) => Some((t.as_slice(), b.as_slice())),
                _ => None,
            })
            .collect()
    }
}

impl CommandRecorder for RecordingCommandBuffer {
    fn bind_shader_program(&mut self, program: ShaderProgramHandle) {
        self.commands.push(Command::BindProgram(program));
    }

    fn bind_texture(&mut self, reg: Register, view: TextureView) {
        self.commands.push(Command::BindTexture(reg, view));
    }

    fn bind_sampler(&mut self, reg: Register, sampler: SamplerHandle) {
        self.commands.push(Command::BindSampler(reg, sampler));
    }

    fn bind_uniform_buffer(&mut self, reg: Register, view: BufferView) {
        self.commands.push(Command::BindUniformBuffer(reg, view));
    }

    fn bind_storage_buffer(&mut self, reg: Register, view: BufferView) {
        self.commands.push(Command::BindStorageBuffer(reg, view));
    }

    fn bind_texel_buffer(&mut self, reg: Register, view: BufferView, format: TexelFormat) {
        self.commands.push(Command::BindTexelBuffer(reg, view, format));
    }

    fn bind_index_buffer(&mut self, view: BufferView, format: wgpu::IndexFormat) {
        self.commands.push(Command::BindIndexBuffer(view, format));
    }

    fn bind_vertex_buffer(
        &mut self,
        binding: u32,
        view: BufferView,
        stride: u64,
        step_mode: wgpu::VertexStepMode,
    ) {
        self.commands.push(Command::BindVertexBuffer {
            binding,
            view,
            stride,
            step_mode,
        });
    }

    fn set_vertex_attribute(
        &mut self,
        semantic: VertexAttributeSemantic,
        binding: u32,
        format: wgpu::VertexFormat,
        relative_offset: u64,
    ) {
        self.commands.push(Command::SetVertexAttribute {
            semantic,
            binding,
            format,
            offset: relative_offset,
        });
    }

    fn set_push_constants(&mut self, data: &[u8]) {
        self.commands.push(Command::PushConstants(data.to_vec()));
    }

    fn dispatch_compute(&mut self, x: u32, y: u32, z: u32) {
        self.commands.push(Command::Dispatch(x, y, z));
    }

    fn draw_mesh_tasks_indirect(&mut self, args: BufferView) {
        self.commands.push(Command::DrawMeshTasksIndirect(args));
    }

    fn draw_indirect(&mut self, topology: wgpu::PrimitiveTopology, args: BufferView) {
        self.commands.push(Command::DrawIndirect(topology, args));
    }

    fn draw_indexed_indirect_count(
        &mut self,
        topology: wgpu::PrimitiveTopology,
        args: BufferView,
        args_stride: u32,
        count: BufferView,
        max_draw_count: u32,
    ) {
        self.commands.push(Command::DrawIndexedIndirectCount {
            topology,
            args,
            stride: args_stride,
            count,
            max_draw_count,
        });
    }

    fn draw_indirect_count(
        &mut self,
        topology: wgpu::PrimitiveTopology,
        args: BufferView,
        args_stride: u32,
        count: BufferView,
        max_draw_count: u32,
    ) {
        self.commands.push(Command::DrawIndirectCount {
            topology,
            args,
            stride: args_stride,
            count,
            max_draw_count,
        });
    }

    fn set_pipeline_barrier(&mut self, textures: &[TextureBarrier], buffers: &[BufferBarrier]) {
        self.commands
            .push(Command::Barrier(textures.to_vec(), buffers.to_vec()));
    }

    fn begin_pipeline_query(&mut self, query: PipelineQueryHandle) {
        self.commands.push(Command::BeginQuery(query));
    }

    fn end_pipeline_query(&mut self, query: PipelineQueryHandle) {
        self.commands.push(Command::EndQuery(query));
    }

    fn push_debug_marker(&mut self, name: &str) {
        self.commands.push(Command::PushMarker(name.to_owned()));
    }

    fn pop_debug_marker(&mut self) {
        self.commands.push(Command::PopMarker);
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn buffer(id: u64, size: u64) -> BufferView {
    BufferView::new(BufferHandle(id), 0, size)
}

pub fn scene_buffers() -> GpuSceneBuffers {
    GpuSceneBuffers {
        gpu_scene: buffer(1, 1 << 20),
        unified_geometry: buffer(2, 1000),
        renderables: buffer(3, 1 << 16),
        mesh_lods: buffer(4, 1 << 16),
        transforms: buffer(5, 1 << 16),
    }
}

pub const GLOBAL_UNIFORMS: BufferView = BufferView::new(BufferHandle(99), 0, 1024);

pub fn full_viewport() -> UVec4 {
    UVec4::new(0, 0, 1920, 1080)
}

pub fn view_matrices() -> (Mat4, Mat4, Mat4, Mat4) {
    let view = Mat4::look_at_rh(glam::Vec3::new(0.0, 2.0, 5.0), glam::Vec3::ZERO, glam::Vec3::Y);
    let proj = Mat4::perspective_rh(1.0, 16.0 / 9.0, 0.1, 100.0);
    (proj * view, proj * view, view, view.inverse())
}
