//! Renderer Core
//!
//! [`Renderer`] ties the subsystems together for one frame:
//!
//! ```text
//! Renderer::new(device, scene_buffers, settings)
//!   ├─ Samplers, 1x1 dummy texture, transient uniform pool
//!   ├─ Sky                (disabled on init failure, never fatal)
//!   └─ RenderableDrawer   (shared with MDI passes through Arc)
//!
//! per frame:
//!   queue_mdi_pass(..)            ┐
//!   populate_render_graph(ctx, ..)├─ declaration
//!   ctx.into_graph().compile()?   ┘
//!   graph.execute(recorder)         record
//!   end_frame()                     transient reset, query drain
//! ```

pub mod core;
pub mod drawer;
pub mod graph;
pub mod settings;

use std::sync::Arc;

use crate::errors::Result;
use crate::renderer::core::device::{BufferDesc, GpuDevice, Samplers, TextureDesc};
use crate::renderer::core::gpu::{PipelineQueryHandle, TextureView};
use crate::renderer::core::{CommandRecorder, TransientUniformPool};
use crate::renderer::drawer::{DrawerArguments, GpuSceneBuffers, RenderableDrawer};
use crate::renderer::graph::passes::{MdiPassRequest, Sky, populate_mdi_pass};
use crate::renderer::graph::resource::{BufferUsage, TextureUsage};
use crate::renderer::graph::{PassHandle, RenderingContext};
use crate::renderer::settings::RendererSettings;
use crate::scene::{RenderStateBucketContainer, SceneLighting};

pub struct Renderer {
    settings: RendererSettings,
    device: Arc<dyn GpuDevice>,
    samplers: Samplers,
    dummy_texture: TextureView,
    transient: Arc<TransientUniformPool>,

    sky: Sky,
    drawer: Arc<RenderableDrawer>,

    pending_mdi_passes: Vec<MdiPassRequest>,
}

impl Renderer {
    /// Creates the shared GPU objects and both subsystems.
    ///
    /// # Errors
    ///
    /// Fails if a sampler, the dummy texture or the transient uniform buffer
    /// cannot be created. Sky failures are logged and leave the sky disabled.
    pub fn new(
        device: Arc<dyn GpuDevice>,
        scene_buffers: GpuSceneBuffers,
        settings: RendererSettings,
    ) -> Result<Self> {
        let caps = device.capabilities();
        log::info!(
            "Initializing renderer (mesh shaders: {}, pipeline queries: {})",
            caps.mesh_shaders,
            caps.pipeline_query
        );

        let samplers = Samplers::new(device.as_ref())?;

        let dummy_texture = TextureView::all(device.create_texture(&TextureDesc::new_2d(
            1,
            1,
            wgpu::TextureFormat::Rgba8Unorm,
            TextureUsage::ALL_SAMPLED,
            "Dummy",
        ))?);

        let transient_buffer = device.create_buffer(&BufferDesc {
            label: "TransientUniforms".to_owned(),
            size: settings.transient_uniform_capacity,
            usage: BufferUsage::UNIFORM_GEOMETRY
                | BufferUsage::UNIFORM_FRAGMENT
                | BufferUsage::UNIFORM_COMPUTE
                | BufferUsage::TRANSFER_DESTINATION,
        })?;
        let transient = Arc::new(TransientUniformPool::new(
            transient_buffer,
            settings.transient_uniform_capacity,
            settings.transient_uniform_alignment,
        ));

        let sky = Sky::new(device.as_ref(), &samplers, &settings.sky);

        let drawer = Arc::new(RenderableDrawer::new(
            Arc::clone(&device),
            scene_buffers,
            samplers,
            dummy_texture,
            Arc::clone(&transient),
            settings.statistics,
        ));

        Ok(Self {
            settings,
            device,
            samplers,
            dummy_texture,
            transient,
            sky,
            drawer,
            pending_mdi_passes: Vec::new(),
        })
    }

    // ── Accessors ──────────────────────────────────────────────────────────

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    #[inline]
    #[must_use]
    pub fn device(&self) -> &Arc<dyn GpuDevice> {
        &self.device
    }

    #[inline]
    #[must_use]
    pub fn samplers(&self) -> &Samplers {
        &self.samplers
    }

    #[inline]
    #[must_use]
    pub fn dummy_texture(&self) -> TextureView {
        self.dummy_texture
    }

    #[inline]
    #[must_use]
    pub fn sky(&self) -> &Sky {
        &self.sky
    }

    #[inline]
    #[must_use]
    pub fn drawer(&self) -> &Arc<RenderableDrawer> {
        &self.drawer
    }

    #[inline]
    #[must_use]
    pub fn transient_uniforms(&self) -> &Arc<TransientUniformPool> {
        &self.transient
    }

    // ── Frame ──────────────────────────────────────────────────────────────

    /// Queues a batch to be declared by the next
    /// [`populate_render_graph`](Self::populate_render_graph).
    pub fn queue_mdi_pass(&mut self, request: MdiPassRequest) {
        self.pending_mdi_passes.push(request);
    }

    /// Declares the sky passes followed by one graphics pass per queued batch,
    /// in queue order. Returns the MDI pass handles.
    pub fn populate_render_graph(
        &mut self,
        ctx: &mut RenderingContext,
        scene: &SceneLighting,
        buckets: &Arc<RenderStateBucketContainer>,
    ) -> Vec<PassHandle> {
        self.sky.populate_render_graph(ctx, scene);

        let requests = std::mem::take(&mut self.pending_mdi_passes);
        log::debug!("Declaring {} MDI pass(es)", requests.len());
        requests
            .into_iter()
            .map(|request| populate_mdi_pass(ctx, &self.drawer, buckets, request))
            .collect()
    }

    /// Records a batch straight into `cmdb`, outside any render graph.
    pub fn draw_batch(
        &self,
        args: &DrawerArguments,
        buckets: &RenderStateBucketContainer,
        cmdb: &mut dyn CommandRecorder,
    ) -> Result<()> {
        self.drawer.draw_mdi(args, buckets, cmdb)
    }

    /// Retires the frame once the GPU is done with it.
    ///
    /// Returns the pipeline queries recorded during the frame so their
    /// results can be read back.
    pub fn end_frame(&mut self) -> Vec<PipelineQueryHandle> {
        log::trace!("Frame used {} transient uniform bytes", self.transient.used());
        self.transient.reset();
        self.drawer.drain_pipeline_queries()
    }
}
