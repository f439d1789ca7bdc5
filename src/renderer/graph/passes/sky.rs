//! Atmospheric Sky
//!
//! Four compute passes produce the lookup textures a physically based sky is
//! shaded from:
//!
//! ```text
//!  SkyTransmittanceLut ──► SkyMultipleScatteringLut ──► SkyLut ──► (sky shading)
//!        │  256×64               32×32                   192×108
//!        └───────────────────────────────────────────► ComputeSunColor
//!                                                          │
//!                                          global rendering uniforms (u0)
//! ```
//!
//! The first two depend only on fixed atmosphere parameters and are
//! generated once. The sky-view LUT is regenerated when the sun changes.
//! Sun color is cheap and always recomputed. See
//! [`LutGenerationState`] for the gating rules.
//!
//! If any program fails to load at construction the sky stays disabled for
//! the lifetime of the renderer.

use std::sync::Arc;

use glam::UVec2;

use crate::errors::{OrreryError, Result};
use crate::renderer::core::command::dispatch_pp_compute;
use crate::renderer::core::device::{GpuDevice, Samplers, TextureDesc};
use crate::renderer::core::gpu::{Register, SamplerHandle, ShaderProgramHandle};
use crate::renderer::graph::context::RenderingContext;
use crate::renderer::graph::import::{RenderTarget, create_and_clear_render_target};
use crate::renderer::graph::passes::lut_state::{LutFramePlan, LutGenerationState};
use crate::renderer::graph::resource::{BufferUsage, RenderTargetHandle, TextureUsage};
use crate::renderer::settings::SkySettings;
use crate::scene::SceneLighting;

pub const TRANSMITTANCE_LUT_SIZE: UVec2 = UVec2::new(256, 64);
pub const MULTIPLE_SCATTERING_LUT_SIZE: UVec2 = UVec2::new(32, 32);
pub const SKY_LUT_SIZE: UVec2 = UVec2::new(192, 108);

/// Thread-group footprint of the LUT kernels.
const LUT_TILE_SIZE: u32 = 8;

const LUT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Unorm;

/// Pass names, also used as the program techniques.
pub mod pass_names {
    pub const TRANSMITTANCE_LUT: &str = "SkyTransmittanceLut";
    pub const MULTIPLE_SCATTERING_LUT: &str = "SkyMultipleScatteringLut";
    pub const SKY_LUT: &str = "SkyLut";
    pub const COMPUTE_SUN_COLOR: &str = "ComputeSunColor";
}

#[derive(Clone, Copy, Debug)]
struct SkyPrograms {
    transmittance_lut: ShaderProgramHandle,
    multiple_scattering_lut: ShaderProgramHandle,
    sky_lut: ShaderProgramHandle,
    compute_sun_color: ShaderProgramHandle,
}

#[derive(Debug)]
struct SkyResources {
    programs: SkyPrograms,
    trilinear_clamp: SamplerHandle,
    transmittance_lut: Arc<RenderTarget>,
    multiple_scattering_lut: Arc<RenderTarget>,
    sky_lut: Arc<RenderTarget>,
}

impl SkyResources {
    fn new(device: &dyn GpuDevice, samplers: &Samplers, settings: &SkySettings) -> Result<Self> {
        let binary = settings.shader_binary.as_str();
        let programs = SkyPrograms {
            transmittance_lut: device.load_shader_program(binary, pass_names::TRANSMITTANCE_LUT)?,
            multiple_scattering_lut: device
                .load_shader_program(binary, pass_names::MULTIPLE_SCATTERING_LUT)?,
            sky_lut: device.load_shader_program(binary, pass_names::SKY_LUT)?,
            compute_sun_color: device.load_shader_program(binary, pass_names::COMPUTE_SUN_COLOR)?,
        };

        let usage = TextureUsage::ALL_COMPUTE;
        let initial_usage = TextureUsage::ALL_COMPUTE;

        let transmittance_lut = create_and_clear_render_target(
            device,
            TextureDesc::new_2d(
                TRANSMITTANCE_LUT_SIZE.x,
                TRANSMITTANCE_LUT_SIZE.y,
                LUT_FORMAT,
                usage,
                "SkyTransmittanceLut",
            ),
            initial_usage,
        )?;
        let multiple_scattering_lut = create_and_clear_render_target(
            device,
            TextureDesc::new_2d(
                MULTIPLE_SCATTERING_LUT_SIZE.x,
                MULTIPLE_SCATTERING_LUT_SIZE.y,
                LUT_FORMAT,
                usage,
                "SkyMultipleScatteringLut",
            ),
            initial_usage,
        )?;
        let sky_lut = create_and_clear_render_target(
            device,
            TextureDesc::new_2d(
                SKY_LUT_SIZE.x,
                SKY_LUT_SIZE.y,
                LUT_FORMAT,
                usage | TextureUsage::SAMPLED_FRAGMENT,
                "SkyLut",
            ),
            initial_usage,
        )?;

        Ok(Self {
            programs,
            trilinear_clamp: samplers.trilinear_clamp,
            transmittance_lut,
            multiple_scattering_lut,
            sky_lut,
        })
    }
}

/// The atmospheric LUT pipeline.
pub struct Sky {
    resources: Option<SkyResources>,
    state: LutGenerationState,
    /// This frame's sky LUT, `None` when the sky did not run.
    sky_lut_rt: Option<RenderTargetHandle>,
}

impl Sky {
    /// Loads the programs and creates the LUTs.
    ///
    /// Never fails: on error the sky logs and stays disabled.
    #[must_use]
    pub fn new(device: &dyn GpuDevice, samplers: &Samplers, settings: &SkySettings) -> Self {
        let resources = if settings.enabled {
            match SkyResources::new(device, samplers, settings) {
                Ok(resources) => Some(resources),
                Err(e) => {
                    log::error!("Failed to initialize the sky, it will stay disabled: {e}");
                    None
                }
            }
        } else {
            log::debug!("Sky disabled by settings");
            None
        };

        Self {
            resources,
            state: LutGenerationState::default(),
            sky_lut_rt: None,
        }
    }

    /// Programs and LUTs were created.
    #[inline]
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.resources.is_some()
    }

    /// The sky runs this frame: initialized, a generated skybox and a
    /// directional light are present.
    #[must_use]
    pub fn is_enabled(&self, scene: &SceneLighting) -> bool {
        self.is_initialized()
            && scene.skybox().is_some_and(|s| s.is_generated())
            && scene.directional_light().is_some()
    }

    /// This frame's sky LUT handle, for passes that shade the sky.
    #[inline]
    #[must_use]
    pub fn sky_lut(&self) -> Option<RenderTargetHandle> {
        self.sky_lut_rt
    }

    /// Like [`Self::sky_lut`], for passes that cannot shade without it.
    ///
    /// # Errors
    ///
    /// [`OrreryError::SubsystemDisabled`] when the sky declared no passes
    /// this frame.
    pub fn require_sky_lut(&self) -> Result<RenderTargetHandle> {
        self.sky_lut_rt.ok_or(OrreryError::SubsystemDisabled("Sky"))
    }

    /// The persistent sky LUT, if initialized.
    #[must_use]
    pub fn sky_lut_target(&self) -> Option<&Arc<RenderTarget>> {
        self.resources.as_ref().map(|r| &r.sky_lut)
    }

    #[inline]
    #[must_use]
    pub fn lut_state(&self) -> &LutGenerationState {
        &self.state
    }

    /// Declares this frame's sky passes.
    pub fn populate_render_graph(&mut self, ctx: &mut RenderingContext, scene: &SceneLighting) {
        self.sky_lut_rt = None;

        let generated = scene.skybox().is_some_and(|s| s.is_generated());
        let (Some(resources), Some(light), true) =
            (self.resources.as_ref(), scene.directional_light(), generated)
        else {
            self.state.reset();
            return;
        };

        let plan = self.state.advance(light);
        log::debug!("Sky LUT plan: {:?}", plan.regen);

        self.sky_lut_rt = Some(declare_passes(ctx, resources, plan));
    }
}

fn declare_passes(
    ctx: &mut RenderingContext,
    resources: &SkyResources,
    plan: LutFramePlan,
) -> RenderTargetHandle {
    let programs = resources.programs;
    let sampler = resources.trilinear_clamp;
    let uniforms = ctx.global_rendering_uniforms;
    let rgraph = &mut ctx.graph;

    let base_usage = plan.base_lut_import_usage();
    let transmittance_lut_rt =
        rgraph.import_render_target(&resources.transmittance_lut, Some(base_usage));
    let multiple_scattering_lut_rt =
        rgraph.import_render_target(&resources.multiple_scattering_lut, Some(base_usage));
    let sky_lut_rt = rgraph.import_render_target(&resources.sky_lut, plan.sky_lut_import_usage());

    // Transmittance LUT
    if plan.renders_base_luts() {
        rgraph
            .new_compute_pass(pass_names::TRANSMITTANCE_LUT)
            .new_texture_dependency(transmittance_lut_rt, TextureUsage::STORAGE_COMPUTE_WRITE)
            .set_work(move |rgraph_ctx| {
                log::trace!("{}", pass_names::TRANSMITTANCE_LUT);
                rgraph_ctx
                    .command_buffer()
                    .bind_shader_program(programs.transmittance_lut);
                rgraph_ctx.bind_texture(Register::u(0), transmittance_lut_rt);
                dispatch_pp_compute(
                    rgraph_ctx.command_buffer(),
                    LUT_TILE_SIZE,
                    LUT_TILE_SIZE,
                    TRANSMITTANCE_LUT_SIZE.x,
                    TRANSMITTANCE_LUT_SIZE.y,
                );
            });
    }

    // Multiple scattering LUT
    if plan.renders_base_luts() {
        rgraph
            .new_compute_pass(pass_names::MULTIPLE_SCATTERING_LUT)
            .new_texture_dependency(transmittance_lut_rt, TextureUsage::SAMPLED_COMPUTE)
            .new_texture_dependency(
                multiple_scattering_lut_rt,
                TextureUsage::STORAGE_COMPUTE_WRITE,
            )
            .set_work(move |rgraph_ctx| {
                log::trace!("{}", pass_names::MULTIPLE_SCATTERING_LUT);
                rgraph_ctx
                    .command_buffer()
                    .bind_shader_program(programs.multiple_scattering_lut);
                rgraph_ctx.bind_texture(Register::t(0), transmittance_lut_rt);
                rgraph_ctx
                    .command_buffer()
                    .bind_sampler(Register::s(0), sampler);
                rgraph_ctx.bind_texture(Register::u(0), multiple_scattering_lut_rt);
                dispatch_pp_compute(
                    rgraph_ctx.command_buffer(),
                    LUT_TILE_SIZE,
                    LUT_TILE_SIZE,
                    MULTIPLE_SCATTERING_LUT_SIZE.x,
                    MULTIPLE_SCATTERING_LUT_SIZE.y,
                );
            });
    }

    // Sky LUT
    if plan.renders_sky_lut() {
        rgraph
            .new_compute_pass(pass_names::SKY_LUT)
            .new_texture_dependency(transmittance_lut_rt, TextureUsage::SAMPLED_COMPUTE)
            .new_texture_dependency(multiple_scattering_lut_rt, TextureUsage::SAMPLED_COMPUTE)
            .new_texture_dependency(sky_lut_rt, TextureUsage::STORAGE_COMPUTE_WRITE)
            .new_buffer_dependency(uniforms, BufferUsage::UNIFORM_COMPUTE)
            .set_work(move |rgraph_ctx| {
                log::trace!("{}", pass_names::SKY_LUT);
                rgraph_ctx
                    .command_buffer()
                    .bind_shader_program(programs.sky_lut);
                rgraph_ctx.bind_texture(Register::t(0), transmittance_lut_rt);
                rgraph_ctx.bind_texture(Register::t(1), multiple_scattering_lut_rt);
                rgraph_ctx
                    .command_buffer()
                    .bind_sampler(Register::s(0), sampler);
                rgraph_ctx.bind_texture(Register::u(0), sky_lut_rt);
                rgraph_ctx.bind_uniform_buffer(Register::b(0), uniforms);
                dispatch_pp_compute(
                    rgraph_ctx.command_buffer(),
                    LUT_TILE_SIZE,
                    LUT_TILE_SIZE,
                    SKY_LUT_SIZE.x,
                    SKY_LUT_SIZE.y,
                );
            });
    }

    // Sun color, every frame
    rgraph
        .new_compute_pass(pass_names::COMPUTE_SUN_COLOR)
        .new_texture_dependency(transmittance_lut_rt, TextureUsage::SAMPLED_COMPUTE)
        .new_buffer_dependency(uniforms, BufferUsage::STORAGE_COMPUTE_WRITE)
        .set_work(move |rgraph_ctx| {
            log::trace!("{}", pass_names::COMPUTE_SUN_COLOR);
            rgraph_ctx
                .command_buffer()
                .bind_shader_program(programs.compute_sun_color);
            rgraph_ctx.bind_texture(Register::t(0), transmittance_lut_rt);
            rgraph_ctx.bind_storage_buffer(Register::u(0), uniforms);
            rgraph_ctx.command_buffer().dispatch_compute(1, 1, 1);
        });

    sky_lut_rt
}
