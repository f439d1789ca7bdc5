//! LUT Generation State
//!
//! Cross-frame bookkeeping of the atmospheric LUT pipeline, kept apart from
//! the GPU side so the gating logic can be tested on its own.
//!
//! ```text
//!                  ┌──────────────────┐ latch set
//!  (reset) ───────►│  NeedsFullRegen  │──────────┐
//!                  └──────────────────┘          ▼
//!                         sun changed  ┌──────────────────┐
//!                       ┌─────────────►│ NeedsSkyLutOnly  │
//!                       │              └──────────────────┘
//!              ┌────────┴───────┐               │ sun unchanged
//!              │    UpToDate    │◄──────────────┘
//!              └────────────────┘
//! ```
//!
//! The transmittance and multiple-scattering LUTs depend only on fixed
//! atmosphere parameters, so they are generated once and latched. The sky
//! view LUT depends on the sun and is regenerated whenever its direction or
//! power differs (exact comparison) from the cached value.

use glam::Vec3;

use crate::renderer::graph::resource::TextureUsage;
use crate::scene::DirectionalLight;

/// What the sky has to regenerate this frame.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum LutRegenPlan {
    /// Transmittance, multiple scattering and sky view.
    NeedsFullRegen,
    /// Sky view only.
    NeedsSkyLutOnly,
    /// Nothing but the sun color.
    UpToDate,
}

/// The decisions for one frame.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct LutFramePlan {
    pub regen: LutRegenPlan,
    /// The sky LUT has never been imported since the last reset.
    pub first_sky_lut_import: bool,
}

impl LutFramePlan {
    #[inline]
    #[must_use]
    pub fn renders_base_luts(&self) -> bool {
        self.regen == LutRegenPlan::NeedsFullRegen
    }

    #[inline]
    #[must_use]
    pub fn renders_sky_lut(&self) -> bool {
        self.regen != LutRegenPlan::UpToDate
    }

    /// Import usage of the transmittance and multiple-scattering LUTs:
    /// writable when they are generated this frame, sampled otherwise.
    #[must_use]
    pub fn base_lut_import_usage(&self) -> TextureUsage {
        if self.renders_base_luts() {
            TextureUsage::ALL_COMPUTE
        } else {
            TextureUsage::SAMPLED_COMPUTE
        }
    }

    /// Import usage of the sky LUT; `None` means "whatever it was left in".
    #[must_use]
    pub fn sky_lut_import_usage(&self) -> Option<TextureUsage> {
        self.first_sky_lut_import.then_some(TextureUsage::ALL_COMPUTE)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LutGenerationState {
    pub sun_direction: Vec3,
    pub sun_power: f32,
    pub transmittance_and_multi_scatter_generated: bool,
    pub sky_lut_imported_once: bool,
}

impl LutGenerationState {
    /// Compares the light against the cached sun, then caches it and sets
    /// the latches as if this frame's passes were declared.
    #[allow(clippy::float_cmp)]
    pub fn advance(&mut self, light: &DirectionalLight) -> LutFramePlan {
        let sun_changed = light.direction != self.sun_direction || light.power != self.sun_power;

        let regen = if !self.transmittance_and_multi_scatter_generated {
            LutRegenPlan::NeedsFullRegen
        } else if sun_changed {
            LutRegenPlan::NeedsSkyLutOnly
        } else {
            LutRegenPlan::UpToDate
        };

        let plan = LutFramePlan {
            regen,
            first_sky_lut_import: !self.sky_lut_imported_once,
        };

        self.sun_direction = light.direction;
        self.sun_power = light.power;
        self.transmittance_and_multi_scatter_generated = true;
        self.sky_lut_imported_once = true;

        plan
    }

    /// Forgets everything, so the next enabled frame regenerates all LUTs.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
