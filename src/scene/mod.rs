//! Scene-side inputs of the renderer core.
//!
//! - [`SceneLighting`]: what the sky reads each frame (sun, skybox)
//! - [`RenderStateBucketContainer`]: renderables grouped by pipeline state

pub mod background;
pub mod light;
pub mod render_state_bucket;

pub use background::{Skybox, SkyboxType};
pub use light::DirectionalLight;
pub use render_state_bucket::{
    RenderStateBucket, RenderStateBucketContainer, RenderStateBucketIndex, RenderStateInfo,
    RenderingTechnique,
};

/// Per-frame snapshot of the scene state the renderer core depends on.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SceneLighting {
    pub directional_light: Option<DirectionalLight>,
    pub skybox: Option<Skybox>,
}

impl SceneLighting {
    #[must_use]
    pub fn new(directional_light: Option<DirectionalLight>, skybox: Option<Skybox>) -> Self {
        Self {
            directional_light,
            skybox,
        }
    }

    #[inline]
    #[must_use]
    pub fn directional_light(&self) -> Option<&DirectionalLight> {
        self.directional_light.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn skybox(&self) -> Option<&Skybox> {
        self.skybox.as_ref()
    }
}
