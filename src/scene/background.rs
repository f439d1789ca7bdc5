//! Skybox
//!
//! Describes *what* the scene background is. Only
//! [`SkyboxType::Generated`] drives the atmospheric LUT pipeline; the other
//! kinds are drawn by passes outside this crate.

use glam::Vec3;

/// How the sky is produced.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SkyboxType {
    /// Flat color clear.
    SolidColor(Vec3),
    /// Pre-authored environment image.
    Image,
    /// Physically based atmosphere computed from the directional light.
    Generated,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Skybox {
    pub skybox_type: SkyboxType,
}

impl Skybox {
    #[must_use]
    pub fn new(skybox_type: SkyboxType) -> Self {
        Self { skybox_type }
    }

    #[must_use]
    pub fn generated() -> Self {
        Self::new(SkyboxType::Generated)
    }

    #[inline]
    #[must_use]
    pub fn skybox_type(&self) -> SkyboxType {
        self.skybox_type
    }

    #[inline]
    #[must_use]
    pub fn is_generated(&self) -> bool {
        matches!(self.skybox_type, SkyboxType::Generated)
    }
}
