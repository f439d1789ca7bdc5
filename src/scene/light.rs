use glam::Vec3;

/// The scene's sun.
///
/// `direction` points from the light towards the scene. The sky compares it
/// bit-for-bit between frames, so callers should avoid re-normalizing an
/// unchanged direction every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub color: Vec3,
    /// Radiometric power (illuminance scale) of the light.
    pub power: f32,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            direction: Vec3::NEG_Y,
            color: Vec3::ONE,
            power: 1.0,
        }
    }
}

impl DirectionalLight {
    #[must_use]
    pub fn new(direction: Vec3, power: f32) -> Self {
        Self {
            direction,
            power,
            ..Default::default()
        }
    }

    #[inline]
    #[must_use]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    #[inline]
    #[must_use]
    pub fn power(&self) -> f32 {
        self.power
    }
}
