//! Draw Strategy Selection
//!
//! Each bucket is drawn with exactly one of four indirect variants. The
//! choice depends on two inputs only, so it is resolved here, away from any
//! GPU call:
//!
//! | meshlet groups | mesh shader HW | indexed | strategy            |
//! |----------------|----------------|---------|---------------------|
//! | > 0            | yes            | any     | `HardwareMeshShader`|
//! | > 0            | no             | any     | `SoftwareMeshlet`   |
//! | 0              | any            | yes     | `LegacyIndexed`     |
//! | 0              | any            | no      | `LegacyNonIndexed`  |

use crate::renderer::core::gpu::DeviceCapabilities;
use crate::scene::RenderStateBucket;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum DrawStrategy {
    /// One task-shader indirect dispatch per bucket.
    HardwareMeshShader,
    /// One non-indexed indirect draw over meshlet instances.
    SoftwareMeshlet,
    /// Indexed multi-draw with a GPU-side count.
    LegacyIndexed,
    /// Non-indexed multi-draw with a GPU-side count.
    LegacyNonIndexed,
}

impl DrawStrategy {
    /// First match wins, in the order of the table above.
    #[inline]
    #[must_use]
    pub const fn select(
        meshlet_group_count: u32,
        indexed_drawcall: bool,
        mesh_shader_support: bool,
    ) -> Self {
        let meshlets = meshlet_group_count > 0;
        if meshlets && mesh_shader_support {
            Self::HardwareMeshShader
        } else if meshlets {
            Self::SoftwareMeshlet
        } else if indexed_drawcall {
            Self::LegacyIndexed
        } else {
            Self::LegacyNonIndexed
        }
    }

    #[inline]
    #[must_use]
    pub fn for_bucket(bucket: &RenderStateBucket, caps: DeviceCapabilities) -> Self {
        Self::select(
            bucket.meshlet_group_count,
            bucket.state.indexed_drawcall,
            caps.mesh_shaders,
        )
    }

    #[inline]
    #[must_use]
    pub const fn uses_meshlets(self) -> bool {
        matches!(self, Self::HardwareMeshShader | Self::SoftwareMeshlet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_table() {
        use DrawStrategy::*;
        let cases = [
            // (groups, indexed, hw) -> strategy
            ((2, true, true), HardwareMeshShader),
            ((2, false, true), HardwareMeshShader),
            ((2, true, false), SoftwareMeshlet),
            ((1, false, false), SoftwareMeshlet),
            ((0, true, true), LegacyIndexed),
            ((0, true, false), LegacyIndexed),
            ((0, false, true), LegacyNonIndexed),
            ((0, false, false), LegacyNonIndexed),
        ];
        for ((groups, indexed, hw), expected) in cases {
            assert_eq!(
                DrawStrategy::select(groups, indexed, hw),
                expected,
                "groups={groups} indexed={indexed} hw={hw}"
            );
        }
    }

    #[test]
    fn meshlet_paths_are_exclusive_for_a_fixed_device() {
        for hw in [false, true] {
            let strategy = DrawStrategy::select(3, true, hw);
            assert!(strategy.uses_meshlets());
            assert_eq!(strategy == DrawStrategy::HardwareMeshShader, hw);
            assert_eq!(strategy == DrawStrategy::SoftwareMeshlet, !hw);
        }
    }
}
