//! GPU structures shared with the material shaders.
//!
//! Layouts are fixed by the shaders; sizes are checked at compile time.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

/// Row-major 3x4 affine matrix, as the shaders consume view and camera
/// transforms.
/// Memory layout: [Row0(4 floats), Row1(4 floats), Row2(4 floats)]
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Mat3x4 {
    pub rows: [Vec4; 3],
}

impl Mat3x4 {
    pub const IDENTITY: Self = Self {
        rows: [
            Vec4::new(1.0, 0.0, 0.0, 0.0),
            Vec4::new(0.0, 1.0, 0.0, 0.0),
            Vec4::new(0.0, 0.0, 1.0, 0.0),
        ],
    };

    /// Drops the projective row of an affine `Mat4`.
    #[must_use]
    pub fn from_mat4(m: Mat4) -> Self {
        Self {
            rows: [m.row(0), m.row(1), m.row(2)],
        }
    }
}

/// Per-batch constants bound at the global uniforms register.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct MaterialGlobalUniforms {
    pub view_projection_matrix: Mat4,          // 64
    pub previous_view_projection_matrix: Mat4, // 64
    pub view_transform: Mat3x4,                // 48
    pub camera_transform: Mat3x4,              // 48
    pub viewport: Vec4,                        // 16
    pub enable_hzb_testing: u32,               // 4
    pub _padding: [u32; 3],                    // pad to 256 bytes
}

/// Per-instance vertex stream of the legacy paths (binding 0, `Misc0`).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct GpuSceneRenderableInstance {
    pub world_transforms_index: u32,
    pub uniforms_offset: u32,
    pub mesh_lod_index: u32,
    pub bone_transforms_offset: u32,
}

/// Per-instance vertex stream of the software meshlet path.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct GpuSceneMeshletInstance {
    pub world_transforms_index: u32,
    pub uniforms_offset: u32,
    pub meshlet_geometry_descriptor_index: u32,
    pub bone_transforms_offset: u32,
}

// ─── Strides ──────────────────────────────────────────────────────────────────

pub const RENDERABLE_INSTANCE_STRIDE: u64 = size_of::<GpuSceneRenderableInstance>() as u64;
pub const MESHLET_INSTANCE_STRIDE: u64 = size_of::<GpuSceneMeshletInstance>() as u64;

pub const DISPATCH_INDIRECT_ARGS_SIZE: u64 = size_of::<wgpu::util::DispatchIndirectArgs>() as u64;
pub const DRAW_INDIRECT_ARGS_SIZE: u64 = size_of::<wgpu::util::DrawIndirectArgs>() as u64;
pub const DRAW_INDEXED_INDIRECT_ARGS_SIZE: u64 =
    size_of::<wgpu::util::DrawIndexedIndirectArgs>() as u64;

/// GPU-written draw count per bucket.
pub const MDI_DRAW_COUNT_SIZE: u64 = size_of::<u32>() as u64;

const _: () = assert!(size_of::<MaterialGlobalUniforms>() == 256);
const _: () = assert!(RENDERABLE_INSTANCE_STRIDE == 16);
const _: () = assert!(MESHLET_INSTANCE_STRIDE == 16);
const _: () = assert!(DISPATCH_INDIRECT_ARGS_SIZE == 12);
const _: () = assert!(DRAW_INDIRECT_ARGS_SIZE == 16);
const _: () = assert!(DRAW_INDEXED_INDIRECT_ARGS_SIZE == 20);

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn mat3x4_keeps_translation_in_last_column() {
        let m = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let rows = Mat3x4::from_mat4(m).rows;
        assert_eq!(rows[0], Vec4::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(rows[1], Vec4::new(0.0, 1.0, 0.0, 2.0));
        assert_eq!(rows[2], Vec4::new(0.0, 0.0, 1.0, 3.0));
        assert_eq!(Mat3x4::from_mat4(Mat4::IDENTITY), Mat3x4::IDENTITY);
    }
}
