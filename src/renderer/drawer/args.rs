//! Drawer Arguments
//!
//! Immutable per-call snapshot handed to
//! [`RenderableDrawer::draw_mdi`](super::RenderableDrawer::draw_mdi).
//!
//! Three geometry sources exist, one per family of draw strategies. Each
//! carries per-bucket instance ranges indexed by bucket slot:
//!
//! | Source                     | Used by                              |
//! |----------------------------|--------------------------------------|
//! | [`LegacyGeometry`]         | `LegacyIndexed`, `LegacyNonIndexed`  |
//! | [`SoftwareMeshletGeometry`]| `SoftwareMeshlet`                    |
//! | [`MeshShaderGeometry`]     | `HardwareMeshShader`                 |

use glam::{Mat4, UVec4};

use crate::renderer::core::gpu::{BufferView, SamplerHandle, TextureView};
use crate::scene::RenderingTechnique;

// ─── Instance Range ───────────────────────────────────────────────────────────

/// A contiguous slice of a GPU instance array.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct InstanceRange {
    first_instance: u32,
    instance_count: u32,
}

impl InstanceRange {
    #[inline]
    #[must_use]
    pub const fn new(first_instance: u32, instance_count: u32) -> Self {
        Self {
            first_instance,
            instance_count,
        }
    }

    #[inline]
    #[must_use]
    pub const fn first_instance(&self) -> u32 {
        self.first_instance
    }

    #[inline]
    #[must_use]
    pub const fn instance_count(&self) -> u32 {
        self.instance_count
    }

    /// One past the last instance.
    #[inline]
    #[must_use]
    pub const fn end(&self) -> u32 {
        self.first_instance + self.instance_count
    }

    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.instance_count > 0
            && other.instance_count > 0
            && self.first_instance < other.end()
            && other.first_instance < self.end()
    }
}

/// Whether no two non-empty ranges share an instance.
#[must_use]
pub fn instance_ranges_disjoint(ranges: &[InstanceRange]) -> bool {
    let mut sorted: Vec<InstanceRange> = ranges
        .iter()
        .copied()
        .filter(|r| r.instance_count > 0)
        .collect();
    sorted.sort_unstable_by_key(InstanceRange::first_instance);
    sorted.windows(2).all(|w| w[0].end() <= w[1].first_instance)
}

// ─── Geometry Sources ─────────────────────────────────────────────────────────

/// Per-vertex meshes drawn with multi-draw-indirect-count.
#[derive(Clone, Debug, PartialEq)]
pub struct LegacyGeometry {
    /// Array of [`GpuSceneRenderableInstance`](super::GpuSceneRenderableInstance).
    pub renderable_instances_buffer: BufferView,
    /// One `DrawIndexedIndirectArgs` per instance, for both the indexed and
    /// the non-indexed variant.
    pub draw_indexed_indirect_args_buffer: BufferView,
    /// One `u32` draw count per bucket, written by GPU culling.
    pub mdi_draw_counts_buffer: BufferView,
    pub bucket_renderable_instance_ranges: Vec<InstanceRange>,
}

/// Meshlets expanded by a vertex shader (no mesh shader support).
#[derive(Clone, Debug, PartialEq)]
pub struct SoftwareMeshletGeometry {
    /// Array of [`GpuSceneMeshletInstance`](super::GpuSceneMeshletInstance).
    pub meshlet_instances_buffer: BufferView,
    /// One `DrawIndirectArgs` per bucket.
    pub draw_indirect_args_buffer: BufferView,
    pub bucket_meshlet_instance_ranges: Vec<InstanceRange>,
}

/// Meshlet groups dispatched as task-shader workgroups.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshShaderGeometry {
    /// Bound only when present.
    pub meshlet_group_instances_buffer: Option<BufferView>,
    /// One `DispatchIndirectArgs` per bucket.
    pub task_shader_indirect_args_buffer: BufferView,
    pub bucket_meshlet_group_instance_ranges: Vec<InstanceRange>,
}

// ─── Arguments ────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct DrawerArguments {
    pub view_projection_matrix: Mat4,
    pub previous_view_projection_matrix: Mat4,
    /// World to view, affine.
    pub view_matrix: Mat4,
    /// View to world, affine.
    pub camera_transform: Mat4,
    /// `(x, y, width, height)`; width and height must be non-zero.
    pub viewport: UVec4,
    /// Material sampler, bound at the trilinear-repeat register.
    pub sampler: SamplerHandle,
    /// Enables HZB occlusion testing when present.
    pub hzb_texture: Option<TextureView>,
    pub rendering_technique: RenderingTechnique,

    pub legacy: Option<LegacyGeometry>,
    pub software_mesh: Option<SoftwareMeshletGeometry>,
    pub mesh: Option<MeshShaderGeometry>,
}

impl DrawerArguments {
    /// Identity matrices, no HZB and no geometry sources.
    #[must_use]
    pub fn new(rendering_technique: RenderingTechnique, viewport: UVec4, sampler: SamplerHandle) -> Self {
        Self {
            view_projection_matrix: Mat4::IDENTITY,
            previous_view_projection_matrix: Mat4::IDENTITY,
            view_matrix: Mat4::IDENTITY,
            camera_transform: Mat4::IDENTITY,
            viewport,
            sampler,
            hzb_texture: None,
            rendering_technique,
            legacy: None,
            software_mesh: None,
            mesh: None,
        }
    }

    #[must_use]
    pub fn with_matrices(
        mut self,
        view_projection: Mat4,
        previous_view_projection: Mat4,
        view: Mat4,
        camera_transform: Mat4,
    ) -> Self {
        self.view_projection_matrix = view_projection;
        self.previous_view_projection_matrix = previous_view_projection;
        self.view_matrix = view;
        self.camera_transform = camera_transform;
        self
    }

    #[must_use]
    pub fn with_hzb(mut self, hzb: TextureView) -> Self {
        self.hzb_texture = Some(hzb);
        self
    }

    #[must_use]
    pub fn with_legacy(mut self, legacy: LegacyGeometry) -> Self {
        self.legacy = Some(legacy);
        self
    }

    #[must_use]
    pub fn with_software_mesh(mut self, software_mesh: SoftwareMeshletGeometry) -> Self {
        self.software_mesh = Some(software_mesh);
        self
    }

    #[must_use]
    pub fn with_mesh(mut self, mesh: MeshShaderGeometry) -> Self {
        self.mesh = Some(mesh);
        self
    }

    /// Viewport has a non-zero extent in both dimensions.
    #[inline]
    #[must_use]
    pub fn has_valid_viewport(&self) -> bool {
        self.viewport.z != 0 && self.viewport.w != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjacent_ranges_do_not_overlap() {
        let a = InstanceRange::new(0, 4);
        let b = InstanceRange::new(4, 2);
        assert!(!a.overlaps(&b));
        assert!(instance_ranges_disjoint(&[b, a]));
    }

    #[test]
    fn overlapping_ranges_are_detected() {
        let a = InstanceRange::new(0, 5);
        let b = InstanceRange::new(4, 2);
        assert!(a.overlaps(&b));
        assert!(!instance_ranges_disjoint(&[a, b]));
    }

    #[test]
    fn empty_ranges_never_overlap() {
        let empty = InstanceRange::new(2, 0);
        let full = InstanceRange::new(0, 10);
        assert!(!empty.overlaps(&full));
        assert!(instance_ranges_disjoint(&[full, empty]));
    }

    #[test]
    fn zero_extent_viewport_is_invalid() {
        let args = DrawerArguments::new(
            RenderingTechnique::GBuffer,
            UVec4::new(0, 0, 1920, 0),
            SamplerHandle(1),
        );
        assert!(!args.has_valid_viewport());
    }
}
