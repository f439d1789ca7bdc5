//! Render State Buckets
//!
//! Renderables that share one GPU pipeline configuration are grouped into a
//! bucket per rendering technique. The drawer issues one indirect draw per
//! non-empty bucket, so the bucket index doubles as the slot into every
//! per-bucket GPU array (indirect args, draw counts, instance ranges).
//!
//! ```text
//! technique ──► [bucket 0] [bucket 1] [bucket 2] ...   (creation order = slot)
//!                   │
//!                   └─ RenderStateInfo { program, topology, indexed }
//!                      user_count / meshlet_group_count / meshlet_count
//!
//! performance order: meshlet buckets → grouped by program → creation index
//! ```
//!
//! Buckets are never removed, only emptied, so slots stay stable across
//! frames. The container is `Clone`; renderers hold an `Arc` snapshot and the
//! scene mutates its own copy with `Arc::make_mut`.

use rustc_hash::FxHashMap;

use crate::renderer::core::gpu::ShaderProgramHandle;

/// Number of meshlets a single meshlet group (one task-shader workgroup)
/// covers.
pub const MESHLETS_PER_GROUP: u32 = 64;

/// Rendering technique a bucket set belongs to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(u8)]
pub enum RenderingTechnique {
    GBuffer = 0,
    Depth = 1,
    Forward = 2,
}

impl RenderingTechnique {
    pub const COUNT: usize = 3;
    pub const ALL: [Self; Self::COUNT] = [Self::GBuffer, Self::Depth, Self::Forward];

    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// The pipeline state a bucket shares.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct RenderStateInfo {
    pub program: ShaderProgramHandle,
    pub primitive_topology: wgpu::PrimitiveTopology,
    pub indexed_drawcall: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderStateBucket {
    pub state: RenderStateInfo,
    pub user_count: u32,
    pub meshlet_group_count: u32,
    pub meshlet_count: u32,
}

impl RenderStateBucket {
    #[inline]
    #[must_use]
    pub fn has_meshlets(&self) -> bool {
        self.meshlet_group_count > 0
    }
}

/// Returned by [`RenderStateBucketContainer::add_user`]; hand it back to
/// [`RenderStateBucketContainer::remove_user`].
#[derive(Debug, PartialEq, Eq)]
#[must_use]
pub struct RenderStateBucketIndex {
    technique: RenderingTechnique,
    bucket: u32,
    lod0_meshlet_count: u32,
}

impl RenderStateBucketIndex {
    #[inline]
    #[must_use]
    pub fn technique(&self) -> RenderingTechnique {
        self.technique
    }

    #[inline]
    #[must_use]
    pub fn bucket(&self) -> u32 {
        self.bucket
    }
}

#[derive(Clone, Debug, Default)]
struct TechniqueBuckets {
    buckets: Vec<RenderStateBucket>,
    lookup: FxHashMap<RenderStateInfo, u32>,
    performance_order: Vec<u32>,
}

impl TechniqueBuckets {
    fn refresh_performance_order(&mut self) {
        let buckets = &self.buckets;
        self.performance_order = (0..buckets.len() as u32).collect();
        self.performance_order.sort_by_key(|&i| {
            let bucket = &buckets[i as usize];
            (!bucket.has_meshlets(), bucket.state.program, i)
        });
    }
}

#[derive(Clone, Debug, Default)]
pub struct RenderStateBucketContainer {
    techniques: [TechniqueBuckets; RenderingTechnique::COUNT],
}

impl RenderStateBucketContainer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one renderable under `state`. A renderable with
    /// `lod0_meshlet_count > 0` is drawn through the meshlet paths.
    pub fn add_user(
        &mut self,
        technique: RenderingTechnique,
        state: RenderStateInfo,
        lod0_meshlet_count: u32,
    ) -> RenderStateBucketIndex {
        let set = &mut self.techniques[technique.index()];

        let (bucket_index, created) = match set.lookup.get(&state) {
            Some(&index) => (index, false),
            None => {
                let index = set.buckets.len() as u32;
                set.buckets.push(RenderStateBucket {
                    state,
                    user_count: 0,
                    meshlet_group_count: 0,
                    meshlet_count: 0,
                });
                set.lookup.insert(state, index);
                log::debug!("New render state bucket {index} for {technique:?}: {state:?}");
                (index, true)
            }
        };

        let bucket = &mut set.buckets[bucket_index as usize];
        let had_meshlets = bucket.has_meshlets();
        bucket.user_count += 1;
        bucket.meshlet_count += lod0_meshlet_count;
        bucket.meshlet_group_count += lod0_meshlet_count.div_ceil(MESHLETS_PER_GROUP);

        if created || had_meshlets != bucket.has_meshlets() {
            set.refresh_performance_order();
        }

        RenderStateBucketIndex {
            technique,
            bucket: bucket_index,
            lod0_meshlet_count,
        }
    }

    /// Unregisters a renderable. The bucket keeps its slot when it empties.
    pub fn remove_user(&mut self, index: RenderStateBucketIndex) {
        let set = &mut self.techniques[index.technique.index()];
        let bucket = &mut set.buckets[index.bucket as usize];
        debug_assert!(bucket.user_count > 0, "Bucket {} has no users", index.bucket);

        let had_meshlets = bucket.has_meshlets();
        bucket.user_count -= 1;
        bucket.meshlet_count -= index.lod0_meshlet_count;
        bucket.meshlet_group_count -= index.lod0_meshlet_count.div_ceil(MESHLETS_PER_GROUP);

        if had_meshlets != bucket.has_meshlets() {
            set.refresh_performance_order();
        }
    }

    /// Number of buckets (empty ones included) for `technique`.
    #[inline]
    #[must_use]
    pub fn bucket_count(&self, technique: RenderingTechnique) -> u32 {
        self.techniques[technique.index()].buckets.len() as u32
    }

    #[must_use]
    pub fn bucket(&self, technique: RenderingTechnique, index: u32) -> Option<&RenderStateBucket> {
        self.techniques[technique.index()]
            .buckets
            .get(index as usize)
    }

    /// Buckets as `(slot, bucket)` in the order that minimizes pipeline
    /// switches.
    pub fn buckets_performance_order(
        &self,
        technique: RenderingTechnique,
    ) -> impl Iterator<Item = (u32, &RenderStateBucket)> {
        let set = &self.techniques[technique.index()];
        set.performance_order
            .iter()
            .map(move |&i| (i, &set.buckets[i as usize]))
    }

    /// Total renderables across all buckets of `technique`.
    #[must_use]
    pub fn user_count(&self, technique: RenderingTechnique) -> u32 {
        self.techniques[technique.index()]
            .buckets
            .iter()
            .map(|b| b.user_count)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(program: u64, indexed: bool) -> RenderStateInfo {
        RenderStateInfo {
            program: ShaderProgramHandle(program),
            primitive_topology: wgpu::PrimitiveTopology::TriangleList,
            indexed_drawcall: indexed,
        }
    }

    #[test]
    fn same_state_shares_a_bucket() {
        let mut container = RenderStateBucketContainer::new();
        let a = container.add_user(RenderingTechnique::GBuffer, state(1, true), 0);
        let b = container.add_user(RenderingTechnique::GBuffer, state(1, true), 0);
        assert_eq!(a.bucket(), b.bucket());
        assert_eq!(container.bucket_count(RenderingTechnique::GBuffer), 1);
        assert_eq!(container.user_count(RenderingTechnique::GBuffer), 2);
        assert_eq!(container.bucket_count(RenderingTechnique::Depth), 0);
    }

    #[test]
    fn meshlet_counts_round_up_to_groups() {
        let mut container = RenderStateBucketContainer::new();
        let _ = container.add_user(RenderingTechnique::Forward, state(1, false), 65);
        let bucket = container.bucket(RenderingTechnique::Forward, 0).unwrap();
        assert_eq!(bucket.meshlet_count, 65);
        assert_eq!(bucket.meshlet_group_count, 2);
    }

    #[test]
    fn removing_last_user_keeps_the_slot() {
        let mut container = RenderStateBucketContainer::new();
        let idx = container.add_user(RenderingTechnique::Depth, state(4, true), 10);
        container.remove_user(idx);

        let bucket = container.bucket(RenderingTechnique::Depth, 0).unwrap();
        assert_eq!(bucket.user_count, 0);
        assert_eq!(bucket.meshlet_group_count, 0);
        assert_eq!(container.bucket_count(RenderingTechnique::Depth), 1);
    }

    #[test]
    fn performance_order_puts_meshlets_first_then_groups_programs() {
        let mut container = RenderStateBucketContainer::new();
        let t = RenderingTechnique::GBuffer;
        let _ = container.add_user(t, state(9, true), 0); // slot 0
        let _ = container.add_user(t, state(2, true), 0); // slot 1
        let _ = container.add_user(t, state(5, false), 128); // slot 2, meshlets
        let _ = container.add_user(t, state(2, false), 0); // slot 3

        let order: Vec<u32> = container.buckets_performance_order(t).map(|(i, _)| i).collect();
        assert_eq!(order, vec![2, 1, 3, 0]);
    }
}
