//! Transient Uniform Pool
//!
//! Frame-scoped, append-only allocator for small GPU constant blocks (global
//! per-draw uniforms, per-pass parameters). Allocation only needs `&self` so
//! several recording threads can carve blocks out of the same frame
//! concurrently.
//!
//! # Design
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              TransientUniformPool                   │
//! │                                                     │
//! │  cursor:  AtomicU64   ←── bump pointer (aligned)    │
//! │  staging: Mutex<Vec<u8>>  ←── CPU mirror            │
//! │                                                     │
//! │  allocate_frame()   (record phase, &self)           │
//! │  upload_with()      (before submit, &self)          │
//! │  reset()            (frame retired, &self)          │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! Memory handed out in frame N is never reused before [`reset`] is called,
//! which the owner does only once the GPU has consumed frame N.
//!
//! [`reset`]: TransientUniformPool::reset

use std::sync::atomic::{AtomicU64, Ordering};

use bytemuck::Pod;
use parking_lot::Mutex;

use crate::errors::{OrreryError, Result};
use crate::renderer::core::gpu::{BufferHandle, BufferView};

pub struct TransientUniformPool {
    buffer: BufferHandle,
    capacity: u64,
    alignment: u64,
    cursor: AtomicU64,
    staging: Mutex<Vec<u8>>,
}

impl TransientUniformPool {
    /// Creates a pool backed by `buffer`, which must be at least `capacity`
    /// bytes and bindable as a uniform buffer.
    ///
    /// # Panics
    ///
    /// Panics if `alignment` is not a power of two.
    #[must_use]
    pub fn new(buffer: BufferHandle, capacity: u64, alignment: u64) -> Self {
        assert!(
            alignment.is_power_of_two(),
            "Transient uniform alignment must be a power of two, got {alignment}"
        );
        Self {
            buffer,
            capacity,
            alignment,
            cursor: AtomicU64::new(0),
            staging: Mutex::new(Vec::new()),
        }
    }

    // ── Record phase (&self) ───────────────────────────────────────────────

    /// Allocates a block for one value and writes it.
    pub fn allocate_frame<T: Pod>(&self, value: &T) -> Result<BufferView> {
        self.allocate_bytes(bytemuck::bytes_of(value))
    }

    /// Allocates a contiguous block for a slice of values and writes it.
    pub fn allocate_frame_slice<T: Pod>(&self, values: &[T]) -> Result<BufferView> {
        self.allocate_bytes(bytemuck::cast_slice(values))
    }

    fn allocate_bytes(&self, bytes: &[u8]) -> Result<BufferView> {
        let size = bytes.len() as u64;
        let aligned = size.max(1).next_multiple_of(self.alignment);
        let capacity = self.capacity;

        let offset = self
            .cursor
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current + aligned <= capacity).then_some(current + aligned)
            })
            .map_err(|_| OrreryError::TransientPoolExhausted {
                requested: aligned,
                capacity,
            })?;

        let start = offset as usize;
        let end = start + bytes.len();
        {
            let mut staging = self.staging.lock();
            if staging.len() < end {
                staging.resize(end, 0);
            }
            staging[start..end].copy_from_slice(bytes);
        }

        Ok(BufferView::new(self.buffer, offset, size))
    }

    /// Hands the bytes written so far to the backend for upload.
    pub fn upload_with<F>(&self, upload: F)
    where
        F: FnOnce(BufferHandle, &[u8]),
    {
        let staging = self.staging.lock();
        let used = (self.used() as usize).min(staging.len());
        upload(self.buffer, &staging[..used]);
    }

    /// Bytes consumed in the current frame, alignment padding included.
    #[must_use]
    pub fn used(&self) -> u64 {
        self.cursor.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    #[must_use]
    pub fn buffer(&self) -> BufferHandle {
        self.buffer
    }

    // ── Frame boundary ─────────────────────────────────────────────────────

    /// Makes the whole pool available again.
    ///
    /// Call only after the GPU has finished with every view handed out since
    /// the previous reset, and never concurrently with an allocation.
    pub fn reset(&self) {
        let mut staging = self.staging.lock();
        self.cursor.store(0, Ordering::Release);
        staging.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn allocations_are_aligned_and_disjoint() {
        let pool = TransientUniformPool::new(BufferHandle(3), 1024, 256);
        let a = pool.allocate_frame(&[1.0f32; 4]).unwrap();
        let b = pool.allocate_frame(&7u32).unwrap();

        assert_eq!(a.offset, 0);
        assert_eq!(a.range, 16);
        assert_eq!(b.offset, 256);
        assert_eq!(b.range, 4);
        assert_eq!(pool.used(), 512);
    }

    #[test]
    fn exhaustion_reports_error_and_leaves_cursor() {
        let pool = TransientUniformPool::new(BufferHandle(3), 512, 256);
        pool.allocate_frame(&0u32).unwrap();
        pool.allocate_frame(&0u32).unwrap();

        let err = pool.allocate_frame(&0u32).unwrap_err();
        assert!(matches!(
            err,
            OrreryError::TransientPoolExhausted {
                requested: 256,
                capacity: 512
            }
        ));
        assert_eq!(pool.used(), 512);
    }

    #[test]
    fn reset_rewinds_the_frame() {
        let pool = TransientUniformPool::new(BufferHandle(3), 512, 256);
        pool.allocate_frame(&0u64).unwrap();
        pool.reset();
        assert_eq!(pool.used(), 0);
        assert_eq!(pool.allocate_frame(&0u64).unwrap().offset, 0);
    }

    #[test]
    fn uploaded_bytes_match_written_values() {
        let pool = TransientUniformPool::new(BufferHandle(9), 1024, 16);
        let view = pool.allocate_frame(&[0xAABB_CCDDu32, 5]).unwrap();

        pool.upload_with(|buffer, bytes| {
            assert_eq!(buffer, BufferHandle(9));
            let words: &[u32] = bytemuck::cast_slice(&bytes[view.offset as usize..view.end() as usize]);
            assert_eq!(words, &[0xAABB_CCDD, 5]);
        });
    }

    #[test]
    fn concurrent_allocations_never_overlap() {
        let pool = Arc::new(TransientUniformPool::new(BufferHandle(1), 64 * 1024, 64));

        let handles: Vec<_> = (0..4u32)
            .map(|t| {
                let pool = Arc::clone(&pool);
                std::thread::spawn(move || {
                    (0..32u32)
                        .map(|i| pool.allocate_frame(&(t * 100 + i)).unwrap().offset)
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut offsets: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        offsets.sort_unstable();
        offsets.dedup();
        assert_eq!(offsets.len(), 128);
        assert!(offsets.iter().all(|o| o % 64 == 0));
    }
}
