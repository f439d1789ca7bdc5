//! Renderer Settings
//!
//! Configuration consumed once by [`Renderer::new`](super::Renderer::new).
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use orrery::{RendererSettings, SkySettings};
//!
//! // Defaults: statistics off, sky enabled
//! let settings = RendererSettings::default();
//!
//! // Profiling build without the atmosphere
//! let settings = RendererSettings {
//!     statistics: true,
//!     sky: SkySettings { enabled: false, ..Default::default() },
//!     ..Default::default()
//! };
//! ```

// ---------------------------------------------------------------------------
// SkySettings
// ---------------------------------------------------------------------------

/// Atmospheric sky configuration.
///
/// | Field           | Description                                 | Default                      |
/// |-----------------|---------------------------------------------|------------------------------|
/// | `enabled`       | Create the sky subsystem at all             | `true`                       |
/// | `shader_binary` | Program binary holding the four LUT kernels | `shaders/sky.wgsl` |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkySettings {
    /// When `false` the sky is never initialized and reports itself disabled.
    pub enabled: bool,

    /// Path of the compiled program binary, resolved by the [`GpuDevice`].
    ///
    /// [`GpuDevice`]: crate::renderer::core::GpuDevice
    pub shader_binary: String,
}

impl Default for SkySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            shader_binary: "shaders/sky.wgsl".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// RendererSettings
// ---------------------------------------------------------------------------

/// Global configuration for renderer initialization.
///
/// # Fields
///
/// | Field                         | Description                                   | Default  |
/// |-------------------------------|-----------------------------------------------|----------|
/// | `statistics`                  | Wrap draw batches in pipeline queries         | `false`  |
/// | `transient_uniform_capacity`  | Bytes of frame-scoped uniform memory          | 4 MiB    |
/// | `transient_uniform_alignment` | Alignment of each transient allocation        | `256`    |
/// | `sky`                         | Atmospheric sky configuration                 | enabled  |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererSettings {
    // === Instrumentation ===
    /// Collect GPU pipeline statistics (primitives passed clipping) for
    /// every MDI batch. Ignored when the device lacks pipeline queries.
    pub statistics: bool,

    // === Memory ===
    /// Size in bytes of the transient uniform pool. Every `set_state` call
    /// consumes one aligned global uniform block.
    pub transient_uniform_capacity: u64,

    /// Alignment of transient uniform blocks. Must be a power of two and at
    /// least the device's minimum uniform buffer offset alignment.
    pub transient_uniform_alignment: u64,

    // === Subsystems ===
    pub sky: SkySettings,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            statistics: false,
            transient_uniform_capacity: 4 * 1024 * 1024,
            transient_uniform_alignment: 256,
            sky: SkySettings::default(),
        }
    }
}
