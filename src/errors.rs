//! Error Types
//!
//! This module defines the error types used throughout the renderer core.
//!
//! # Overview
//!
//! The main error type [`OrreryError`] covers the recoverable failure modes:
//! - Shader program loading failures (fatal to the owning subsystem)
//! - GPU resource creation failures
//! - Render graph declaration errors (cycles, stale handles)
//! - Transient memory exhaustion
//!
//! Caller contract violations (zero viewport, missing directional light while
//! the sky is enabled) are assertions, not errors.
//!
//! # Usage
//!
//! All fallible APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, OrreryError>`.
//!
//! ```rust,ignore
//! use orrery::errors::{OrreryError, Result};
//!
//! fn compile_frame(graph: RenderGraphBuilder) -> Result<CompiledRenderGraph> {
//!     graph.compile()
//! }
//! ```

use thiserror::Error;

/// The main error type for the renderer core.
#[derive(Error, Debug)]
pub enum OrreryError {
    // ========================================================================
    // Initialization Errors
    // ========================================================================
    /// A shader program (or one of its techniques) failed to load.
    #[error("Failed to load shader program '{program}' (technique '{technique}'): {reason}")]
    ShaderProgramLoad {
        /// Program binary path
        program: String,
        /// Technique / entry variant inside the binary
        technique: String,
        /// Backend supplied reason
        reason: String,
    },

    /// A GPU resource (texture, sampler, buffer) could not be created.
    #[error("Failed to create GPU resource '{name}': {reason}")]
    ResourceCreation {
        /// Debug name of the resource
        name: String,
        /// Backend supplied reason
        reason: String,
    },

    /// The subsystem was left uninitialized and cannot service requests.
    #[error("Subsystem disabled: {0}")]
    SubsystemDisabled(&'static str),

    // ========================================================================
    // Render Graph Errors
    // ========================================================================
    /// The declared dependencies form a cycle.
    #[error("Circular dependency in render graph involving pass '{pass}'")]
    CyclicPassDependency {
        /// Name of a pass that participates in the cycle
        pass: String,
    },

    /// A pass handle does not belong to the graph it was used with.
    #[error("Invalid pass handle: {0}")]
    InvalidPassHandle(u32),

    /// A resource handle does not belong to the graph it was used with.
    #[error("Invalid resource handle: {0}")]
    InvalidResourceHandle(u32),

    // ========================================================================
    // Memory Errors
    // ========================================================================
    /// The frame-scoped transient uniform pool ran out of space.
    #[error("Transient uniform pool exhausted: requested {requested} bytes, capacity {capacity} bytes")]
    TransientPoolExhausted {
        /// Size of the failed allocation (after alignment)
        requested: u64,
        /// Total pool capacity
        capacity: u64,
    },
}

/// Alias for `Result<T, OrreryError>`.
pub type Result<T> = std::result::Result<T, OrreryError>;
