//! Subsystems that populate the render graph.
//!
//! - [`sky`]: atmospheric LUT generation and sun color
//! - [`lut_state`]: change detection gating the sky passes
//! - [`mdi`]: indirect multi-draw batches of the [`RenderableDrawer`]
//!
//! [`RenderableDrawer`]: crate::renderer::drawer::RenderableDrawer

pub mod lut_state;
pub mod mdi;
pub mod sky;

pub use lut_state::{LutFramePlan, LutGenerationState, LutRegenPlan};
pub use mdi::{MdiPassRequest, populate_mdi_pass};
pub use sky::Sky;
