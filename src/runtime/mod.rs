//! Block runtime
//!
//! The renderer performs the render-time work the compiled templates call
//! into, and `BlockEngine` wires every pipeline stage together.

pub mod engine;
pub mod renderer;

pub use engine::{BlockEngine, BlockEngineBuilder, CompiledTemplate};
pub use renderer::{RenderError, Renderer};

use serde::{Deserialize, Serialize};

/// Which code path templates are compiled and rendered for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Regular page rendering
    #[default]
    Live,
    /// Live editing: editor markers, disabled-block placeholders, scripts
    Preview,
}

impl RenderMode {
    pub fn is_preview(self) -> bool {
        self == RenderMode::Preview
    }
}
