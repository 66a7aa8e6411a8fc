//! Records the driver appends to its output stream.

use crate::diagnostics::Totals;
use crate::Float;
use serde_derive::{Deserialize, Serialize};

/// Captures values that can be outputed during a run. Not every field is
/// filled at every step, which is reflected in the Option type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputEntry {
    pub timestep: usize,
    pub time: Float,
    pub dt: Float,
    pub totals: Option<Totals>,
    pub max_div_b: Option<Float>,
}
