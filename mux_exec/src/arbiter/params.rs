//! Parameters structure for the Arbiter

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for command arbitration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Params {

    /// Maximum age a buffered source command may reach before it is discarded. Ages are
    /// evaluated against the tick instant, not the receipt instant.
    ///
    /// Units: seconds
    pub cmd_staleness_window_s: f64,

    /// Maximum age the enable gate may reach unrefreshed before it reverts to disabled.
    ///
    /// Units: seconds
    pub enable_staleness_window_s: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            cmd_staleness_window_s: 1.0,
            enable_staleness_window_s: 1.0,
        }
    }
}
