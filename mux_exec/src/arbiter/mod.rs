//! Command arbitration module
//!
//! The arbiter buffers the most recent command from each source, expires commands and the gap
//! follow enable gate when they go stale, and selects the single command driven to the vehicle
//! each cycle by fixed priority: joystick first, gap follow while the gate is enabled, safe stop
//! otherwise.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during Arbiter processing.
///
/// There are none: missing, late, or stale inputs are states folded into the selection policy,
/// and the worst case output is the safe stop command.
#[derive(Debug, thiserror::Error)]
pub enum ArbiterError {}
