//! # Communications interface crate.
//!
//! Provides all common communications interfaces for the drive mux software.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Drive command and enable gate message definitions
pub mod drive;

/// Network module
pub mod net;
