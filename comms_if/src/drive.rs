//! # Drive command messages
//!
//! These are the messages exchanged between the command sources (joystick
//! teleoperation and the gap follow controller), the mux, and the vehicle.
//! All messages are serialised as JSON strings on the wire.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A demanded motion of the vehicle.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct DriveCmd {
    /// The demanded steering angle of the front axle.
    ///
    /// Follows the right hand rule about the vehicle's Z+ (upwards) axis, so that positive angles
    /// steer to the left and negative angles to the right.
    ///
    /// Units: radians
    pub steering_angle_rad: f64,

    /// The demanded speed of the vehicle body over the terrain.
    ///
    /// Positive speeds are "forwards", negative speeds are "backwards".
    ///
    /// Units: meters/second
    pub speed_ms: f64,
}

/// A [`DriveCmd`] together with the wall clock time at which its source produced it.
///
/// The stamp is observability data (used to log message ages), staleness decisions inside the mux
/// are made against the monotonic receipt time.
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct StampedDriveCmd {
    /// Wall clock production time of the command.
    pub stamp: DateTime<Utc>,

    /// The demanded motion.
    pub drive: DriveCmd,
}

/// Activation state of the gap follow controller.
///
/// Sources must refresh this message periodically, the mux reverts to "disabled" if it goes
/// unrefreshed for longer than the enable staleness window.
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct EnableMsg {
    /// True if gap follow commands may be driven to the vehicle.
    pub enabled: bool,
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl DriveCmd {
    /// The safe stop command: zero steering angle and zero speed.
    pub const STOP: DriveCmd = DriveCmd {
        steering_angle_rad: 0.0,
        speed_ms: 0.0,
    };
}

impl Default for DriveCmd {
    fn default() -> Self {
        DriveCmd::STOP
    }
}

impl StampedDriveCmd {
    /// Stamp the given demand with the current wall clock time.
    pub fn now(drive: DriveCmd) -> Self {
        Self {
            stamp: Utc::now(),
            drive,
        }
    }
}
