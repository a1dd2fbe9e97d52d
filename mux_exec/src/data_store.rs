//! # Data Store

use crate::arbiter::{self, Arbiter};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// True if this cycle falls on a 1Hz boundary
    pub is_1_hz_cycle: bool,

    /// Session elapsed time at the start of the cycle
    pub elapsed_s: f64,

    // Inbound staging
    /// Newest joystick command recieved this cycle, stamped at receipt
    pub joystick_cmd: Option<arbiter::Command>,

    /// Newest gap follow command recieved this cycle, stamped at receipt
    pub gap_follow_cmd: Option<arbiter::Command>,

    /// Newest gap follow enable state recieved this cycle, stamped at receipt
    pub gap_follow_enable: Option<arbiter::EnableSignal>,

    // Arbiter
    pub arbiter: Arbiter,
    pub arbiter_output: Option<arbiter::OutputData>,
    pub arbiter_status_rpt: arbiter::StatusReport,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Perform actions required at the start of a cycle.
    ///
    /// Clears the staging slots so each cycle only hands the arbiter messages which actually
    /// arrived during it, and sets the 1Hz cycle flag.
    pub fn cycle_start(&mut self, cycle_frequency_hz: f64) {
        if self.num_cycles % (cycle_frequency_hz as u128) == 0 {
            self.is_1_hz_cycle = true;
        } else {
            self.is_1_hz_cycle = false;
        }

        self.joystick_cmd = None;
        self.gap_follow_cmd = None;
        self.gap_follow_enable = None;

        self.arbiter_output = None;
        self.arbiter_status_rpt = arbiter::StatusReport::default();

        self.elapsed_s = util::session::get_elapsed_seconds();
    }
}
