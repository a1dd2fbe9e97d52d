//! Implementations for the Arbiter state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

// Internal
use super::{ArbiterError, Params};
use comms_if::drive::DriveCmd;
use util::{
    module::State,
    params,
    session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Command arbitration module state
#[derive(Default)]
pub struct Arbiter {

    pub(crate) params: Params,

    pub(crate) report: StatusReport,

    /// Most recent joystick command, or `None` if none has arrived or the last one was
    /// discarded as stale.
    pub(crate) joystick_slot: Option<Command>,

    /// Most recent gap follow command, or `None` if none has arrived or the last one was
    /// discarded as stale.
    pub(crate) gap_follow_slot: Option<Command>,

    /// Most recent enable signal, as recieved.
    pub(crate) last_enable: Option<EnableSignal>,

    /// Whether gap follow commands are currently allowed through. Tracks
    /// `last_enable.enabled` until the enable timeout forces it off.
    pub(crate) gap_follow_enabled: bool,
}

/// A drive demand buffered from one of the command sources.
#[derive(Clone, Copy, Debug)]
pub struct Command {
    /// The demanded motion values.
    pub drive: DriveCmd,

    /// Monotonic time the command was captured at.
    pub timestamp: Instant,
}

/// The gap follow activation state at a known instant.
#[derive(Clone, Copy, Debug)]
pub struct EnableSignal {
    /// True if gap follow commands may be driven to the vehicle.
    pub enabled: bool,

    /// Monotonic time the state was captured at.
    pub timestamp: Instant,
}

/// Input data to the Arbiter.
///
/// The command and enable fields hold the newest message recieved on each channel since the
/// previous cycle, or `None` if nothing arrived. Only the newest value matters, anything older
/// was superseded before this cycle saw it.
#[derive(Debug)]
pub struct InputData {
    pub joystick_cmd: Option<Command>,

    pub gap_follow_cmd: Option<Command>,

    pub gap_follow_enable: Option<EnableSignal>,

    /// The instant this cycle's arbitration is evaluated at.
    pub now: Instant,
}

/// Output command to be driven to the vehicle.
#[derive(Clone, Copy, Debug)]
pub struct OutputData {
    /// The selected motion values.
    pub drive: DriveCmd,

    /// The instant the command was selected at.
    pub timestamp: Instant,
}

/// Status report for Arbiter processing.
#[derive(Clone, Copy, Serialize, Deserialize, Debug)]
pub struct StatusReport {
    /// The source whose command was emitted this cycle.
    pub selected: SelectedSource,

    /// True on the cycle a buffered joystick command was discarded as stale.
    pub joystick_expired: bool,

    /// True on the cycle a buffered gap follow command was discarded as stale.
    pub gap_follow_expired: bool,

    /// True on the cycle the enable gate was forced off by the enable timeout.
    pub enable_expired: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The source selected to drive the vehicle on a cycle.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum SelectedSource {
    /// The joystick slot was occupied.
    Joystick,

    /// The joystick slot was empty, the gap follow slot was occupied and the gate enabled.
    GapFollow,

    /// Neither source was eligible, the zero command was emitted.
    SafeStop,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for Arbiter {
    type InitData = &'static str;
    type InitError = params::LoadError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = ArbiterError;

    /// Initialise the Arbiter module.
    ///
    /// Expected init data is the path to the parameter file
    fn init(&mut self, init_data: Self::InitData, _session: &Session)
        -> Result<(), Self::InitError>
    {
        // Load the parameters
        self.params = params::load(init_data)?;

        // The slots start empty and the gate disabled, which the Default impl has already
        // given us.

        Ok(())
    }

    /// Perform cyclic processing of command arbitration.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        // Apply the inputs which arrived since the last cycle
        if let Some(cmd) = input_data.joystick_cmd {
            self.update_joystick(cmd);
        }
        if let Some(cmd) = input_data.gap_follow_cmd {
            self.update_gap_follow(cmd);
        }
        if let Some(sig) = input_data.gap_follow_enable {
            self.update_enable(sig);
        }

        // Evaluate the arbitration rules
        let output = self.tick(input_data.now);

        Ok((output, self.report))
    }
}

impl Arbiter {

    /// Buffer a new joystick command, replacing any previous one.
    ///
    /// The command is not validated here, staleness is only evaluated at tick time.
    pub fn update_joystick(&mut self, cmd: Command) {
        self.joystick_slot = Some(cmd);
    }

    /// Buffer a new gap follow command, replacing any previous one.
    pub fn update_gap_follow(&mut self, cmd: Command) {
        self.gap_follow_slot = Some(cmd);
    }

    /// Take on a new enable state, replacing any previous one.
    ///
    /// A disable takes effect at the next tick. An enable holds until the signal goes
    /// unrefreshed for longer than the enable staleness window.
    pub fn update_enable(&mut self, sig: EnableSignal) {
        self.last_enable = Some(sig);
        self.gap_follow_enabled = sig.enabled;
    }

    /// Evaluate the arbitration rules at `now`, producing the command to drive to the vehicle.
    ///
    /// Always produces exactly one output, falling through to the safe stop command if neither
    /// source is eligible. Timestamps later than `now` count as age zero.
    pub fn tick(&mut self, now: Instant) -> OutputData {
        // Clear the status report
        self.report = StatusReport::default();

        let cmd_window = Duration::from_secs_f64(self.params.cmd_staleness_window_s);
        let enable_window = Duration::from_secs_f64(self.params.enable_staleness_window_s);

        // Make sure the enable gate has been refreshed within its window. The timeout only ever
        // disables the gate, a fresh signal is needed to re-enable it.
        if self.gap_follow_enabled {
            if let Some(sig) = self.last_enable {
                if now.saturating_duration_since(sig.timestamp) > enable_window {
                    self.gap_follow_enabled = false;
                    self.report.enable_expired = true;
                }
            }
        }

        // Erase stale commands
        if expire_slot(&mut self.joystick_slot, now, cmd_window) {
            self.report.joystick_expired = true;
        }
        if expire_slot(&mut self.gap_follow_slot, now, cmd_window) {
            self.report.gap_follow_expired = true;
        }

        // Select the output by fixed priority. The selection never inspects the motion values,
        // a neutral joystick command is still a joystick command.
        let (drive, selected) = match (
            self.joystick_slot,
            self.gap_follow_slot,
            self.gap_follow_enabled,
        ) {
            (Some(cmd), _, _) => (cmd.drive, SelectedSource::Joystick),
            (None, Some(cmd), true) => (cmd.drive, SelectedSource::GapFollow),
            _ => (DriveCmd::STOP, SelectedSource::SafeStop),
        };

        self.report.selected = selected;

        trace!("Arbiter output ({:?}): {:?}", selected, drive);

        OutputData {
            drive,
            timestamp: now,
        }
    }
}

impl Default for StatusReport {
    fn default() -> Self {
        Self {
            selected: SelectedSource::SafeStop,
            joystick_expired: false,
            gap_follow_expired: false,
            enable_expired: false,
        }
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Clear the slot if its command is older than the staleness window at `now`.
///
/// Returns true if a command was discarded.
fn expire_slot(slot: &mut Option<Command>, now: Instant, window: Duration) -> bool {
    match slot {
        Some(cmd) if now.saturating_duration_since(cmd.timestamp) > window => {
            *slot = None;
            true
        }
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    /// Staleness window used by the tests, matching the default parameters.
    const WINDOW: Duration = Duration::from_secs(1);

    fn arbiter() -> Arbiter {
        // Default params carry the deployed staleness windows
        Arbiter::default()
    }

    fn cmd(steering_angle_rad: f64, speed_ms: f64, timestamp: Instant) -> Command {
        Command {
            drive: DriveCmd {
                steering_angle_rad,
                speed_ms,
            },
            timestamp,
        }
    }

    fn enable(enabled: bool, timestamp: Instant) -> EnableSignal {
        EnableSignal { enabled, timestamp }
    }

    #[test]
    fn test_joystick_has_priority() {
        let mut arb = arbiter();
        let t0 = Instant::now();

        arb.update_joystick(cmd(0.1, 2.0, t0));
        arb.update_gap_follow(cmd(0.2, 1.0, t0));
        arb.update_enable(enable(true, t0));

        let out = arb.tick(t0);

        assert_eq!(
            out.drive,
            DriveCmd {
                steering_angle_rad: 0.1,
                speed_ms: 2.0
            }
        );
        assert_eq!(arb.report.selected, SelectedSource::Joystick);
    }

    #[test]
    fn test_neutral_joystick_still_has_priority() {
        // A joystick command equal to the stop command is an occupied slot, not an absence
        let mut arb = arbiter();
        let t0 = Instant::now();

        arb.update_joystick(cmd(0.0, 0.0, t0));
        arb.update_gap_follow(cmd(0.2, 1.0, t0));
        arb.update_enable(enable(true, t0));

        let out = arb.tick(t0);

        assert_eq!(out.drive, DriveCmd::STOP);
        assert_eq!(arb.report.selected, SelectedSource::Joystick);
    }

    #[test]
    fn test_gap_follow_needs_enable() {
        let mut arb = arbiter();
        let t0 = Instant::now();

        arb.update_gap_follow(cmd(0.2, 1.0, t0));

        // Gate never enabled, expect safe stop
        let out = arb.tick(t0);
        assert_eq!(out.drive, DriveCmd::STOP);
        assert_eq!(arb.report.selected, SelectedSource::SafeStop);

        // Enable, expect passthrough
        arb.update_enable(enable(true, t0));
        let out = arb.tick(t0);
        assert_eq!(out.drive.speed_ms, 1.0);
        assert_eq!(arb.report.selected, SelectedSource::GapFollow);

        // An explicit disable takes effect at the next tick
        arb.update_enable(enable(false, t0));
        let out = arb.tick(t0);
        assert_eq!(out.drive, DriveCmd::STOP);
        assert_eq!(arb.report.selected, SelectedSource::SafeStop);
    }

    #[test]
    fn test_safe_stop_when_empty() {
        let mut arb = arbiter();

        let out = arb.tick(Instant::now());

        assert_eq!(out.drive, DriveCmd::STOP);
        assert_eq!(arb.report.selected, SelectedSource::SafeStop);
    }

    #[test]
    fn test_newest_command_wins() {
        let mut arb = arbiter();
        let t0 = Instant::now();

        arb.update_joystick(cmd(0.1, 2.0, t0));
        arb.update_joystick(cmd(-0.1, 0.5, t0));

        let out = arb.tick(t0);

        assert_eq!(
            out.drive,
            DriveCmd {
                steering_angle_rad: -0.1,
                speed_ms: 0.5
            }
        );
    }

    #[test]
    fn test_command_expiry_at_use() {
        let mut arb = arbiter();
        let t0 = Instant::now();

        arb.update_joystick(cmd(0.1, 2.0, t0));

        // In window, including the boundary itself
        let out = arb.tick(t0 + WINDOW);
        assert_eq!(arb.report.selected, SelectedSource::Joystick);
        assert_eq!(out.drive.speed_ms, 2.0);
        assert!(!arb.report.joystick_expired);

        // Just past the window the slot is discarded
        let out = arb.tick(t0 + WINDOW + Duration::from_millis(1));
        assert_eq!(out.drive, DriveCmd::STOP);
        assert_eq!(arb.report.selected, SelectedSource::SafeStop);
        assert!(arb.report.joystick_expired);

        // The expiry flag is only raised on the cycle of the discard
        arb.tick(t0 + WINDOW + Duration::from_millis(21));
        assert!(!arb.report.joystick_expired);
    }

    #[test]
    fn test_timestamps_trusted_as_given() {
        let mut arb = arbiter();
        let t0 = Instant::now();
        let now = t0 + Duration::from_secs(2);

        // A command carrying an old capture timestamp expires relative to that timestamp, not
        // to when it was buffered
        arb.update_joystick(cmd(0.1, 2.0, t0 + Duration::from_millis(500)));
        let out = arb.tick(now);
        assert_eq!(out.drive, DriveCmd::STOP);
        assert!(arb.report.joystick_expired);

        // A timestamp later than the tick instant counts as age zero
        arb.update_joystick(cmd(0.1, 2.0, now + Duration::from_secs(3)));
        let out = arb.tick(now);
        assert_eq!(arb.report.selected, SelectedSource::Joystick);
        assert_eq!(out.drive.speed_ms, 2.0);
    }

    #[test]
    fn test_enable_timeout_is_one_directional() {
        let mut arb = arbiter();
        let t0 = Instant::now();

        arb.update_enable(enable(true, t0));

        // Keep the gap follow command fresh so only the gate is under test
        arb.update_gap_follow(cmd(0.2, 1.0, t0 + Duration::from_millis(900)));
        arb.tick(t0 + Duration::from_millis(999));
        assert_eq!(arb.report.selected, SelectedSource::GapFollow);

        // Gate unrefreshed past its window, reverts to disabled
        arb.update_gap_follow(cmd(0.2, 1.0, t0 + Duration::from_millis(1000)));
        let out = arb.tick(t0 + Duration::from_millis(1001));
        assert_eq!(out.drive, DriveCmd::STOP);
        assert_eq!(arb.report.selected, SelectedSource::SafeStop);
        assert!(arb.report.enable_expired);

        // No amount of fresh commands turns the gate back on
        arb.update_gap_follow(cmd(0.2, 1.0, t0 + Duration::from_millis(1100)));
        arb.tick(t0 + Duration::from_millis(1200));
        assert_eq!(arb.report.selected, SelectedSource::SafeStop);
        assert!(!arb.report.enable_expired);
    }

    #[test]
    fn test_disable_is_never_auto_reverted() {
        let mut arb = arbiter();
        let t0 = Instant::now();

        arb.update_enable(enable(false, t0));

        // The gate stays off no matter how stale the false signal becomes
        arb.update_gap_follow(cmd(0.2, 1.0, t0 + Duration::from_millis(1900)));
        let out = arb.tick(t0 + Duration::from_secs(2));
        assert_eq!(out.drive, DriveCmd::STOP);
        assert_eq!(arb.report.selected, SelectedSource::SafeStop);
        assert!(!arb.report.enable_expired);
    }

    #[test]
    fn test_joystick_dropout_scenario() {
        // Joystick command and enable at t=0, no gap follow. Passthrough for every tick up to
        // the staleness window, safe stop afterwards.
        let mut arb = arbiter();
        let t0 = Instant::now();

        arb.update_joystick(cmd(0.1, 2.0, t0));
        arb.update_enable(enable(true, t0));

        let mut t = t0;
        while t <= t0 + WINDOW {
            let out = arb.tick(t);
            assert_eq!(
                out.drive,
                DriveCmd {
                    steering_angle_rad: 0.1,
                    speed_ms: 2.0
                }
            );
            t += Duration::from_millis(20);
        }

        let out = arb.tick(t0 + Duration::from_millis(1020));
        assert_eq!(out.drive, DriveCmd::STOP);
    }

    #[test]
    fn test_gap_follow_dropout_scenario() {
        // Gap follow command and enable at t=0, never refreshed. The command and the gate both
        // expire one window later.
        let mut arb = arbiter();
        let t0 = Instant::now();

        arb.update_gap_follow(cmd(0.2, 1.0, t0));
        arb.update_enable(enable(true, t0));

        let mut t = t0;
        while t <= t0 + WINDOW {
            let out = arb.tick(t);
            assert_eq!(
                out.drive,
                DriveCmd {
                    steering_angle_rad: 0.2,
                    speed_ms: 1.0
                }
            );
            t += Duration::from_millis(20);
        }

        let out = arb.tick(t0 + Duration::from_millis(1020));
        assert_eq!(out.drive, DriveCmd::STOP);
        assert!(arb.report.gap_follow_expired);
        assert!(arb.report.enable_expired);
    }

    #[test]
    fn test_refreshed_gap_follow_runs_indefinitely() {
        // Command and enable refreshed every 500 ms, joystick never sent: continuous
        // passthrough, the gate never reaches its window unrefreshed.
        let mut arb = arbiter();
        let t0 = Instant::now();

        for i in 0..12u64 {
            let t = t0 + Duration::from_millis(i * 500);
            arb.update_gap_follow(cmd(0.2, 1.0, t));
            arb.update_enable(enable(true, t));

            let out = arb.tick(t + Duration::from_millis(10));
            assert_eq!(arb.report.selected, SelectedSource::GapFollow);
            assert_eq!(out.drive.speed_ms, 1.0);
        }
    }

    #[test]
    fn test_proc_applies_staged_inputs() {
        let mut arb = arbiter();
        let t0 = Instant::now();

        let input = InputData {
            joystick_cmd: None,
            gap_follow_cmd: Some(cmd(0.2, 1.0, t0)),
            gap_follow_enable: Some(enable(true, t0)),
            now: t0 + Duration::from_millis(20),
        };

        let (out, report) = arb.proc(&input).unwrap();
        assert_eq!(out.drive.speed_ms, 1.0);
        assert_eq!(out.timestamp, input.now);
        assert_eq!(report.selected, SelectedSource::GapFollow);

        // Slots persist between cycles without new input
        let input = InputData {
            joystick_cmd: None,
            gap_follow_cmd: None,
            gap_follow_enable: None,
            now: t0 + Duration::from_millis(40),
        };

        let (out, report) = arb.proc(&input).unwrap();
        assert_eq!(out.drive.speed_ms, 1.0);
        assert_eq!(report.selected, SelectedSource::GapFollow);
    }
}
