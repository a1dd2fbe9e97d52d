//! Main mux executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop (fixed 20 ms cycle):
//!         - System input acquisition:
//!             - Joystick commands
//!             - Gap follow commands
//!             - Gap follow enable gate
//!         - Command arbitration processing
//!         - Drive command output
//!         - Telemetry output
//!
//! # Modules
//!
//! All modules (e.g. `arbiter`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::State` trait.
//!

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use mux_lib::{
    arbiter::{self, Command, EnableSignal},
    cmd_sub::CmdSub,
    data_store::DataStore,
    drive_pub::DrivePub,
    enable_sub::EnableSub,
    tm_server::TmServer,
};

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use chrono::Utc;
use color_eyre::{eyre::WrapErr, Report};
use log::{debug, info, warn};
use std::thread;
use std::time::{Duration, Instant};

// Internal
use comms_if::{
    drive::{DriveCmd, StampedDriveCmd},
    net::NetParams,
};
use util::{
    host,
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target period of one cycle.
const CYCLE_PERIOD_S: f64 = 0.02;

/// Number of cycles per second
const CYCLE_FREQUENCY_HZ: f64 = 1.0 / CYCLE_PERIOD_S;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "mux_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Drive Mux Executable\n");
    info!(
        "Running on: {:#?}",
        host::get_uname().wrap_err("Failed to get host information")?
    );
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let net_params: NetParams = util::params::load(
        "net.toml"
    ).wrap_err("Could not load net params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE DATASTORE ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    // ---- INITIALISE MODULES ----

    ds.arbiter.init("arbiter.toml", &session)
        .wrap_err("Failed to initialise Arbiter")?;
    info!("Arbiter init complete");

    info!("Module initialisation complete\n");

    // ---- INITIALISE NETWORK ----

    info!("Initialising network");

    let zmq_ctx = comms_if::net::zmq::Context::new();

    let joystick_sub = CmdSub::new(&zmq_ctx, &net_params.joystick_cmd_endpoint)
        .wrap_err("Failed to initialise the joystick CmdSub")?;
    info!("Joystick CmdSub initialised");

    let gap_follow_sub = CmdSub::new(&zmq_ctx, &net_params.gap_follow_cmd_endpoint)
        .wrap_err("Failed to initialise the gap follow CmdSub")?;
    info!("Gap follow CmdSub initialised");

    let enable_sub = EnableSub::new(&zmq_ctx, &net_params)
        .wrap_err("Failed to initialise the EnableSub")?;
    info!("EnableSub initialised");

    let mut drive_pub = DrivePub::new(&zmq_ctx, &net_params)
        .wrap_err("Failed to initialise the DrivePub")?;
    info!("DrivePub initialised");

    let mut tm_server = TmServer::new(&zmq_ctx, &net_params)
        .wrap_err("Failed to initialise the TmServer")?;
    info!("TmServer initialised");

    info!("Network initialisation complete");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    loop {

        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start(CYCLE_FREQUENCY_HZ);

        // ---- DATA INPUT ----

        // Each channel is drained to its newest message, which is stamped with the monotonic
        // receipt time. Staleness is judged against these stamps at tick time.
        match joystick_sub.recv_latest() {
            Ok(Some(cmd)) => {
                log_cmd_age("Joystick", &cmd);
                ds.joystick_cmd = Some(Command {
                    drive: cmd.drive,
                    timestamp: Instant::now(),
                });
            }
            Ok(None) => (),
            Err(e) => warn!("Joystick CmdSub error: {}", e),
        }

        match gap_follow_sub.recv_latest() {
            Ok(Some(cmd)) => {
                log_cmd_age("Gap follow", &cmd);
                ds.gap_follow_cmd = Some(Command {
                    drive: cmd.drive,
                    timestamp: Instant::now(),
                });
            }
            Ok(None) => (),
            Err(e) => warn!("Gap follow CmdSub error: {}", e),
        }

        match enable_sub.recv_latest() {
            Ok(Some(msg)) => {
                debug!("Gap follow enable = {}", msg.enabled);
                ds.gap_follow_enable = Some(EnableSignal {
                    enabled: msg.enabled,
                    timestamp: Instant::now(),
                });
            }
            Ok(None) => (),
            Err(e) => warn!("EnableSub error: {}", e),
        }

        // ---- ARBITRATION PROCESSING ----

        let arbiter_input = arbiter::InputData {
            joystick_cmd: ds.joystick_cmd.take(),
            gap_follow_cmd: ds.gap_follow_cmd.take(),
            gap_follow_enable: ds.gap_follow_enable.take(),
            now: Instant::now(),
        };

        match ds.arbiter.proc(&arbiter_input) {
            Ok((o, r)) => {
                ds.arbiter_output = Some(o);
                ds.arbiter_status_rpt = r;
            }
            Err(e) => warn!("Error during Arbiter processing: {}", e),
        };

        // ---- DRIVE OUTPUT ----

        // Exactly one command is published per cycle, falling through to the safe stop if the
        // arbiter produced nothing.
        let drive = match ds.arbiter_output {
            Some(ref o) => o.drive,
            None => DriveCmd::STOP,
        };

        match drive_pub.send(&drive) {
            Ok(_) => (),
            Err(e) => warn!("DrivePub error: {}", e),
        }

        // ---- TELEMETRY ----

        match tm_server.send(&ds) {
            Ok(_) => (),
            Err(e) => warn!("TmServer error: {}", e),
        };

        // 1 Hz heartbeat with the selected source and any quiet channels
        if ds.is_1_hz_cycle {
            debug!("Selected source: {:?}", ds.arbiter_status_rpt.selected);

            if !joystick_sub.is_connected() {
                debug!("Joystick source not connected");
            }
            if !gap_follow_sub.is_connected() {
                debug!("Gap follow source not connected");
            }
            if !enable_sub.is_connected() {
                debug!("Enable source not connected");
            }
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match Duration::from_secs_f64(CYCLE_PERIOD_S)
            .checked_sub(cycle_dur)
        {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            },
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64()
                        - Duration::from_secs_f64(CYCLE_PERIOD_S).as_secs_f64()
                );
                ds.num_consec_cycle_overruns += 1;
            }
        }

        // Increment cycle counter
        ds.num_cycles += 1;
    }
}

/// Log receipt of a stamped command at debug level, with its wall clock age.
fn log_cmd_age(source: &str, cmd: &StampedDriveCmd) {
    let age_ms = Utc::now()
        .signed_duration_since(cmd.stamp)
        .num_milliseconds();

    debug!("{} command recieved ({} ms old)", source, age_ms);
}
