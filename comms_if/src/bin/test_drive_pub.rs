//! Fake drive command source
//!
//! Publishes stamped drive commands at a fixed rate, standing in for the joystick or gap follow
//! node when exercising the mux on a desk.

use comms_if::{
    drive::{DriveCmd, StampedDriveCmd},
    net::{MonitoredSocket, SocketOptions},
};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "test_drive_pub")]
struct Opt {
    /// Endpoint to bind the publisher to.
    #[structopt(long, default_value = "tcp://*:5011")]
    endpoint: String,

    /// Steering angle to demand.
    ///
    /// Units: radians
    #[structopt(long, default_value = "0.0")]
    steering_angle_rad: f64,

    /// Speed to demand.
    ///
    /// Units: meters/second
    #[structopt(long, default_value = "0.0")]
    speed_ms: f64,

    /// Publication period in milliseconds.
    #[structopt(long, default_value = "100")]
    period_ms: u64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let opt = Opt::from_args();

    // Create zmq context
    let ctx = zmq::Context::new();

    // Create socket options
    let socket_options = SocketOptions {
        bind: true,
        block_on_first_connect: false,
        ..Default::default()
    };

    // Create the socket
    let socket = MonitoredSocket::new(
        &ctx,
        zmq::PUB,
        socket_options,
        &opt.endpoint
    )?;

    println!("Publishing drive commands on {}", opt.endpoint);

    // Send commands to subscribers
    loop {
        let cmd = StampedDriveCmd::now(DriveCmd {
            steering_angle_rad: opt.steering_angle_rad,
            speed_ms: opt.speed_ms,
        });

        let cmd_str = serde_json::to_string(&cmd)?;

        match socket.send(&cmd_str, 0) {
            Ok(_) => (),
            Err(e) => println!("Failed to send command: {}", e)
        }

        std::thread::sleep(std::time::Duration::from_millis(opt.period_ms));
    }
}
