//! Drive command monitor
//!
//! Subscribes to a drive command endpoint and prints every command received, along with its age.
//! Point it at the mux output to watch what the vehicle would be told to do.

use chrono::Utc;
use comms_if::{
    drive::StampedDriveCmd,
    net::{MonitoredSocket, SocketOptions},
};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "test_drive_sub")]
struct Opt {
    /// Endpoint to subscribe to.
    #[structopt(long, default_value = "tcp://localhost:5001")]
    endpoint: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let opt = Opt::from_args();

    // Create context
    let ctx = zmq::Context::new();

    // Create socket options
    let socket_options = SocketOptions {
        block_on_first_connect: false,
        subscribe: Some(b"".to_vec()),
        ..Default::default()
    };

    // Create socket
    let socket = MonitoredSocket::new(
        &ctx,
        zmq::SUB,
        socket_options,
        &opt.endpoint
    )?;

    println!("Listening for drive commands on {}", opt.endpoint);

    // Recieve messages from publisher
    loop {
        let msg = match socket.recv_string(0)? {
            Ok(s) => s,
            Err(_) => {
                println!("Got a non UTF-8 message, skipping");
                continue;
            }
        };

        match serde_json::from_str::<StampedDriveCmd>(&msg) {
            Ok(cmd) => {
                let age_ms = Utc::now()
                    .signed_duration_since(cmd.stamp)
                    .num_milliseconds();

                println!(
                    "steering_angle_rad: {:+.4}, speed_ms: {:+.3} ({} ms old)",
                    cmd.drive.steering_angle_rad,
                    cmd.drive.speed_ms,
                    age_ms
                );
            }
            Err(e) => println!("Could not parse drive command: {}", e)
        }
    }
}
