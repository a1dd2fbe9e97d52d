//! Fake gap follow enable source
//!
//! Publishes the gap follow enable gate at a fixed rate. The mux reverts the gate to disabled if
//! it goes unrefreshed for longer than the enable staleness window, so the period should be well
//! under that window.

use comms_if::{
    drive::EnableMsg,
    net::{MonitoredSocket, SocketOptions},
};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "test_enable_pub")]
struct Opt {
    /// Endpoint to bind the publisher to.
    #[structopt(long, default_value = "tcp://*:5013")]
    endpoint: String,

    /// Publish "disabled" instead of "enabled".
    #[structopt(long)]
    disable: bool,

    /// Publication period in milliseconds.
    #[structopt(long, default_value = "500")]
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

    println!(
        "Publishing enable = {} on {}",
        !opt.disable,
        opt.endpoint
    );

    loop {
        let msg = EnableMsg { enabled: !opt.disable };

        let msg_str = serde_json::to_string(&msg)?;

        match socket.send(&msg_str, 0) {
            Ok(_) => (),
            Err(e) => println!("Failed to send enable: {}", e)
        }

        std::thread::sleep(std::time::Duration::from_millis(opt.period_ms));
    }
}
