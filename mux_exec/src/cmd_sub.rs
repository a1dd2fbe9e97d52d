//! # Drive Command Subscriber
//!
//! One subscriber is created per command source. The joystick and gap follow channels carry the
//! same message type and differ only in endpoint.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    drive::StampedDriveCmd,
    net::{zmq, MonitoredSocket, MonitoredSocketError, SocketOptions},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Drive command subscriber
pub struct CmdSub {
    socket: MonitoredSocket
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CmdSubError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not recieve a message from the source: {0}")]
    RecvError(zmq::Error),

    #[error("Could not parse the recieved command: {0}")]
    CmdParseError(serde_json::Error),

    #[error("The source sent a message which was not valid UTF-8")]
    NonUtf8Message
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CmdSub {

    /// Create a new drive command subscriber on the given endpoint.
    ///
    /// This function will not block until the source connects.
    pub fn new(ctx: &zmq::Context, endpoint: &str) -> Result<Self, CmdSubError> {
        // Create the socket options. The receive timeout is zero so the cyclic drain never
        // stalls the loop.
        let socket_options = SocketOptions {
            block_on_first_connect: false,
            subscribe: Some(b"".to_vec()),
            connect_timeout: 1000,
            linger: 1,
            recv_timeout: 0,
            ..Default::default()
        };

        // Connect the socket
        let socket = MonitoredSocket::new(
            ctx,
            zmq::SUB,
            socket_options,
            endpoint
        ).map_err(|e| CmdSubError::SocketError(e))?;

        // Create self
        Ok(Self {
            socket
        })
    }

    /// Check if the subscriber is connected to its source
    pub fn is_connected(&self) -> bool {
        self.socket.connected()
    }

    /// Recieve the newest pending command, or `None` if nothing arrived since the last call.
    ///
    /// All pending messages are drained and only the most recent is kept, an older command is
    /// superseded the moment a newer one exists.
    pub fn recv_latest(&self) -> Result<Option<StampedDriveCmd>, CmdSubError> {
        let mut latest = None;

        loop {
            // Attempt to read a string from the socket
            let cmd_str = match self.socket.recv_string(0) {
                // Valid message
                Ok(Ok(s)) => s,
                // Non UTF-8 message
                Ok(Err(_)) => return Err(CmdSubError::NonUtf8Message),
                // No message pending
                Err(zmq::Error::EAGAIN) => return Ok(latest),
                // Recieve error
                Err(e) => return Err(CmdSubError::RecvError(e))
            };

            // Parse the command
            let cmd = serde_json::from_str(&cmd_str)
                .map_err(|e| CmdSubError::CmdParseError(e))?;

            latest = Some(cmd);
        }
    }
}
