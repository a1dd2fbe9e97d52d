//! # Drive Command Publisher

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    drive::{DriveCmd, StampedDriveCmd},
    net::{zmq, MonitoredSocket, MonitoredSocketError, NetParams, SocketOptions},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Final vehicle drive command publisher
pub struct DrivePub {
    socket: MonitoredSocket
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum DrivePubError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not send the drive command: {0}")]
    SendError(zmq::Error),

    #[error("Could not serialize the drive command: {0}")]
    SerializationError(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DrivePub {
    /// Create a new instance of the drive command publisher.
    ///
    /// This function will not block until a consumer connects.
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, DrivePubError> {
        // Create the socket options
        let socket_options = SocketOptions {
            block_on_first_connect: false,
            bind: true,
            connect_timeout: 1000,
            linger: 1,
            send_timeout: 10,
            ..Default::default()
        };

        // Bind the socket
        let socket = MonitoredSocket::new(
            ctx,
            zmq::PUB,
            socket_options,
            &params.drive_cmd_endpoint
        ).map_err(|e| DrivePubError::SocketError(e))?;

        // Create self
        Ok(Self {
            socket
        })
    }

    /// Publish the given demand, stamping it with the current wall clock time.
    pub fn send(&mut self, drive: &DriveCmd) -> Result<(), DrivePubError> {
        // Build and serialize the stamped command
        let cmd = StampedDriveCmd::now(*drive);

        let cmd_str = serde_json::to_string(&cmd)
            .map_err(|e| DrivePubError::SerializationError(e))?;

        // Send the command
        self.socket.send(&cmd_str, 0)
            .map_err(|e| DrivePubError::SendError(e))
    }
}
