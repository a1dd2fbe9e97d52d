//! # Enable Gate Subscriber

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    drive::EnableMsg,
    net::{zmq, MonitoredSocket, MonitoredSocketError, NetParams, SocketOptions},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Gap follow enable gate subscriber
pub struct EnableSub {
    socket: MonitoredSocket
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum EnableSubError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not recieve a message from the source: {0}")]
    RecvError(zmq::Error),

    #[error("Could not parse the recieved enable state: {0}")]
    EnableParseError(serde_json::Error),

    #[error("The source sent a message which was not valid UTF-8")]
    NonUtf8Message
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl EnableSub {

    /// Create a new enable gate subscriber.
    ///
    /// This function will not block until the source connects.
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, EnableSubError> {
        // Create the socket options
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
            &params.gap_follow_enable_endpoint
        ).map_err(|e| EnableSubError::SocketError(e))?;

        // Create self
        Ok(Self {
            socket
        })
    }

    /// Check if the subscriber is connected to its source
    pub fn is_connected(&self) -> bool {
        self.socket.connected()
    }

    /// Recieve the newest pending enable state, or `None` if nothing arrived since the last
    /// call.
    pub fn recv_latest(&self) -> Result<Option<EnableMsg>, EnableSubError> {
        let mut latest = None;

        loop {
            // Attempt to read a string from the socket
            let msg_str = match self.socket.recv_string(0) {
                // Valid message
                Ok(Ok(s)) => s,
                // Non UTF-8 message
                Ok(Err(_)) => return Err(EnableSubError::NonUtf8Message),
                // No message pending
                Err(zmq::Error::EAGAIN) => return Ok(latest),
                // Recieve error
                Err(e) => return Err(EnableSubError::RecvError(e))
            };

            // Parse the enable state
            let msg = serde_json::from_str(&msg_str)
                .map_err(|e| EnableSubError::EnableParseError(e))?;

            latest = Some(msg);
        }
    }
}
