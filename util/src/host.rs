//! Host platform (linux for example) utility functions

use std::path::PathBuf;
use thiserror::Error;
use uname;

/// Errors associated with the host environment.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("The software root environment variable (DRIVE_MUX_ROOT) is not set")]
    SwRootNotSet,
}

/// Retrieve uname information.
pub fn get_uname() -> std::io::Result<uname::Info> {
    uname::uname()
}

/// Get the path to the software root directory.
///
/// The root is read from the `DRIVE_MUX_ROOT` environment variable, and is
/// the directory that the `params` and `sessions` directories live under.
pub fn get_drive_mux_root() -> Result<PathBuf, HostError> {
    match std::env::var("DRIVE_MUX_ROOT") {
        Ok(p) => Ok(PathBuf::from(p)),
        Err(_) => Err(HostError::SwRootNotSet),
    }
}
