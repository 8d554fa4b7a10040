use std::time::Duration;

use crate::config::model::Profile;
use crate::error::Result;

pub mod client;
#[cfg(test)]
pub(crate) mod fake;
pub mod session;

pub use client::RemoteFileClient;
pub use session::{FtpConnection, FtpSession, SessionError};

/// Opens logged-in clients for a profile.
pub trait Connector {
    type Session: FtpSession;

    fn connect(&self, profile: &Profile) -> Result<RemoteFileClient<Self::Session>>;
}

#[derive(Debug, Clone, Copy)]
pub struct FtpConnector {
    pub timeout: Duration,
}

impl FtpConnector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Connector for FtpConnector {
    type Session = FtpConnection;

    fn connect(&self, profile: &Profile) -> Result<RemoteFileClient<FtpConnection>> {
        RemoteFileClient::connect(profile, self.timeout)
    }
}
