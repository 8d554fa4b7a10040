use std::io::{self, Read, Write};
use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;

use suppaftp::native_tls::TlsConnector;
use suppaftp::types::FileType;
use suppaftp::{FtpError, FtpStream, NativeTlsConnector, NativeTlsFtpStream};
use thiserror::Error;
use tracing::debug;

use crate::config::model::Profile;

/// Failure reported by the server or the transport, message kept verbatim.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct SessionError(pub String);

impl From<FtpError> for SessionError {
    fn from(err: FtpError) -> Self {
        SessionError(err.to_string())
    }
}

impl From<io::Error> for SessionError {
    fn from(err: io::Error) -> Self {
        SessionError(err.to_string())
    }
}

pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// The handful of FTP commands the backup engine needs.
pub trait FtpSession {
    fn pwd(&mut self) -> SessionResult<String>;
    fn cwd(&mut self, path: &str) -> SessionResult<()>;
    /// Raw MLSD lines (`facts; name`).
    fn mlsd(&mut self, path: &str) -> SessionResult<Vec<String>>;
    fn nlst(&mut self, path: &str) -> SessionResult<Vec<String>>;
    /// Streams the whole file into `out`, returning the byte count.
    fn retr(&mut self, path: &str, out: &mut dyn Write) -> SessionResult<u64>;
    fn quit(&mut self) -> SessionResult<()>;
}

pub enum FtpConnection {
    Plain(FtpStream),
    Secure(NativeTlsFtpStream),
}

macro_rules! with_stream {
    ($conn:expr, $stream:ident => $body:expr) => {
        match $conn {
            FtpConnection::Plain($stream) => $body,
            FtpConnection::Secure($stream) => $body,
        }
    };
}

impl FtpConnection {
    pub fn open(profile: &Profile, timeout: Duration) -> SessionResult<Self> {
        let addr = resolve_addr(&profile.host, profile.port)?;
        let mut conn = if profile.tls {
            let stream = NativeTlsFtpStream::connect_timeout(addr, timeout)?;
            let connector = TlsConnector::new().map_err(|e| SessionError(e.to_string()))?;
            // AUTH TLS, then PBSZ 0 / PROT P for the data channel.
            let stream = stream.into_secure(NativeTlsConnector::from(connector), &profile.host)?;
            FtpConnection::Secure(stream)
        } else {
            FtpConnection::Plain(FtpStream::connect_timeout(addr, timeout)?)
        };
        with_stream!(&mut conn, s => {
            s.get_ref().set_read_timeout(Some(timeout))?;
            s.get_ref().set_write_timeout(Some(timeout))?;
            s.login(&profile.username, &profile.password)?;
            s.transfer_type(FileType::Binary)?;
        });
        debug!("logged in to {}:{} as {}", profile.host, profile.port, profile.username);
        Ok(conn)
    }
}

fn resolve_addr(host: &str, port: u16) -> SessionResult<SocketAddr> {
    (host, port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| SessionError(format!("no address found for {}:{}", host, port)))
}

impl FtpSession for FtpConnection {
    fn pwd(&mut self) -> SessionResult<String> {
        Ok(with_stream!(self, s => s.pwd()?))
    }

    fn cwd(&mut self, path: &str) -> SessionResult<()> {
        with_stream!(self, s => s.cwd(path)?);
        Ok(())
    }

    fn mlsd(&mut self, path: &str) -> SessionResult<Vec<String>> {
        Ok(with_stream!(self, s => s.mlsd(Some(path))?))
    }

    fn nlst(&mut self, path: &str) -> SessionResult<Vec<String>> {
        Ok(with_stream!(self, s => s.nlst(Some(path))?))
    }

    fn retr(&mut self, path: &str, out: &mut dyn Write) -> SessionResult<u64> {
        let copied = with_stream!(self, s => s.retr(path, |reader: &mut dyn Read| {
            io::copy(reader, out).map_err(FtpError::ConnectionError)
        })?);
        Ok(copied)
    }

    fn quit(&mut self) -> SessionResult<()> {
        with_stream!(self, s => s.quit()?);
        Ok(())
    }
}
