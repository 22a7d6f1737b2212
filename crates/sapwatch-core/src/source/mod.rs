//! Datagram sources.
//!
//! Sources own all I/O: the multicast socket for live listening and PCAP /
//! PCAPNG readers for offline replay. Both yield raw UDP payloads; decoding
//! happens downstream.

mod capture;
mod multicast;

pub use capture::CaptureFileSource;
pub use multicast::MulticastSource;

use std::net::{Ipv4Addr, SocketAddr};

use thiserror::Error;

/// One received UDP payload.
#[derive(Debug, Clone)]
pub struct Datagram {
    /// Capture timestamp in seconds since the epoch (capture files only).
    pub ts: Option<f64>,
    /// Sender as seen by the transport.
    pub peer: Option<SocketAddr>,
    pub data: Vec<u8>,
}

pub trait DatagramSource {
    /// Next datagram, or `None` once nothing more is available (end of
    /// capture, closed socket, or an elapsed receive timeout).
    fn next_datagram(&mut self) -> Result<Option<Datagram>, SourceError>;
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("not a multicast group: {group}")]
    NotMulticast { group: Ipv4Addr },
    #[error("read timeout must be greater than zero")]
    ZeroTimeout,
    #[error("failed to join {group} on {interface}: {source}")]
    Join {
        group: Ipv4Addr,
        interface: Ipv4Addr,
        source: std::io::Error,
    },
    #[error("capture parse error: {0}")]
    Capture(String),
}

impl From<capture::error::CaptureSourceError> for SourceError {
    fn from(value: capture::error::CaptureSourceError) -> Self {
        match value {
            capture::error::CaptureSourceError::Io(err) => SourceError::Io(err),
            capture::error::CaptureSourceError::Pcap { context, message } => {
                SourceError::Capture(format!("{context}: {message}"))
            }
        }
    }
}
