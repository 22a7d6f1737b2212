//! Receive loop: pull datagrams until one decodes.
//!
//! SAP announcements are repeated periodically, so a datagram that fails to
//! decode is dropped and the next one is read. Only transport errors stop the
//! loop.

use std::net::SocketAddr;

use crate::protocols::sap::{SapPacket, decode_sap_packet};
use crate::source::{Datagram, DatagramSource, SourceError};

/// A decoded packet with its transport metadata.
#[derive(Debug, Clone)]
pub struct ReceivedPacket {
    pub packet: SapPacket,
    pub peer: Option<SocketAddr>,
    pub ts: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerStats {
    pub datagrams: u64,
    pub decoded: u64,
    pub discarded: u64,
}

pub struct SapListener<S> {
    source: S,
    stats: ListenerStats,
}

impl<S: DatagramSource> SapListener<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            stats: ListenerStats::default(),
        }
    }

    /// Next decodable packet, or `None` once the source has nothing more.
    pub fn next_packet(&mut self) -> Result<Option<ReceivedPacket>, SourceError> {
        while let Some(Datagram { ts, peer, data }) = self.source.next_datagram()? {
            self.stats.datagrams += 1;
            match decode_sap_packet(&data) {
                Ok(packet) => {
                    self.stats.decoded += 1;
                    return Ok(Some(ReceivedPacket { packet, peer, ts }));
                }
                Err(err) => {
                    self.stats.discarded += 1;
                    tracing::debug!(
                        kind = err.kind(),
                        error = %err,
                        peer = ?peer,
                        len = data.len(),
                        "discarding SAP datagram"
                    );
                }
            }
        }
        Ok(None)
    }

    pub fn stats(&self) -> ListenerStats {
        self.stats
    }

    pub fn into_inner(self) -> S {
        self.source
    }
}
