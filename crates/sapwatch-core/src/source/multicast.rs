use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};

use crate::config::ListenerConfig;
use crate::source::{Datagram, DatagramSource, SourceError};

/// UDP socket joined to a SAP multicast group.
///
/// The group is left and the socket released by `close`, which also runs on
/// drop, so every exit path tears the membership down.
///
/// # Examples
/// ```no_run
/// use sapwatch_core::{DatagramSource, ListenerConfig, MulticastSource};
///
/// let mut source = MulticastSource::open(&ListenerConfig::default())?;
/// if let Some(datagram) = source.next_datagram()? {
///     println!("{} bytes from {:?}", datagram.data.len(), datagram.peer);
/// }
/// source.close()?;
/// # Ok::<(), sapwatch_core::SourceError>(())
/// ```
pub struct MulticastSource {
    socket: Option<UdpSocket>,
    group: Ipv4Addr,
    interface: Ipv4Addr,
    buffer: Vec<u8>,
}

impl MulticastSource {
    pub fn open(config: &ListenerConfig) -> Result<Self, SourceError> {
        if !config.group.is_multicast() {
            return Err(SourceError::NotMulticast {
                group: config.group,
            });
        }
        // The socket rejects a zero timeout, and by then the group is joined.
        if config.read_timeout.is_some_and(|timeout| timeout.is_zero()) {
            return Err(SourceError::ZeroTimeout);
        }

        let socket = UdpSocket::bind(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, config.port))?;
        socket
            .join_multicast_v4(&config.group, &config.interface)
            .map_err(|source| SourceError::Join {
                group: config.group,
                interface: config.interface,
                source,
            })?;
        socket.set_read_timeout(config.read_timeout)?;
        tracing::info!(
            group = %config.group,
            port = config.port,
            interface = %config.interface,
            "joined SAP group"
        );

        Ok(Self {
            socket: Some(socket),
            group: config.group,
            interface: config.interface,
            buffer: vec![0u8; config.buffer_size],
        })
    }

    /// Local address the socket is bound to, while open.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|socket| socket.local_addr().ok())
    }

    pub fn is_open(&self) -> bool {
        self.socket.is_some()
    }

    /// Block for one datagram.
    ///
    /// Returns `None` when the transport is closed or the configured read
    /// timeout elapsed without traffic.
    pub fn receive_datagram(&mut self) -> Result<Option<Datagram>, SourceError> {
        let Some(socket) = self.socket.as_ref() else {
            return Ok(None);
        };
        match socket.recv_from(&mut self.buffer) {
            Ok((len, peer)) => Ok(Some(Datagram {
                ts: None,
                peer: Some(peer),
                data: self.buffer[..len].to_vec(),
            })),
            Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Leave the group and release the socket. Safe to call repeatedly.
    pub fn close(&mut self) -> Result<(), SourceError> {
        let Some(socket) = self.socket.take() else {
            return Ok(());
        };
        let left = socket.leave_multicast_v4(&self.group, &self.interface);
        drop(socket);
        tracing::info!(group = %self.group, "left SAP group");
        left.map_err(SourceError::from)
    }
}

impl DatagramSource for MulticastSource {
    fn next_datagram(&mut self) -> Result<Option<Datagram>, SourceError> {
        self.receive_datagram()
    }
}

impl Drop for MulticastSource {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            tracing::warn!(error = %err, group = %self.group, "failed to leave SAP group");
        }
    }
}
