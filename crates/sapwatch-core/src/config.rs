use std::net::{Ipv4Addr, Ipv6Addr};
use std::time::Duration;

/// Well-known SAP UDP port.
pub const SAP_PORT: u16 = 9875;
/// Global-scope IPv4 SAP group.
pub const SAP_IPV4_GLOBAL_GROUP: Ipv4Addr = Ipv4Addr::new(224, 2, 127, 254);

/// IPv6 SAP groups by scope. Named for reference; origins on these groups
/// cannot be decoded.
pub const SAP_IPV6_NODE_LOCAL_GROUP: Ipv6Addr = Ipv6Addr::new(0xff01, 0, 0, 0, 0, 0, 2, 0x7ffe);
pub const SAP_IPV6_LINK_LOCAL_GROUP: Ipv6Addr = Ipv6Addr::new(0xff02, 0, 0, 0, 0, 0, 2, 0x7ffe);
pub const SAP_IPV6_SITE_LOCAL_GROUP: Ipv6Addr = Ipv6Addr::new(0xff05, 0, 0, 0, 0, 0, 2, 0x7ffe);
pub const SAP_IPV6_ORG_LOCAL_GROUP: Ipv6Addr = Ipv6Addr::new(0xff08, 0, 0, 0, 0, 0, 2, 0x7ffe);
pub const SAP_IPV6_GLOBAL_GROUP: Ipv6Addr = Ipv6Addr::new(0xff0e, 0, 0, 0, 0, 0, 2, 0x7ffe);

/// Receive buffer size; SDP bodies are expected to fit in 1 KB.
pub const DEFAULT_BUFFER_SIZE: usize = 2048;

/// Multicast listener settings.
///
/// # Examples
/// ```
/// use sapwatch_core::{ListenerConfig, SAP_PORT};
///
/// let config = ListenerConfig::default();
/// assert_eq!(config.port, SAP_PORT);
/// assert_eq!(config.group.to_string(), "224.2.127.254");
/// assert!(config.read_timeout.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerConfig {
    /// Multicast group to join.
    pub group: Ipv4Addr,
    /// UDP port to bind.
    pub port: u16,
    /// Local interface address used for the group join.
    pub interface: Ipv4Addr,
    /// Maximum datagram size read per receive.
    pub buffer_size: usize,
    /// Upper bound for a single blocking receive.
    pub read_timeout: Option<Duration>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            group: SAP_IPV4_GLOBAL_GROUP,
            port: SAP_PORT,
            interface: Ipv4Addr::UNSPECIFIED,
            buffer_size: DEFAULT_BUFFER_SIZE,
            read_timeout: None,
        }
    }
}
