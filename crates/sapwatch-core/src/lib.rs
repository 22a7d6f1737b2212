//! sapwatch core library: SAP (RFC 2974) decoding and session tracking.
//!
//! The decoder in `protocols::sap` is a pure function from one datagram to a
//! typed [`SapPacket`] or a [`SapDecodeError`]; it performs no I/O and keeps
//! no state. Around it sit datagram sources (multicast socket, PCAP/PCAPNG
//! replay), a receive loop that skips undecodable datagrams, a session
//! directory, and an offline analysis that turns a capture into a
//! deterministic JSON report.
//!
//! Invariants:
//! - Decoding never reads past the end of the datagram.
//! - Unsupported features (IPv6 origins, authentication, encryption) fail the
//!   whole datagram; there is no partial packet.
//! - Report ordering is stable across runs.
//!
//! # Examples
//! ```no_run
//! use sapwatch_core::{ListenerConfig, MulticastSource, SapListener};
//!
//! let source = MulticastSource::open(&ListenerConfig::default())?;
//! let mut listener = SapListener::new(source);
//! if let Some(received) = listener.next_packet()? {
//!     println!("{}", received.packet);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::{Deserialize, Serialize};

mod analysis;
mod config;
mod directory;
mod listener;
mod protocols;
mod source;

pub use analysis::{AnalysisError, analyze_capture_file, analyze_source};
pub use config::{
    DEFAULT_BUFFER_SIZE, ListenerConfig, SAP_IPV4_GLOBAL_GROUP, SAP_IPV6_GLOBAL_GROUP,
    SAP_IPV6_LINK_LOCAL_GROUP, SAP_IPV6_NODE_LOCAL_GROUP, SAP_IPV6_ORG_LOCAL_GROUP,
    SAP_IPV6_SITE_LOCAL_GROUP, SAP_PORT,
};
pub use directory::{DirectoryEvent, SessionDirectory, SessionEntry, SessionKey};
pub use listener::{ListenerStats, ReceivedPacket, SapListener};
pub use protocols::sap::error::SapDecodeError;
pub use protocols::sap::header::{AddressType, MessageType, SapHeader, SapVersion};
pub use protocols::sap::{SapPacket, decode_sap_packet};
pub use source::{CaptureFileSource, Datagram, DatagramSource, MulticastSource, SourceError};

/// Current report schema version.
pub const REPORT_VERSION: u32 = 1;
/// Default timestamp used when no capture time is available.
pub const DEFAULT_GENERATED_AT: &str = "1970-01-01T00:00:00Z";

/// Capture analysis report with deterministic ordering.
///
/// # Examples
/// ```
/// use sapwatch_core::make_stub_report;
///
/// let report = make_stub_report("capture.pcapng", 123);
/// assert_eq!(report.report_version, sapwatch_core::REPORT_VERSION);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Report schema version (not the binary version).
    pub report_version: u32,
    /// Tool identification metadata.
    pub tool: ToolInfo,
    /// RFC3339 timestamp of the last captured SAP datagram.
    pub generated_at: String,

    /// Input capture metadata.
    pub input: InputInfo,

    /// Capture summary (absent until a capture has been read).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture_summary: Option<CaptureSummary>,
    /// Decoded packets in capture order.
    pub announcements: Vec<AnnouncementRecord>,
    /// Sessions still announced at the end of the capture.
    pub sessions: Vec<SessionSummary>,
    /// Undecodable datagrams grouped by error kind.
    pub decode_failures: Vec<DecodeFailureSummary>,
}

/// Tool metadata embedded in reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
}

/// Input capture metadata embedded in reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputInfo {
    /// Input path as provided to the analyzer.
    pub path: String,
    /// Input size in bytes.
    pub bytes: u64,
}

/// SAP traffic totals for a capture.
///
/// # Examples
/// ```
/// use sapwatch_core::CaptureSummary;
///
/// let summary = CaptureSummary {
///     sap_datagrams: 10,
///     decoded: 9,
///     failed: 1,
///     time_start: None,
///     time_end: None,
/// };
/// assert_eq!(summary.decoded + summary.failed, summary.sap_datagrams);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSummary {
    /// UDP datagrams seen on the SAP port.
    pub sap_datagrams: u64,
    pub decoded: u64,
    pub failed: u64,
    /// RFC3339 timestamp of the first SAP datagram (if known).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_start: Option<String>,
    /// RFC3339 timestamp of the last SAP datagram (if known).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_end: Option<String>,
}

/// One decoded SAP packet, flattened for output.
///
/// The payload is rendered as text; non-UTF-8 bytes are replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnouncementRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ts: Option<String>,
    /// Sender endpoint as observed by the transport.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peer: Option<String>,
    pub version: u8,
    /// `announcement` or `deletion`.
    pub message_type: String,
    pub compressed: bool,
    pub auth_len: u8,
    /// Four lowercase hex digits.
    pub msg_id_hash: String,
    pub origin: String,
    pub payload_mime_type: String,
    pub payload_len: usize,
    pub payload: String,
}

impl AnnouncementRecord {
    /// # Examples
    /// ```
    /// use sapwatch_core::{AnnouncementRecord, decode_sap_packet};
    ///
    /// let packet = decode_sap_packet(b"\x24\x00\xbe\xef\x0a\x00\x00\x01")?;
    /// let record = AnnouncementRecord::from_packet(&packet, None, None);
    /// assert_eq!(record.message_type, "deletion");
    /// assert_eq!(record.msg_id_hash, "beef");
    /// assert_eq!(record.origin, "10.0.0.1");
    /// # Ok::<(), sapwatch_core::SapDecodeError>(())
    /// ```
    pub fn from_packet(packet: &SapPacket, peer: Option<String>, ts: Option<String>) -> Self {
        Self {
            ts,
            peer,
            version: packet.version.as_u8(),
            message_type: packet.message_type.as_str().to_string(),
            compressed: packet.compressed,
            auth_len: packet.auth_len,
            msg_id_hash: packet.msg_id_hash_hex(),
            origin: packet.origin_address.to_string(),
            payload_mime_type: packet.payload_mime_type.clone(),
            payload_len: packet.payload.len(),
            payload: packet.payload_text().into_owned(),
        }
    }
}

/// Session still active at the end of a capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub origin: String,
    pub msg_id_hash: String,
    pub payload_mime_type: String,
    /// Announcements received for this session, including the first.
    pub announcements: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_seen: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<String>,
}

/// Datagrams that failed to decode, grouped by error kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeFailureSummary {
    /// Stable error kind (e.g., `unsupported_version`).
    pub kind: String,
    pub count: u64,
    /// At most three examples, formatted as `datagram #n from ip:port @ ts: error`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
}

/// Build a stub report with base fields filled and empty aggregates.
///
/// # Examples
/// ```
/// use sapwatch_core::make_stub_report;
///
/// let report = make_stub_report("capture.pcapng", 123);
/// assert!(report.announcements.is_empty());
/// assert_eq!(report.tool.name, "sapwatch");
/// ```
pub fn make_stub_report(input_path: &str, input_bytes: u64) -> Report {
    Report {
        report_version: REPORT_VERSION,
        tool: ToolInfo {
            name: "sapwatch".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        generated_at: DEFAULT_GENERATED_AT.to_string(),
        input: InputInfo {
            path: input_path.to_string(),
            bytes: input_bytes,
        },
        capture_summary: None,
        announcements: vec![],
        sessions: vec![],
        decode_failures: vec![],
    }
}
