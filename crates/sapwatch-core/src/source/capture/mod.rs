//! PCAP/PCAPNG capture replay.
//!
//! Frames are sliced down to UDP and only payloads on the configured SAP port
//! are emitted, stamped with the capture time and sender address.

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;
pub mod udp;

pub use parser::CaptureFileSource;
