//! SAP (RFC 2974) datagram decoding.
//!
//! The decoder walks the datagram with a bounds-checked cursor: the 4-byte
//! header is unpacked into typed fields, the IPv4 origin address follows, then
//! `auth_len` 32-bit words of authentication data are skipped before the
//! payload. Compressed payloads are inflated with zlib and the result is
//! classified by its leading bytes (SDP signature first, then a NUL-terminated
//! MIME label).
//!
//! IPv6 origins, authentication and encryption are rejected with explicit
//! errors. Byte offsets and bit masks live in `layout`, cursor handling in
//! `reader`.

pub mod error;
pub mod header;
pub mod layout;
pub mod parser;
pub mod payload;
pub mod reader;

pub use parser::{SapPacket, decode_sap_packet};
