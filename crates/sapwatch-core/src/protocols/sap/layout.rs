/// Control byte, auth length and message id hash.
pub const HEADER_LEN: usize = 4;
pub const IPV4_ORIGIN_LEN: usize = 4;

/// Authentication length is expressed in 32-bit words.
pub const AUTH_WORD_LEN: usize = 4;

pub const VERSION_SHIFT: u8 = 5;
pub const VERSION_MASK: u8 = 0b111;
pub const ADDRESS_TYPE_BIT: u8 = 0x10;
pub const MESSAGE_TYPE_BIT: u8 = 0x04;
pub const ENCRYPTED_BIT: u8 = 0x02;
pub const COMPRESSED_BIT: u8 = 0x01;

pub const SDP_SIGNATURE: &[u8; 2] = b"v=";
pub const SDP_MIME_TYPE: &str = "application/sdp";
pub const UNKNOWN_MIME_TYPE: &str = "unknown";
pub const MIME_TERMINATOR: u8 = 0x00;

pub const MAX_INFLATED_PAYLOAD: usize = 64 * 1024;
