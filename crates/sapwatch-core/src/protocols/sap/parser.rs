use std::fmt;
use std::net::Ipv4Addr;

use serde::Serialize;

use super::error::SapDecodeError;
use super::header::{AddressType, MessageType, SapHeader, SapVersion};
use super::layout;
use super::payload;
use super::reader::SapReader;

/// A fully decoded SAP datagram.
///
/// # Examples
/// ```
/// use sapwatch_core::{MessageType, decode_sap_packet};
///
/// let mut datagram = vec![0x20, 0x00, 0x12, 0x87, 152, 78, 104, 83];
/// datagram.extend_from_slice(b"v=0\r\ns=Lecture\r\n");
///
/// let packet = decode_sap_packet(&datagram)?;
/// assert_eq!(packet.message_type, MessageType::Announcement);
/// assert_eq!(packet.origin_address.to_string(), "152.78.104.83");
/// assert_eq!(packet.msg_id_hash_hex(), "1287");
/// assert_eq!(packet.payload_mime_type, "application/sdp");
/// # Ok::<(), sapwatch_core::SapDecodeError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SapPacket {
    pub version: SapVersion,
    pub address_type: AddressType,
    pub message_type: MessageType,
    pub encrypted: bool,
    pub compressed: bool,
    /// Authentication data length in 32-bit words.
    pub auth_len: u8,
    pub msg_id_hash: u16,
    pub origin_address: Ipv4Addr,
    /// Always empty: authenticated packets are rejected during decoding.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub auth_data: Vec<u8>,
    pub payload_mime_type: String,
    pub payload: Vec<u8>,
}

impl SapPacket {
    /// Message id hash as four lowercase hex digits.
    pub fn msg_id_hash_hex(&self) -> String {
        format!("{:04x}", self.msg_id_hash)
    }

    pub fn is_deletion(&self) -> bool {
        self.message_type == MessageType::Deletion
    }

    pub fn is_sdp(&self) -> bool {
        self.payload_mime_type == layout::SDP_MIME_TYPE
    }

    pub fn payload_text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}

impl fmt::Display for SapPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SAP version:       {}", self.version.as_u8())?;
        writeln!(f, "Message type:      {}", self.message_type.as_str())?;
        writeln!(f, "Encrypted:         {}", self.encrypted)?;
        writeln!(f, "Compressed:        {}", self.compressed)?;
        writeln!(f, "Auth length:       {}", self.auth_len)?;
        writeln!(f, "Message id hash:   0x{}", self.msg_id_hash_hex())?;
        writeln!(f, "Origin address:    {}", self.origin_address)?;
        writeln!(f, "Payload type:      {}", self.payload_mime_type)?;
        writeln!(f, "Payload ({} bytes):", self.payload.len())?;
        for line in self.payload_text().lines() {
            writeln!(f, "  {line}")?;
        }
        Ok(())
    }
}

/// Decode one SAP datagram.
///
/// The buffer is consumed front to back: header, origin address,
/// authentication data, then the (optionally compressed) payload. Unsupported
/// features fail the whole datagram; there is no partial result.
pub fn decode_sap_packet(datagram: &[u8]) -> Result<SapPacket, SapDecodeError> {
    let mut reader = SapReader::new(datagram);

    let header = SapHeader::read(&mut reader)?;
    if header.address_type == AddressType::Ipv6 {
        return Err(SapDecodeError::UnsupportedAddressFamily);
    }
    let origin_address = Ipv4Addr::from(reader.read_array::<{ layout::IPV4_ORIGIN_LEN }>()?);

    // Skipped even though it is rejected, so truncation is still reported first.
    reader.read_slice(header.auth_data_len())?;
    if header.auth_len > 0 || header.encrypted {
        return Err(SapDecodeError::UnsupportedAuthentication {
            auth_len: header.auth_len,
            encrypted: header.encrypted,
        });
    }

    let raw = reader.read_rest();
    let classified = if header.compressed {
        payload::classify(&payload::inflate(raw)?)
    } else {
        payload::classify(raw)
    };

    Ok(SapPacket {
        version: header.version,
        address_type: header.address_type,
        message_type: header.message_type,
        encrypted: header.encrypted,
        compressed: header.compressed,
        auth_len: header.auth_len,
        msg_id_hash: header.msg_id_hash,
        origin_address,
        auth_data: Vec::new(),
        payload_mime_type: classified.mime_type,
        payload: classified.body,
    })
}

#[cfg(test)]
mod tests {
    use super::decode_sap_packet;
    use crate::protocols::sap::error::SapDecodeError;
    use crate::protocols::sap::layout;

    fn datagram(control: u8, auth_len: u8, payload: &[u8]) -> Vec<u8> {
        let mut data = vec![control, auth_len, 0x12, 0x87, 10, 0, 0, 1];
        data.extend_from_slice(payload);
        data
    }

    #[test]
    fn parse_minimal_announcement() {
        let parsed = decode_sap_packet(&datagram(0x20, 0, b"")).unwrap();
        assert_eq!(parsed.origin_address.octets(), [10, 0, 0, 1]);
        assert_eq!(parsed.payload_mime_type, layout::UNKNOWN_MIME_TYPE);
        assert!(parsed.payload.is_empty());
    }

    #[test]
    fn parse_deletion() {
        let parsed = decode_sap_packet(&datagram(0x24, 0, b"v=0\r\n")).unwrap();
        assert!(parsed.is_deletion());
        assert!(parsed.is_sdp());
    }

    #[test]
    fn parse_short_origin() {
        let err = decode_sap_packet(&[0x20, 0, 0, 0, 10, 0]).unwrap_err();
        assert_eq!(
            err,
            SapDecodeError::TruncatedPacket {
                offset: layout::HEADER_LEN,
                needed: layout::IPV4_ORIGIN_LEN,
                actual: 2,
            }
        );
    }

    #[test]
    fn ipv6_is_rejected_before_reading_the_address() {
        // Only the header is present: an attempt to read 16 address bytes
        // would have reported truncation instead.
        let err = decode_sap_packet(&[0x30, 0, 0, 0]).unwrap_err();
        assert_eq!(err, SapDecodeError::UnsupportedAddressFamily);
    }

    #[test]
    fn encrypted_is_rejected() {
        let err = decode_sap_packet(&datagram(0x22, 0, b"opaque")).unwrap_err();
        assert_eq!(
            err,
            SapDecodeError::UnsupportedAuthentication {
                auth_len: 0,
                encrypted: true,
            }
        );
    }

    #[test]
    fn short_auth_data_is_truncated() {
        let err = decode_sap_packet(&datagram(0x20, 2, &[0u8; 7])).unwrap_err();
        assert_eq!(
            err,
            SapDecodeError::TruncatedPacket {
                offset: layout::HEADER_LEN + layout::IPV4_ORIGIN_LEN,
                needed: 8,
                actual: 7,
            }
        );
    }

    #[test]
    fn display_dumps_fields() {
        let parsed = decode_sap_packet(&datagram(0x20, 0, b"v=0\r\ns=Talk\r\n")).unwrap();
        let dump = parsed.to_string();
        assert!(dump.contains("Message id hash:   0x1287"));
        assert!(dump.contains("Origin address:    10.0.0.1"));
        assert!(dump.contains("  s=Talk"));
    }
}
