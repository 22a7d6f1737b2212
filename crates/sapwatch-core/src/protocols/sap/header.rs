use serde::{Deserialize, Serialize};

use super::error::SapDecodeError;
use super::layout;
use super::reader::SapReader;

/// Supported SAP protocol versions.
///
/// RFC 2974 mandates version 1; version 0 is still emitted by older
/// announcers (sdr) and decodes identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SapVersion {
    V0,
    V1,
}

impl SapVersion {
    pub fn from_bits(value: u8) -> Result<Self, SapDecodeError> {
        match value {
            0 => Ok(SapVersion::V0),
            1 => Ok(SapVersion::V1),
            version => Err(SapDecodeError::UnsupportedVersion { version }),
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            SapVersion::V0 => 0,
            SapVersion::V1 => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressType {
    Ipv4,
    Ipv6,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Announcement,
    Deletion,
}

impl MessageType {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageType::Announcement => "announcement",
            MessageType::Deletion => "deletion",
        }
    }
}

/// Fixed 4-byte SAP header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SapHeader {
    pub version: SapVersion,
    pub address_type: AddressType,
    pub message_type: MessageType,
    pub encrypted: bool,
    pub compressed: bool,
    /// Authentication data length in 32-bit words.
    pub auth_len: u8,
    pub msg_id_hash: u16,
}

impl SapHeader {
    /// Read the header from the reader's current position.
    ///
    /// All four bytes are consumed before the control byte is validated, so
    /// a short buffer is reported as truncated whatever its version bits say.
    pub fn read(reader: &mut SapReader<'_>) -> Result<Self, SapDecodeError> {
        reader.require_len(layout::HEADER_LEN)?;
        let control = reader.read_u8()?;
        let auth_len = reader.read_u8()?;
        let msg_id_hash = reader.read_u16_be()?;
        Self::from_parts(control, auth_len, msg_id_hash)
    }

    fn from_parts(control: u8, auth_len: u8, msg_id_hash: u16) -> Result<Self, SapDecodeError> {
        let version =
            SapVersion::from_bits((control >> layout::VERSION_SHIFT) & layout::VERSION_MASK)?;
        let address_type = if control & layout::ADDRESS_TYPE_BIT != 0 {
            AddressType::Ipv6
        } else {
            AddressType::Ipv4
        };
        let message_type = if control & layout::MESSAGE_TYPE_BIT != 0 {
            MessageType::Deletion
        } else {
            MessageType::Announcement
        };

        Ok(Self {
            version,
            address_type,
            message_type,
            encrypted: control & layout::ENCRYPTED_BIT != 0,
            compressed: control & layout::COMPRESSED_BIT != 0,
            auth_len,
            msg_id_hash,
        })
    }

    /// Number of authentication bytes following the origin address.
    pub fn auth_data_len(&self) -> usize {
        self.auth_len as usize * layout::AUTH_WORD_LEN
    }
}
