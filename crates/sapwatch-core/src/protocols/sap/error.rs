use thiserror::Error;

/// Errors returned by SAP decoding.
///
/// Every variant is final for the datagram that produced it; re-receiving is
/// up to the caller.
///
/// # Examples
/// ```
/// use sapwatch_core::SapDecodeError;
///
/// let err = SapDecodeError::UnsupportedVersion { version: 3 };
/// assert!(err.to_string().contains("unsupported SAP version"));
/// assert_eq!(err.kind(), "unsupported_version");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SapDecodeError {
    #[error("truncated packet: need {needed} bytes at offset {offset}, got {actual}")]
    TruncatedPacket {
        offset: usize,
        needed: usize,
        actual: usize,
    },
    #[error("unsupported SAP version: {version}")]
    UnsupportedVersion { version: u8 },
    #[error("unsupported address family: IPv6 origin")]
    UnsupportedAddressFamily,
    #[error("unsupported authentication: auth_len {auth_len} words, encrypted {encrypted}")]
    UnsupportedAuthentication { auth_len: u8, encrypted: bool },
    #[error("payload decompression failed: {message}")]
    DecompressionFailed { message: String },
}

impl SapDecodeError {
    /// Stable identifier used in failure tallies and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            SapDecodeError::TruncatedPacket { .. } => "truncated_packet",
            SapDecodeError::UnsupportedVersion { .. } => "unsupported_version",
            SapDecodeError::UnsupportedAddressFamily => "unsupported_address_family",
            SapDecodeError::UnsupportedAuthentication { .. } => "unsupported_authentication",
            SapDecodeError::DecompressionFailed { .. } => "decompression_failed",
        }
    }
}
