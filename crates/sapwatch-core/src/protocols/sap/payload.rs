use flate2::{Decompress, FlushDecompress, Status};

use super::error::SapDecodeError;
use super::layout;

const INFLATE_CHUNK: usize = 4096;

/// Payload after MIME-type classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedPayload {
    pub mime_type: String,
    pub body: Vec<u8>,
}

/// Inflate a zlib-compressed payload.
///
/// The stream must reach its end marker; a stream that stops short is a
/// failure, as is output beyond `layout::MAX_INFLATED_PAYLOAD`. Bytes after
/// the end marker are ignored.
pub fn inflate(data: &[u8]) -> Result<Vec<u8>, SapDecodeError> {
    let mut inflater = Decompress::new(true);
    let mut out = Vec::with_capacity(INFLATE_CHUNK);
    loop {
        if out.len() > layout::MAX_INFLATED_PAYLOAD {
            return Err(too_large());
        }
        if out.len() == out.capacity() {
            out.reserve(INFLATE_CHUNK);
        }

        let in_before = inflater.total_in();
        let out_before = inflater.total_out();
        let input = &data[in_before as usize..];
        let status = inflater
            .decompress_vec(input, &mut out, FlushDecompress::None)
            .map_err(|err| SapDecodeError::DecompressionFailed {
                message: err.to_string(),
            })?;
        if status == Status::StreamEnd {
            break;
        }
        if inflater.total_in() == in_before && inflater.total_out() == out_before {
            return Err(SapDecodeError::DecompressionFailed {
                message: "compressed stream ended early".to_string(),
            });
        }
    }

    if out.len() > layout::MAX_INFLATED_PAYLOAD {
        return Err(too_large());
    }
    Ok(out)
}

fn too_large() -> SapDecodeError {
    SapDecodeError::DecompressionFailed {
        message: format!(
            "inflated payload exceeds {} bytes",
            layout::MAX_INFLATED_PAYLOAD
        ),
    }
}

/// Classify a payload by its leading bytes.
///
/// The SDP signature wins over a NUL-terminated label; without either the
/// type is `unknown` and the payload is returned untouched.
pub fn classify(data: &[u8]) -> ClassifiedPayload {
    if is_sdp(data) {
        return ClassifiedPayload {
            mime_type: layout::SDP_MIME_TYPE.to_string(),
            body: data.to_vec(),
        };
    }

    match data.iter().position(|&b| b == layout::MIME_TERMINATOR) {
        Some(end) => ClassifiedPayload {
            mime_type: String::from_utf8_lossy(&data[..end]).into_owned(),
            body: data[end + 1..].to_vec(),
        },
        None => ClassifiedPayload {
            mime_type: layout::UNKNOWN_MIME_TYPE.to_string(),
            body: data.to_vec(),
        },
    }
}

/// `v=` followed by at least one ASCII digit.
fn is_sdp(data: &[u8]) -> bool {
    data.strip_prefix(layout::SDP_SIGNATURE.as_slice())
        .and_then(|rest| rest.first())
        .is_some_and(u8::is_ascii_digit)
}
