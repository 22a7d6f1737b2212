use super::error::SapDecodeError;

/// Forward-only cursor over a SAP datagram.
///
/// Reads never move the cursor past the end of the buffer; a read that would
/// fails with `TruncatedPacket` and leaves the cursor where it was.
pub struct SapReader<'a> {
    payload: &'a [u8],
    offset: usize,
}

impl<'a> SapReader<'a> {
    pub fn new(payload: &'a [u8]) -> Self {
        Self { payload, offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn require_len(&self, needed: usize) -> Result<(), SapDecodeError> {
        if self.payload.len() - self.offset < needed {
            return Err(SapDecodeError::TruncatedPacket {
                offset: self.offset,
                needed,
                actual: self.payload.len() - self.offset,
            });
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8, SapDecodeError> {
        let bytes = self.read_array::<1>()?;
        Ok(bytes[0])
    }

    pub fn read_u16_be(&mut self) -> Result<u16, SapDecodeError> {
        Ok(u16::from_be_bytes(self.read_array::<2>()?))
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], SapDecodeError> {
        let bytes = self.read_slice(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    pub fn read_slice(&mut self, len: usize) -> Result<&'a [u8], SapDecodeError> {
        self.require_len(len)?;
        let start = self.offset;
        self.offset += len;
        Ok(&self.payload[start..self.offset])
    }

    /// Consume everything left in the buffer.
    pub fn read_rest(&mut self) -> &'a [u8] {
        let rest = &self.payload[self.offset..];
        self.offset = self.payload.len();
        rest
    }
}
