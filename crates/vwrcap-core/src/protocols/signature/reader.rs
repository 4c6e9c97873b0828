use super::error::SignatureError;
use super::layout;

/// Reads fields of a signature candidate starting at a fixed payload offset.
pub struct SignatureReader<'a> {
    payload: &'a [u8],
    start: usize,
}

impl<'a> SignatureReader<'a> {
    pub fn new(payload: &'a [u8], start: usize) -> Self {
        Self { payload, start }
    }

    /// Whether a full signature fits at this position.
    pub fn fits(&self) -> bool {
        self.start + layout::SIGNATURE_LEN <= self.payload.len()
    }

    pub fn read_u8(&self, offset: usize) -> Result<u8, SignatureError> {
        let pos = self.start + offset;
        self.payload
            .get(pos)
            .copied()
            .ok_or(SignatureError::TooShort {
                needed: pos + 1,
                actual: self.payload.len(),
            })
    }

    pub fn read_slice(&self, range: std::ops::Range<usize>) -> Result<&'a [u8], SignatureError> {
        let range = self.start + range.start..self.start + range.end;
        self.payload
            .get(range.clone())
            .ok_or(SignatureError::TooShort {
                needed: range.end,
                actual: self.payload.len(),
            })
    }

    pub fn read_u24_le(&self, range: std::ops::Range<usize>) -> Result<u32, SignatureError> {
        let bytes = self.read_slice(range)?;
        if bytes.len() != 3 {
            return Err(SignatureError::TooShort {
                needed: 3,
                actual: bytes.len(),
            });
        }
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], 0]))
    }

    pub fn read_u32_le(&self, range: std::ops::Range<usize>) -> Result<u32, SignatureError> {
        let bytes = self.read_slice(range)?;
        if bytes.len() != 4 {
            return Err(SignatureError::TooShort {
                needed: 4,
                actual: bytes.len(),
            });
        }
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn is_compact(&self) -> Result<bool, SignatureError> {
        Ok(self.read_u8(layout::FORMAT_MARKER_OFFSET)? == layout::COMPACT_MARKER)
    }
}
