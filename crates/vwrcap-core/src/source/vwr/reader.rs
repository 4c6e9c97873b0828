use std::io::{ErrorKind, Read};

use super::error::VwrError;
use super::layout::{self, BitField, FieldLayout};

/// Decode a 64-bit counter stored as two big-endian words in swapped order.
///
/// Bytes `0..4` carry the low word and bytes `4..8` the high word; each word
/// keeps its big-endian byte order.
///
/// # Examples
/// ```
/// use vwrcap_core::source::vwr::reader::decode_word_swapped_u64;
///
/// let raw = [0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x01];
/// assert_eq!(decode_word_swapped_u64(&raw), 0x0000_0001_0000_0002);
/// ```
pub fn decode_word_swapped_u64(bytes: &[u8; 8]) -> u64 {
    let low = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    let high = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    ((high as u64) << 32) | low as u64
}

/// Fill `buf` from `reader` until it is full or the stream ends.
///
/// Returns the number of bytes read, so callers can tell a clean end of
/// stream (0) from a short read (anything below `buf.len()`).
///
/// # Errors
/// Returns the underlying I/O error; interrupted reads are retried.
pub fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}

/// Bounds-checked access to one record body.
pub struct RecordReader<'a> {
    body: &'a [u8],
    offset: u64,
}

impl<'a> RecordReader<'a> {
    /// `offset` is the stream position of the record, used in error context.
    pub fn new(body: &'a [u8], offset: u64) -> Self {
        Self { body, offset }
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn require_len(&self, needed: usize) -> Result<(), VwrError> {
        if self.body.len() < needed {
            return Err(self.too_short(needed));
        }
        Ok(())
    }

    pub fn read_u8(&self, pos: usize) -> Result<u8, VwrError> {
        self.body
            .get(pos)
            .copied()
            .ok_or_else(|| self.too_short(pos + 1))
    }

    pub fn read_u16_be(&self, pos: usize) -> Result<u16, VwrError> {
        let bytes = self.read_slice(pos..pos + 2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u24_be(&self, pos: usize) -> Result<u32, VwrError> {
        let bytes = self.read_slice(pos..pos + layout::FLOW_ID_LEN)?;
        Ok(u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]))
    }

    pub fn read_u32_be(&self, pos: usize) -> Result<u32, VwrError> {
        let bytes = self.read_slice(pos..pos + 4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_masked(&self, field: BitField) -> Result<u8, VwrError> {
        Ok((self.read_u8(field.offset)? & field.mask) >> field.shift())
    }

    pub fn read_timestamp(&self, pos: usize) -> Result<u64, VwrError> {
        let bytes = self.read_slice(pos..pos + layout::TIMESTAMP_LEN)?;
        let mut raw = [0u8; layout::TIMESTAMP_LEN];
        raw.copy_from_slice(bytes);
        Ok(decode_word_swapped_u64(&raw))
    }

    pub fn read_slice(&self, range: std::ops::Range<usize>) -> Result<&'a [u8], VwrError> {
        self.body
            .get(range.clone())
            .ok_or_else(|| self.too_short(range.end))
    }

    fn too_short(&self, needed: usize) -> VwrError {
        VwrError::RecordTooShort {
            offset: self.offset,
            needed,
            actual: self.body.len(),
        }
    }
}

/// Named accessors for the statistics trailer of a frame record.
pub struct TrailerReader<'a> {
    stats: RecordReader<'a>,
    layout: &'a FieldLayout,
}

impl<'a> TrailerReader<'a> {
    /// Locate the trailer at the end of `body`.
    ///
    /// # Errors
    /// Returns `VwrError::RecordTooShort` when the body cannot hold the
    /// PLCP prefix and trailer.
    pub fn new(body: &'a [u8], layout: &'a FieldLayout, offset: u64) -> Result<Self, VwrError> {
        let record = RecordReader::new(body, offset);
        record.require_len(layout.fixed_len())?;
        let start = body.len() - layout.stats_len;
        let stats = RecordReader::new(record.read_slice(start..body.len())?, offset);
        Ok(Self { stats, layout })
    }

    pub fn msdu_length(&self) -> Result<usize, VwrError> {
        Ok(self.stats.read_u16_be(self.layout.msdu_length)? as usize)
    }

    pub fn flow_valid(&self) -> Result<bool, VwrError> {
        Ok(self.stats.read_masked(self.layout.valid)? != 0)
    }

    pub fn modulation(&self) -> Result<Option<u8>, VwrError> {
        self.layout
            .modulation
            .map(|field| self.stats.read_masked(field))
            .transpose()
    }

    /// RSSI on receive, transmit power on transmit; sign-extended.
    pub fn signal(&self) -> Result<Option<i8>, VwrError> {
        self.layout
            .signal
            .map(|pos| self.stats.read_u8(pos).map(|raw| raw as i8))
            .transpose()
    }

    pub fn sequence(&self) -> Result<u8, VwrError> {
        self.stats.read_u8(self.layout.sequence)
    }

    pub fn vc_id(&self) -> Result<u16, VwrError> {
        self.stats.read_u16_be(self.layout.vc_id)
    }

    pub fn flow_id(&self) -> Result<u32, VwrError> {
        self.stats.read_u24_be(self.layout.flow_id)
    }

    pub fn errors(&self) -> Result<u32, VwrError> {
        self.stats.read_u32_be(self.layout.errors)
    }

    pub fn frame_type(&self) -> Result<u32, VwrError> {
        self.stats.read_u32_be(self.layout.frame_type)
    }

    pub fn start_time(&self) -> Result<u64, VwrError> {
        self.stats.read_timestamp(self.layout.start_time)
    }

    pub fn end_time(&self) -> Result<u64, VwrError> {
        self.stats.read_timestamp(self.layout.end_time)
    }
}
