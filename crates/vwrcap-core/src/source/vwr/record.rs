use std::io::{self, Read, Seek};

use tracing::{debug, warn};

use super::error::VwrError;
use super::layout;
use super::reader::read_up_to;

/// Record type encoded by the command byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Frame,
    ControlA,
    ControlB,
    Unknown,
}

/// Parsed view of a 16-byte record header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub command: u8,
    pub kind: RecordKind,
    pub body_len: usize,
    pub is_tx: bool,
}

impl RecordHeader {
    /// Classify the command byte and pick the body length from the
    /// kind-specific header position. Unknown commands carry no body.
    pub fn decode(header: &[u8; layout::RECORD_HEADER_LEN]) -> Self {
        let command = header[layout::COMMAND_OFFSET];
        let frame_len = header_u16(header, layout::FRAME_LENGTH_RANGE);
        let (kind, body_len) = match command {
            layout::COMMAND_RX | layout::COMMAND_TX => (RecordKind::Frame, frame_len),
            cmd if layout::CONTROL_A_COMMANDS.contains(&cmd) => (RecordKind::ControlA, frame_len),
            layout::CONTROL_B_COMMAND => (
                RecordKind::ControlB,
                header_u16(header, layout::CONTROL_B_LENGTH_RANGE),
            ),
            _ => (RecordKind::Unknown, 0),
        };
        let is_tx = kind == RecordKind::Frame
            && command & layout::COMMAND_DIRECTION_MASK == layout::COMMAND_TX_NIBBLE;
        Self {
            command,
            kind,
            body_len,
            is_tx,
        }
    }

    pub fn is_frame(&self) -> bool {
        self.kind == RecordKind::Frame
    }
}

fn header_u16(header: &[u8; layout::RECORD_HEADER_LEN], range: std::ops::Range<usize>) -> usize {
    u16::from_be_bytes([header[range.start], header[range.start + 1]]) as usize
}

/// A frame record located by the scanner.
#[derive(Debug, Clone)]
pub struct FrameRecord {
    /// Stream offset of the record header.
    pub offset: u64,
    pub header: RecordHeader,
    pub body: Vec<u8>,
}

/// Read one record header at the current position.
///
/// Returns `Ok(None)` on a clean end of stream (no header bytes at all).
///
/// # Errors
/// Returns `VwrError::ShortHeader` when the stream ends inside a header.
pub fn read_record_header<R: Read>(
    reader: &mut R,
    offset: u64,
) -> Result<Option<RecordHeader>, VwrError> {
    let mut raw = [0u8; layout::RECORD_HEADER_LEN];
    let read = read_up_to(reader, &mut raw)?;
    if read == 0 {
        return Ok(None);
    }
    if read < raw.len() {
        return Err(VwrError::ShortHeader {
            offset,
            expected: raw.len(),
            actual: read,
        });
    }
    Ok(Some(RecordHeader::decode(&raw)))
}

/// Consume `len` body bytes of the record at `offset` without keeping them.
///
/// # Errors
/// Returns `VwrError::ShortBody` when the stream ends first, or `VwrError::Io`.
pub fn skip_body<R: Read>(reader: &mut R, offset: u64, len: usize) -> Result<(), VwrError> {
    let skipped = io::copy(&mut reader.by_ref().take(len as u64), &mut io::sink())?;
    if skipped < len as u64 {
        return Err(VwrError::ShortBody {
            offset,
            expected: len,
            actual: skipped as usize,
        });
    }
    Ok(())
}

enum ScanState {
    ReadHeader,
    SkipNonFrame { offset: u64, header: RecordHeader },
    HaveFrame { offset: u64, header: RecordHeader },
}

/// Advance to the next frame record, skipping control records.
///
/// Returns `Ok(None)` on a clean end of stream.
///
/// # Errors
/// Returns `VwrError::InvalidRecordLength` for a declared body above
/// [`layout::MAX_BODY_LEN`], `VwrError::ShortHeader`/`VwrError::ShortBody`
/// when the stream ends inside a record, or `VwrError::Io`.
pub fn next_frame_record<R: Read + Seek>(reader: &mut R) -> Result<Option<FrameRecord>, VwrError> {
    let mut state = ScanState::ReadHeader;
    loop {
        state = match state {
            ScanState::ReadHeader => {
                let offset = reader.stream_position()?;
                let header = match read_record_header(reader, offset)? {
                    Some(header) => header,
                    None => return Ok(None),
                };
                if header.body_len > layout::MAX_BODY_LEN {
                    return Err(VwrError::InvalidRecordLength {
                        offset,
                        length: header.body_len,
                        max: layout::MAX_BODY_LEN,
                    });
                }
                if header.is_frame() {
                    ScanState::HaveFrame { offset, header }
                } else {
                    ScanState::SkipNonFrame { offset, header }
                }
            }
            ScanState::SkipNonFrame { offset, header } => {
                if header.kind == RecordKind::Unknown {
                    warn!(offset, command = header.command, "unknown record command");
                } else {
                    debug!(offset, kind = ?header.kind, len = header.body_len, "skipping control record");
                }
                skip_body(reader, offset, header.body_len)?;
                ScanState::ReadHeader
            }
            ScanState::HaveFrame { offset, header } => {
                let mut body = vec![0u8; header.body_len];
                let read = read_up_to(reader, &mut body)?;
                if read < body.len() {
                    return Err(VwrError::ShortBody {
                        offset,
                        expected: body.len(),
                        actual: read,
                    });
                }
                return Ok(Some(FrameRecord {
                    offset,
                    header,
                    body,
                }));
            }
        };
    }
}
