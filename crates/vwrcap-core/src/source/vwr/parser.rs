use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use tracing::debug;

use crate::DecodedFrame;
use crate::source::{PacketSource, SourceError};

use super::decoder::decode_frame;
use super::detect::detect_revision;
use super::error::VwrError;
use super::layout::{FieldLayout, Revision};
use super::record::next_frame_record;

/// Capture-log source yielding decoded frames in stream order.
///
/// The hardware revision is detected once when the source is created and the
/// matching layout is used for every record of the stream.
pub struct VwrFileSource<R = BufReader<File>> {
    reader: R,
    layout: &'static FieldLayout,
}

impl VwrFileSource<BufReader<File>> {
    /// Open a capture file and detect its hardware revision.
    ///
    /// # Errors
    /// Returns `VwrError::FormatMismatch` when no known layout explains the
    /// first frame record, or `VwrError::Io` when the file cannot be read.
    pub fn open(path: &Path) -> Result<Self, VwrError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }
}

impl<R: Read + Seek> VwrFileSource<R> {
    /// Wrap an already opened stream, detecting from its current position.
    ///
    /// # Errors
    /// Same as [`VwrFileSource::open`].
    pub fn from_reader(mut reader: R) -> Result<Self, VwrError> {
        let revision = detect_revision(&mut reader)?.ok_or(VwrError::FormatMismatch)?;
        debug!(%revision, "capture revision selected");
        Ok(Self {
            reader,
            layout: FieldLayout::for_revision(revision),
        })
    }

    pub fn revision(&self) -> Revision {
        self.layout.revision
    }

    pub fn layout(&self) -> &'static FieldLayout {
        self.layout
    }

    /// Decode the next frame record, skipping control records.
    ///
    /// Returns `Ok(None)` at a clean end of stream.
    ///
    /// # Errors
    /// Returns `VwrError` for malformed records, short reads and I/O failures.
    pub fn next_frame(&mut self) -> Result<Option<DecodedFrame>, VwrError> {
        let record = match next_frame_record(&mut self.reader)? {
            Some(record) => record,
            None => return Ok(None),
        };
        decode_frame(
            &record.body,
            record.header.is_tx,
            self.layout,
            record.offset,
        )
        .map(Some)
    }

    /// Decode the first frame record at or after the record header at `offset`.
    ///
    /// The sequential position used by [`VwrFileSource::next_frame`] is
    /// restored afterwards, whether or not the decode succeeds.
    ///
    /// # Errors
    /// Returns `VwrError::NoFrameAt` when no frame record follows `offset`,
    /// plus the errors of [`VwrFileSource::next_frame`].
    pub fn read_frame_at(&mut self, offset: u64) -> Result<DecodedFrame, VwrError> {
        let resume = self.reader.stream_position()?;
        let result = read_frame_at(&mut self.reader, self.layout, offset);
        self.reader.seek(SeekFrom::Start(resume))?;
        result
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read + Seek> PacketSource for VwrFileSource<R> {
    fn next_frame(&mut self) -> Result<Option<DecodedFrame>, SourceError> {
        VwrFileSource::next_frame(self).map_err(SourceError::from)
    }
}

/// Random access with a caller-owned cursor.
///
/// Seeks `reader` to `offset`, which must be the start of a record header, and
/// decodes the next frame record from there using `layout`. Each caller can
/// hold its own handle on the same file and share the layout.
///
/// # Errors
/// Returns `VwrError::NoFrameAt` when the stream ends before a frame record,
/// plus any scan or decode error.
pub fn read_frame_at<R: Read + Seek>(
    reader: &mut R,
    layout: &FieldLayout,
    offset: u64,
) -> Result<DecodedFrame, VwrError> {
    reader.seek(SeekFrom::Start(offset))?;
    let record = next_frame_record(reader)?.ok_or(VwrError::NoFrameAt { offset })?;
    decode_frame(&record.body, record.header.is_tx, layout, record.offset)
}
