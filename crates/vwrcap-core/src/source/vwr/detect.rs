use std::io::{Read, Seek, SeekFrom};

use tracing::debug;

use super::error::VwrError;
use super::layout::{self, FieldLayout, Revision};
use super::reader::{TrailerReader, read_up_to};
use super::record::{read_record_header, skip_body};

/// Frame records examined before an ambiguous match falls back to ordering.
pub const PROBE_FRAMES: usize = 16;

/// Identify the hardware revision of a capture stream.
///
/// Scans forward to the first frame record and keeps every layout whose
/// padded payload length plus fixed length equals the body length. Short
/// frames can satisfy more than one layout; later frame records then narrow
/// the set until one layout remains, up to [`PROBE_FRAMES`] records. A tie
/// left at that point is broken by [`match_layout`] on the first record. The
/// stream position is restored to where detection began, whatever the
/// outcome.
///
/// Returns `Ok(None)` when the stream is not a capture log: no frame record
/// before end of stream, a truncated or oversized first record, or no layout
/// explaining the first frame record.
///
/// # Errors
/// Only genuine I/O failures are reported as errors.
pub fn detect_revision<R: Read + Seek>(reader: &mut R) -> Result<Option<Revision>, VwrError> {
    let start = reader.stream_position()?;
    let result = probe(reader);
    reader.seek(SeekFrom::Start(start))?;
    let revision = result?;
    debug!(start, revision = ?revision, "revision detection finished");
    Ok(revision)
}

fn probe<R: Read + Seek>(reader: &mut R) -> Result<Option<Revision>, VwrError> {
    let first = match next_probe_body(reader)? {
        Some(body) => body,
        None => return Ok(None),
    };
    let mut candidates = candidate_layouts(&first);

    let mut probed = 1;
    while candidates.len() > 1 && probed < PROBE_FRAMES {
        let body = match next_probe_body(reader)? {
            Some(body) => body,
            None => break,
        };
        probed += 1;
        let narrowed: Vec<_> = candidates
            .iter()
            .copied()
            .filter(|layout| layout_matches(layout, &body))
            .collect();
        if narrowed.is_empty() {
            debug!(probed, "later frame record fits no remaining layout");
            break;
        }
        candidates = narrowed;
    }
    if candidates.len() > 1 {
        debug!(
            probed,
            candidates = candidates.len(),
            "ambiguous revision, using first record"
        );
    }
    Ok(preferred(&candidates, &first).map(|layout| layout.revision))
}

/// Body of the next frame record, or `None` when the stream ends or stops
/// looking like a capture log before one is complete.
fn next_probe_body<R: Read + Seek>(reader: &mut R) -> Result<Option<Vec<u8>>, VwrError> {
    loop {
        let offset = reader.stream_position()?;
        let header = match read_record_header(reader, offset) {
            Ok(Some(header)) => header,
            Ok(None) | Err(VwrError::ShortHeader { .. }) => return Ok(None),
            Err(err) => return Err(err),
        };
        if header.body_len > layout::MAX_BODY_LEN {
            debug!(offset, len = header.body_len, "probe hit oversized record");
            return Ok(None);
        }
        if !header.is_frame() {
            match skip_body(reader, offset, header.body_len) {
                Ok(()) => continue,
                Err(VwrError::ShortBody { .. }) => return Ok(None),
                Err(err) => return Err(err),
            }
        }

        let mut body = vec![0u8; header.body_len];
        if read_up_to(reader, &mut body)? < body.len() {
            return Ok(None);
        }
        return Ok(Some(body));
    }
}

/// Layouts, in detection order, that explain the body length.
pub fn candidate_layouts(body: &[u8]) -> Vec<&'static FieldLayout> {
    FieldLayout::all()
        .iter()
        .filter(|layout| layout_matches(layout, body))
        .collect()
}

/// Best layout for a single frame record body.
///
/// Among the layouts that explain the body length, one that reads a non-empty
/// payload wins over one that reads an empty payload; otherwise detection
/// order decides.
pub fn match_layout(body: &[u8]) -> Option<&'static FieldLayout> {
    preferred(&candidate_layouts(body), body)
}

fn preferred(
    candidates: &[&'static FieldLayout],
    body: &[u8],
) -> Option<&'static FieldLayout> {
    candidates
        .iter()
        .copied()
        .min_by_key(|layout| declared_len(layout, body).is_none_or(|len| len == 0))
}

/// Whether `layout` explains a frame record body of this length.
pub fn layout_matches(layout: &FieldLayout, body: &[u8]) -> bool {
    declared_len(layout, body)
        .is_some_and(|declared| layout::pad4(declared) + layout.fixed_len() == body.len())
}

fn declared_len(layout: &FieldLayout, body: &[u8]) -> Option<usize> {
    TrailerReader::new(body, layout, 0)
        .and_then(|trailer| trailer.msdu_length())
        .ok()
}
