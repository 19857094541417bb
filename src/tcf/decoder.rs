//! # TCF Record Decoder
//!
//! Walks a byte buffer of nested KLV records and produces a record tree.

use tracing::trace;

use super::codec::{decode_element, decode_structured, parse_layout, Truncated, Value};
use super::protocol::*;
use crate::error::{Result, TrackError};

/// One decoded record
#[derive(Debug, Clone, PartialEq)]
pub struct Klv {
    /// Record header
    pub header: RecordHeader,

    /// Absolute byte offset of the header in the input buffer
    pub offset: usize,

    /// Decoded body
    pub body: KlvBody,
}

/// Body of a decoded record
#[derive(Debug, Clone, PartialEq)]
pub enum KlvBody {
    /// Child records of a container
    Nested(Vec<Klv>),

    /// One tuple per repeated element
    Tuples(Vec<Vec<Value>>),
}

/// Decode every top-level record in `buf`
///
/// # Errors
///
/// Returns error if:
/// - A header or payload runs past the end of its enclosing buffer
/// - Containers nest deeper than [`TCF_MAX_NESTING_DEPTH`]
pub fn decode_buffer(buf: &[u8]) -> Result<Vec<Klv>> {
    decode_level(buf, 0, 0)
}

/// Decode the sibling records filling `buf`
///
/// `base` is the absolute offset of `buf[0]`, used for error context.
fn decode_level(buf: &[u8], base: usize, depth: usize) -> Result<Vec<Klv>> {
    if depth > TCF_MAX_NESTING_DEPTH {
        return Err(TrackError::NestingTooDeep {
            depth: TCF_MAX_NESTING_DEPTH,
            offset: base,
        });
    }

    let mut records = Vec::new();
    let mut layout: Option<Vec<TypeCode>> = None;
    let mut pos = 0;

    while pos < buf.len() {
        let (record, consumed) = decode_record(&buf[pos..], base + pos, depth, layout.as_deref())?;

        if record.header.tag == tags::TYPE {
            layout = type_layout(&record);
        }

        pos += consumed;
        records.push(record);
    }

    Ok(records)
}

/// Decode one record from the front of `buf`
///
/// Returns the record and the number of bytes it occupies, header and padding
/// included. The padded length is consumed whether or not the payload could
/// be interpreted.
pub fn decode_record(
    buf: &[u8],
    offset: usize,
    depth: usize,
    layout: Option<&[TypeCode]>,
) -> Result<(Klv, usize)> {
    let raw: &[u8; TCF_HEADER_SIZE] = buf
        .get(..TCF_HEADER_SIZE)
        .and_then(|h| h.try_into().ok())
        .ok_or_else(|| TrackError::MalformedPayload {
            tag: partial_tag(buf),
            offset,
            needed: TCF_HEADER_SIZE,
            available: buf.len(),
        })?;
    let header = RecordHeader::parse(raw);

    let rest = &buf[TCF_HEADER_SIZE..];
    let payload_len = header.payload_len();
    if rest.len() < payload_len {
        return Err(TrackError::MalformedPayload {
            tag: header.tag,
            offset,
            needed: payload_len,
            available: rest.len(),
        });
    }
    let payload = &rest[..payload_len];

    // Padding may be missing on the final record of a buffer
    let consumed = TCF_HEADER_SIZE + header.padded_len().min(rest.len());

    trace!(
        "{} type={:?} size={} repeat={} at {}",
        header.tag, header.type_code, header.element_size, header.repeat, offset
    );

    let body = match header.type_code {
        TypeCode::Nested => KlvBody::Nested(decode_level(
            payload,
            offset + TCF_HEADER_SIZE,
            depth + 1,
        )?),
        _ => KlvBody::Tuples(
            decode_tuples(&header, payload, layout).map_err(|t| TrackError::MalformedPayload {
                tag: header.tag,
                offset,
                needed: t.needed,
                available: t.available,
            })?,
        ),
    };

    Ok((Klv { header, offset, body }, consumed))
}

fn decode_tuples(
    header: &RecordHeader,
    payload: &[u8],
    layout: Option<&[TypeCode]>,
) -> std::result::Result<Vec<Vec<Value>>, Truncated> {
    let size = header.element_size as usize;
    if size == 0 || payload.is_empty() {
        return Ok(Vec::new());
    }

    // Single-byte strings are spread over the repeat count
    if header.type_code == TypeCode::Char && size == 1 {
        return Ok(vec![decode_element(TypeCode::Char, payload)?]);
    }

    payload
        .chunks_exact(size)
        .map(|element| match (header.type_code, layout) {
            (TypeCode::Complex, Some(layout)) => Ok(decode_structured(layout, element)
                .unwrap_or_else(|| vec![Value::Bytes(bytes::Bytes::copy_from_slice(element))])),
            (code, _) => decode_element(code, element),
        })
        .collect()
}

fn type_layout(record: &Klv) -> Option<Vec<TypeCode>> {
    match &record.body {
        KlvBody::Tuples(tuples) => tuples
            .first()
            .and_then(|t| t.first())
            .and_then(Value::as_str)
            .and_then(parse_layout),
        KlvBody::Nested(_) => None,
    }
}

fn partial_tag(buf: &[u8]) -> FourCC {
    let mut raw = [b'?'; 4];
    for (dst, &src) in raw.iter_mut().zip(buf) {
        *dst = src;
    }
    FourCC(raw)
}

impl Klv {
    /// Child records if this is a container
    pub fn children(&self) -> Option<&[Klv]> {
        match &self.body {
            KlvBody::Nested(children) => Some(children),
            KlvBody::Tuples(_) => None,
        }
    }
}
