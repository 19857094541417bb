//! # TCF Record Encoder
//!
//! Builds well-formed records, mainly for fixtures and raw dump synthesis.

use super::protocol::*;

/// Encode one record with an explicit header
///
/// The payload is written as given and zero-padded to the alignment boundary.
/// `payload` should be `element_size × repeat` bytes long.
///
/// # Examples
///
/// ```
/// use tcf_track::tcf::encoder::encode_record;
/// use tcf_track::tcf::protocol::{tags, TypeCode};
///
/// let record = encode_record(tags::GPSF, TypeCode::U32, 4, 1, &3u32.to_be_bytes());
/// assert_eq!(record.len(), 12);
/// ```
pub fn encode_record(
    tag: FourCC,
    type_code: TypeCode,
    element_size: u8,
    repeat: u16,
    payload: &[u8],
) -> Vec<u8> {
    let mut out = Vec::with_capacity(TCF_HEADER_SIZE + pad4(payload.len()));
    out.extend_from_slice(tag.as_bytes());
    out.push(type_code.as_byte());
    out.push(element_size);
    out.extend_from_slice(&repeat.to_be_bytes());
    out.extend_from_slice(payload);
    out.resize(TCF_HEADER_SIZE + pad4(payload.len()), 0);
    out
}

/// Encode a container record wrapping already-encoded children
pub fn encode_container(tag: FourCC, children: &[Vec<u8>]) -> Vec<u8> {
    let payload = children.concat();

    // Large containers switch to 4-byte elements to fit the repeat field
    let (size, repeat) = if payload.len() <= u16::MAX as usize {
        (1u8, payload.len() as u16)
    } else {
        (4u8, (payload.len() / 4) as u16)
    };

    encode_record(tag, TypeCode::Nested, size, repeat, &payload)
}

/// Encode signed 32-bit tuples, one element per tuple
///
/// All tuples must have the same length.
pub fn encode_i32s(tag: FourCC, tuples: &[&[i32]]) -> Vec<u8> {
    let width = tuples.first().map_or(0, |t| t.len());
    let payload: Vec<u8> = tuples
        .iter()
        .flat_map(|t| t.iter().flat_map(|v| v.to_be_bytes()))
        .collect();
    encode_record(tag, TypeCode::I32, (width * 4) as u8, tuples.len() as u16, &payload)
}

/// Encode signed 16-bit tuples, one element per tuple
pub fn encode_i16s(tag: FourCC, tuples: &[&[i16]]) -> Vec<u8> {
    let width = tuples.first().map_or(0, |t| t.len());
    let payload: Vec<u8> = tuples
        .iter()
        .flat_map(|t| t.iter().flat_map(|v| v.to_be_bytes()))
        .collect();
    encode_record(tag, TypeCode::I16, (width * 2) as u8, tuples.len() as u16, &payload)
}

/// Encode a single unsigned 32-bit value
pub fn encode_u32(tag: FourCC, value: u32) -> Vec<u8> {
    encode_record(tag, TypeCode::U32, 4, 1, &value.to_be_bytes())
}

/// Encode a string as one element
pub fn encode_text(tag: FourCC, text: &str) -> Vec<u8> {
    encode_record(tag, TypeCode::Char, text.len() as u8, 1, text.as_bytes())
}

/// Encode a GPS UTC timestamp (`yymmddhhmmss.sss`)
pub fn encode_gps_time(text: &str) -> Vec<u8> {
    encode_record(tags::GPSU, TypeCode::UtcDate, 16, 1, text.as_bytes())
}
