//! # TCF Type Codec
//!
//! Decodes single scalar values, and element tuples built from them, for
//! every header type code.

use bytes::{Buf, Bytes};
use thiserror::Error;

use super::protocol::{FourCC, TypeCode};

/// A slice was shorter than the width its type code declares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("needed {needed} bytes, {available} available")]
pub struct Truncated {
    pub needed: usize,
    pub available: usize,
}

/// One decoded scalar
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    UInt(u64),
    Float(f64),
    FourCC(FourCC),
    Text(String),
    Bytes(Bytes),
}

impl Value {
    /// Numeric view of the value, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Int(v) => Some(v as f64),
            Value::UInt(v) => Some(v as f64),
            Value::Float(v) => Some(v),
            _ => None,
        }
    }

    /// Unsigned integer view, rejecting negatives and fractions
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::Int(v) => u64::try_from(v).ok(),
            Value::UInt(v) => Some(v),
            _ => None,
        }
    }

    /// Text view
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Decode one scalar of type `code` from the front of `bytes`
///
/// # Errors
///
/// Returns [`Truncated`] if `bytes` is shorter than the code's width.
/// Codes without a fixed width (unknown, complex) consume the whole slice as
/// opaque bytes and never fail.
pub fn decode_scalar(code: TypeCode, bytes: &[u8]) -> Result<Value, Truncated> {
    let width = match code.width() {
        Some(w) => w,
        None => return Ok(Value::Bytes(Bytes::copy_from_slice(bytes))),
    };

    if bytes.len() < width {
        return Err(Truncated {
            needed: width,
            available: bytes.len(),
        });
    }

    let mut buf = &bytes[..width];
    let value = match code {
        TypeCode::I8 => Value::Int(buf.get_i8() as i64),
        TypeCode::U8 => Value::UInt(buf.get_u8() as u64),
        TypeCode::I16 => Value::Int(buf.get_i16() as i64),
        TypeCode::U16 => Value::UInt(buf.get_u16() as u64),
        TypeCode::I32 => Value::Int(buf.get_i32() as i64),
        TypeCode::U32 => Value::UInt(buf.get_u32() as u64),
        TypeCode::I64 => Value::Int(buf.get_i64()),
        TypeCode::U64 => Value::UInt(buf.get_u64()),
        TypeCode::F32 => Value::Float(buf.get_f32() as f64),
        TypeCode::F64 => Value::Float(buf.get_f64()),
        TypeCode::Q15_16 => Value::Float(buf.get_i32() as f64 / 65_536.0),
        TypeCode::Q31_32 => Value::Float(buf.get_i64() as f64 / 4_294_967_296.0),
        TypeCode::FourCC => {
            let mut raw = [0u8; 4];
            buf.copy_to_slice(&mut raw);
            Value::FourCC(FourCC(raw))
        }
        TypeCode::Char | TypeCode::UtcDate => Value::Text(decode_text(buf)),
        TypeCode::Guid => Value::Bytes(Bytes::copy_from_slice(buf)),
        TypeCode::Complex | TypeCode::Nested | TypeCode::Unknown(_) => {
            Value::Bytes(Bytes::copy_from_slice(buf))
        }
    };

    Ok(value)
}

/// Decode one element of `element.len()` bytes into a tuple of scalars
///
/// Text codes produce a single string for the whole element. Numeric codes
/// split the element into `len / width` scalars; an element that is not a
/// whole number of scalars is returned as one opaque blob.
pub fn decode_element(code: TypeCode, element: &[u8]) -> Result<Vec<Value>, Truncated> {
    if code.is_text() {
        return Ok(vec![Value::Text(decode_text(element))]);
    }

    match code.width() {
        Some(width) if !element.is_empty() && element.len() % width == 0 => element
            .chunks_exact(width)
            .map(|chunk| decode_scalar(code, chunk))
            .collect(),
        _ => Ok(vec![Value::Bytes(Bytes::copy_from_slice(element))]),
    }
}

/// Decode one element laid out as the scalar sequence `layout`
///
/// Returns `None` when the layout does not cover the element exactly.
pub fn decode_structured(layout: &[TypeCode], element: &[u8]) -> Option<Vec<Value>> {
    let total: usize = layout.iter().map(|c| c.width()).sum::<Option<usize>>()?;
    if total != element.len() {
        return None;
    }

    let mut offset = 0;
    let mut values = Vec::with_capacity(layout.len());
    for &code in layout {
        let width = code.width()?;
        values.push(decode_scalar(code, &element[offset..offset + width]).ok()?);
        offset += width;
    }

    Some(values)
}

/// Parse a TYPE record string into scalar codes
///
/// Array notation (`[n]`) and nested codes are not supported and yield `None`.
pub fn parse_layout(text: &str) -> Option<Vec<TypeCode>> {
    text.bytes()
        .map(|b| match TypeCode::from_byte(b) {
            TypeCode::Nested | TypeCode::Complex | TypeCode::Unknown(_) => None,
            code => Some(code),
        })
        .collect()
}

fn decode_text(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_signed_integers() {
        assert_eq!(decode_scalar(TypeCode::I8, &[0xFF]).unwrap(), Value::Int(-1));
        assert_eq!(decode_scalar(TypeCode::I16, &[0xFF, 0xFE]).unwrap(), Value::Int(-2));
        assert_eq!(
            decode_scalar(TypeCode::I32, &(-123_456i32).to_be_bytes()).unwrap(),
            Value::Int(-123_456)
        );
        assert_eq!(
            decode_scalar(TypeCode::I64, &(-5i64).to_be_bytes()).unwrap(),
            Value::Int(-5)
        );
    }

    #[test]
    fn test_decode_unsigned_integers() {
        assert_eq!(decode_scalar(TypeCode::U8, &[0xFF]).unwrap(), Value::UInt(255));
        assert_eq!(decode_scalar(TypeCode::U16, &[0x01, 0x00]).unwrap(), Value::UInt(256));
        assert_eq!(
            decode_scalar(TypeCode::U32, &[0x00, 0x01, 0x00, 0x00]).unwrap(),
            Value::UInt(65_536)
        );
        assert_eq!(
            decode_scalar(TypeCode::U64, &u64::MAX.to_be_bytes()).unwrap(),
            Value::UInt(u64::MAX)
        );
    }

    #[test]
    fn test_decode_floats() {
        assert_eq!(
            decode_scalar(TypeCode::F32, &1.5f32.to_be_bytes()).unwrap(),
            Value::Float(1.5)
        );
        assert_eq!(
            decode_scalar(TypeCode::F64, &(-2.25f64).to_be_bytes()).unwrap(),
            Value::Float(-2.25)
        );
    }

    #[test]
    fn test_decode_fixed_point() {
        // 1.5 in Q15.16
        let q = decode_scalar(TypeCode::Q15_16, &0x0001_8000i32.to_be_bytes()).unwrap();
        assert_eq!(q, Value::Float(1.5));

        // -0.5 in Q31.32
        let q = decode_scalar(TypeCode::Q31_32, &(-(1i64 << 31)).to_be_bytes()).unwrap();
        assert_eq!(q, Value::Float(-0.5));
    }

    #[test]
    fn test_decode_fourcc_and_text() {
        assert_eq!(
            decode_scalar(TypeCode::FourCC, b"GPS5").unwrap(),
            Value::FourCC(FourCC::new(b"GPS5"))
        );
        let text = decode_element(TypeCode::Char, b"HERO7\0\0\0").unwrap();
        assert_eq!(text, vec![Value::Text("HERO7".to_string())]);
    }

    #[test]
    fn test_decode_truncated() {
        let err = decode_scalar(TypeCode::I32, &[0x00, 0x01]).unwrap_err();
        assert_eq!(err, Truncated { needed: 4, available: 2 });
    }

    #[test]
    fn test_unknown_code_is_opaque() {
        let value = decode_scalar(TypeCode::Unknown(b'z'), &[1, 2, 3]).unwrap();
        assert_eq!(value, Value::Bytes(Bytes::from_static(&[1, 2, 3])));
    }

    #[test]
    fn test_decode_element_tuple() {
        let mut element = Vec::new();
        for v in [100i32, 200, 300] {
            element.extend_from_slice(&v.to_be_bytes());
        }
        let tuple = decode_element(TypeCode::I32, &element).unwrap();
        assert_eq!(tuple, vec![Value::Int(100), Value::Int(200), Value::Int(300)]);
    }

    #[test]
    fn test_decode_element_misaligned_is_opaque() {
        let tuple = decode_element(TypeCode::I32, &[1, 2, 3, 4, 5, 6]).unwrap();
        assert!(matches!(tuple.as_slice(), [Value::Bytes(b)] if b.len() == 6));
    }

    #[test]
    fn test_decode_structured() {
        let layout = parse_layout("lSB").unwrap();
        let element = [0, 0, 0, 7, 0, 9, 1];
        let values = decode_structured(&layout, &element).unwrap();
        assert_eq!(values, vec![Value::Int(7), Value::UInt(9), Value::UInt(1)]);

        assert!(decode_structured(&layout, &element[..6]).is_none());
    }

    #[test]
    fn test_parse_layout_rejects_arrays() {
        assert!(parse_layout("JlllSSSSBB").is_some());
        assert!(parse_layout("f[8]").is_none());
    }

    #[test]
    fn test_value_views() {
        assert_eq!(Value::Int(-3).as_f64(), Some(-3.0));
        assert_eq!(Value::Int(-3).as_u64(), None);
        assert_eq!(Value::UInt(3).as_u64(), Some(3));
        assert_eq!(Value::Text("x".into()).as_str(), Some("x"));
        assert_eq!(Value::Text("x".into()).as_f64(), None);
    }
}
