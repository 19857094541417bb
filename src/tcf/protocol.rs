//! # TCF Protocol Constants and Types
//!
//! Core definitions for the Telemetry Container Format: record header layout,
//! four-character tags and scalar type codes.

use bytes::Buf;
use std::fmt;

/// Record header size: tag(4) + type(1) + element size(1) + repeat(2)
pub const TCF_HEADER_SIZE: usize = 8;

/// Payloads are padded up to this boundary
pub const TCF_ALIGNMENT: usize = 4;

/// Maximum container nesting accepted by the decoder
pub const TCF_MAX_NESTING_DEPTH: usize = 16;

/// Four-character record tag
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    /// Build a tag from its four ASCII bytes
    pub const fn new(raw: &[u8; 4]) -> Self {
        Self(*raw)
    }

    /// Raw tag bytes
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if b.is_ascii_graphic() || b == b' ' {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{:02X}", b)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCC({})", self)
    }
}

/// Well-known tags
pub mod tags {
    use super::FourCC;

    /// Device container
    pub const DEVC: FourCC = FourCC::new(b"DEVC");
    /// Stream container
    pub const STRM: FourCC = FourCC::new(b"STRM");
    /// Device name
    pub const DVNM: FourCC = FourCC::new(b"DVNM");
    /// Scale divisors for the following samples
    pub const SCAL: FourCC = FourCC::new(b"SCAL");
    /// Structure description for complex (`?`) payloads
    pub const TYPE: FourCC = FourCC::new(b"TYPE");
    /// Total samples delivered
    pub const TSMP: FourCC = FourCC::new(b"TSMP");
    /// GPS UTC time, `yymmddhhmmss.sss`
    pub const GPSU: FourCC = FourCC::new(b"GPSU");
    /// GPS fix quality
    pub const GPSF: FourCC = FourCC::new(b"GPSF");
    /// GPS samples: lat, lon, alt, 2D speed, 3D speed
    pub const GPS5: FourCC = FourCC::new(b"GPS5");
    /// Legacy system clock (seconds, milliseconds)
    pub const SYST: FourCC = FourCC::new(b"SYST");
    /// Legacy raw GPS fix (Karma)
    pub const GPRI: FourCC = FourCC::new(b"GPRI");
    /// Camera orientation quaternion
    pub const CORI: FourCC = FourCC::new(b"CORI");
    /// Gravity vector
    pub const GRAV: FourCC = FourCC::new(b"GRAV");
    /// Accelerometer
    pub const ACCL: FourCC = FourCC::new(b"ACCL");
}

/// GPS5 field count
pub const GPS5_FIELDS: usize = 5;

/// Field positions inside a legacy GPRI tuple
pub mod gpri {
    /// GPS time
    pub const TIME: usize = 0;
    /// Latitude
    pub const LAT: usize = 1;
    /// Longitude
    pub const LON: usize = 2;
    /// Altitude
    pub const ALT: usize = 3;
    /// Ground speed
    pub const SPEED: usize = 6;
    /// Minimum field count for a usable fix
    pub const MIN_FIELDS: usize = SPEED + 1;
}

/// Scalar type code carried in the record header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCode {
    /// `b` signed 8-bit
    I8,
    /// `B` unsigned 8-bit
    U8,
    /// `c` ASCII text
    Char,
    /// `d` IEEE double
    F64,
    /// `f` IEEE float
    F32,
    /// `F` four character code
    FourCC,
    /// `G` 128-bit identifier
    Guid,
    /// `j` signed 64-bit
    I64,
    /// `J` unsigned 64-bit
    U64,
    /// `l` signed 32-bit
    I32,
    /// `L` unsigned 32-bit
    U32,
    /// `q` Q15.16 fixed point
    Q15_16,
    /// `Q` Q31.32 fixed point
    Q31_32,
    /// `s` signed 16-bit
    I16,
    /// `S` unsigned 16-bit
    U16,
    /// `U` UTC date string
    UtcDate,
    /// `?` structure described by a sibling TYPE record
    Complex,
    /// `0x00` nested container
    Nested,
    /// Anything else, kept as raw bytes
    Unknown(u8),
}

impl TypeCode {
    /// Map a header byte to a type code
    pub fn from_byte(b: u8) -> Self {
        match b {
            b'b' => Self::I8,
            b'B' => Self::U8,
            b'c' => Self::Char,
            b'd' => Self::F64,
            b'f' => Self::F32,
            b'F' => Self::FourCC,
            b'G' => Self::Guid,
            b'j' => Self::I64,
            b'J' => Self::U64,
            b'l' => Self::I32,
            b'L' => Self::U32,
            b'q' => Self::Q15_16,
            b'Q' => Self::Q31_32,
            b's' => Self::I16,
            b'S' => Self::U16,
            b'U' => Self::UtcDate,
            b'?' => Self::Complex,
            0 => Self::Nested,
            other => Self::Unknown(other),
        }
    }

    /// Header byte for this type code
    pub fn as_byte(self) -> u8 {
        match self {
            Self::I8 => b'b',
            Self::U8 => b'B',
            Self::Char => b'c',
            Self::F64 => b'd',
            Self::F32 => b'f',
            Self::FourCC => b'F',
            Self::Guid => b'G',
            Self::I64 => b'j',
            Self::U64 => b'J',
            Self::I32 => b'l',
            Self::U32 => b'L',
            Self::Q15_16 => b'q',
            Self::Q31_32 => b'Q',
            Self::I16 => b's',
            Self::U16 => b'S',
            Self::UtcDate => b'U',
            Self::Complex => b'?',
            Self::Nested => 0,
            Self::Unknown(b) => b,
        }
    }

    /// Width in bytes of one scalar, if the code has a fixed width
    pub fn width(self) -> Option<usize> {
        match self {
            Self::I8 | Self::U8 | Self::Char => Some(1),
            Self::I16 | Self::U16 => Some(2),
            Self::I32 | Self::U32 | Self::F32 | Self::FourCC | Self::Q15_16 => Some(4),
            Self::I64 | Self::U64 | Self::F64 | Self::Q31_32 => Some(8),
            Self::Guid | Self::UtcDate => Some(16),
            Self::Complex | Self::Nested | Self::Unknown(_) => None,
        }
    }

    /// Whether the code holds text rather than numbers
    pub fn is_text(self) -> bool {
        matches!(self, Self::Char | Self::UtcDate)
    }
}

/// Parsed 8-byte record header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    /// Record tag
    pub tag: FourCC,

    /// Scalar type code
    pub type_code: TypeCode,

    /// Bytes per element
    pub element_size: u8,

    /// Number of elements
    pub repeat: u16,
}

impl RecordHeader {
    /// Parse a header from exactly [`TCF_HEADER_SIZE`] bytes (big-endian)
    pub fn parse(raw: &[u8; TCF_HEADER_SIZE]) -> Self {
        let mut buf = &raw[..];
        let mut tag = [0u8; 4];
        buf.copy_to_slice(&mut tag);
        let type_code = TypeCode::from_byte(buf.get_u8());
        let element_size = buf.get_u8();
        let repeat = buf.get_u16();

        Self {
            tag: FourCC(tag),
            type_code,
            element_size,
            repeat,
        }
    }

    /// Declared payload length without padding
    pub fn payload_len(&self) -> usize {
        self.element_size as usize * self.repeat as usize
    }

    /// Payload length rounded up to the alignment boundary
    pub fn padded_len(&self) -> usize {
        pad4(self.payload_len())
    }

    /// Total bytes this record occupies in the stream
    pub fn record_len(&self) -> usize {
        TCF_HEADER_SIZE + self.padded_len()
    }
}

/// Round `len` up to the next multiple of [`TCF_ALIGNMENT`]
pub fn pad4(len: usize) -> usize {
    (len + TCF_ALIGNMENT - 1) / TCF_ALIGNMENT * TCF_ALIGNMENT
}
