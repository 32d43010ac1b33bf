//! Shared types: [`ByteOrder`], [`SampleFormat`], [`Variant`], and the
//! open-time settings [`Endianness`] and [`AccessMode`].

use std::fmt;

use crate::{Result, SegyError};

/// Byte order of multi-byte sample words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ByteOrder {
    Big,
    Little,
}

impl ByteOrder {
    /// The opposite byte order.
    pub fn swapped(self) -> Self {
        match self {
            Self::Big => Self::Little,
            Self::Little => Self::Big,
        }
    }
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Big => write!(f, "big-endian"),
            Self::Little => write!(f, "little-endian"),
        }
    }
}

/// Sample encoding declared by the binary reel header `format` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SampleFormat {
    /// 32-bit IBM/370 hexadecimal floating point (code 1).
    IbmFloat32,
    /// 32-bit two's-complement integer (code 2).
    Int32,
    /// 16-bit two's-complement integer (code 3).
    Int16,
    /// 32-bit fixed point with gain, legacy (code 4).
    FixedPointGain32,
    /// 32-bit IEEE-754 float (code 5).
    IeeeFloat32,
    /// 8-bit two's-complement integer (code 8).
    Int8,
}

impl SampleFormat {
    /// Convert a raw `format` code from the binary header.
    pub fn from_code(code: u16) -> Result<Self> {
        match code {
            1 => Ok(Self::IbmFloat32),
            2 => Ok(Self::Int32),
            3 => Ok(Self::Int16),
            4 => Ok(Self::FixedPointGain32),
            5 => Ok(Self::IeeeFloat32),
            8 => Ok(Self::Int8),
            _ => Err(SegyError::UnsupportedFormat(code)),
        }
    }

    /// Convert to the raw `format` code for the binary header.
    pub fn to_code(self) -> u16 {
        match self {
            Self::IbmFloat32 => 1,
            Self::Int32 => 2,
            Self::Int16 => 3,
            Self::FixedPointGain32 => 4,
            Self::IeeeFloat32 => 5,
            Self::Int8 => 8,
        }
    }

    /// Bytes per on-disk sample.
    pub fn sample_width(self) -> usize {
        match self {
            Self::Int16 => 2,
            Self::Int8 => 1,
            _ => 4,
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IbmFloat32 => write!(f, "IBM32"),
            Self::Int32 => write!(f, "INT32"),
            Self::Int16 => write!(f, "INT16"),
            Self::FixedPointGain32 => write!(f, "FIXED32-GAIN"),
            Self::IeeeFloat32 => write!(f, "IEEE32"),
            Self::Int8 => write!(f, "INT8"),
        }
    }
}

/// File-level layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variant {
    /// Text header, binary header, then traces.
    #[default]
    Segy,
    /// Seismic Unix: traces only, IEEE float samples.
    Su,
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Segy => write!(f, "SEG-Y"),
            Self::Su => write!(f, "SU"),
        }
    }
}

/// Sample byte order requested when opening a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endianness {
    /// Guess from the sample data of the first non-zero trace.
    #[default]
    Auto,
    /// Samples are known to be big-endian.
    Big,
    /// Samples are known to be little-endian.
    Little,
}

/// How trace bytes are reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessMode {
    /// Memory-map the file, falling back to stream reads if mapping fails.
    #[default]
    Auto,
    /// Memory-map the file; fail if that is not possible.
    Mapped,
    /// Seek and read through the file descriptor.
    Stream,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_codes_roundtrip() {
        for code in [1u16, 2, 3, 4, 5, 8] {
            let format = SampleFormat::from_code(code).unwrap();
            assert_eq!(format.to_code(), code);
        }
    }

    #[test]
    fn test_unknown_format_code_rejected() {
        for code in [0u16, 6, 7, 9, 16] {
            assert!(matches!(
                SampleFormat::from_code(code),
                Err(SegyError::UnsupportedFormat(c)) if c == code
            ));
        }
    }

    #[test]
    fn test_sample_widths() {
        assert_eq!(SampleFormat::IbmFloat32.sample_width(), 4);
        assert_eq!(SampleFormat::Int32.sample_width(), 4);
        assert_eq!(SampleFormat::Int16.sample_width(), 2);
        assert_eq!(SampleFormat::FixedPointGain32.sample_width(), 4);
        assert_eq!(SampleFormat::IeeeFloat32.sample_width(), 4);
        assert_eq!(SampleFormat::Int8.sample_width(), 1);
    }

    #[test]
    fn test_byte_order_swapped() {
        assert_eq!(ByteOrder::Big.swapped(), ByteOrder::Little);
        assert_eq!(ByteOrder::Little.swapped().swapped(), ByteOrder::Little);
    }
}
