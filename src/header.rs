//! SEG-Y reel and trace headers.
//!
//! All header integers are big-endian on disk, whatever the sample byte
//! order. The binary reel header packs 27 fields into its first 60 bytes
//! (`3xu32, 24xu16`); the trace header packs 71 fields into its first 180
//! bytes (`7xu32, 4xu16, 8xu32, 2xu16, 4xu32, 46xu16`). The remaining bytes
//! of each block are reserved and written as zero.
//!
//! Field names follow Seismic Unix (`fldr`, `ns`, `scalco`, ...). The field
//! order is part of the wire format; struct, name table, decoder and encoder
//! are generated from a single declaration per header kind.

use std::fmt;

use crate::ebcdic::{self, EBCDIC_SPACE};
use crate::types::SampleFormat;
use crate::{Result, SegyError};

pub const TEXT_HEADER_LEN: usize = 3200;
pub const BINARY_HEADER_LEN: usize = 400;
pub const TRACE_HEADER_LEN: usize = 240;
/// Text plus binary reel header.
pub const REEL_HEADER_LEN: usize = TEXT_HEADER_LEN + BINARY_HEADER_LEN;

/// Fields kept by [`TraceHeader::decode_major`].
pub const MAJOR_HEADER_FIELDS: [&str; 6] = ["tracr", "fldr", "tracf", "trid", "ns", "dt"];

/// A big-endian header word, stored unsigned.
///
/// Several fields (`scalco`, `sx`, `offset`, ...) hold two's-complement
/// values by convention, so setters accept the signed range as well.
trait PackedField: Copy + Into<i64> {
    const WIDTH: usize;
    const SIGNED_MIN: i64;
    const MAX: i64;

    fn read_be(data: &[u8]) -> Self;
    fn write_be(self, out: &mut [u8]);
    /// Truncate to the field width. `value` lies in `SIGNED_MIN..=MAX`.
    fn wrap(value: i64) -> Self;
    /// Two's-complement reading of the word.
    fn signed(self) -> i64;
}

impl PackedField for u16 {
    const WIDTH: usize = 2;
    const SIGNED_MIN: i64 = i16::MIN as i64;
    const MAX: i64 = u16::MAX as i64;

    fn wrap(value: i64) -> Self {
        value as u16
    }

    fn signed(self) -> i64 {
        i64::from(self as i16)
    }

    fn read_be(data: &[u8]) -> Self {
        u16::from_be_bytes([data[0], data[1]])
    }

    fn write_be(self, out: &mut [u8]) {
        out[..2].copy_from_slice(&self.to_be_bytes());
    }
}

impl PackedField for u32 {
    const WIDTH: usize = 4;
    const SIGNED_MIN: i64 = i32::MIN as i64;
    const MAX: i64 = u32::MAX as i64;

    fn wrap(value: i64) -> Self {
        value as u32
    }

    fn signed(self) -> i64 {
        i64::from(self as i32)
    }

    fn read_be(data: &[u8]) -> Self {
        u32::from_be_bytes([data[0], data[1], data[2], data[3]])
    }

    fn write_be(self, out: &mut [u8]) {
        out[..4].copy_from_slice(&self.to_be_bytes());
    }
}

struct Unpacker<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Unpacker<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn next<T: PackedField>(&mut self) -> T {
        let value = T::read_be(&self.data[self.pos..]);
        self.pos += T::WIDTH;
        value
    }
}

struct Packer<'a> {
    out: &'a mut [u8],
    pos: usize,
}

impl<'a> Packer<'a> {
    fn new(out: &'a mut [u8]) -> Self {
        Self { out, pos: 0 }
    }

    fn put<T: PackedField>(&mut self, value: T) {
        value.write_be(&mut self.out[self.pos..]);
        self.pos += T::WIDTH;
    }
}

fn check_len(data: &[u8], expected: usize) -> Result<()> {
    if data.len() < expected {
        return Err(SegyError::TooShort {
            expected: expected as u64,
            actual: data.len() as u64,
        });
    }
    Ok(())
}

macro_rules! packed_header {
    (
        $(#[$meta:meta])*
        $name:ident, names = $names:ident, block = $block:expr, {
            $($(#[$field_meta:meta])* $field:ident: $ty:ty),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name {
            $($(#[$field_meta])* pub $field: $ty,)+
        }

        #[doc = concat!("Field names of [`", stringify!($name), "`] in wire order.")]
        pub const $names: &[&str] = &[$(stringify!($field)),+];

        impl $name {
            /// Bytes occupied by the named fields.
            pub const PACKED_LEN: usize = 0 $(+ <$ty as PackedField>::WIDTH)+;

            /// On-disk block size, reserved bytes included.
            pub const BLOCK_LEN: usize = $block;

            /// Decode from the start of `data` (at least `PACKED_LEN` bytes).
            pub fn decode(data: &[u8]) -> Result<Self> {
                check_len(data, Self::PACKED_LEN)?;
                let mut unpacker = Unpacker::new(data);
                Ok(Self {
                    $($field: unpacker.next(),)+
                })
            }

            /// Encode into a full block with zeroed reserved bytes.
            pub fn encode(&self) -> [u8; $block] {
                let mut out = [0u8; $block];
                let mut packer = Packer::new(&mut out);
                $(packer.put(self.$field);)+
                out
            }

            /// Look up a field by name, as the raw unsigned word.
            pub fn get(&self, name: &str) -> Option<i64> {
                match name {
                    $(stringify!($field) => Some(self.$field.into()),)+
                    _ => None,
                }
            }

            /// Look up a field by name, read as two's complement.
            pub fn get_signed(&self, name: &str) -> Option<i64> {
                match name {
                    $(stringify!($field) => Some(PackedField::signed(self.$field)),)+
                    _ => None,
                }
            }

            /// Set a field by name.
            ///
            /// Negative values down to the signed minimum of the field width
            /// are stored in two's complement, so `set("scalco", -100)`
            /// stores `0xFF9C`.
            pub fn set(&mut self, name: &str, value: i64) -> Result<()> {
                match name {
                    $(stringify!($field) => {
                        if !(<$ty as PackedField>::SIGNED_MIN..=<$ty as PackedField>::MAX)
                            .contains(&value)
                        {
                            return Err(SegyError::FieldOverflow {
                                field: stringify!($field),
                                value,
                            });
                        }
                        self.$field = <$ty as PackedField>::wrap(value);
                        Ok(())
                    })+
                    _ => Err(SegyError::InvalidHeaderKey(name.to_string())),
                }
            }
        }
    };
}

packed_header! {
    /// Binary reel header (file bytes 3200-3599).
    BinaryHeader, names = BINARY_HEADER_FIELDS, block = BINARY_HEADER_LEN, {
        /// Job identification number.
        jobid: u32,
        /// Line number.
        lino: u32,
        /// Reel number.
        reno: u32,
        /// Data traces per ensemble.
        ntrpr: u16,
        /// Auxiliary traces per ensemble.
        nart: u16,
        /// Sample interval in microseconds.
        hdt: u16,
        dto: u16,
        /// Samples per trace.
        hns: u16,
        nso: u16,
        /// Sample format code.
        format: u16,
        fold: u16,
        tsort: u16,
        vscode: u16,
        hsfs: u16,
        hsfe: u16,
        hslen: u16,
        hstyp: u16,
        schn: u16,
        hstas: u16,
        hstae: u16,
        htatyp: u16,
        hcorr: u16,
        bgrcv: u16,
        rcvm: u16,
        /// Measurement system: 1 = metres, 2 = feet.
        mfeet: u16,
        polyt: u16,
        vpol: u16,
    }
}

packed_header! {
    /// Trace header (240 bytes in front of every trace).
    TraceHeader, names = TRACE_HEADER_FIELDS, block = TRACE_HEADER_LEN, {
        /// Trace sequence number within line.
        tracl: u32,
        /// Trace sequence number within reel.
        tracr: u32,
        /// Field record number.
        fldr: u32,
        /// Trace number within field record.
        tracf: u32,
        ep: u32,
        cdp: u32,
        cdpt: u32,
        /// Trace identification code.
        trid: u16,
        nvs: u16,
        nhs: u16,
        duse: u16,
        offset: u32,
        gelev: u32,
        selev: u32,
        sdepth: u32,
        gdel: u32,
        sdel: u32,
        swdep: u32,
        gwdep: u32,
        /// Elevation scale factor.
        scalel: u16,
        /// Coordinate scale factor.
        scalco: u16,
        sx: u32,
        sy: u32,
        gx: u32,
        gy: u32,
        counit: u16,
        wevel: u16,
        swevel: u16,
        sut: u16,
        gut: u16,
        sstat: u16,
        gstat: u16,
        tstat: u16,
        laga: u16,
        lagb: u16,
        /// Delay recording time in milliseconds.
        delrt: u16,
        muts: u16,
        mute: u16,
        /// Samples in this trace.
        ns: u16,
        /// Sample interval in microseconds.
        dt: u16,
        gain: u16,
        igc: u16,
        igi: u16,
        corr: u16,
        sfs: u16,
        sfe: u16,
        slen: u16,
        styp: u16,
        stas: u16,
        stae: u16,
        tatyp: u16,
        afilf: u16,
        afils: u16,
        nofilf: u16,
        nofils: u16,
        lcf: u16,
        hcf: u16,
        lcs: u16,
        hcs: u16,
        year: u16,
        day: u16,
        hour: u16,
        minute: u16,
        sec: u16,
        timbas: u16,
        trwf: u16,
        grnors: u16,
        grnofr: u16,
        grnlof: u16,
        gaps: u16,
        otrav: u16,
    }
}

impl BinaryHeader {
    /// Sample format declared by the `format` field.
    pub fn sample_format(&self) -> Result<SampleFormat> {
        SampleFormat::from_code(self.format)
    }
}

impl TraceHeader {
    /// Decode only the [`MAJOR_HEADER_FIELDS`]; every other field is zero.
    pub fn decode_major(data: &[u8]) -> Result<Self> {
        check_len(data, Self::PACKED_LEN)?;
        Ok(Self {
            tracr: u32::read_be(&data[4..]),
            fldr: u32::read_be(&data[8..]),
            tracf: u32::read_be(&data[12..]),
            trid: u16::read_be(&data[28..]),
            ns: u16::read_be(&data[114..]),
            dt: u16::read_be(&data[116..]),
            ..Self::default()
        })
    }

    /// Whether `name` is kept by [`TraceHeader::decode_major`].
    pub fn is_major_field(name: &str) -> bool {
        MAJOR_HEADER_FIELDS.contains(&name)
    }

    /// Multiplier for the coordinate fields (`sx`, `sy`, `gx`, `gy`).
    pub fn coordinate_scale(&self) -> f64 {
        scale_factor(self.scalco)
    }

    /// Multiplier for the elevation and depth fields.
    pub fn elevation_scale(&self) -> f64 {
        scale_factor(self.scalel)
    }

    /// Scaled source `(x, y, elevation)`.
    ///
    /// Coordinates are read as signed integers. A zero scale factor is
    /// taken as unscaled.
    pub fn source_position(&self) -> (f64, f64, f64) {
        let xy = or_unscaled(self.coordinate_scale());
        let z = or_unscaled(self.elevation_scale());
        (
            signed(self.sx) * xy,
            signed(self.sy) * xy,
            signed(self.selev) * z,
        )
    }

    /// Scaled receiver `(x, y, elevation)`; see [`TraceHeader::source_position`].
    pub fn receiver_position(&self) -> (f64, f64, f64) {
        let xy = or_unscaled(self.coordinate_scale());
        let z = or_unscaled(self.elevation_scale());
        (
            signed(self.gx) * xy,
            signed(self.gy) * xy,
            signed(self.gelev) * z,
        )
    }
}

/// Interpret a raw `scalco`/`scalel` value.
///
/// The field holds a signed 16-bit value `v`: negative means divide by
/// `|v|`, otherwise multiply by `v`. Zero comes back as zero.
pub fn scale_factor(raw: u16) -> f64 {
    let v = raw as i16;
    if v < 0 {
        1.0 / -f64::from(v)
    } else {
        f64::from(v)
    }
}

fn or_unscaled(scale: f64) -> f64 {
    if scale == 0.0 { 1.0 } else { scale }
}

fn signed(raw: u32) -> f64 {
    f64::from(raw as i32)
}

/// 3200-byte EBCDIC reel text header.
#[derive(Clone, PartialEq, Eq)]
pub struct TextHeader {
    bytes: Box<[u8; TEXT_HEADER_LEN]>,
}

impl TextHeader {
    /// Wrap raw EBCDIC bytes (the first 3200 bytes of `data`).
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        check_len(data, TEXT_HEADER_LEN)?;
        let mut bytes = Box::new([0u8; TEXT_HEADER_LEN]);
        bytes.copy_from_slice(&data[..TEXT_HEADER_LEN]);
        Ok(Self { bytes })
    }

    /// Encode text as EBCDIC, truncated or blank-padded to 3200 bytes.
    pub fn from_text(text: &str) -> Result<Self> {
        let end = text
            .char_indices()
            .nth(TEXT_HEADER_LEN)
            .map_or(text.len(), |(i, _)| i);
        let encoded = ebcdic::encode_cp500(&text[..end])?;

        let mut bytes = Box::new([EBCDIC_SPACE; TEXT_HEADER_LEN]);
        bytes[..encoded.len()].copy_from_slice(&encoded);
        Ok(Self { bytes })
    }

    /// Decoded text, 3200 characters.
    pub fn text(&self) -> String {
        ebcdic::decode_cp500(&self.bytes[..])
    }

    /// The 40 card images of 80 columns, trailing blanks trimmed.
    pub fn lines(&self) -> Vec<String> {
        self.bytes
            .chunks(80)
            .map(|card| ebcdic::decode_cp500(card).trim_end().to_string())
            .collect()
    }

    /// Raw EBCDIC bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..]
    }
}

impl Default for TextHeader {
    fn default() -> Self {
        Self {
            bytes: Box::new([EBCDIC_SPACE; TEXT_HEADER_LEN]),
        }
    }
}

impl fmt::Debug for TextHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let first = self.lines().into_iter().next().unwrap_or_default();
        f.debug_struct("TextHeader").field("first_line", &first).finish()
    }
}

impl fmt::Display for TextHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
