//! Trace sample decoding and encoding.
//!
//! Every [`SampleFormat`] has one codec type implementing [`SampleCodec`].
//! The byte order passed in applies to whole sample words; samples are
//! always returned as host `f32`.

use crate::ibm;
use crate::types::{ByteOrder, SampleFormat};
use crate::{Result, SegyError};

/// Per-format conversion between one on-disk sample word and `f32`.
pub trait SampleCodec {
    /// Bytes per sample word.
    const WIDTH: usize;

    /// Decode one word. `word` holds at least `WIDTH` bytes.
    fn decode_word(word: &[u8], order: ByteOrder) -> f32;

    /// Encode one sample into the first `WIDTH` bytes of `out`.
    fn encode_word(value: f32, order: ByteOrder, out: &mut [u8]);
}

/// Read `N` bytes as a big-endian-ordered word.
fn read_word<const N: usize>(data: &[u8], order: ByteOrder) -> [u8; N] {
    let mut word = [0u8; N];
    word.copy_from_slice(&data[..N]);
    if order == ByteOrder::Little {
        word.reverse();
    }
    word
}

/// Store a big-endian-ordered word in the requested byte order.
fn write_word<const N: usize>(mut word: [u8; N], order: ByteOrder, out: &mut [u8]) {
    if order == ByteOrder::Little {
        word.reverse();
    }
    out[..N].copy_from_slice(&word);
}

/// Format 1: IBM/370 hexadecimal float.
pub struct IbmFloat;

impl SampleCodec for IbmFloat {
    const WIDTH: usize = 4;

    fn decode_word(word: &[u8], order: ByteOrder) -> f32 {
        ibm::ibm_to_f32(u32::from_be_bytes(read_word(word, order)))
    }

    fn encode_word(value: f32, order: ByteOrder, out: &mut [u8]) {
        write_word(ibm::f32_to_ibm(value).to_be_bytes(), order, out);
    }
}

/// Format 2: 32-bit integer.
pub struct Int32;

impl SampleCodec for Int32 {
    const WIDTH: usize = 4;

    fn decode_word(word: &[u8], order: ByteOrder) -> f32 {
        i32::from_be_bytes(read_word(word, order)) as f32
    }

    fn encode_word(value: f32, order: ByteOrder, out: &mut [u8]) {
        write_word((value.round() as i32).to_be_bytes(), order, out);
    }
}

/// Format 3: 16-bit integer.
pub struct Int16;

impl SampleCodec for Int16 {
    const WIDTH: usize = 2;

    fn decode_word(word: &[u8], order: ByteOrder) -> f32 {
        f32::from(i16::from_be_bytes(read_word(word, order)))
    }

    fn encode_word(value: f32, order: ByteOrder, out: &mut [u8]) {
        write_word((value.round() as i16).to_be_bytes(), order, out);
    }
}

/// Format 4: 32-bit fixed point with gain.
///
/// Word bytes (big-endian order) are `[unused, gain exponent (i8),
/// mantissa (i16)]` and decode as `mantissa.powi(exponent)`. This is the
/// legacy interpretation carried by older processing tools, kept as-is so
/// results stay comparable; it is not the `mantissa * 2^-gain` reading of
/// the SEG-Y standard.
pub struct FixedPointGain;

impl SampleCodec for FixedPointGain {
    const WIDTH: usize = 4;

    fn decode_word(word: &[u8], order: ByteOrder) -> f32 {
        let [_, exponent, hi, lo] = read_word(word, order);
        let mantissa = f32::from(i16::from_be_bytes([hi, lo]));
        mantissa.powi(i32::from(exponent as i8))
    }

    /// Writes gain exponent 1, so integral samples within `i16` range
    /// decode back unchanged.
    fn encode_word(value: f32, order: ByteOrder, out: &mut [u8]) {
        let [hi, lo] = (value.round() as i16).to_be_bytes();
        write_word([0, 1, hi, lo], order, out);
    }
}

/// Format 5: IEEE-754 single precision.
pub struct IeeeFloat;

impl SampleCodec for IeeeFloat {
    const WIDTH: usize = 4;

    fn decode_word(word: &[u8], order: ByteOrder) -> f32 {
        f32::from_be_bytes(read_word(word, order))
    }

    fn encode_word(value: f32, order: ByteOrder, out: &mut [u8]) {
        write_word(value.to_be_bytes(), order, out);
    }
}

/// Format 8: 8-bit integer.
pub struct Int8;

impl SampleCodec for Int8 {
    const WIDTH: usize = 1;

    fn decode_word(word: &[u8], _order: ByteOrder) -> f32 {
        f32::from(word[0] as i8)
    }

    fn encode_word(value: f32, _order: ByteOrder, out: &mut [u8]) {
        out[0] = (value.round() as i8) as u8;
    }
}

fn decode_with<C: SampleCodec>(data: &[u8], count: usize, order: ByteOrder) -> Vec<f32> {
    data.chunks_exact(C::WIDTH)
        .take(count)
        .map(|word| C::decode_word(word, order))
        .collect()
}

fn encode_with<C: SampleCodec>(samples: &[f32], order: ByteOrder) -> Vec<u8> {
    let mut data = vec![0u8; samples.len() * C::WIDTH];
    for (&value, word) in samples.iter().zip(data.chunks_exact_mut(C::WIDTH)) {
        C::encode_word(value, order, word);
    }
    data
}

/// Decode `count` samples from `data`.
pub fn decode_samples(
    data: &[u8],
    format: SampleFormat,
    count: usize,
    order: ByteOrder,
) -> Result<Vec<f32>> {
    let needed = count * format.sample_width();
    if data.len() < needed {
        return Err(SegyError::TooShort {
            expected: needed as u64,
            actual: data.len() as u64,
        });
    }
    let samples = match format {
        SampleFormat::IbmFloat32 => decode_with::<IbmFloat>(data, count, order),
        SampleFormat::Int32 => decode_with::<Int32>(data, count, order),
        SampleFormat::Int16 => decode_with::<Int16>(data, count, order),
        SampleFormat::FixedPointGain32 => decode_with::<FixedPointGain>(data, count, order),
        SampleFormat::IeeeFloat32 => decode_with::<IeeeFloat>(data, count, order),
        SampleFormat::Int8 => decode_with::<Int8>(data, count, order),
    };
    Ok(samples)
}

/// Encode samples in the given format and byte order.
///
/// Integer formats round to nearest and saturate at the type bounds.
pub fn encode_samples(samples: &[f32], format: SampleFormat, order: ByteOrder) -> Vec<u8> {
    match format {
        SampleFormat::IbmFloat32 => encode_with::<IbmFloat>(samples, order),
        SampleFormat::Int32 => encode_with::<Int32>(samples, order),
        SampleFormat::Int16 => encode_with::<Int16>(samples, order),
        SampleFormat::FixedPointGain32 => encode_with::<FixedPointGain>(samples, order),
        SampleFormat::IeeeFloat32 => encode_with::<IeeeFloat>(samples, order),
        SampleFormat::Int8 => encode_with::<Int8>(samples, order),
    }
}

/// Decode the single sample word at the start of `word`.
pub fn decode_sample(word: &[u8], format: SampleFormat, order: ByteOrder) -> f32 {
    match format {
        SampleFormat::IbmFloat32 => IbmFloat::decode_word(word, order),
        SampleFormat::Int32 => Int32::decode_word(word, order),
        SampleFormat::Int16 => Int16::decode_word(word, order),
        SampleFormat::FixedPointGain32 => FixedPointGain::decode_word(word, order),
        SampleFormat::IeeeFloat32 => IeeeFloat::decode_word(word, order),
        SampleFormat::Int8 => Int8::decode_word(word, order),
    }
}

/// Encode a single sample into the start of `out`.
pub fn encode_sample(value: f32, format: SampleFormat, order: ByteOrder, out: &mut [u8]) {
    match format {
        SampleFormat::IbmFloat32 => IbmFloat::encode_word(value, order, out),
        SampleFormat::Int32 => Int32::encode_word(value, order, out),
        SampleFormat::Int16 => Int16::encode_word(value, order, out),
        SampleFormat::FixedPointGain32 => FixedPointGain::encode_word(value, order, out),
        SampleFormat::IeeeFloat32 => IeeeFloat::encode_word(value, order, out),
        SampleFormat::Int8 => Int8::encode_word(value, order, out),
    }
}

/// Rescale a trace onto `[-1, 1]`: `2 * (x - min) / (max - min) - 1`.
///
/// A flat trace (or an empty one) maps to zeros.
pub fn normalize_trace(trace: &[f32]) -> Vec<f32> {
    let (min, max) = trace
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &x| {
            (lo.min(x), hi.max(x))
        });
    let span = max - min;
    if span.is_finite() && span > 0.0 {
        trace
            .iter()
            .map(|&x| (2.0 * (x - min) / span - 1.0).clamp(-1.0, 1.0))
            .collect()
    } else {
        vec![0.0; trace.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_FORMATS: [SampleFormat; 6] = [
        SampleFormat::IbmFloat32,
        SampleFormat::Int32,
        SampleFormat::Int16,
        SampleFormat::FixedPointGain32,
        SampleFormat::IeeeFloat32,
        SampleFormat::Int8,
    ];

    #[test]
    fn test_codec_widths_match_format() {
        assert_eq!(IbmFloat::WIDTH, SampleFormat::IbmFloat32.sample_width());
        assert_eq!(Int32::WIDTH, SampleFormat::Int32.sample_width());
        assert_eq!(Int16::WIDTH, SampleFormat::Int16.sample_width());
        assert_eq!(FixedPointGain::WIDTH, SampleFormat::FixedPointGain32.sample_width());
        assert_eq!(IeeeFloat::WIDTH, SampleFormat::IeeeFloat32.sample_width());
        assert_eq!(Int8::WIDTH, SampleFormat::Int8.sample_width());
    }

    #[test]
    fn test_decode_ibm_words() {
        let data = [0x41, 0x10, 0x00, 0x00, 0xC2, 0x76, 0xA0, 0x00];
        let samples = decode_samples(&data, SampleFormat::IbmFloat32, 2, ByteOrder::Big).unwrap();
        assert_eq!(samples, vec![1.0, -118.625]);

        let swapped = [0x00, 0x00, 0x10, 0x41];
        let samples =
            decode_samples(&swapped, SampleFormat::IbmFloat32, 1, ByteOrder::Little).unwrap();
        assert_eq!(samples, vec![1.0]);
    }

    #[test]
    fn test_decode_integers() {
        let data = [0xFF, 0xFF, 0xFF, 0xFE, 0x00, 0x01, 0x86, 0xA0];
        let samples = decode_samples(&data, SampleFormat::Int32, 2, ByteOrder::Big).unwrap();
        assert_eq!(samples, vec![-2.0, 100_000.0]);

        let data = [0x80, 0x00, 0x7F, 0xFF, 0x00, 0x05];
        let samples = decode_samples(&data, SampleFormat::Int16, 3, ByteOrder::Big).unwrap();
        assert_eq!(samples, vec![-32768.0, 32767.0, 5.0]);

        let samples = decode_samples(&data, SampleFormat::Int16, 3, ByteOrder::Little).unwrap();
        assert_eq!(samples, vec![128.0, -129.0, 1280.0]);

        let data = [0x80, 0x7F, 0x00, 0xFF];
        let samples = decode_samples(&data, SampleFormat::Int8, 4, ByteOrder::Big).unwrap();
        assert_eq!(samples, vec![-128.0, 127.0, 0.0, -1.0]);
    }

    #[test]
    fn test_decode_fixed_point_gain() {
        // [_, exponent, mantissa hi, mantissa lo]
        let data = [
            0x00, 0x02, 0x00, 0x03, // 3^2
            0x00, 0x01, 0xFF, 0xF6, // (-10)^1
            0x00, 0x00, 0x00, 0x07, // 7^0
            0x00, 0xFF, 0x00, 0x04, // 4^-1
            0x00, 0x03, 0xFF, 0xFE, // (-2)^3
        ];
        let samples =
            decode_samples(&data, SampleFormat::FixedPointGain32, 5, ByteOrder::Big).unwrap();
        assert_eq!(samples, vec![9.0, -10.0, 1.0, 0.25, -8.0]);

        let mut swapped = data;
        for word in swapped.chunks_exact_mut(4) {
            word.reverse();
        }
        let again =
            decode_samples(&swapped, SampleFormat::FixedPointGain32, 5, ByteOrder::Little).unwrap();
        assert_eq!(again, samples);
    }

    #[test]
    fn test_decode_ieee_both_orders() {
        let value = -1234.5f32;
        let be = value.to_be_bytes();
        let le = value.to_le_bytes();
        assert_eq!(
            decode_samples(&be, SampleFormat::IeeeFloat32, 1, ByteOrder::Big).unwrap(),
            vec![value]
        );
        assert_eq!(
            decode_samples(&le, SampleFormat::IeeeFloat32, 1, ByteOrder::Little).unwrap(),
            vec![value]
        );
    }

    #[test]
    fn test_decode_too_short() {
        let err = decode_samples(&[0u8; 7], SampleFormat::Int32, 2, ByteOrder::Big).unwrap_err();
        assert!(matches!(
            err,
            SegyError::TooShort {
                expected: 8,
                actual: 7
            }
        ));
    }

    #[test]
    fn test_encode_decode_each_format() {
        let samples = vec![0.0f32, 1.0, -1.0, 12.0, -100.0, 127.0];
        for format in ALL_FORMATS {
            for order in [ByteOrder::Big, ByteOrder::Little] {
                let bytes = encode_samples(&samples, format, order);
                assert_eq!(bytes.len(), samples.len() * format.sample_width());
                let decoded = decode_samples(&bytes, format, samples.len(), order).unwrap();
                assert_eq!(decoded, samples, "{format} {order}");
            }
        }
    }

    #[test]
    fn test_integer_encoding_rounds_and_saturates() {
        let bytes = encode_samples(&[2.6, -2.6, 40_000.0, f32::NAN], SampleFormat::Int16, ByteOrder::Big);
        let decoded = decode_samples(&bytes, SampleFormat::Int16, 4, ByteOrder::Big).unwrap();
        assert_eq!(decoded, vec![3.0, -3.0, 32767.0, 0.0]);

        let bytes = encode_samples(&[300.0, -300.0], SampleFormat::Int8, ByteOrder::Big);
        assert_eq!(bytes, vec![0x7F, 0x80]);
    }

    #[test]
    fn test_single_sample_helpers() {
        let mut word = [0u8; 4];
        encode_sample(3.5, SampleFormat::IeeeFloat32, ByteOrder::Little, &mut word);
        assert_eq!(word, 3.5f32.to_le_bytes());
        assert_eq!(decode_sample(&word, SampleFormat::IeeeFloat32, ByteOrder::Little), 3.5);

        encode_sample(-1.0, SampleFormat::IbmFloat32, ByteOrder::Big, &mut word);
        assert_eq!(word, [0xC1, 0x10, 0x00, 0x00]);
    }

    #[test]
    fn test_normalize_range_and_order() {
        let trace = vec![-3.0f32, 0.5, 2.0, -1.0, 7.0, 1.5];
        let norm = normalize_trace(&trace);
        assert_eq!(norm.len(), trace.len());
        assert!(norm.iter().all(|v| (-1.0..=1.0).contains(v)));
        assert_eq!(norm[0], -1.0);
        assert_eq!(norm[4], 1.0);

        // affine: equal input steps give equal output steps
        let line: Vec<f32> = (0..5).map(|i| i as f32 * 2.0 - 3.0).collect();
        let out = normalize_trace(&line);
        for pair in out.windows(2) {
            assert!((pair[1] - pair[0] - 0.5).abs() < 1e-6);
        }

        // order preserved
        for i in 0..trace.len() {
            for j in 0..trace.len() {
                if trace[i] < trace[j] {
                    assert!(norm[i] < norm[j]);
                }
            }
        }
    }

    #[test]
    fn test_normalize_flat_and_empty() {
        assert_eq!(normalize_trace(&[4.0, 4.0, 4.0]), vec![0.0, 0.0, 0.0]);
        assert!(normalize_trace(&[]).is_empty());
    }
}
