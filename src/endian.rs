//! Sample byte-order resolution.
//!
//! Header fields are always big-endian. Sample words follow the file's
//! byte order, which SU files in particular leave undeclared: they are
//! written in whatever order the producing host used.

use tracing::{debug, warn};

use crate::Result;
use crate::sample::decode_samples;
use crate::types::{ByteOrder, Endianness, SampleFormat};

/// Byte order of the running host.
pub fn detect_host_endian() -> ByteOrder {
    if 1u16.to_ne_bytes()[0] == 1 {
        ByteOrder::Little
    } else {
        ByteOrder::Big
    }
}

/// How sample words relate to the host byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndianMode {
    /// Samples are stored in host order.
    Native,
    /// Samples are stored byte-swapped relative to the host.
    Foreign,
}

impl EndianMode {
    /// Effective byte order for sample words on a host with `host` order.
    pub fn sample_order(self, host: ByteOrder) -> ByteOrder {
        match self {
            Self::Native => host,
            Self::Foreign => host.swapped(),
        }
    }
}

/// Resolve an explicitly declared byte order. `Auto` yields `None`.
pub fn resolve_declared(declared: Endianness, host: ByteOrder) -> Option<EndianMode> {
    let file = match declared {
        Endianness::Auto => return None,
        Endianness::Big => ByteOrder::Big,
        Endianness::Little => ByteOrder::Little,
    };
    Some(if file == host {
        EndianMode::Native
    } else {
        EndianMode::Foreign
    })
}

/// Binary exponent of `x` as returned by C `frexp`: `x = m * 2^e` with
/// `0.5 <= |m| < 1`. Zero gives 0.
pub(crate) fn frexp_exponent(x: f64) -> i32 {
    if x == 0.0 || !x.is_finite() {
        return 0;
    }
    let biased = ((x.to_bits() >> 52) & 0x7FF) as i32;
    if biased == 0 {
        // subnormal: scale into the normal range first
        return frexp_exponent(x * 2f64.powi(54)) - 54;
    }
    biased - 1022
}

/// Exponent magnitude used to compare readings. Readings that are all
/// zero or have a non-finite mean are treated as the worst possible.
fn exponent_magnitude(samples: &[f32]) -> i32 {
    let mean = mean(samples);
    if samples.iter().all(|&x| x == 0.0) || !mean.is_finite() {
        i32::MAX
    } else {
        frexp_exponent(mean).abs()
    }
}

fn mean(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(|&x| f64::from(x)).sum::<f64>() / samples.len() as f64
}

/// Mode under which sample words are big-endian.
fn big_endian_mode(host: ByteOrder) -> EndianMode {
    if host == ByteOrder::Big {
        EndianMode::Native
    } else {
        EndianMode::Foreign
    }
}

/// Format 4 words lead with an unused byte that is zero on disk. Picks
/// the reading under which every leading byte of the trace is zero, if
/// exactly one reading does.
fn gain_word_mode(raw: &[u8], ns: usize, host: ByteOrder) -> Option<EndianMode> {
    let leading_zero = |order: ByteOrder| {
        let lead = if order == ByteOrder::Big { 0 } else { 3 };
        raw.chunks_exact(4).take(ns).all(|word| word[lead] == 0)
    };
    match (leading_zero(host), leading_zero(host.swapped())) {
        (true, false) => Some(EndianMode::Native),
        (false, true) => Some(EndianMode::Foreign),
        _ => None,
    }
}

/// Decide the sample byte order from trace data.
///
/// `trace_data(i)` returns the raw sample bytes of 0-based trace `i`.
/// Each trace is decoded in host order and swapped. The first trace where
/// at least one reading is non-zero with a finite mean decides: the
/// reading whose mean has the smaller binary exponent magnitude wins,
/// with ties going to the swapped reading. When no trace qualifies the
/// samples are taken as native.
///
/// Fixed-point-with-gain samples decode to `1.0` for most words read in
/// the wrong order, which defeats the exponent comparison. For that
/// format the first trace whose unused leading bytes are zero under
/// exactly one reading decides, and big-endian is assumed when none does.
pub fn autodetect<'a, F>(
    trace_count: usize,
    ns: usize,
    format: SampleFormat,
    host: ByteOrder,
    mut trace_data: F,
) -> Result<EndianMode>
where
    F: FnMut(usize) -> Result<std::borrow::Cow<'a, [u8]>>,
{
    if format == SampleFormat::FixedPointGain32 {
        for index in 0..trace_count {
            let raw = trace_data(index)?;
            if let Some(mode) = gain_word_mode(&raw, ns, host) {
                debug!(
                    trace = index + 1,
                    ?mode,
                    "sample byte order detected from gain words"
                );
                return Ok(mode);
            }
        }
        warn!(
            traces = trace_count,
            "gain words inconclusive, assuming big-endian samples"
        );
        return Ok(big_endian_mode(host));
    }

    for index in 0..trace_count {
        let raw = trace_data(index)?;
        let native = decode_samples(&raw, format, ns, host)?;
        let swapped = decode_samples(&raw, format, ns, host.swapped())?;

        let native_exp = exponent_magnitude(&native);
        let swapped_exp = exponent_magnitude(&swapped);
        if native_exp == i32::MAX && swapped_exp == i32::MAX {
            continue;
        }

        let mode = if native_exp < swapped_exp {
            EndianMode::Native
        } else {
            EndianMode::Foreign
        };
        debug!(
            trace = index + 1,
            native_exp, swapped_exp, ?mode, "sample byte order detected"
        );
        return Ok(mode);
    }

    warn!(
        traces = trace_count,
        "no trace with usable energy, assuming native sample byte order"
    );
    Ok(EndianMode::Native)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::encode_samples;
    use std::borrow::Cow;

    fn detect(traces: &[Vec<u8>], ns: usize, format: SampleFormat, host: ByteOrder) -> EndianMode {
        autodetect(traces.len(), ns, format, host, |i| {
            Ok(Cow::Borrowed(traces[i].as_slice()))
        })
        .unwrap()
    }

    #[test]
    fn test_host_endian_matches_target() {
        let expected = if cfg!(target_endian = "little") {
            ByteOrder::Little
        } else {
            ByteOrder::Big
        };
        assert_eq!(detect_host_endian(), expected);
    }

    #[test]
    fn test_resolve_declared() {
        assert_eq!(resolve_declared(Endianness::Auto, ByteOrder::Little), None);
        assert_eq!(
            resolve_declared(Endianness::Big, ByteOrder::Little),
            Some(EndianMode::Foreign)
        );
        assert_eq!(
            resolve_declared(Endianness::Little, ByteOrder::Little),
            Some(EndianMode::Native)
        );
        assert_eq!(
            resolve_declared(Endianness::Big, ByteOrder::Big),
            Some(EndianMode::Native)
        );
    }

    #[test]
    fn test_sample_order() {
        assert_eq!(EndianMode::Native.sample_order(ByteOrder::Big), ByteOrder::Big);
        assert_eq!(EndianMode::Foreign.sample_order(ByteOrder::Big), ByteOrder::Little);
    }

    #[test]
    fn test_frexp_exponent() {
        assert_eq!(frexp_exponent(0.0), 0);
        assert_eq!(frexp_exponent(1.0), 1);
        assert_eq!(frexp_exponent(0.5), 0);
        assert_eq!(frexp_exponent(0.25), -1);
        assert_eq!(frexp_exponent(-3.0), 2);
        assert_eq!(frexp_exponent(1024.0), 11);
        assert_eq!(frexp_exponent(f64::MIN_POSITIVE), -1021);
        assert_eq!(frexp_exponent(f64::MIN_POSITIVE / 4.0), -1023);
    }

    fn seismic_trace(ns: usize) -> Vec<f32> {
        (0..ns).map(|i| ((i as f32) * 0.3).sin() * 50.0 + 2.0).collect()
    }

    #[test]
    fn test_autodetect_native_and_foreign() {
        let host = detect_host_endian();
        let samples = seismic_trace(64);
        let native = encode_samples(&samples, SampleFormat::IeeeFloat32, host);
        let foreign = encode_samples(&samples, SampleFormat::IeeeFloat32, host.swapped());

        assert_eq!(
            detect(&[native], 64, SampleFormat::IeeeFloat32, host),
            EndianMode::Native
        );
        assert_eq!(
            detect(&[foreign], 64, SampleFormat::IeeeFloat32, host),
            EndianMode::Foreign
        );
    }

    #[test]
    fn test_autodetect_skips_dead_traces() {
        let host = ByteOrder::Big;
        let zeros = vec![0u8; 32 * 4];
        let live = encode_samples(&seismic_trace(32), SampleFormat::IeeeFloat32, ByteOrder::Little);
        assert_eq!(
            detect(&[zeros.clone(), zeros, live], 32, SampleFormat::IeeeFloat32, host),
            EndianMode::Foreign
        );
    }

    #[test]
    fn test_autodetect_ibm_reading_flushed_to_zero() {
        // short IBM mantissas read backwards underflow to zero
        let data = encode_samples(&[1.0, -118.625, 16.0], SampleFormat::IbmFloat32, ByteOrder::Big);
        assert_eq!(
            detect(&[data.clone()], 3, SampleFormat::IbmFloat32, ByteOrder::Little),
            EndianMode::Foreign
        );
        assert_eq!(
            detect(&[data], 3, SampleFormat::IbmFloat32, ByteOrder::Big),
            EndianMode::Native
        );
    }

    #[test]
    fn test_autodetect_integer_formats() {
        let samples: Vec<f32> = seismic_trace(40).iter().map(|x| x.round()).collect();
        for format in [SampleFormat::Int32, SampleFormat::Int16] {
            let data = encode_samples(&samples, format, ByteOrder::Big);
            assert_eq!(detect(&[data.clone()], 40, format, ByteOrder::Big), EndianMode::Native);
            assert_eq!(detect(&[data], 40, format, ByteOrder::Little), EndianMode::Foreign);
        }
    }

    #[test]
    fn test_autodetect_fixed_point_gain() {
        let samples = [1.0, -2.0, 3.0, 100.0];
        let format = SampleFormat::FixedPointGain32;
        for host in [ByteOrder::Big, ByteOrder::Little] {
            let big = encode_samples(&samples, format, ByteOrder::Big);
            let little = encode_samples(&samples, format, ByteOrder::Little);
            assert_eq!(
                detect(&[big], 4, format, host).sample_order(host),
                ByteOrder::Big
            );
            assert_eq!(
                detect(&[little], 4, format, host).sample_order(host),
                ByteOrder::Little
            );
        }
    }

    #[test]
    fn test_autodetect_fixed_point_gain_inconclusive() {
        let format = SampleFormat::FixedPointGain32;
        // zero mantissa low bytes leave both leading bytes zero
        let ambiguous = encode_samples(&[256.0, 512.0], format, ByteOrder::Little);
        let decided = encode_samples(&[7.0, 9.0], format, ByteOrder::Little);
        assert_eq!(
            detect(&[ambiguous.clone(), decided], 2, format, ByteOrder::Big),
            EndianMode::Foreign
        );
        assert_eq!(
            detect(&[ambiguous], 2, format, ByteOrder::Little),
            EndianMode::Foreign
        );
        assert_eq!(detect(&[], 2, format, ByteOrder::Big), EndianMode::Native);
    }

    #[test]
    fn test_autodetect_all_zero_defaults_native() {
        let zeros = vec![0u8; 16 * 4];
        assert_eq!(
            detect(&[zeros.clone(), zeros], 16, SampleFormat::IeeeFloat32, ByteOrder::Little),
            EndianMode::Native
        );
        assert_eq!(
            detect(&[], 16, SampleFormat::IeeeFloat32, ByteOrder::Little),
            EndianMode::Native
        );
    }
}
