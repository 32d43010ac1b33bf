//! SU, SEG-Y and headerless trace writers.
//!
//! All writers take one header per trace and require every trace to have
//! the same length. The written `ns` (and SEG-Y `hns`) fields are set from
//! that length.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::header::{BinaryHeader, TextHeader, TraceHeader};
use crate::sample::encode_samples;
use crate::types::{ByteOrder, SampleFormat};
use crate::{Result, SegyError};

/// Sample encoding used by [`write_segy`] and [`write_flat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// Defaults to IEEE float.
    pub format: SampleFormat,
    /// Defaults to big-endian.
    pub byte_order: ByteOrder,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            format: SampleFormat::IeeeFloat32,
            byte_order: ByteOrder::Big,
        }
    }
}

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_format(mut self, format: SampleFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }
}

/// Common trace length, checked against the header count.
fn common_ns<T: AsRef<[f32]>>(traces: &[T], headers: Option<&[TraceHeader]>) -> Result<u16> {
    if let Some(headers) = headers {
        if headers.len() != traces.len() {
            return Err(SegyError::HeaderCountMismatch {
                traces: traces.len(),
                headers: headers.len(),
            });
        }
    }

    let ns = traces.first().map_or(0, |t| t.as_ref().len());
    for (i, trace) in traces.iter().enumerate() {
        let actual = trace.as_ref().len();
        if actual != ns {
            return Err(SegyError::SampleCountMismatch {
                trace: i + 1,
                expected: ns,
                actual,
            });
        }
    }

    u16::try_from(ns).map_err(|_| SegyError::FieldOverflow {
        field: "ns",
        value: ns as i64,
    })
}

fn write_traces<W: Write, T: AsRef<[f32]>>(
    out: &mut W,
    traces: &[T],
    headers: &[TraceHeader],
    ns: u16,
    format: SampleFormat,
    order: ByteOrder,
) -> Result<()> {
    for (trace, header) in traces.iter().zip(headers) {
        let mut header = *header;
        header.ns = ns;
        out.write_all(&header.encode())?;
        out.write_all(&encode_samples(trace.as_ref(), format, order))?;
    }
    Ok(())
}

/// Write an SU file: per trace a 240-byte header and IEEE float samples
/// in `byte_order`.
pub fn write_su<T: AsRef<[f32]>>(
    path: impl AsRef<Path>,
    traces: &[T],
    headers: &[TraceHeader],
    byte_order: ByteOrder,
) -> Result<()> {
    let path = path.as_ref();
    let ns = common_ns(traces, Some(headers))?;

    let mut out = BufWriter::new(File::create(path)?);
    write_traces(
        &mut out,
        traces,
        headers,
        ns,
        SampleFormat::IeeeFloat32,
        byte_order,
    )?;
    out.flush()?;

    info!(path = %path.display(), traces = traces.len(), ns, %byte_order, "wrote SU file");
    Ok(())
}

/// Write a SEG-Y file.
///
/// The binary header is written with `format` and `hns` replaced to match
/// `options` and the trace length.
pub fn write_segy<T: AsRef<[f32]>>(
    path: impl AsRef<Path>,
    text: &TextHeader,
    binary: &BinaryHeader,
    traces: &[T],
    headers: &[TraceHeader],
    options: &WriteOptions,
) -> Result<()> {
    let path = path.as_ref();
    let ns = common_ns(traces, Some(headers))?;

    let mut binary = *binary;
    binary.format = options.format.to_code();
    binary.hns = ns;

    let mut out = BufWriter::new(File::create(path)?);
    out.write_all(text.as_bytes())?;
    out.write_all(&binary.encode())?;
    write_traces(
        &mut out,
        traces,
        headers,
        ns,
        options.format,
        options.byte_order,
    )?;
    out.flush()?;

    info!(
        path = %path.display(),
        traces = traces.len(),
        ns,
        format = %options.format,
        byte_order = %options.byte_order,
        "wrote SEG-Y file"
    );
    Ok(())
}

/// Write bare samples, trace after trace, with no headers.
pub fn write_flat<T: AsRef<[f32]>>(
    path: impl AsRef<Path>,
    traces: &[T],
    options: &WriteOptions,
) -> Result<()> {
    let path = path.as_ref();
    let ns = common_ns(traces, None)?;

    let mut out = BufWriter::new(File::create(path)?);
    for trace in traces {
        out.write_all(&encode_samples(
            trace.as_ref(),
            options.format,
            options.byte_order,
        ))?;
    }
    out.flush()?;

    info!(path = %path.display(), traces = traces.len(), ns, "wrote flat sample file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::{REEL_HEADER_LEN, TRACE_HEADER_LEN};

    fn headers(n: usize) -> Vec<TraceHeader> {
        (0..n)
            .map(|i| TraceHeader {
                tracl: i as u32 + 1,
                fldr: 10,
                ns: 999,
                ..TraceHeader::default()
            })
            .collect()
    }

    #[test]
    fn test_write_su_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.su");
        let traces = vec![vec![1.0f32, 2.0], vec![3.0, 4.0]];
        write_su(&path, &traces, &headers(2), ByteOrder::Little).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 2 * (TRACE_HEADER_LEN + 8));
        let header = TraceHeader::decode(&bytes).unwrap();
        assert_eq!(header.ns, 2);
        assert_eq!(header.tracl, 1);
        assert_eq!(&bytes[240..244], &1.0f32.to_le_bytes());
        assert_eq!(&bytes[492..496], &4.0f32.to_le_bytes());
    }

    #[test]
    fn test_write_segy_patches_binary_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.sgy");
        let traces = vec![vec![1.0f32; 5]; 3];
        let binary = BinaryHeader {
            format: 1,
            hns: 77,
            hdt: 4000,
            ..BinaryHeader::default()
        };
        let options = WriteOptions::new().with_format(SampleFormat::Int16);
        write_segy(&path, &TextHeader::default(), &binary, &traces, &headers(3), &options)
            .unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), REEL_HEADER_LEN + 3 * (TRACE_HEADER_LEN + 10));
        let written = BinaryHeader::decode(&bytes[3200..]).unwrap();
        assert_eq!(written.format, 3);
        assert_eq!(written.hns, 5);
        assert_eq!(written.hdt, 4000);
        assert!(bytes[..3200].iter().all(|&b| b == 0x40));
    }

    #[test]
    fn test_header_count_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let traces = vec![vec![0.0f32; 3]; 2];
        let err = write_su(dir.path().join("x.su"), &traces, &headers(3), ByteOrder::Big)
            .unwrap_err();
        assert!(matches!(
            err,
            SegyError::HeaderCountMismatch {
                traces: 2,
                headers: 3
            }
        ));
    }

    #[test]
    fn test_ragged_traces_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let traces = vec![vec![0.0f32; 3], vec![0.0; 4]];
        let err = write_su(dir.path().join("x.su"), &traces, &headers(2), ByteOrder::Big)
            .unwrap_err();
        assert!(matches!(
            err,
            SegyError::SampleCountMismatch {
                trace: 2,
                expected: 3,
                actual: 4
            }
        ));
    }

    #[test]
    fn test_write_flat() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flat.bin");
        let traces = [[1.0f32, -1.0], [0.5, 2.0]];
        write_flat(&path, &traces, &WriteOptions::default()).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[12..16], &2.0f32.to_be_bytes());
    }
}
