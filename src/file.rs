//! Open SEG-Y / SU sessions.
//!
//! [`SegyFile::open`] parses the reel and trace headers once, works out
//! the trace geometry and the sample byte order, and then serves traces
//! by 1-based index.

use std::borrow::Cow;
use std::cell::OnceCell;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::endian::{self, EndianMode};
use crate::header::{
    BinaryHeader, REEL_HEADER_LEN, TEXT_HEADER_LEN, TRACE_HEADER_FIELDS, TRACE_HEADER_LEN,
    TextHeader, TraceHeader,
};
use crate::reader::Traces;
use crate::sample::{decode_samples, normalize_trace};
use crate::source::ByteSource;
use crate::store::{self, EnsembleIndex, TraceGeometry};
use crate::types::{AccessMode, ByteOrder, Endianness, SampleFormat, Variant};
use crate::view::{TraceView, TraceViewMut};
use crate::writer::{self, WriteOptions};
use crate::{Result, SegyError};

/// Settings for [`SegyFile::open`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegyOptions {
    pub variant: Variant,
    pub endian: Endianness,
    /// Decode only `tracr fldr tracf trid ns dt` from each trace header.
    pub major_headers_only: bool,
    pub access: AccessMode,
    /// Open read-write; required for mutable views and header patching.
    pub writable: bool,
    /// Header field that groups traces into ensembles.
    pub ensemble_key: String,
}

impl Default for SegyOptions {
    fn default() -> Self {
        Self {
            variant: Variant::Segy,
            endian: Endianness::Auto,
            major_headers_only: false,
            access: AccessMode::Auto,
            writable: false,
            ensemble_key: "fldr".to_string(),
        }
    }
}

impl SegyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }

    pub fn with_endian(mut self, endian: Endianness) -> Self {
        self.endian = endian;
        self
    }

    pub fn with_major_headers_only(mut self, major_only: bool) -> Self {
        self.major_headers_only = major_only;
        self
    }

    pub fn with_access(mut self, access: AccessMode) -> Self {
        self.access = access;
        self
    }

    pub fn with_writable(mut self, writable: bool) -> Self {
        self.writable = writable;
        self
    }

    pub fn with_ensemble_key(mut self, key: impl Into<String>) -> Self {
        self.ensemble_key = key.into();
        self
    }

    /// Whether `key` can be looked up in headers decoded with these options.
    fn check_key(&self, key: &str) -> Result<()> {
        let known = TRACE_HEADER_FIELDS.contains(&key);
        if !known || (self.major_headers_only && !TraceHeader::is_major_field(key)) {
            return Err(SegyError::InvalidHeaderKey(key.to_string()));
        }
        Ok(())
    }
}

/// An open SEG-Y or SU file.
///
/// Trace numbers are 1-based throughout.
pub struct SegyFile {
    path: PathBuf,
    options: SegyOptions,
    source: ByteSource,
    text_header: Option<TextHeader>,
    binary_header: Option<BinaryHeader>,
    trace_headers: Vec<TraceHeader>,
    format: SampleFormat,
    geometry: TraceGeometry,
    trace_count: usize,
    host: ByteOrder,
    endian_mode: EndianMode,
    ensembles: OnceCell<EnsembleIndex>,
}

impl std::fmt::Debug for SegyFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegyFile")
            .field("path", &self.path)
            .field("variant", &self.options.variant)
            .field("format", &self.format)
            .field("traces", &self.trace_count)
            .field("ns", &self.geometry.ns())
            .field("endian_mode", &self.endian_mode)
            .field("mapped", &self.source.is_mapped())
            .finish()
    }
}

impl SegyFile {
    /// Open a file and read all of its headers.
    pub fn open(path: impl AsRef<Path>, options: SegyOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let host = endian::detect_host_endian();
        debug!(?host, "host byte order");
        options.check_key(&options.ensemble_key)?;

        let source = ByteSource::open(&path, options.access, options.writable)?;

        let (text_header, binary_header, format, declared_ns) = match options.variant {
            Variant::Segy => {
                let reel = source.read_at(0, REEL_HEADER_LEN)?;
                let text = TextHeader::from_bytes(&reel)?;
                let binary = BinaryHeader::decode(&reel[TEXT_HEADER_LEN..])?;
                let format = binary.sample_format()?;
                (Some(text), Some(binary), format, usize::from(binary.hns))
            }
            Variant::Su => (None, None, SampleFormat::IeeeFloat32, 0),
        };

        let ns = if declared_ns != 0 {
            declared_ns
        } else {
            probe_ns(&source, options.variant, format)?
        };

        let geometry = TraceGeometry::new(options.variant, ns, format);
        let trace_count = geometry.trace_count(source.len())?;
        debug!(ns, stride = geometry.stride(), trace_count, "trace geometry");

        let trace_headers =
            scan_trace_headers(&source, &geometry, trace_count, options.major_headers_only)?;

        let endian_mode = match endian::resolve_declared(options.endian, host) {
            Some(mode) => mode,
            // byte order is meaningless for single-byte samples
            None if format.sample_width() == 1 || trace_count == 0 => EndianMode::Native,
            None => endian::autodetect(trace_count, ns, format, host, |i| {
                source.read_at(geometry.data_offset(i + 1), geometry.data_len())
            })?,
        };

        info!(
            path = %path.display(),
            variant = %options.variant,
            traces = trace_count,
            ns,
            %format,
            ?endian_mode,
            mapped = source.is_mapped(),
            "opened seismic file"
        );

        Ok(Self {
            path,
            options,
            source,
            text_header,
            binary_header,
            trace_headers,
            format,
            geometry,
            trace_count,
            host,
            endian_mode,
            ensembles: OnceCell::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn options(&self) -> &SegyOptions {
        &self.options
    }

    pub fn variant(&self) -> Variant {
        self.options.variant
    }

    /// Reel text header; `None` for SU.
    pub fn text_header(&self) -> Option<&TextHeader> {
        self.text_header.as_ref()
    }

    /// Reel binary header; `None` for SU.
    pub fn binary_header(&self) -> Option<&BinaryHeader> {
        self.binary_header.as_ref()
    }

    /// Every trace header, in file order.
    pub fn trace_headers(&self) -> &[TraceHeader] {
        &self.trace_headers
    }

    pub fn trace_header(&self, trace: usize) -> Result<&TraceHeader> {
        self.check_trace(trace)?;
        Ok(&self.trace_headers[trace - 1])
    }

    pub fn trace_count(&self) -> usize {
        self.trace_count
    }

    pub fn samples_per_trace(&self) -> usize {
        self.geometry.ns()
    }

    pub fn sample_format(&self) -> SampleFormat {
        self.format
    }

    pub fn geometry(&self) -> &TraceGeometry {
        &self.geometry
    }

    pub fn endian_mode(&self) -> EndianMode {
        self.endian_mode
    }

    /// Byte order the sample words are decoded with.
    pub fn sample_byte_order(&self) -> ByteOrder {
        self.endian_mode.sample_order(self.host)
    }

    pub fn is_mapped(&self) -> bool {
        self.source.is_mapped()
    }

    fn check_trace(&self, trace: usize) -> Result<()> {
        if trace == 0 || trace > self.trace_count {
            return Err(SegyError::TraceOutOfRange {
                trace,
                count: self.trace_count,
            });
        }
        Ok(())
    }

    /// Decode the samples of one trace.
    pub fn read_trace(&self, trace: usize) -> Result<Vec<f32>> {
        self.check_trace(trace)?;
        let raw = self
            .source
            .read_at(self.geometry.data_offset(trace), self.geometry.data_len())?;
        decode_samples(
            &raw,
            self.format,
            self.geometry.ns(),
            self.sample_byte_order(),
        )
    }

    /// Decode several traces in the order given. Repeats are allowed.
    pub fn read_traces(&self, traces: &[usize]) -> Result<Vec<Vec<f32>>> {
        traces.iter().map(|&t| self.read_trace(t)).collect()
    }

    /// Decode every trace.
    pub fn read_all(&self) -> Result<Vec<Vec<f32>>> {
        (1..=self.trace_count).map(|t| self.read_trace(t)).collect()
    }

    /// Iterate over every trace with its header.
    pub fn traces(&self) -> Traces<'_> {
        Traces::new(self)
    }

    /// Borrow traces straight from the memory map, decoding on access.
    pub fn lock_traces(&self, traces: &[usize]) -> Result<Vec<TraceView<'_>>> {
        let bytes = self.source.bytes()?;
        let order = self.sample_byte_order();
        let len = self.geometry.data_len();
        traces
            .iter()
            .map(|&trace| {
                self.check_trace(trace)?;
                let start = self.geometry.data_offset(trace) as usize;
                Ok(TraceView::new(
                    trace,
                    &bytes[start..start + len],
                    self.format,
                    order,
                ))
            })
            .collect()
    }

    /// Borrow traces mutably from the memory map; writes go to the file.
    ///
    /// Views come back in the order requested. A trace may appear only
    /// once.
    pub fn lock_traces_mut(&mut self, traces: &[usize]) -> Result<Vec<TraceViewMut<'_>>> {
        let mut sorted: Vec<(usize, usize)> = traces
            .iter()
            .enumerate()
            .map(|(position, &trace)| (trace, position))
            .collect();
        sorted.sort_unstable();
        for pair in sorted.windows(2) {
            if pair[0].0 == pair[1].0 {
                return Err(SegyError::DuplicateTrace(pair[0].0));
            }
        }
        for &(trace, _) in &sorted {
            self.check_trace(trace)?;
        }

        let (format, order, geometry) = (self.format, self.sample_byte_order(), self.geometry);
        let len = geometry.data_len();
        let mut rest = self.source.bytes_mut()?;
        let mut consumed = 0usize;
        let mut slots: Vec<Option<TraceViewMut<'_>>> = traces.iter().map(|_| None).collect();

        for (trace, position) in sorted {
            let start = geometry.data_offset(trace) as usize;
            let (_, tail) = std::mem::take(&mut rest).split_at_mut(start - consumed);
            let (data, tail) = tail.split_at_mut(len);
            slots[position] = Some(TraceViewMut::new(trace, data, format, order));
            rest = tail;
            consumed = start + len;
        }

        Ok(slots.into_iter().flatten().collect())
    }

    /// 1-based traces whose `key` header field lies in `min..=max`.
    pub fn find_traces(&self, key: &str, min: i64, max: i64) -> Result<Vec<usize>> {
        self.options.check_key(key)?;
        store::find_traces(&self.trace_headers, key, min, max)
    }

    /// Ensemble index over the configured key, built on first use.
    pub fn ensembles(&self) -> Result<&EnsembleIndex> {
        if let Some(index) = self.ensembles.get() {
            return Ok(index);
        }
        let index = EnsembleIndex::build(&self.trace_headers, &self.options.ensemble_key)?;
        debug!(
            key = %self.options.ensemble_key,
            ensembles = index.len(),
            "ensemble index built"
        );
        Ok(self.ensembles.get_or_init(|| index))
    }

    /// Samples of every trace in the ensemble with key `value`, or `None`
    /// if there is no such ensemble.
    pub fn read_ensemble(&self, value: i64) -> Result<Option<Vec<Vec<f32>>>> {
        let Some(range) = self.ensembles()?.range(value) else {
            return Ok(None);
        };
        (range.start + 1..=range.end)
            .map(|t| self.read_trace(t))
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }

    /// Replace the header of one trace on disk.
    ///
    /// Only the named fields are written; reserved bytes are kept. The
    /// sample count cannot change.
    pub fn patch_trace_header(&mut self, trace: usize, header: &TraceHeader) -> Result<()> {
        if !self.source.is_writable() {
            return Err(SegyError::ReadOnly);
        }
        self.check_trace(trace)?;
        let ns = self.geometry.ns();
        if header.ns != 0 && usize::from(header.ns) != ns {
            return Err(SegyError::SampleCountMismatch {
                trace,
                expected: ns,
                actual: usize::from(header.ns),
            });
        }

        let encoded = header.encode();
        self.source.write_at(
            self.geometry.head_offset(trace),
            &encoded[..TraceHeader::PACKED_LEN],
        )?;
        self.trace_headers[trace - 1] = if self.options.major_headers_only {
            TraceHeader::decode_major(&encoded)?
        } else {
            *header
        };
        self.ensembles.take();
        debug!(trace, "trace header patched");
        Ok(())
    }

    /// Set one named field of one trace header on disk.
    pub fn set_trace_header_field(&mut self, trace: usize, key: &str, value: i64) -> Result<()> {
        self.check_trace(trace)?;
        // the in-memory copy may hold major fields only
        let raw = self
            .source
            .read_at(self.geometry.head_offset(trace), TRACE_HEADER_LEN)?;
        let mut header = TraceHeader::decode(&raw)?;
        header.set(key, value)?;
        self.patch_trace_header(trace, &header)
    }

    /// Headers the writers use when the caller passes none.
    fn output_headers<'h>(
        &'h self,
        headers: Option<&'h [TraceHeader]>,
    ) -> Result<Cow<'h, [TraceHeader]>> {
        match headers {
            Some(headers) => Ok(Cow::Borrowed(headers)),
            // in-memory headers hold major fields only
            None if self.options.major_headers_only => Ok(Cow::Owned(scan_trace_headers(
                &self.source,
                &self.geometry,
                self.trace_count,
                false,
            )?)),
            None => Ok(Cow::Borrowed(&self.trace_headers[..])),
        }
    }

    /// Write traces as an SU file (big-endian IEEE float).
    ///
    /// `headers` defaults to this file's own full trace headers, read back
    /// from disk in a major-only session.
    pub fn write_su<T: AsRef<[f32]>>(
        &self,
        path: impl AsRef<Path>,
        traces: &[T],
        headers: Option<&[TraceHeader]>,
    ) -> Result<()> {
        let headers = self.output_headers(headers)?;
        writer::write_su(path, traces, &headers, ByteOrder::Big)
    }

    /// Write traces as SEG-Y with IEEE float samples, reusing this file's
    /// reel headers.
    pub fn write_segy<T: AsRef<[f32]>>(
        &self,
        path: impl AsRef<Path>,
        traces: &[T],
        headers: Option<&[TraceHeader]>,
    ) -> Result<()> {
        self.write_segy_with(path, traces, headers, &WriteOptions::default())
    }

    /// [`SegyFile::write_segy`] with an explicit sample encoding.
    ///
    /// SU sessions have no reel headers; a blank text header and a binary
    /// header carrying the sample interval are written instead.
    pub fn write_segy_with<T: AsRef<[f32]>>(
        &self,
        path: impl AsRef<Path>,
        traces: &[T],
        headers: Option<&[TraceHeader]>,
        options: &WriteOptions,
    ) -> Result<()> {
        let headers = self.output_headers(headers)?;
        let text = self.text_header.clone().unwrap_or_default();
        let binary = self.binary_header.unwrap_or_else(|| BinaryHeader {
            hdt: headers.first().map_or(0, |h| h.dt),
            ..BinaryHeader::default()
        });
        writer::write_segy(path, &text, &binary, traces, &headers, options)
    }

    /// Write the raw on-disk sample bytes of every trace, without headers.
    pub fn write_flat(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut out = BufWriter::new(File::create(path)?);
        for trace in 1..=self.trace_count {
            let raw = self
                .source
                .read_at(self.geometry.data_offset(trace), self.geometry.data_len())?;
            out.write_all(&raw)?;
        }
        out.flush()?;
        info!(path = %path.display(), traces = self.trace_count, "wrote flat sample file");
        Ok(())
    }

    /// Rescale every trace onto `[-1, 1]`.
    pub fn s_normalize<T: AsRef<[f32]>>(traces: &[T]) -> Vec<Vec<f32>> {
        traces.iter().map(|t| normalize_trace(t.as_ref())).collect()
    }

    /// Flush pending writes to disk.
    pub fn flush(&mut self) -> Result<()> {
        self.source.flush()
    }

    /// Flush and release the file.
    pub fn close(mut self) -> Result<()> {
        self.flush()?;
        debug!(path = %self.path.display(), "closed");
        Ok(())
    }
}

/// Sample count from the first trace header. A file with nothing after
/// its reel headers holds no traces and yields 0.
fn probe_ns(source: &ByteSource, variant: Variant, format: SampleFormat) -> Result<usize> {
    let geometry = TraceGeometry::new(variant, 0, format);
    if source.len() == geometry.header_bytes() {
        debug!("no trace data");
        return Ok(0);
    }
    let first = geometry.head_offset(1);
    let raw = source.read_at(first, TRACE_HEADER_LEN)?;
    let ns = usize::from(TraceHeader::decode_major(&raw)?.ns);
    if ns == 0 {
        return Err(SegyError::MissingSampleCount);
    }
    debug!(ns, "sample count taken from first trace header");
    Ok(ns)
}

fn scan_trace_headers(
    source: &ByteSource,
    geometry: &TraceGeometry,
    trace_count: usize,
    major_only: bool,
) -> Result<Vec<TraceHeader>> {
    let mut headers = Vec::with_capacity(trace_count);
    for trace in 1..=trace_count {
        let raw = source.read_at(geometry.head_offset(trace), TRACE_HEADER_LEN)?;
        let header = if major_only {
            TraceHeader::decode_major(&raw)?
        } else {
            TraceHeader::decode(&raw)?
        };
        let actual = usize::from(header.ns);
        if actual != 0 && actual != geometry.ns() {
            return Err(SegyError::SampleCountMismatch {
                trace,
                expected: geometry.ns(),
                actual,
            });
        }
        headers.push(header);
    }
    debug!(headers = headers.len(), major_only, "trace headers scanned");
    Ok(headers)
}
