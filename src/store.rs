//! Trace layout arithmetic, header search and the ensemble index.

use std::collections::BTreeMap;
use std::ops::Range;

use crate::header::{REEL_HEADER_LEN, TRACE_HEADER_FIELDS, TRACE_HEADER_LEN, TraceHeader};
use crate::types::{SampleFormat, Variant};
use crate::{Result, SegyError};

/// Where every trace lives in a file with a fixed sample count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceGeometry {
    header_bytes: u64,
    ns: usize,
    sample_width: usize,
}

impl TraceGeometry {
    pub fn new(variant: Variant, ns: usize, format: SampleFormat) -> Self {
        let header_bytes = match variant {
            Variant::Segy => REEL_HEADER_LEN as u64,
            Variant::Su => 0,
        };
        Self {
            header_bytes,
            ns,
            sample_width: format.sample_width(),
        }
    }

    /// Bytes in front of the first trace.
    pub fn header_bytes(&self) -> u64 {
        self.header_bytes
    }

    /// Samples per trace.
    pub fn ns(&self) -> usize {
        self.ns
    }

    pub fn sample_width(&self) -> usize {
        self.sample_width
    }

    /// Sample bytes per trace.
    pub fn data_len(&self) -> usize {
        self.ns * self.sample_width
    }

    /// Bytes from one trace header to the next.
    pub fn stride(&self) -> u64 {
        (TRACE_HEADER_LEN + self.data_len()) as u64
    }

    /// Offset of the first sample of 1-based `trace`.
    pub fn data_offset(&self, trace: usize) -> u64 {
        self.head_offset(trace) + TRACE_HEADER_LEN as u64
    }

    /// Offset of the header of 1-based `trace`.
    pub fn head_offset(&self, trace: usize) -> u64 {
        debug_assert!(trace >= 1, "trace numbers are 1-based");
        self.header_bytes + self.stride() * (trace as u64 - 1)
    }

    /// Number of whole traces in a file of `file_size` bytes.
    ///
    /// Leftover bytes after the last trace are an error, never a partial
    /// trace.
    pub fn trace_count(&self, file_size: u64) -> Result<usize> {
        if file_size < self.header_bytes {
            return Err(SegyError::TooShort {
                expected: self.header_bytes,
                actual: file_size,
            });
        }
        let body = file_size - self.header_bytes;
        let stride = self.stride();
        let remainder = body % stride;
        if remainder != 0 {
            return Err(SegyError::SizeMismatch {
                file_size,
                header_bytes: self.header_bytes,
                stride,
                remainder,
            });
        }
        Ok((body / stride) as usize)
    }
}

fn check_key(key: &str) -> Result<()> {
    if TRACE_HEADER_FIELDS.contains(&key) {
        Ok(())
    } else {
        Err(SegyError::InvalidHeaderKey(key.to_string()))
    }
}

/// 1-based indices of traces whose `key` field lies in `min..=max`, ascending.
///
/// A field matches when either its raw unsigned value or its
/// two's-complement reading is in range, so negative bounds find
/// negative scalars and coordinates.
pub fn find_traces(headers: &[TraceHeader], key: &str, min: i64, max: i64) -> Result<Vec<usize>> {
    check_key(key)?;
    Ok(headers
        .iter()
        .enumerate()
        .filter(|(_, header)| {
            let range = min..=max;
            header.get(key).is_some_and(|value| range.contains(&value))
                || header
                    .get_signed(key)
                    .is_some_and(|value| range.contains(&value))
        })
        .map(|(i, _)| i + 1)
        .collect())
}

/// First trace of every ensemble (gather), keyed by a header field.
///
/// Traces of one ensemble are assumed contiguous; only the first
/// occurrence of each key value is recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnsembleIndex {
    key: String,
    first: BTreeMap<i64, usize>,
    // (value, first trace) in file order
    order: Vec<(i64, usize)>,
    trace_count: usize,
}

impl EnsembleIndex {
    pub fn build(headers: &[TraceHeader], key: &str) -> Result<Self> {
        check_key(key)?;
        let mut first = BTreeMap::new();
        let mut order = Vec::new();
        for (i, header) in headers.iter().enumerate() {
            let value = header.get(key).unwrap_or_default();
            if let std::collections::btree_map::Entry::Vacant(slot) = first.entry(value) {
                slot.insert(i);
                order.push((value, i));
            }
        }
        Ok(Self {
            key: key.to_string(),
            first,
            order,
            trace_count: headers.len(),
        })
    }

    /// Header field the index is keyed on.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// 0-based first trace of the ensemble with key `value`.
    pub fn first_trace(&self, value: i64) -> Option<usize> {
        self.first.get(&value).copied()
    }

    /// Number of ensembles.
    pub fn len(&self) -> usize {
        self.first.len()
    }

    pub fn is_empty(&self) -> bool {
        self.first.is_empty()
    }

    /// `(key value, 0-based first trace)` in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, usize)> + '_ {
        self.first.iter().map(|(&value, &trace)| (value, trace))
    }

    pub fn as_map(&self) -> &BTreeMap<i64, usize> {
        &self.first
    }

    /// `(key value, 0-based trace range)` in file order. Each range runs
    /// to the next ensemble's first trace, the last one to the end.
    pub fn ranges(&self) -> impl Iterator<Item = (i64, Range<usize>)> + '_ {
        self.order.iter().enumerate().map(|(i, &(value, start))| {
            let end = self
                .order
                .get(i + 1)
                .map_or(self.trace_count, |&(_, next)| next);
            (value, start..end)
        })
    }

    /// 0-based trace range of the ensemble with key `value`.
    pub fn range(&self, value: i64) -> Option<Range<usize>> {
        self.ranges()
            .find(|(v, _)| *v == value)
            .map(|(_, range)| range)
    }
}
