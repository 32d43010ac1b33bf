//! Iterator over the traces of an open file.
//!
//! Use [`SegyFile::traces`] to walk every trace with its header.

use crate::Result;
use crate::file::SegyFile;
use crate::header::TraceHeader;

/// One decoded trace.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    /// 1-based trace number.
    pub index: usize,
    pub header: TraceHeader,
    pub samples: Vec<f32>,
}

/// Iterator over the traces of a [`SegyFile`], in file order.
///
/// Each call to `next()` reads and decodes one trace. Iteration stops
/// after the last trace or after the first error.
///
/// # Example
///
/// ```
/// use segy_rs::{SegyFile, SegyOptions, TraceHeader, Variant};
///
/// let dir = tempfile::tempdir().unwrap();
/// let path = dir.path().join("line.su");
/// let traces = vec![vec![1.0f32, 2.0, 3.0], vec![4.0, 5.0, 6.0]];
/// let headers = vec![TraceHeader { fldr: 7, ..TraceHeader::default() }; 2];
/// segy_rs::writer::write_su(&path, &traces, &headers, segy_rs::ByteOrder::Big).unwrap();
///
/// let file = SegyFile::open(&path, SegyOptions::new().with_variant(Variant::Su)).unwrap();
/// let read: Vec<_> = file.traces().collect::<Result<Vec<_>, _>>().unwrap();
/// assert_eq!(read.len(), 2);
/// assert_eq!(read[1].samples, vec![4.0, 5.0, 6.0]);
/// assert_eq!(read[1].header.fldr, 7);
/// ```
pub struct Traces<'a> {
    file: &'a SegyFile,
    next: usize,
}

impl<'a> Traces<'a> {
    pub(crate) fn new(file: &'a SegyFile) -> Self {
        Self { file, next: 1 }
    }
}

impl Iterator for Traces<'_> {
    type Item = Result<Trace>;

    fn next(&mut self) -> Option<Self::Item> {
        let count = self.file.trace_count();
        if self.next > count {
            return None;
        }

        let index = self.next;
        let trace = self.file.trace_header(index).and_then(|header| {
            let samples = self.file.read_trace(index)?;
            Ok(Trace {
                index,
                header: *header,
                samples,
            })
        });

        self.next = if trace.is_ok() { index + 1 } else { count + 1 };
        Some(trace)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.file.trace_count() + 1).saturating_sub(self.next);
        (0, Some(remaining))
    }
}
