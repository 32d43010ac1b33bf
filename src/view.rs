//! Zero-copy views of single traces inside a memory map.
//!
//! Samples are decoded (or encoded) one word at a time on access, so a
//! view costs nothing until it is read.

use crate::sample::{decode_sample, encode_sample};
use crate::types::{ByteOrder, SampleFormat};

/// Read-only view of one trace's samples.
#[derive(Debug, Clone, Copy)]
pub struct TraceView<'a> {
    index: usize,
    data: &'a [u8],
    format: SampleFormat,
    order: ByteOrder,
}

impl<'a> TraceView<'a> {
    pub(crate) fn new(index: usize, data: &'a [u8], format: SampleFormat, order: ByteOrder) -> Self {
        Self {
            index,
            data,
            format,
            order,
        }
    }

    /// 1-based trace number.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.data.len() / self.format.sample_width()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Sample `i`, or `None` past the end.
    pub fn get(&self, i: usize) -> Option<f32> {
        let width = self.format.sample_width();
        let word = self.data.get(i * width..(i + 1) * width)?;
        Some(decode_sample(word, self.format, self.order))
    }

    pub fn iter(&self) -> impl Iterator<Item = f32> + 'a {
        let (format, order) = (self.format, self.order);
        self.data
            .chunks_exact(format.sample_width())
            .map(move |word| decode_sample(word, format, order))
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.iter().collect()
    }

    /// Raw on-disk sample bytes.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }
}

/// Writable view of one trace's samples. Writes land in the mapped file.
#[derive(Debug)]
pub struct TraceViewMut<'a> {
    index: usize,
    data: &'a mut [u8],
    format: SampleFormat,
    order: ByteOrder,
}

impl<'a> TraceViewMut<'a> {
    pub(crate) fn new(
        index: usize,
        data: &'a mut [u8],
        format: SampleFormat,
        order: ByteOrder,
    ) -> Self {
        Self {
            index,
            data,
            format,
            order,
        }
    }

    /// 1-based trace number.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.data.len() / self.format.sample_width()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<f32> {
        let width = self.format.sample_width();
        let word = self.data.get(i * width..(i + 1) * width)?;
        Some(decode_sample(word, self.format, self.order))
    }

    /// Overwrite sample `i` in the file's own format and byte order.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.len()`.
    pub fn set(&mut self, i: usize, value: f32) {
        let width = self.format.sample_width();
        encode_sample(
            value,
            self.format,
            self.order,
            &mut self.data[i * width..(i + 1) * width],
        );
    }

    /// Overwrite the leading samples with `values`.
    ///
    /// # Panics
    ///
    /// Panics if `values` is longer than the trace.
    pub fn copy_from_slice(&mut self, values: &[f32]) {
        assert!(values.len() <= self.len(), "more values than samples");
        for (i, &value) in values.iter().enumerate() {
            self.set(i, value);
        }
    }

    /// Apply `f` to every sample in place.
    pub fn map_in_place(&mut self, mut f: impl FnMut(f32) -> f32) {
        for i in 0..self.len() {
            if let Some(value) = self.get(i) {
                self.set(i, f(value));
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        let (format, order) = (self.format, self.order);
        self.data
            .chunks_exact(format.sample_width())
            .map(move |word| decode_sample(word, format, order))
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.iter().collect()
    }

    pub fn as_view(&self) -> TraceView<'_> {
        TraceView::new(self.index, &*self.data, self.format, self.order)
    }
}
