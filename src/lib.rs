//! Pure Rust SEG-Y and Seismic Unix (SU) reader and writer.
//!
//! Decodes the EBCDIC text header, the binary reel header and every trace
//! header, serves trace samples by index from a memory map (or stream
//! reads), and writes SU, SEG-Y and flat sample files. Sample formats 1
//! (IBM float), 2 (int32), 3 (int16), 4 (fixed point with gain), 5 (IEEE
//! float) and 8 (int8) are supported. Sample byte order is detected from
//! the data when not declared.
//!
//! # Writing and reading an SU file
//!
//! ```
//! use segy_rs::{ByteOrder, SegyFile, SegyOptions, TraceHeader, Variant};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let path = dir.path().join("shot.su");
//!
//! let traces: Vec<Vec<f32>> = (0..4).map(|i| vec![i as f32, 0.5, -1.0]).collect();
//! let headers: Vec<TraceHeader> = (0..4)
//!     .map(|i| TraceHeader { tracl: i + 1, fldr: 100 + i / 2, dt: 4000, ..TraceHeader::default() })
//!     .collect();
//! segy_rs::writer::write_su(&path, &traces, &headers, ByteOrder::Little).unwrap();
//!
//! let file = SegyFile::open(&path, SegyOptions::new().with_variant(Variant::Su)).unwrap();
//! assert_eq!(file.trace_count(), 4);
//! assert_eq!(file.samples_per_trace(), 3);
//! assert_eq!(file.read_trace(3).unwrap(), vec![2.0, 0.5, -1.0]);
//! assert_eq!(file.find_traces("fldr", 101, 101).unwrap(), vec![3, 4]);
//! ```
//!
//! # SEG-Y with IBM float samples
//!
//! ```
//! use segy_rs::{BinaryHeader, SampleFormat, SegyFile, SegyOptions, TextHeader, TraceHeader};
//! use segy_rs::writer::{write_segy, WriteOptions};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let path = dir.path().join("line.sgy");
//!
//! let text = TextHeader::from_text("C 1 CLIENT: EXAMPLE LINE").unwrap();
//! let binary = BinaryHeader { hdt: 2000, ..BinaryHeader::default() };
//! let traces = vec![vec![1.0f32, -118.625, 16.0]; 2];
//! let headers = vec![TraceHeader::default(); 2];
//! let options = WriteOptions::new().with_format(SampleFormat::IbmFloat32);
//! write_segy(&path, &text, &binary, &traces, &headers, &options).unwrap();
//!
//! let file = SegyFile::open(&path, SegyOptions::default()).unwrap();
//! assert_eq!(file.sample_format(), SampleFormat::IbmFloat32);
//! assert!(file.text_header().unwrap().text().starts_with("C 1 CLIENT"));
//! assert_eq!(file.read_all().unwrap(), traces);
//! ```
//!
//! # Ensembles
//!
//! ```
//! use segy_rs::{ByteOrder, SegyFile, SegyOptions, TraceHeader, Variant};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let path = dir.path().join("gathers.su");
//! let traces = vec![vec![0.25f32; 8]; 6];
//! let headers: Vec<TraceHeader> = [7, 7, 7, 8, 8, 9]
//!     .iter()
//!     .map(|&fldr| TraceHeader { fldr, ..TraceHeader::default() })
//!     .collect();
//! segy_rs::writer::write_su(&path, &traces, &headers, ByteOrder::Big).unwrap();
//!
//! let file = SegyFile::open(&path, SegyOptions::new().with_variant(Variant::Su)).unwrap();
//! let index = file.ensembles().unwrap();
//! assert_eq!(index.iter().collect::<Vec<_>>(), vec![(7, 0), (8, 3), (9, 5)]);
//! assert_eq!(file.read_ensemble(8).unwrap().unwrap().len(), 2);
//! ```

pub mod ebcdic;
pub mod endian;
pub mod error;
pub mod file;
pub mod header;
pub mod ibm;
pub mod reader;
pub mod sample;
pub mod source;
pub mod store;
pub mod types;
pub mod view;
pub mod writer;

pub use endian::EndianMode;
pub use error::{Result, SegyError};
pub use file::{SegyFile, SegyOptions};
pub use header::{BinaryHeader, TextHeader, TraceHeader};
pub use reader::{Trace, Traces};
pub use store::{EnsembleIndex, TraceGeometry};
pub use types::{AccessMode, ByteOrder, Endianness, SampleFormat, Variant};
pub use view::{TraceView, TraceViewMut};
pub use writer::WriteOptions;
