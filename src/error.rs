//! Error types for SEG-Y / SU decoding, encoding, and trace access.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SegyError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("input too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: u64, actual: u64 },

    #[error("unsupported sample format code: {0}")]
    UnsupportedFormat(u16),

    #[error("character {character:?} at position {position} has no EBCDIC-500 encoding")]
    Encoding { character: char, position: usize },

    #[error(
        "file size {file_size} is not {header_bytes} header bytes plus a whole number of \
         {stride}-byte traces ({remainder} bytes left over)"
    )]
    SizeMismatch {
        file_size: u64,
        header_bytes: u64,
        stride: u64,
        remainder: u64,
    },

    #[error("sample count mismatch at trace {trace}: expected {expected}, got {actual}")]
    SampleCountMismatch {
        trace: usize,
        expected: usize,
        actual: usize,
    },

    #[error("samples per trace is zero in both the binary header and the first trace header")]
    MissingSampleCount,

    #[error("unknown trace header field: {0}")]
    InvalidHeaderKey(String),

    #[error("value {value} does not fit header field {field}")]
    FieldOverflow { field: &'static str, value: i64 },

    #[error("trace {trace} out of range (1..={count})")]
    TraceOutOfRange { trace: usize, count: usize },

    #[error("trace {0} requested twice for mutable access")]
    DuplicateTrace(usize),

    #[error("{traces} traces supplied with {headers} trace headers")]
    HeaderCountMismatch { traces: usize, headers: usize },

    #[error("operation requires a memory-mapped session")]
    NotMapped,

    #[error("operation requires a session opened as writable")]
    ReadOnly,
}

pub type Result<T> = std::result::Result<T, SegyError>;
