//! The error taxonomy of the column engine.

/// Errors generated by this crate.
///
/// Variants carry a human-readable payload; call sites that know the
/// affected column embed its dotted path (and the page ordinal, where
/// applicable) in the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A caller-provided argument violates a contract, e.g. a byte slice
    /// whose length is not a multiple of the element size, a [`crate::value::Value`]
    /// whose kind does not match the column, or a bit width out of range.
    InvalidInput(String),
    /// An offset or row range is outside the bounds of a buffer or page.
    IndexOutOfRange(String),
    /// The input ended in the middle of a page body, an RLE header or a
    /// delta block.
    UnexpectedEndOfInput(String),
    /// The file violates the format: CRC mismatch, a run length above the
    /// safety cap, or inconsistent metadata.
    Corrupt(String),
    /// The encoding is not supported for the physical type, or absent from
    /// the registry altogether.
    EncodingNotSupported(String),
    /// The compression codec is not supported or its feature is not active.
    CompressionNotSupported(String),
    /// A row or a row group does not match the writer's schema.
    SchemaMismatch(String),
    /// Normal termination of a sequence. Public iterators translate this
    /// into exhaustion; it is not a failure.
    EndOfSequence,
    /// An error from the underlying reader or writer.
    Transport(String),
}

impl Error {
    pub(crate) fn invalid<I: Into<String>>(message: I) -> Self {
        Self::InvalidInput(message.into())
    }

    pub(crate) fn oob<I: Into<String>>(message: I) -> Self {
        Self::IndexOutOfRange(message.into())
    }

    pub(crate) fn eof<I: Into<String>>(message: I) -> Self {
        Self::UnexpectedEndOfInput(message.into())
    }

    pub(crate) fn corrupt<I: Into<String>>(message: I) -> Self {
        Self::Corrupt(message.into())
    }
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::InvalidInput(message) => write!(fmt, "invalid input: {}", message),
            Error::IndexOutOfRange(message) => write!(fmt, "index out of range: {}", message),
            Error::UnexpectedEndOfInput(message) => {
                write!(fmt, "unexpected end of input: {}", message)
            }
            Error::Corrupt(message) => write!(fmt, "corrupt data: {}", message),
            Error::EncodingNotSupported(message) => {
                write!(fmt, "encoding not supported: {}", message)
            }
            Error::CompressionNotSupported(message) => {
                write!(fmt, "compression not supported: {}", message)
            }
            Error::SchemaMismatch(message) => write!(fmt, "schema mismatch: {}", message),
            Error::EndOfSequence => write!(fmt, "end of sequence"),
            Error::Transport(message) => write!(fmt, "underlying IO error: {}", message),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::Transport(e.to_string())
    }
}

impl From<parquet_format_safe::thrift::Error> for Error {
    fn from(e: parquet_format_safe::thrift::Error) -> Error {
        Error::Corrupt(format!("underlying thrift error: {}", e))
    }
}

impl From<std::num::TryFromIntError> for Error {
    fn from(e: std::num::TryFromIntError) -> Error {
        Error::InvalidInput(format!("number does not fit its target width: {}", e))
    }
}

#[cfg(feature = "snappy")]
impl From<snap::Error> for Error {
    fn from(e: snap::Error) -> Error {
        Error::Corrupt(format!("underlying snap error: {}", e))
    }
}

/// A specialized `Result` for errors of this crate.
pub type Result<T> = std::result::Result<T, Error>;
