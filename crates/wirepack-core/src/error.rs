use std::io;

use thiserror::Error;

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, ErrorKind>;

/// Errors that can occur while framing, reassembling or scheduling
/// transmissions.
///
/// Every fallible transport call returns one of these; none of the library
/// paths panic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    /// The outgoing table is at capacity; the caller keeps the messages.
    #[error("outgoing table is at capacity ({0} entries)")]
    OutgoingTableFull(usize),
    /// The reassembly arena cannot reserve room for another transmission.
    #[error("reassembly arena full: {requested} bytes requested, {available} available")]
    ReassemblyArenaFull {
        /// Bytes the new transmission would need.
        requested: usize,
        /// Bytes left in the arena budget.
        available: usize,
    },
    /// A continuation chunk arrived with no matching in-flight transmission.
    #[error("continuation chunk matches no in-flight transmission")]
    UnknownContinuation,
    /// The transmission header could not be read or its magic is wrong.
    #[error("could not read transmission header: {0}")]
    CouldNotReadHeader(String),
    /// A transmission must carry at least one message.
    #[error("transmission carries no messages")]
    EmptyTransmission,
    /// A payload does not fit the u16 length prefix of its body layout.
    #[error("payload of {0} bytes exceeds the u16 length prefix")]
    PayloadTooLarge(usize),
    /// The message stream inside a transmission could not be decoded.
    #[error("could not decode message: {0}")]
    DecodingError(DecodingErrorKind),
    /// Wrapped I/O error from the byte reader/writer.
    #[error("I/O error: {0}")]
    Io(String),
}

/// Specific decoding failure inside a transmission body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodingErrorKind {
    /// The byte stream ended in the middle of a message field.
    #[error("unexpected end of data")]
    UnexpectedEof,
    /// The flag field contained bits this version does not know.
    #[error("unknown message flag bits")]
    MessageFlags,
}

impl From<io::Error> for ErrorKind {
    fn from(inner: io::Error) -> ErrorKind {
        if inner.kind() == io::ErrorKind::UnexpectedEof {
            ErrorKind::DecodingError(DecodingErrorKind::UnexpectedEof)
        } else {
            ErrorKind::Io(inner.to_string())
        }
    }
}

impl From<DecodingErrorKind> for ErrorKind {
    fn from(inner: DecodingErrorKind) -> ErrorKind {
        ErrorKind::DecodingError(inner)
    }
}
