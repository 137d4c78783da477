//! Error type shared by the codec modules.

use thiserror::Error;

/// Errors raised while framing, rendering, or parsing EPP documents.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The document could not be parsed or written as XML.
    #[error("malformed XML: {0}")]
    MalformedXml(String),

    /// A required element was absent from the document.
    #[error("missing element <{0}>")]
    MissingElement(&'static str),

    /// A required attribute was absent or could not be interpreted.
    #[error("invalid attribute {attribute:?} on <{element}>: {detail}")]
    InvalidAttribute {
        element: &'static str,
        attribute: &'static str,
        detail: String,
    },

    /// The reply was not the kind of frame the session expected.
    #[error("expected {expected} frame, received {received}")]
    UnexpectedFrame {
        expected: &'static str,
        received: &'static str,
    },

    /// The frame header declares a total length shorter than the header itself.
    #[error("invalid frame length {0}: shorter than the 4-byte header")]
    InvalidFrameLength(usize),

    /// The frame payload is not valid UTF-8.
    #[error("frame payload is not valid UTF-8: {0}")]
    InvalidEncoding(String),
}
