//! EPP/TCP wire framing helpers.
//!
//! Current servers (RFC 5734) prefix every XML document with a 4-byte
//! big-endian *total length* field that counts the header itself:
//!
//! ```text
//! [total_len:4][xml document:total_len-4]
//! ```
//!
//! Legacy servers predate the length header: they write the bare XML document
//! and the peer scans for the closing `</epp>` tag instead.  Both disciplines
//! are implemented by the session layer on top of the helpers here.

use crate::error::ProtocolError;

/// Size of the RFC 5734 length header in bytes.
pub const HEADER_SIZE: usize = 4;

/// Delimiter terminating a legacy (unprefixed) frame.
pub const CLOSE_DELIMITER: &[u8] = b"</epp>";

/// Encodes one document as a length-prefixed frame.
pub fn length_prefix(xml: &str) -> Vec<u8> {
    let total = (xml.len() + HEADER_SIZE) as u32;
    let mut frame = Vec::with_capacity(xml.len() + HEADER_SIZE);
    frame.extend_from_slice(&total.to_be_bytes());
    frame.extend_from_slice(xml.as_bytes());
    frame
}

/// Reads the payload length out of a 4-byte frame header.
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidFrameLength`] when the header is not
/// exactly [`HEADER_SIZE`] bytes or declares a total length that leaves no
/// room for a payload.
pub fn declared_len(header: &[u8]) -> Result<usize, ProtocolError> {
    let header: [u8; HEADER_SIZE] = header
        .try_into()
        .map_err(|_| ProtocolError::InvalidFrameLength(header.len()))?;
    let total = u32::from_be_bytes(header) as usize;
    if total <= HEADER_SIZE {
        return Err(ProtocolError::InvalidFrameLength(total));
    }
    Ok(total - HEADER_SIZE)
}

/// Decodes a received frame payload into the XML document string.
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidEncoding`] when the payload is not UTF-8.
pub fn decode_payload(payload: Vec<u8>) -> Result<String, ProtocolError> {
    String::from_utf8(payload).map_err(|e| ProtocolError::InvalidEncoding(e.to_string()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
