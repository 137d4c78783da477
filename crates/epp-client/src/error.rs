//! Error type for the session layer.

use epp_proto::ProtocolError;
use thiserror::Error;

/// Errors surfaced by [`crate::EppClient`] and the connection layer beneath
/// it.
///
/// The variants separate "could not even talk to the server"
/// ([`Error::Transport`]) from "the server rejected the session"
/// ([`Error::Login`]) from caller mistakes caught before any network I/O
/// ([`Error::Configuration`], [`Error::UnsupportedType`],
/// [`Error::InvalidOperation`]).
#[derive(Debug, Error)]
pub enum Error {
    /// Client construction was handed unusable arguments.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The object-type token is not one this client understands.
    #[error("unsupported object type {0:?}")]
    UnsupportedType(String),

    /// A command argument was outside its allowed set.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// The registry rejected the login exchange.
    #[error("login rejected by server: {message} (code {code})")]
    Login { code: u16, message: String },

    /// Connection-level I/O failure.
    #[error("transport failure: {0}")]
    Transport(#[from] std::io::Error),

    /// The server reply could not be parsed or was not the expected frame.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
