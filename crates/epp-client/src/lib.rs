//! # epp-client
//!
//! Session-managed client for the Extensible Provisioning Protocol (EPP),
//! the XML request/response protocol domain registries expose to
//! registrars.
//!
//! The crate wraps every business command in an authenticated session: the
//! [`EppClient`] facade opens a connection, reads the greeting, logs in,
//! sends the command, logs out, and disconnects — on every exit path,
//! including errors.  Callers pick a verb and an object type and get a typed
//! response back; they never see the session choreography.
//!
//! Two protocol variants sit behind the same facade: the current RFC 5734
//! wire framing, and a legacy "compatibility" discipline for servers that
//! predate it.  The variant is chosen once, at construction, via
//! [`ClientOptions::compatibility`].
//!
//! Layering:
//!
//! ```text
//! EppClient (facade: verbs, validation, scope orchestration)
//!  └─ ProtocolConnection (session state, login/logout, framing variant)
//!      └─ Transport (TCP or TLS byte stream)
//! ```
//!
//! The envelope codec and response models live in the `epp-proto` crate and
//! are re-exported here for convenience.

pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod transport;

pub use client::{EppClient, SessionFuture};
pub use config::{default_services, AddressFamily, ClientOptions, SessionConfig, TlsConfig, DEFAULT_PORT};
pub use connection::{
    CloseDelimited, CompatConnection, Framer, LengthPrefixed, ProtocolConnection, Session,
    SessionState, StandardConnection,
};
pub use error::Error;
pub use transport::{TcpTransport, Transport};

// Protocol-layer types callers handle directly.
pub use epp_proto::{
    CheckItem, CheckResponse, Command, CreateResponse, DeleteResponse, Element, Greeting,
    InfoResponse, LoginCommand, MessageQueue, ObjectKind, RawResponse, RenewResponse, ResultData,
    TransferOp, TransferResponse, TypedResponse, UpdateResponse, Verb,
};
