//! # epp-proto
//!
//! Protocol layer for the EPP (Extensible Provisioning Protocol) client:
//! the XML envelope codec, TCP wire framing helpers, the command model, and
//! the raw/typed response model.
//!
//! This crate is pure data and codec work.  It owns no sockets and performs
//! no I/O; the `epp-client` crate drives it from its session layer.
//!
//! - **`xml`** – owned element tree plus quick-xml rendering and parsing.
//! - **`frame`** – RFC 5734 length-prefix framing and the legacy `</epp>`
//!   delimiter used by pre-RFC servers.
//! - **`command`** / **`object`** – the per-call command value and the closed
//!   domain/contact/host dispatch enum.
//! - **`envelope`** – hello/login/logout/command rendering and greeting/
//!   response parsing.
//! - **`response`** / **`typed`** – raw replies and the verb-specific
//!   wrappers handed back to callers.

pub mod command;
pub mod envelope;
pub mod error;
pub mod frame;
pub mod object;
pub mod response;
pub mod typed;
pub mod xml;

// Re-export the types callers touch on every request so they can be named
// without spelling out the module path.
pub use command::{Command, LoginCommand, TransferOp, Verb};
pub use envelope::{Reply, EPP_XMLNS};
pub use error::ProtocolError;
pub use object::ObjectKind;
pub use response::{Greeting, MessageQueue, RawResponse, ResultData};
pub use typed::{
    CheckItem, CheckResponse, CreateResponse, DeleteResponse, InfoResponse, RenewResponse,
    TransferResponse, TypedResponse, UpdateResponse,
};
pub use xml::Element;
