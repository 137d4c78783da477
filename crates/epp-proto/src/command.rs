//! Command model: the transient value built for each request.
//!
//! A [`Command`] is constructed by the session facade immediately before a
//! request is sent and discarded once the matching response has been wrapped.
//! The envelope module renders it into the `<command>` element of an EPP
//! request document.

use std::fmt;
use std::str::FromStr;

use crate::object::ObjectKind;
use crate::xml::Element;

// ── Verbs ─────────────────────────────────────────────────────────────────────

/// The EPP command verbs this client issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Check,
    Create,
    Delete,
    Info,
    Renew,
    Transfer,
    Update,
    Poll,
}

impl Verb {
    /// EPP element name for this verb.
    pub fn tag(&self) -> &'static str {
        match self {
            Verb::Check => "check",
            Verb::Create => "create",
            Verb::Delete => "delete",
            Verb::Info => "info",
            Verb::Renew => "renew",
            Verb::Transfer => "transfer",
            Verb::Update => "update",
            Verb::Poll => "poll",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

// ── Transfer sub-operations ───────────────────────────────────────────────────

/// Sub-operation carried in the `op` attribute of a `<transfer>` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOp {
    Request,
    Query,
    Cancel,
    Approve,
    Reject,
}

impl TransferOp {
    /// The wire token written into the `op` attribute.
    pub fn token(&self) -> &'static str {
        match self {
            TransferOp::Request => "request",
            TransferOp::Query => "query",
            TransferOp::Cancel => "cancel",
            TransferOp::Approve => "approve",
            TransferOp::Reject => "reject",
        }
    }
}

impl FromStr for TransferOp {
    type Err = ();

    /// Case-sensitive: the wire tokens are lowercase and nothing else is
    /// accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "request" => Ok(TransferOp::Request),
            "query" => Ok(TransferOp::Query),
            "cancel" => Ok(TransferOp::Cancel),
            "approve" => Ok(TransferOp::Approve),
            "reject" => Ok(TransferOp::Reject),
            _ => Err(()),
        }
    }
}

impl fmt::Display for TransferOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

// ── Command ───────────────────────────────────────────────────────────────────

/// One business command, ready to be rendered and sent.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    verb: Verb,
    object: Option<ObjectKind>,
    payload: Vec<Element>,
    transfer_op: Option<TransferOp>,
    message_id: Option<String>,
}

impl Command {
    fn object_command(verb: Verb, object: ObjectKind, payload: Vec<Element>) -> Self {
        Self {
            verb,
            object: Some(object),
            payload,
            transfer_op: None,
            message_id: None,
        }
    }

    pub fn check(object: ObjectKind, payload: Vec<Element>) -> Self {
        Self::object_command(Verb::Check, object, payload)
    }

    pub fn create(object: ObjectKind, payload: Vec<Element>) -> Self {
        Self::object_command(Verb::Create, object, payload)
    }

    pub fn delete(object: ObjectKind, payload: Vec<Element>) -> Self {
        Self::object_command(Verb::Delete, object, payload)
    }

    pub fn info(object: ObjectKind, payload: Vec<Element>) -> Self {
        Self::object_command(Verb::Info, object, payload)
    }

    pub fn renew(object: ObjectKind, payload: Vec<Element>) -> Self {
        Self::object_command(Verb::Renew, object, payload)
    }

    pub fn update(object: ObjectKind, payload: Vec<Element>) -> Self {
        Self::object_command(Verb::Update, object, payload)
    }

    pub fn transfer(op: TransferOp, object: ObjectKind, payload: Vec<Element>) -> Self {
        Self {
            transfer_op: Some(op),
            ..Self::object_command(Verb::Transfer, object, payload)
        }
    }

    /// A poll request: dequeue nothing, report the first queued message.
    pub fn poll() -> Self {
        Self {
            verb: Verb::Poll,
            object: None,
            payload: Vec::new(),
            transfer_op: None,
            message_id: None,
        }
    }

    /// A poll acknowledgement for the message with the given id.
    pub fn ack(message_id: impl Into<String>) -> Self {
        Self {
            message_id: Some(message_id.into()),
            ..Self::poll()
        }
    }

    pub fn verb(&self) -> Verb {
        self.verb
    }

    pub fn object(&self) -> Option<ObjectKind> {
        self.object
    }

    pub fn payload(&self) -> &[Element] {
        &self.payload
    }

    pub fn transfer_op(&self) -> Option<TransferOp> {
        self.transfer_op
    }

    pub fn message_id(&self) -> Option<&str> {
        self.message_id.as_deref()
    }
}

// ── Login ─────────────────────────────────────────────────────────────────────

/// Parameters of the `<login>` command sent when a session scope opens.
///
/// The service and extension URN lists are advertised in order; the registry
/// treats duplicates as redundant, so none are filtered here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCommand {
    pub client_id: String,
    pub password: String,
    pub version: String,
    pub language: String,
    pub services: Vec<String>,
    pub extensions: Vec<String>,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
