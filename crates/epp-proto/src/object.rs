//! Object-type dispatch: domain, contact, and host.
//!
//! EPP maps every business command onto one of three managed object types.
//! The set is closed and stable, so it is modelled as an enum whose
//! associated behavior supplies the namespace URN, the element prefix, the
//! key element name, and the typed response constructor for each verb.

use std::fmt;
use std::str::FromStr;

use crate::response::RawResponse;
use crate::typed::{
    CheckResponse, CreateResponse, DeleteResponse, InfoResponse, RenewResponse, TransferResponse,
    UpdateResponse,
};

/// Namespace URN for domain objects (RFC 5731).
pub const DOMAIN_XMLNS: &str = "urn:ietf:params:xml:ns:domain-1.0";
/// Namespace URN for contact objects (RFC 5733).
pub const CONTACT_XMLNS: &str = "urn:ietf:params:xml:ns:contact-1.0";
/// Namespace URN for host objects (RFC 5732).
pub const HOST_XMLNS: &str = "urn:ietf:params:xml:ns:host-1.0";

/// The three EPP object types a command can address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Domain,
    Contact,
    Host,
}

impl ObjectKind {
    /// All object kinds, in the order their namespaces are advertised by
    /// default during login.
    pub const ALL: [ObjectKind; 3] = [ObjectKind::Domain, ObjectKind::Contact, ObjectKind::Host];

    /// XML namespace URN of this object's schema.
    pub fn xmlns(&self) -> &'static str {
        match self {
            ObjectKind::Domain => DOMAIN_XMLNS,
            ObjectKind::Contact => CONTACT_XMLNS,
            ObjectKind::Host => HOST_XMLNS,
        }
    }

    /// Namespace prefix used when qualifying payload elements.
    pub fn prefix(&self) -> &'static str {
        match self {
            ObjectKind::Domain => "domain",
            ObjectKind::Contact => "contact",
            ObjectKind::Host => "host",
        }
    }

    /// Name of the element that identifies one object of this kind in
    /// command payloads and response data (`<domain:name>`, `<contact:id>`,
    /// `<host:name>`).
    pub fn key_element(&self) -> &'static str {
        match self {
            ObjectKind::Domain | ObjectKind::Host => "name",
            ObjectKind::Contact => "id",
        }
    }

    // Typed response constructors, one per verb.  Each consumes exactly one
    // raw response and stamps it with this object kind.

    pub fn check_response(&self, raw: RawResponse) -> CheckResponse {
        CheckResponse::new(*self, raw)
    }

    pub fn create_response(&self, raw: RawResponse) -> CreateResponse {
        CreateResponse::new(*self, raw)
    }

    pub fn delete_response(&self, raw: RawResponse) -> DeleteResponse {
        DeleteResponse::new(*self, raw)
    }

    pub fn info_response(&self, raw: RawResponse) -> InfoResponse {
        InfoResponse::new(*self, raw)
    }

    pub fn renew_response(&self, raw: RawResponse) -> RenewResponse {
        RenewResponse::new(*self, raw)
    }

    pub fn transfer_response(&self, raw: RawResponse) -> TransferResponse {
        TransferResponse::new(*self, raw)
    }

    pub fn update_response(&self, raw: RawResponse) -> UpdateResponse {
        UpdateResponse::new(*self, raw)
    }
}

impl FromStr for ObjectKind {
    type Err = ();

    /// Case-sensitive resolution of the caller-supplied type token.  There is
    /// no fallback kind: an unknown token is the caller's error to surface.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "domain" => Ok(ObjectKind::Domain),
            "contact" => Ok(ObjectKind::Contact),
            "host" => Ok(ObjectKind::Host),
            _ => Err(()),
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
