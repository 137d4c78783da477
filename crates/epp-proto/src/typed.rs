//! Typed response wrappers, one per verb.
//!
//! Each wrapper owns exactly one [`RawResponse`] and is stamped with the
//! [`ObjectKind`] that produced it, so accessors know which key element
//! (`name` vs `id`) to read from the object's `resData` schema.  Wrappers
//! expose structured accessors and never mutate the raw response; callers
//! needing the full document drop down to [`TypedResponse::raw`].

use crate::object::ObjectKind;
use crate::response::RawResponse;
use crate::xml::Element;

/// Surface shared by every verb-specific wrapper.
pub trait TypedResponse {
    /// The raw response this wrapper was built from.
    fn raw(&self) -> &RawResponse;

    /// The object kind the originating command addressed.
    fn object(&self) -> ObjectKind;

    /// Result code of the first result entry.
    fn code(&self) -> u16 {
        self.raw().code()
    }

    /// Human-readable message of the first result entry.
    fn message(&self) -> &str {
        self.raw().message()
    }

    fn is_success(&self) -> bool {
        self.raw().is_success()
    }
}

macro_rules! typed_response {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name {
            object: ObjectKind,
            raw: RawResponse,
        }

        impl $name {
            pub(crate) fn new(object: ObjectKind, raw: RawResponse) -> Self {
                Self { object, raw }
            }
        }

        impl TypedResponse for $name {
            fn raw(&self) -> &RawResponse {
                &self.raw
            }

            fn object(&self) -> ObjectKind {
                self.object
            }
        }
    };
}

typed_response!(
    /// Response to a `<check>` command.
    CheckResponse
);
typed_response!(
    /// Response to a `<create>` command.
    CreateResponse
);
typed_response!(
    /// Response to a `<delete>` command.  Carries no `resData`; the result
    /// code is the whole story.
    DeleteResponse
);
typed_response!(
    /// Response to an `<info>` command.
    InfoResponse
);
typed_response!(
    /// Response to a `<renew>` command.
    RenewResponse
);
typed_response!(
    /// Response to a `<transfer>` command (any sub-operation).
    TransferResponse
);
typed_response!(
    /// Response to an `<update>` command.  Carries no `resData`.
    UpdateResponse
);

// ── Check ─────────────────────────────────────────────────────────────────────

/// Availability of one object from a check response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckItem {
    /// Domain or host name, or contact id.
    pub key: String,
    pub available: bool,
    /// Registry-supplied reason when the object is unavailable.
    pub reason: Option<String>,
}

impl CheckResponse {
    /// All `<cd>` entries from the object's `chkData`.
    pub fn items(&self) -> Vec<CheckItem> {
        let Some(res_data) = &self.raw.res_data else {
            return Vec::new();
        };
        res_data
            .find_all("cd")
            .into_iter()
            .filter_map(|cd| self.item_from_cd(cd))
            .collect()
    }

    /// Availability of one object by its key, if it appeared in the reply.
    pub fn is_available(&self, key: &str) -> Option<bool> {
        self.items()
            .into_iter()
            .find(|item| item.key == key)
            .map(|item| item.available)
    }

    fn item_from_cd(&self, cd: &Element) -> Option<CheckItem> {
        let key_el = cd.find(self.object.key_element())?;
        let available = matches!(key_el.attribute("avail"), Some("1") | Some("true"));
        Some(CheckItem {
            key: key_el.content().unwrap_or_default().to_string(),
            available,
            reason: cd.find_text("reason").map(str::to_string),
        })
    }
}

// ── Create ────────────────────────────────────────────────────────────────────

impl CreateResponse {
    /// Key of the created object from `creData`.
    pub fn key(&self) -> Option<&str> {
        self.res_text(self.object.key_element())
    }

    /// Creation timestamp (`crDate`), verbatim.
    pub fn created(&self) -> Option<&str> {
        self.res_text("crDate")
    }

    /// Expiry timestamp (`exDate`), present for domains.
    pub fn expires(&self) -> Option<&str> {
        self.res_text("exDate")
    }

    fn res_text(&self, local: &str) -> Option<&str> {
        self.raw.res_data.as_ref().and_then(|d| d.find_text(local))
    }
}

// ── Info ──────────────────────────────────────────────────────────────────────

impl InfoResponse {
    /// Key of the described object from `infData`.
    pub fn key(&self) -> Option<&str> {
        self.field(self.object.key_element())
    }

    /// Repository object identifier.
    pub fn roid(&self) -> Option<&str> {
        self.field("roid")
    }

    /// Status tokens from every `<status s="…">` entry.
    pub fn statuses(&self) -> Vec<&str> {
        let Some(res_data) = &self.raw.res_data else {
            return Vec::new();
        };
        res_data
            .find_all("status")
            .into_iter()
            .filter_map(|status| status.attribute("s"))
            .collect()
    }

    /// Text of an arbitrary `infData` field by local name, for fields this
    /// wrapper has no dedicated accessor for.
    pub fn field(&self, local: &str) -> Option<&str> {
        self.raw.res_data.as_ref().and_then(|d| d.find_text(local))
    }
}

// ── Renew ─────────────────────────────────────────────────────────────────────

impl RenewResponse {
    /// Key of the renewed object from `renData`.
    pub fn key(&self) -> Option<&str> {
        self.res_text(self.object.key_element())
    }

    /// New expiry timestamp (`exDate`), verbatim.
    pub fn expires(&self) -> Option<&str> {
        self.res_text("exDate")
    }

    fn res_text(&self, local: &str) -> Option<&str> {
        self.raw.res_data.as_ref().and_then(|d| d.find_text(local))
    }
}

// ── Transfer ──────────────────────────────────────────────────────────────────

impl TransferResponse {
    /// Key of the object under transfer from `trnData`.
    pub fn key(&self) -> Option<&str> {
        self.res_text(self.object.key_element())
    }

    /// Transfer state (`trStatus`), e.g. `pending` or `clientApproved`.
    pub fn status(&self) -> Option<&str> {
        self.res_text("trStatus")
    }

    /// Identifier of the registrar that requested the transfer.
    pub fn requested_by(&self) -> Option<&str> {
        self.res_text("reID")
    }

    /// Timestamp of the transfer request.
    pub fn requested_at(&self) -> Option<&str> {
        self.res_text("reDate")
    }

    /// Identifier of the registrar that must act on the request.
    pub fn acting_registrar(&self) -> Option<&str> {
        self.res_text("acID")
    }

    /// Deadline or timestamp of the acting registrar's decision.
    pub fn action_date(&self) -> Option<&str> {
        self.res_text("acDate")
    }

    /// Expiry after the transfer completes, present for domains.
    pub fn expires(&self) -> Option<&str> {
        self.res_text("exDate")
    }

    fn res_text(&self, local: &str) -> Option<&str> {
        self.raw.res_data.as_ref().and_then(|d| d.find_text(local))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
