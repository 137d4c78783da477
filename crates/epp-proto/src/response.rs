//! Raw response and greeting models.
//!
//! A [`RawResponse`] is the structured form of one `<response>` document as
//! received from the registry, before any verb- or object-specific wrapping.
//! The session layer keeps the most recent one for inspection; typed wrappers
//! (see [`crate::typed`]) each take ownership of one and never mutate it.

use crate::xml::Element;

// ── Result codes ──────────────────────────────────────────────────────────────

/// Command completed successfully.
pub const RESULT_SUCCESS: u16 = 1000;
/// Command completed successfully; action pending.
pub const RESULT_SUCCESS_PENDING: u16 = 1001;
/// Command completed successfully; no messages queued.
pub const RESULT_SUCCESS_NO_MESSAGES: u16 = 1300;
/// Command completed successfully; ack to dequeue.
pub const RESULT_SUCCESS_ACK_TO_DEQUEUE: u16 = 1301;
/// Command completed successfully; ending session.
pub const RESULT_SUCCESS_ENDING_SESSION: u16 = 1500;
/// Authentication error.
pub const RESULT_AUTH_ERROR: u16 = 2200;

/// One `<result>` entry: code, human-readable message, and the optional
/// extended reason the registry may attach under `<extValue>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultData {
    /// Four-digit RFC 5730 result code.  Zero is used by the session layer
    /// for locally-detected logout failures that never reached the registry.
    pub code: u16,
    pub message: String,
    pub reason: Option<String>,
}

impl ResultData {
    /// RFC 5730: the 1xxx range reports success, 2xxx reports failure.
    pub fn is_success(&self) -> bool {
        (1000..2000).contains(&self.code)
    }
}

/// Poll queue metadata from `<msgQ>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageQueue {
    /// Number of messages waiting on the server.
    pub count: u64,
    /// Identifier of the message at the head of the queue.
    pub id: String,
}

// ── Raw response ──────────────────────────────────────────────────────────────

/// The structured form of one EPP `<response>` document.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    /// Every `<result>` entry, in document order.  The parser guarantees at
    /// least one.
    pub results: Vec<ResultData>,
    /// Poll queue metadata, when the server reported any.
    pub message_queue: Option<MessageQueue>,
    /// The `<resData>` element, when present.
    pub res_data: Option<Element>,
    /// The `<extension>` element, when present.  Passed through opaquely.
    pub extension: Option<Element>,
    /// Client transaction id echoed from the request.
    pub client_transaction_id: Option<String>,
    /// Server-assigned transaction id.
    pub server_transaction_id: Option<String>,
    /// The response document exactly as received.
    pub xml: String,
}

impl RawResponse {
    /// Code of the first result entry.
    pub fn code(&self) -> u16 {
        self.results.first().map_or(0, |r| r.code)
    }

    /// Message of the first result entry.
    pub fn message(&self) -> &str {
        self.results.first().map_or("", |r| r.message.as_str())
    }

    /// True when every result entry reports success.
    pub fn is_success(&self) -> bool {
        !self.results.is_empty() && self.results.iter().all(ResultData::is_success)
    }
}

// ── Greeting ──────────────────────────────────────────────────────────────────

/// The server greeting: identity plus the advertised service menu.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Greeting {
    pub server_id: String,
    /// Server timestamp, verbatim from `<svDate>`.
    pub server_date: String,
    /// Protocol versions the server offers.
    pub versions: Vec<String>,
    /// Text languages the server offers.
    pub languages: Vec<String>,
    /// Object namespace URNs the server supports.
    pub objects: Vec<String>,
    /// Extension namespace URNs the server supports.
    pub extensions: Vec<String>,
}

impl Greeting {
    /// Whether the server advertises the given object or extension URN.
    pub fn supports(&self, urn: &str) -> bool {
        self.objects.iter().any(|u| u == urn) || self.extensions.iter().any(|u| u == urn)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn response_with_codes(codes: &[u16]) -> RawResponse {
        RawResponse {
            results: codes
                .iter()
                .map(|&code| ResultData {
                    code,
                    message: format!("result {code}"),
                    reason: None,
                })
                .collect(),
            message_queue: None,
            res_data: None,
            extension: None,
            client_transaction_id: None,
            server_transaction_id: None,
            xml: String::new(),
        }
    }

    #[test]
    fn test_result_success_range_is_1xxx() {
        for code in [RESULT_SUCCESS, RESULT_SUCCESS_PENDING, RESULT_SUCCESS_ENDING_SESSION] {
            let result = ResultData {
                code,
                message: String::new(),
                reason: None,
            };
            assert!(result.is_success(), "code {code} must be success");
        }
        let failed = ResultData {
            code: RESULT_AUTH_ERROR,
            message: String::new(),
            reason: None,
        };
        assert!(!failed.is_success());
    }

    #[test]
    fn test_response_code_and_message_come_from_first_result() {
        let response = response_with_codes(&[1000, 2303]);

        assert_eq!(response.code(), 1000);
        assert_eq!(response.message(), "result 1000");
    }

    #[test]
    fn test_response_is_success_requires_all_results_successful() {
        assert!(response_with_codes(&[1000]).is_success());
        assert!(!response_with_codes(&[1000, 2303]).is_success());
        assert!(!response_with_codes(&[]).is_success());
    }

    #[test]
    fn test_greeting_supports_matches_objects_and_extensions() {
        let greeting = Greeting {
            objects: vec!["urn:ietf:params:xml:ns:domain-1.0".into()],
            extensions: vec!["urn:ietf:params:xml:ns:secDNS-1.1".into()],
            ..Greeting::default()
        };

        assert!(greeting.supports("urn:ietf:params:xml:ns:domain-1.0"));
        assert!(greeting.supports("urn:ietf:params:xml:ns:secDNS-1.1"));
        assert!(!greeting.supports("urn:ietf:params:xml:ns:host-1.0"));
    }
}
