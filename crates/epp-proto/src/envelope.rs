//! EPP envelope rendering and reply parsing.
//!
//! Requests are built as [`Element`] trees and rendered with the standard
//! XML declaration.  Replies are parsed into either a [`Greeting`] or a
//! [`RawResponse`]; which one a session expects depends on what it just sent,
//! so the distinction is surfaced as the [`Reply`] enum and enforced by the
//! caller.

use quick_xml::events::{BytesDecl, Event};
use quick_xml::Writer;

use crate::command::{Command, LoginCommand, Verb};
use crate::error::ProtocolError;
use crate::response::{Greeting, MessageQueue, RawResponse, ResultData};
use crate::xml::{self, Element};

/// Namespace URN of the EPP envelope itself (RFC 5730).
pub const EPP_XMLNS: &str = "urn:ietf:params:xml:ns:epp-1.0";

/// One parsed server reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Greeting(Greeting),
    Response(RawResponse),
}

// ── Rendering ─────────────────────────────────────────────────────────────────

fn render_document(body: Element) -> Result<String, ProtocolError> {
    let envelope = Element::new("epp").attr("xmlns", EPP_XMLNS).child(body);

    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("no"))))
        .map_err(|e| ProtocolError::MalformedXml(e.to_string()))?;
    envelope.write_into(&mut writer)?;
    String::from_utf8(writer.into_inner()).map_err(|e| ProtocolError::InvalidEncoding(e.to_string()))
}

/// Renders a `<hello/>` frame requesting a fresh greeting.
pub fn hello() -> Result<String, ProtocolError> {
    render_document(Element::new("hello"))
}

/// Renders the `<login>` command for the configured credentials and
/// advertised service/extension URNs.
pub fn login(login: &LoginCommand, cl_trid: &str) -> Result<String, ProtocolError> {
    let mut svcs = Element::new("svcs").children(
        login
            .services
            .iter()
            .map(|urn| Element::new("objURI").text(urn)),
    );
    if !login.extensions.is_empty() {
        svcs = svcs.child(
            Element::new("svcExtension").children(
                login
                    .extensions
                    .iter()
                    .map(|urn| Element::new("extURI").text(urn)),
            ),
        );
    }

    let body = Element::new("login")
        .child(Element::new("clID").text(&login.client_id))
        .child(Element::new("pw").text(&login.password))
        .child(
            Element::new("options")
                .child(Element::new("version").text(&login.version))
                .child(Element::new("lang").text(&login.language)),
        )
        .child(svcs);

    render_document(command_wrapper(body, None, cl_trid))
}

/// Renders the `<logout/>` command.
pub fn logout(cl_trid: &str) -> Result<String, ProtocolError> {
    render_document(command_wrapper(Element::new("logout"), None, cl_trid))
}

/// Renders one business command.
///
/// Object-addressed verbs wrap their payload in an object-qualified element
/// carrying the schema namespace, e.g.
/// `<check><domain:check xmlns:domain="…"><domain:name>…</domain:name></domain:check></check>`.
/// Poll commands carry only the `op` (and `msgID`) attributes.
///
/// # Errors
///
/// Returns [`ProtocolError::MissingElement`] if an object-addressed verb is
/// rendered without an object kind; the [`Command`] constructors make that
/// unrepresentable from outside this crate.
pub fn command(
    command: &Command,
    extension: Option<&Element>,
    cl_trid: &str,
) -> Result<String, ProtocolError> {
    let verb_el = match command.verb() {
        Verb::Poll => match command.message_id() {
            Some(id) => Element::new("poll").attr("op", "ack").attr("msgID", id),
            None => Element::new("poll").attr("op", "req"),
        },
        verb => {
            let object = command
                .object()
                .ok_or(ProtocolError::MissingElement("object"))?;
            let prefix = object.prefix();
            let object_el = Element::new(format!("{prefix}:{}", verb.tag()))
                .attr(format!("xmlns:{prefix}"), object.xmlns())
                .children(command.payload().iter().map(|el| el.qualified(prefix)));

            let mut verb_el = Element::new(verb.tag());
            if let Some(op) = command.transfer_op() {
                verb_el = verb_el.attr("op", op.token());
            }
            verb_el.child(object_el)
        }
    };

    render_document(command_wrapper(verb_el, extension, cl_trid))
}

fn command_wrapper(verb_el: Element, extension: Option<&Element>, cl_trid: &str) -> Element {
    let mut command_el = Element::new("command").child(verb_el);
    if let Some(extension) = extension {
        command_el = command_el.child(Element::new("extension").child(extension.clone()));
    }
    command_el.child(Element::new("clTRID").text(cl_trid))
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parses one reply document into a [`Reply`].
///
/// # Errors
///
/// Returns [`ProtocolError`] when the document is not well-formed XML, is not
/// an `<epp>` envelope, or contains neither a greeting nor a response with at
/// least one `<result>`.
pub fn parse_reply(reply_xml: &str) -> Result<Reply, ProtocolError> {
    let root = xml::parse(reply_xml)?;
    if root.local_name() != "epp" {
        return Err(ProtocolError::MissingElement("epp"));
    }

    if let Some(greeting) = root.find("greeting") {
        return Ok(Reply::Greeting(parse_greeting(greeting)));
    }
    if let Some(response) = root.find("response") {
        return Ok(Reply::Response(parse_response(response, reply_xml)?));
    }
    Err(ProtocolError::MissingElement("response"))
}

fn parse_greeting(greeting: &Element) -> Greeting {
    let mut parsed = Greeting {
        server_id: greeting.find_text("svID").unwrap_or_default().to_string(),
        server_date: greeting.find_text("svDate").unwrap_or_default().to_string(),
        ..Greeting::default()
    };

    // The service menu is optional in practice: legacy servers omit it.
    if let Some(menu) = greeting.find("svcMenu") {
        let texts = |local: &str| -> Vec<String> {
            menu.find_all(local)
                .into_iter()
                .filter_map(Element::content)
                .map(str::to_string)
                .collect()
        };
        parsed.versions = texts("version");
        parsed.languages = texts("lang");
        parsed.objects = texts("objURI");
        parsed.extensions = texts("extURI");
    }
    parsed
}

fn parse_response(response: &Element, reply_xml: &str) -> Result<RawResponse, ProtocolError> {
    // Only direct children of <response> are result entries; a descendant
    // search would also pick up anything nested inside resData.
    let mut results = Vec::new();
    for child in response.child_elements() {
        if child.local_name() == "result" {
            results.push(parse_result(child)?);
        }
    }
    if results.is_empty() {
        return Err(ProtocolError::MissingElement("result"));
    }

    let message_queue = response
        .child_elements()
        .iter()
        .find(|child| child.local_name() == "msgQ")
        .map(parse_message_queue)
        .transpose()?;

    let transaction = response.find("trID");
    let transaction_text = |local: &str| -> Option<String> {
        transaction
            .and_then(|tr| tr.find_text(local))
            .map(str::to_string)
    };

    Ok(RawResponse {
        results,
        message_queue,
        res_data: response
            .child_elements()
            .iter()
            .find(|child| child.local_name() == "resData")
            .cloned(),
        extension: response
            .child_elements()
            .iter()
            .find(|child| child.local_name() == "extension")
            .cloned(),
        client_transaction_id: transaction_text("clTRID"),
        server_transaction_id: transaction_text("svTRID"),
        xml: reply_xml.to_string(),
    })
}

fn parse_result(result: &Element) -> Result<ResultData, ProtocolError> {
    let code = result
        .attribute("code")
        .ok_or(ProtocolError::InvalidAttribute {
            element: "result",
            attribute: "code",
            detail: "attribute is missing".into(),
        })?;
    let code = code.parse::<u16>().map_err(|e| ProtocolError::InvalidAttribute {
        element: "result",
        attribute: "code",
        detail: e.to_string(),
    })?;

    Ok(ResultData {
        code,
        message: result.find_text("msg").unwrap_or_default().to_string(),
        reason: result
            .find("extValue")
            .and_then(|ext| ext.find_text("reason"))
            .map(str::to_string),
    })
}

fn parse_message_queue(msg_q: &Element) -> Result<MessageQueue, ProtocolError> {
    let count = msg_q
        .attribute("count")
        .ok_or(ProtocolError::InvalidAttribute {
            element: "msgQ",
            attribute: "count",
            detail: "attribute is missing".into(),
        })?
        .parse::<u64>()
        .map_err(|e| ProtocolError::InvalidAttribute {
            element: "msgQ",
            attribute: "count",
            detail: e.to_string(),
        })?;

    Ok(MessageQueue {
        count,
        id: msg_q.attribute("id").unwrap_or_default().to_string(),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
