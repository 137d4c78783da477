//! Integration tests for the full session flow.
//!
//! A scripted transport plays the registry: it serves a greeting on connect,
//! answers login/logout with configurable result codes, and answers business
//! commands with canned replies.  Everything above the transport — framing,
//! envelope codec, session scoping, verb dispatch — is the real thing.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use epp_client::{
    ClientOptions, Element, EppClient, Error, ObjectKind, Transport, TypedResponse,
};
use epp_proto::frame;

const GREETING_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?><epp xmlns="urn:ietf:params:xml:ns:epp-1.0"><greeting><svID>Scripted Registry</svID><svDate>2024-01-15T00:00:00.0Z</svDate><svcMenu><version>1.0</version><lang>en</lang><objURI>urn:ietf:params:xml:ns:domain-1.0</objURI><objURI>urn:ietf:params:xml:ns:contact-1.0</objURI><objURI>urn:ietf:params:xml:ns:host-1.0</objURI></svcMenu></greeting></epp>"#;

fn result_reply(code: u16, msg: &str) -> String {
    format!(
        r#"<epp xmlns="urn:ietf:params:xml:ns:epp-1.0"><response><result code="{code}"><msg>{msg}</msg></result><trID><clTRID>CL-1</clTRID><svTRID>SV-1</svTRID></trID></response></epp>"#
    )
}

fn domain_check_reply() -> String {
    r#"<epp xmlns="urn:ietf:params:xml:ns:epp-1.0"><response><result code="1000"><msg>Command completed successfully</msg></result><resData><domain:chkData xmlns:domain="urn:ietf:params:xml:ns:domain-1.0"><domain:cd><domain:name avail="1">example.test</domain:name></domain:cd></domain:chkData></resData><trID><clTRID>CL-2</clTRID><svTRID>SV-2</svTRID></trID></response></epp>"#.to_string()
}

fn poll_reply() -> String {
    r#"<epp xmlns="urn:ietf:params:xml:ns:epp-1.0"><response><result code="1301"><msg>Command completed successfully; ack to dequeue</msg></result><msgQ count="2" id="555"><msg>Pending transfer.</msg></msgQ><trID><svTRID>SV-3</svTRID></trID></response></epp>"#.to_string()
}

// ── Scripted transport ────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Registry {
    open: bool,
    opens: u32,
    closes: u32,
    incoming: Vec<u8>,
    replies: VecDeque<String>,
    requests: Vec<String>,
    login_code: u16,
    logout_code: u16,
}

impl Registry {
    fn login_count(&self) -> usize {
        self.requests.iter().filter(|r| r.contains("<login")).count()
    }

    fn logout_count(&self) -> usize {
        self.requests.iter().filter(|r| r.contains("<logout")).count()
    }
}

struct ScriptedTransport {
    registry: Arc<Mutex<Registry>>,
    framed: bool,
}

impl ScriptedTransport {
    fn with_replies(framed: bool, replies: Vec<String>) -> (Self, Arc<Mutex<Registry>>) {
        let registry = Arc::new(Mutex::new(Registry {
            replies: replies.into(),
            login_code: 1000,
            logout_code: 1500,
            ..Registry::default()
        }));
        (
            Self {
                registry: Arc::clone(&registry),
                framed,
            },
            registry,
        )
    }

    fn enqueue(&self, registry: &mut Registry, xml: &str) {
        if self.framed {
            registry.incoming.extend(frame::length_prefix(xml));
        } else {
            registry.incoming.extend(xml.as_bytes());
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn open(&mut self) -> io::Result<()> {
        let mut registry = self.registry.lock().expect("lock");
        registry.open = true;
        registry.opens += 1;
        self.enqueue(&mut registry, GREETING_XML);
        Ok(())
    }

    async fn close(&mut self) -> io::Result<()> {
        let mut registry = self.registry.lock().expect("lock");
        registry.open = false;
        registry.closes += 1;
        registry.incoming.clear();
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.registry.lock().expect("lock").open
    }

    async fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        let mut registry = self.registry.lock().expect("lock");
        let xml = if self.framed {
            String::from_utf8_lossy(&bytes[frame::HEADER_SIZE..]).into_owned()
        } else {
            String::from_utf8_lossy(bytes).into_owned()
        };
        registry.requests.push(xml.clone());
        let reply = if xml.contains("<hello") {
            GREETING_XML.to_string()
        } else if xml.contains("<login") {
            result_reply(registry.login_code, "login scripted")
        } else if xml.contains("<logout") {
            result_reply(registry.logout_code, "logout scripted")
        } else {
            registry
                .replies
                .pop_front()
                .unwrap_or_else(|| result_reply(1000, "Command completed successfully"))
        };
        self.enqueue(&mut registry, &reply);
        Ok(())
    }

    async fn read_exact(&mut self, len: usize) -> io::Result<Vec<u8>> {
        let mut registry = self.registry.lock().expect("lock");
        if registry.incoming.len() < len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "scripted registry has nothing more to say",
            ));
        }
        Ok(registry.incoming.drain(..len).collect())
    }

    async fn read_until(&mut self, delimiter: &[u8]) -> io::Result<Vec<u8>> {
        let mut registry = self.registry.lock().expect("lock");
        let pos = registry
            .incoming
            .windows(delimiter.len())
            .position(|window| window == delimiter)
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::UnexpectedEof, "no delimiter in script")
            })?;
        Ok(registry.incoming.drain(..pos + delimiter.len()).collect())
    }
}

fn scripted_client(
    options: ClientOptions,
    replies: Vec<String>,
) -> (EppClient, Arc<Mutex<Registry>>) {
    let (transport, registry) = ScriptedTransport::with_replies(!options.compatibility, replies);
    let client = EppClient::with_transport(
        "TEST-TAG",
        "secret",
        "epp.registry.test",
        options,
        Box::new(transport),
    )
    .expect("valid client");
    (client, registry)
}

// ── Round trip ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_domain_check_round_trip_with_canned_reply() {
    let (mut client, registry) =
        scripted_client(ClientOptions::default(), vec![domain_check_reply()]);

    let response = client
        .check(
            "domain",
            vec![Element::new("name").text("example.test")],
            None,
        )
        .await
        .expect("check succeeds");

    assert!(response.is_success());
    assert_eq!(response.object(), ObjectKind::Domain);
    assert_eq!(response.is_available("example.test"), Some(true));

    // The session recorded exactly the canned reply, verbatim.
    assert_eq!(
        client.last_response().map(|r| r.xml.as_str()),
        Some(domain_check_reply().as_str())
    );
    let last_request = client.last_request().expect("request recorded");
    assert!(last_request.contains("<domain:name>example.test</domain:name>"));

    // One socket, one login, one logout; everything torn down afterwards.
    let registry = registry.lock().expect("lock");
    assert_eq!(registry.opens, 1);
    assert_eq!(registry.closes, 1);
    assert_eq!(registry.login_count(), 1);
    assert_eq!(registry.logout_count(), 1);
    assert!(!registry.open);
}

#[tokio::test]
async fn test_every_verb_and_object_combination_dispatches_to_matching_schema() {
    for kind in ObjectKind::ALL {
        let token = kind.prefix();
        let key = Element::new(kind.key_element()).text("subject");

        let (mut client, registry) = scripted_client(ClientOptions::default(), Vec::new());

        let check = client.check(token, vec![key.clone()], None).await.expect("check");
        assert_eq!(check.object(), kind);
        let create = client.create(token, vec![key.clone()], None).await.expect("create");
        assert_eq!(create.object(), kind);
        let delete = client.delete(token, vec![key.clone()], None).await.expect("delete");
        assert_eq!(delete.object(), kind);
        let info = client.info(token, vec![key.clone()], None).await.expect("info");
        assert_eq!(info.object(), kind);
        let renew = client.renew(token, vec![key.clone()], None).await.expect("renew");
        assert_eq!(renew.object(), kind);
        let transfer = client
            .transfer("request", token, vec![key.clone()], None)
            .await
            .expect("transfer");
        assert_eq!(transfer.object(), kind);
        let update = client.update(token, vec![key], None).await.expect("update");
        assert_eq!(update.object(), kind);

        // Each business request addressed the object's own schema element.
        let registry = registry.lock().expect("lock");
        for verb in ["check", "create", "delete", "info", "renew", "transfer", "update"] {
            assert!(
                registry
                    .requests
                    .iter()
                    .any(|r| r.contains(&format!("<{token}:{verb}"))),
                "{token} {verb} request must carry <{token}:{verb}>"
            );
        }
    }
}

// ── Scope lifecycle ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_each_top_level_command_opens_a_fresh_session() {
    let (mut client, registry) = scripted_client(ClientOptions::default(), Vec::new());

    client.poll().await.expect("first poll");
    client.poll().await.expect("second poll");

    let registry = registry.lock().expect("lock");
    assert_eq!(registry.opens, 2, "each command dials its own connection");
    assert_eq!(registry.closes, 2);
    assert_eq!(registry.login_count(), 2, "each scope logs in again");
    assert_eq!(registry.logout_count(), 2);
}

#[tokio::test]
async fn test_session_block_shares_one_socket_and_one_login() {
    let (mut client, registry) =
        scripted_client(ClientOptions::default(), vec![domain_check_reply()]);

    let available = client
        .session(|client| {
            Box::pin(async move {
                let check = client
                    .check(
                        "domain",
                        vec![Element::new("name").text("example.test")],
                        None,
                    )
                    .await?;
                client.poll().await?;
                Ok(check.is_available("example.test"))
            })
        })
        .await
        .expect("session succeeds");

    assert_eq!(available, Some(true));

    let registry = registry.lock().expect("lock");
    assert_eq!(registry.opens, 1, "nested commands reuse the open socket");
    assert_eq!(registry.closes, 1);
    assert_eq!(registry.login_count(), 1, "nested commands reuse the login");
    assert_eq!(registry.logout_count(), 1);
    assert!(!registry.open, "socket released when the block ends");
}

#[tokio::test]
async fn test_hello_exchange_updates_greeting_and_closes_its_scope() {
    let (mut client, registry) = scripted_client(ClientOptions::default(), Vec::new());
    assert!(client.greeting().is_none());

    let greeting = client.hello().await.expect("hello");

    assert_eq!(greeting.server_id, "Scripted Registry");
    assert_eq!(
        client.greeting().map(|g| g.server_id.as_str()),
        Some("Scripted Registry")
    );
    assert!(greeting.supports("urn:ietf:params:xml:ns:host-1.0"));

    let registry = registry.lock().expect("lock");
    assert_eq!(registry.opens, 1);
    assert_eq!(registry.closes, 1);
    assert_eq!(registry.login_count(), 0, "hello needs no login");
}

#[tokio::test]
async fn test_last_pair_reflects_the_business_command_not_the_session_frames() {
    let (mut client, _registry) = scripted_client(ClientOptions::default(), vec![poll_reply()]);

    let response = client.poll().await.expect("poll");

    let queue = response.message_queue.expect("msgQ");
    assert_eq!(queue.count, 2);
    assert_eq!(queue.id, "555");

    // Login and logout both happened inside the same call, but the recorded
    // pair is the poll exchange.
    let last_request = client.last_request().expect("recorded");
    assert!(last_request.contains(r#"<poll op="req"/>"#));
    assert!(!last_request.contains("<login"));
    assert_eq!(client.last_response().map(|r| r.code()), Some(1301));
}

// ── Failure paths ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_rejection_surfaces_and_still_closes_the_socket() {
    let (mut client, registry) = scripted_client(ClientOptions::default(), Vec::new());
    registry.lock().expect("lock").login_code = 2200;

    let err = client.poll().await.expect_err("login must fail");

    assert!(matches!(err, Error::Login { code: 2200, .. }));
    assert_eq!(client.last_error().map(|e| e.code), Some(2200));

    {
        let registry = registry.lock().expect("lock");
        assert_eq!(registry.closes, registry.opens, "no socket leaked");
        assert_eq!(registry.logout_count(), 0, "no logout after failed login");
        assert!(!registry.open);
    }

    // Once the registry accepts logins again, the same client works: no
    // stale session state survived the failure.
    registry.lock().expect("lock").login_code = 1000;
    let response = client.poll().await.expect("poll after recovery");
    assert!(response.is_success());
}

#[tokio::test]
async fn test_unsupported_type_and_bad_op_never_touch_the_network() {
    let (mut client, registry) = scripted_client(ClientOptions::default(), Vec::new());

    let unsupported = client.check("widget", Vec::new(), None).await;
    assert!(matches!(unsupported, Err(Error::UnsupportedType(_))));

    let bad_op = client.transfer("steal", "domain", Vec::new(), None).await;
    assert!(matches!(bad_op, Err(Error::InvalidOperation(_))));

    let empty_ack = client.ack("").await;
    assert!(matches!(empty_ack, Err(Error::InvalidOperation(_))));

    let registry = registry.lock().expect("lock");
    assert_eq!(registry.opens, 0, "validation failures must not dial");
    assert!(registry.requests.is_empty());
}

#[tokio::test]
async fn test_ack_encodes_exactly_the_given_message_id() {
    let (mut client, registry) = scripted_client(ClientOptions::default(), Vec::new());

    client.ack("555").await.expect("ack");

    let registry = registry.lock().expect("lock");
    let ack_request = registry
        .requests
        .iter()
        .find(|r| r.contains("<poll"))
        .expect("ack request sent");
    assert!(ack_request.contains(r#"<poll op="ack" msgID="555"/>"#));
}

// ── Compatibility variant ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_compatibility_client_completes_a_session_over_bare_frames() {
    let options = ClientOptions {
        compatibility: true,
        ..ClientOptions::default()
    };
    let (mut client, registry) = scripted_client(options, vec![domain_check_reply()]);

    assert!(client.is_compatibility());

    let response = client
        .check(
            "domain",
            vec![Element::new("name").text("example.test")],
            None,
        )
        .await
        .expect("check over legacy framing");

    assert_eq!(response.is_available("example.test"), Some(true));

    let registry = registry.lock().expect("lock");
    assert_eq!(registry.opens, 1);
    assert_eq!(registry.login_count(), 1);
    // Legacy frames carry the document directly; the recorded request text
    // is the whole write, declaration first.
    assert!(registry.requests[0].starts_with("<?xml"));
}
