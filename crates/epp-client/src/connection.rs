//! Protocol-variant connections and the session state they own.
//!
//! Both variants run the same session logic — connect, read the server
//! greeting, log in once per connection scope, exchange commands, log out,
//! disconnect — and differ only in wire framing:
//!
//! - [`StandardConnection`] speaks RFC 5734 length-prefixed frames.
//! - [`CompatConnection`] speaks the legacy discipline: bare XML documents
//!   terminated by the closing `</epp>` tag.
//!
//! The shared logic lives in [`Session`], generic over a [`Framer`]; the two
//! aliases are the two implementing types behind the [`ProtocolConnection`]
//! capability trait.  Exactly one of them is constructed per client and it
//! never changes for the client's lifetime.
//!
//! Scopes are depth-counted rather than block-structured: the facade calls
//! `open_scope`/`close_scope` (and `begin_login`/`end_login`) in pairs on
//! every path out of a command, and nested pairs on the same call stack
//! become no-ops.  That is what lets a command issued inside a wider session
//! scope reuse the one open socket and the one login.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};
use uuid::Uuid;

use epp_proto::{envelope, frame, Command, Element, Greeting, RawResponse, Reply, ResultData};

use crate::config::SessionConfig;
use crate::error::Error;
use crate::transport::Transport;

// ── Session state ─────────────────────────────────────────────────────────────

/// The only mutable state in the system, owned exclusively by the active
/// connection.
///
/// Scope bookkeeping (open flag, depths, login flag) resets when the
/// outermost connection scope closes.  The inspection fields —
/// `last_request`, `last_response`, `last_error`, `greeting` — survive the
/// close so callers can examine the completed exchange afterwards.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    open: bool,
    scope_depth: u32,
    login_depth: u32,
    logged_in: bool,
    last_request: Option<String>,
    last_response: Option<RawResponse>,
    last_error: Option<ResultData>,
    greeting: Option<Greeting>,
}

impl SessionState {
    /// XML of the most recent business request, verbatim.
    pub fn last_request(&self) -> Option<&str> {
        self.last_request.as_deref()
    }

    /// The most recent business response.
    pub fn last_response(&self) -> Option<&RawResponse> {
        self.last_response.as_ref()
    }

    /// The most recent login/logout failure.  A code of zero marks a local
    /// failure that never produced a registry result.
    pub fn last_error(&self) -> Option<&ResultData> {
        self.last_error.as_ref()
    }

    /// The most recently received server greeting.
    pub fn greeting(&self) -> Option<&Greeting> {
        self.greeting.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    fn reset_scope(&mut self) {
        self.open = false;
        self.scope_depth = 0;
        self.login_depth = 0;
        self.logged_in = false;
    }
}

// ── Framing variants ──────────────────────────────────────────────────────────

/// Wire framing discipline; the single point where the two protocol variants
/// differ.
#[async_trait]
pub trait Framer: Send + Sync {
    async fn write_frame(&self, transport: &mut dyn Transport, xml: &str) -> Result<(), Error>;

    async fn read_frame(&self, transport: &mut dyn Transport) -> Result<String, Error>;
}

/// RFC 5734 framing: 4-byte big-endian total length before each document.
#[derive(Debug, Clone, Copy, Default)]
pub struct LengthPrefixed;

#[async_trait]
impl Framer for LengthPrefixed {
    async fn write_frame(&self, transport: &mut dyn Transport, xml: &str) -> Result<(), Error> {
        transport.write_all(&frame::length_prefix(xml)).await?;
        Ok(())
    }

    async fn read_frame(&self, transport: &mut dyn Transport) -> Result<String, Error> {
        let header = transport.read_exact(frame::HEADER_SIZE).await?;
        let len = frame::declared_len(&header)?;
        let payload = transport.read_exact(len).await?;
        Ok(frame::decode_payload(payload)?)
    }
}

/// Legacy framing: bare documents, reads scan for the closing `</epp>` tag.
#[derive(Debug, Clone, Copy, Default)]
pub struct CloseDelimited;

#[async_trait]
impl Framer for CloseDelimited {
    async fn write_frame(&self, transport: &mut dyn Transport, xml: &str) -> Result<(), Error> {
        transport.write_all(xml.as_bytes()).await?;
        Ok(())
    }

    async fn read_frame(&self, transport: &mut dyn Transport) -> Result<String, Error> {
        let bytes = transport.read_until(frame::CLOSE_DELIMITER).await?;
        Ok(frame::decode_payload(bytes)?)
    }
}

// ── Capability trait ──────────────────────────────────────────────────────────

/// The capability set shared by both protocol variants.
///
/// `open_scope`/`close_scope` and `begin_login`/`end_login` are called in
/// pairs by the facade; nested pairs on the same call stack are no-ops.
/// `close_scope` and `end_login` never fail — teardown problems are recorded
/// in session state rather than allowed to mask a command result.
#[async_trait]
pub trait ProtocolConnection: Send {
    /// Enters a connection scope: on first entry, opens the transport and
    /// reads the server greeting.
    async fn open_scope(&mut self) -> Result<(), Error>;

    /// Leaves a connection scope: on outermost exit, closes the transport
    /// and resets the scope state.
    async fn close_scope(&mut self);

    /// Enters a login scope: on first entry within the connection scope,
    /// performs the login exchange.  A rejection records `last_error` and
    /// fails with [`Error::Login`]; no logout is attempted afterwards.
    async fn begin_login(&mut self) -> Result<(), Error>;

    /// Leaves a login scope: on outermost exit, performs the logout
    /// exchange.  Failures are recorded in `last_error` only.
    async fn end_login(&mut self);

    /// Sends one business command and returns the parsed response, recording
    /// the request/response pair in session state.
    async fn request(
        &mut self,
        command: &Command,
        extension: Option<&Element>,
    ) -> Result<RawResponse, Error>;

    /// Sends `<hello/>` and stores the refreshed greeting.
    async fn hello(&mut self) -> Result<Greeting, Error>;

    fn state(&self) -> &SessionState;

    /// True for the legacy protocol variant.
    fn is_compatibility(&self) -> bool;
}

// ── Shared session logic ──────────────────────────────────────────────────────

/// Connection logic shared by both variants, generic over the framing
/// discipline.
pub struct Session<F: Framer> {
    config: Arc<SessionConfig>,
    framer: F,
    transport: Box<dyn Transport>,
    state: SessionState,
}

/// The current-protocol connection.
pub type StandardConnection = Session<LengthPrefixed>;
/// The legacy-protocol connection.
pub type CompatConnection = Session<CloseDelimited>;

impl<F: Framer + Default> Session<F> {
    pub fn new(config: Arc<SessionConfig>, transport: Box<dyn Transport>) -> Self {
        Self {
            config,
            framer: F::default(),
            transport,
            state: SessionState::default(),
        }
    }
}

impl<F: Framer> Session<F> {
    fn next_transaction_id(&self) -> String {
        format!("{}-{}", self.config.tag, Uuid::new_v4())
    }

    async fn exchange(&mut self, xml: &str) -> Result<Reply, Error> {
        self.framer.write_frame(self.transport.as_mut(), xml).await?;
        let reply_xml = self.framer.read_frame(self.transport.as_mut()).await?;
        Ok(envelope::parse_reply(&reply_xml)?)
    }

    async fn expect_response(&mut self, xml: &str) -> Result<RawResponse, Error> {
        match self.exchange(xml).await? {
            Reply::Response(response) => Ok(response),
            Reply::Greeting(_) => Err(epp_proto::ProtocolError::UnexpectedFrame {
                expected: "response",
                received: "greeting",
            }
            .into()),
        }
    }

    async fn read_greeting(&mut self) -> Result<Greeting, Error> {
        let reply_xml = self.framer.read_frame(self.transport.as_mut()).await?;
        match envelope::parse_reply(&reply_xml)? {
            Reply::Greeting(greeting) => Ok(greeting),
            Reply::Response(_) => Err(epp_proto::ProtocolError::UnexpectedFrame {
                expected: "greeting",
                received: "response",
            }
            .into()),
        }
    }

    async fn send_logout(&mut self) -> Result<RawResponse, Error> {
        let xml = envelope::logout(&self.next_transaction_id())?;
        self.expect_response(&xml).await
    }
}

#[async_trait]
impl<F: Framer> ProtocolConnection for Session<F> {
    async fn open_scope(&mut self) -> Result<(), Error> {
        if self.state.scope_depth > 0 {
            self.state.scope_depth += 1;
            return Ok(());
        }

        debug!(host = %self.config.host, port = self.config.options.port, "opening connection");
        self.transport.open().await?;
        match self.read_greeting().await {
            Ok(greeting) => {
                debug!(server = %greeting.server_id, "greeting received");
                self.state.greeting = Some(greeting);
                self.state.open = true;
                self.state.scope_depth = 1;
                Ok(())
            }
            Err(e) => {
                // The scope never became usable; make sure no half-open
                // socket survives into the next attempt.
                if let Err(close_err) = self.transport.close().await {
                    debug!("close after failed greeting also failed: {close_err}");
                }
                Err(e)
            }
        }
    }

    async fn close_scope(&mut self) {
        match self.state.scope_depth {
            0 => (),
            1 => {
                if let Err(e) = self.transport.close().await {
                    debug!("error closing transport: {e}");
                }
                self.state.reset_scope();
                debug!("connection closed");
            }
            _ => self.state.scope_depth -= 1,
        }
    }

    async fn begin_login(&mut self) -> Result<(), Error> {
        if self.state.logged_in {
            self.state.login_depth += 1;
            return Ok(());
        }

        let xml = envelope::login(&self.config.login_command(), &self.next_transaction_id())?;
        let response = self.expect_response(&xml).await?;
        if !response.is_success() {
            warn!(code = response.code(), "login rejected");
            self.state.last_error = response.results.first().cloned();
            return Err(Error::Login {
                code: response.code(),
                message: response.message().to_string(),
            });
        }

        info!(tag = %self.config.tag, "logged in");
        self.state.logged_in = true;
        self.state.login_depth = 1;
        Ok(())
    }

    async fn end_login(&mut self) {
        if !self.state.logged_in {
            return;
        }
        if self.state.login_depth > 1 {
            self.state.login_depth -= 1;
            return;
        }

        match self.send_logout().await {
            Ok(response) if response.is_success() => debug!("logged out"),
            Ok(response) => {
                warn!(code = response.code(), "logout rejected");
                self.state.last_error = response.results.first().cloned();
            }
            Err(e) => {
                warn!("logout failed: {e}");
                self.state.last_error = Some(ResultData {
                    code: 0,
                    message: e.to_string(),
                    reason: None,
                });
            }
        }
        self.state.logged_in = false;
        self.state.login_depth = 0;
    }

    async fn request(
        &mut self,
        command: &Command,
        extension: Option<&Element>,
    ) -> Result<RawResponse, Error> {
        let xml = envelope::command(command, extension, &self.next_transaction_id())?;
        debug!(verb = %command.verb(), "sending command");
        // Recorded before the send so a failed exchange still shows what was
        // attempted.
        self.state.last_request = Some(xml.clone());
        let response = self.expect_response(&xml).await?;
        self.state.last_response = Some(response.clone());
        Ok(response)
    }

    async fn hello(&mut self) -> Result<Greeting, Error> {
        let xml = envelope::hello()?;
        self.framer.write_frame(self.transport.as_mut(), &xml).await?;
        let greeting = self.read_greeting().await?;
        self.state.greeting = Some(greeting.clone());
        Ok(greeting)
    }

    fn state(&self) -> &SessionState {
        &self.state
    }

    fn is_compatibility(&self) -> bool {
        self.config.options.compatibility
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
