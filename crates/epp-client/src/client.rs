//! The session facade.
//!
//! [`EppClient`] is the single entry point callers use.  It owns the frozen
//! [`SessionConfig`] and exactly one protocol-variant connection, selected
//! when the client is constructed and never changed afterwards.  Every verb
//! method runs through the same internal path: enter a connection scope,
//! enter a login scope, send the command, and leave both scopes on every
//! exit — callers never manage login/logout themselves and can never leak an
//! open socket.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use epp_proto::{
    CheckResponse, Command, CreateResponse, DeleteResponse, Element, Greeting, InfoResponse,
    ObjectKind, RawResponse, RenewResponse, ResultData, TransferOp, TransferResponse,
    UpdateResponse,
};

use crate::config::{ClientOptions, SessionConfig};
use crate::connection::{CompatConnection, ProtocolConnection, StandardConnection};
use crate::error::Error;
use crate::transport::{TcpTransport, Transport};

/// Boxed future returned by [`EppClient::session`] bodies.
pub type SessionFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, Error>> + Send + 'a>>;

/// A session-managed EPP client.
///
/// ```no_run
/// use epp_client::{ClientOptions, Element, EppClient};
///
/// # async fn example() -> Result<(), epp_client::Error> {
/// let mut client = EppClient::new(
///     "REGISTRAR-1",
///     "secret",
///     "epp.registry.test",
///     ClientOptions::default(),
/// )?;
///
/// let response = client
///     .check("domain", vec![Element::new("name").text("example.test")], None)
///     .await?;
/// println!("available: {:?}", response.is_available("example.test"));
/// # Ok(())
/// # }
/// ```
pub struct EppClient {
    config: Arc<SessionConfig>,
    connection: Box<dyn ProtocolConnection>,
}

impl EppClient {
    /// Builds a client for the given registrar credentials and registry
    /// host.  `options.compatibility` selects the legacy protocol variant;
    /// everything else is forwarded to the chosen connection unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when the tag or host is empty.
    pub fn new(
        tag: impl Into<String>,
        password: impl Into<String>,
        host: impl Into<String>,
        options: ClientOptions,
    ) -> Result<Self, Error> {
        let config = Arc::new(SessionConfig::new(
            tag.into(),
            password.into(),
            host.into(),
            options,
        )?);
        let transport = Box::new(TcpTransport::new(Arc::clone(&config)));
        Ok(Self::assemble(config, transport))
    }

    /// Like [`EppClient::new`] but with a caller-supplied transport.  This is
    /// the seam tests use to run a full session against a scripted peer.
    pub fn with_transport(
        tag: impl Into<String>,
        password: impl Into<String>,
        host: impl Into<String>,
        options: ClientOptions,
        transport: Box<dyn Transport>,
    ) -> Result<Self, Error> {
        let config = Arc::new(SessionConfig::new(
            tag.into(),
            password.into(),
            host.into(),
            options,
        )?);
        Ok(Self::assemble(config, transport))
    }

    fn assemble(config: Arc<SessionConfig>, transport: Box<dyn Transport>) -> Self {
        let connection: Box<dyn ProtocolConnection> = if config.options.compatibility {
            Box::new(CompatConnection::new(Arc::clone(&config), transport))
        } else {
            Box::new(StandardConnection::new(Arc::clone(&config), transport))
        };
        Self { config, connection }
    }

    /// The frozen configuration this client was built with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// True when the legacy protocol variant is active.
    pub fn is_compatibility(&self) -> bool {
        self.connection.is_compatibility()
    }

    // ── Session state accessors ──────────────────────────────────────────────

    /// XML of the most recent business request.
    pub fn last_request(&self) -> Option<&str> {
        self.connection.state().last_request()
    }

    /// The most recent business response.
    pub fn last_response(&self) -> Option<&RawResponse> {
        self.connection.state().last_response()
    }

    /// The most recent login/logout failure.
    pub fn last_error(&self) -> Option<&ResultData> {
        self.connection.state().last_error()
    }

    /// The most recently received server greeting.
    pub fn greeting(&self) -> Option<&Greeting> {
        self.connection.state().greeting()
    }

    #[doc(hidden)]
    #[deprecated(note = "use `last_request`")]
    pub fn _last_request(&self) -> Option<&str> {
        self.last_request()
    }

    #[doc(hidden)]
    #[deprecated(note = "use `last_response`")]
    pub fn _last_response(&self) -> Option<&RawResponse> {
        self.last_response()
    }

    #[doc(hidden)]
    #[deprecated(note = "use `last_error`")]
    pub fn _last_error(&self) -> Option<&ResultData> {
        self.last_error()
    }

    #[doc(hidden)]
    #[deprecated(note = "use `greeting`")]
    pub fn _greeting(&self) -> Option<&Greeting> {
        self.greeting()
    }

    // ── Session operations ───────────────────────────────────────────────────

    /// Performs a hello/greeting exchange in its own connection scope and
    /// returns the refreshed greeting.
    pub async fn hello(&mut self) -> Result<Greeting, Error> {
        self.connection.open_scope().await?;
        let result = self.connection.hello().await;
        self.connection.close_scope().await;
        result
    }

    /// Runs several commands in one connection and login scope.
    ///
    /// The body receives the client back and may call any verb method; those
    /// nested calls reuse the already-open socket and session instead of
    /// opening their own.  Logout and disconnect are guaranteed when the
    /// body returns, whether it succeeded or failed.
    ///
    /// ```no_run
    /// # async fn example(client: &mut epp_client::EppClient) -> Result<(), epp_client::Error> {
    /// use epp_client::Element;
    ///
    /// client
    ///     .session(|client| {
    ///         Box::pin(async move {
    ///             client
    ///                 .check("domain", vec![Element::new("name").text("a.test")], None)
    ///                 .await?;
    ///             client.poll().await
    ///         })
    ///     })
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn session<T, B>(&mut self, body: B) -> Result<T, Error>
    where
        B: for<'a> FnOnce(&'a mut EppClient) -> SessionFuture<'a, T>,
    {
        self.connection.open_scope().await?;
        let result = self.session_in_scope(body).await;
        self.connection.close_scope().await;
        result
    }

    async fn session_in_scope<T, B>(&mut self, body: B) -> Result<T, Error>
    where
        B: for<'a> FnOnce(&'a mut EppClient) -> SessionFuture<'a, T>,
    {
        self.connection.begin_login().await?;
        let result = body(self).await;
        self.connection.end_login().await;
        result
    }

    // ── Verb methods ─────────────────────────────────────────────────────────

    /// Checks availability of one or more objects.
    pub async fn check(
        &mut self,
        object: &str,
        payload: Vec<Element>,
        extension: Option<Element>,
    ) -> Result<CheckResponse, Error> {
        let kind = self.resolve(object)?;
        let raw = self.run(Command::check(kind, payload), extension).await?;
        Ok(kind.check_response(raw))
    }

    /// Creates an object.
    pub async fn create(
        &mut self,
        object: &str,
        payload: Vec<Element>,
        extension: Option<Element>,
    ) -> Result<CreateResponse, Error> {
        let kind = self.resolve(object)?;
        let raw = self.run(Command::create(kind, payload), extension).await?;
        Ok(kind.create_response(raw))
    }

    /// Deletes an object.
    pub async fn delete(
        &mut self,
        object: &str,
        payload: Vec<Element>,
        extension: Option<Element>,
    ) -> Result<DeleteResponse, Error> {
        let kind = self.resolve(object)?;
        let raw = self.run(Command::delete(kind, payload), extension).await?;
        Ok(kind.delete_response(raw))
    }

    /// Queries full information about an object.
    pub async fn info(
        &mut self,
        object: &str,
        payload: Vec<Element>,
        extension: Option<Element>,
    ) -> Result<InfoResponse, Error> {
        let kind = self.resolve(object)?;
        let raw = self.run(Command::info(kind, payload), extension).await?;
        Ok(kind.info_response(raw))
    }

    /// Renews an object's registration period.
    pub async fn renew(
        &mut self,
        object: &str,
        payload: Vec<Element>,
        extension: Option<Element>,
    ) -> Result<RenewResponse, Error> {
        let kind = self.resolve(object)?;
        let raw = self.run(Command::renew(kind, payload), extension).await?;
        Ok(kind.renew_response(raw))
    }

    /// Manages a transfer.  `op` must be one of `request`, `query`,
    /// `cancel`, `approve`, `reject`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOperation`] for any other `op` token, before
    /// any network I/O happens.
    pub async fn transfer(
        &mut self,
        op: &str,
        object: &str,
        payload: Vec<Element>,
        extension: Option<Element>,
    ) -> Result<TransferResponse, Error> {
        let op: TransferOp = op
            .parse()
            .map_err(|()| Error::InvalidOperation(format!("unknown transfer op {op:?}")))?;
        let kind = self.resolve(object)?;
        let raw = self
            .run(Command::transfer(op, kind, payload), extension)
            .await?;
        Ok(kind.transfer_response(raw))
    }

    /// Updates an object.
    pub async fn update(
        &mut self,
        object: &str,
        payload: Vec<Element>,
        extension: Option<Element>,
    ) -> Result<UpdateResponse, Error> {
        let kind = self.resolve(object)?;
        let raw = self.run(Command::update(kind, payload), extension).await?;
        Ok(kind.update_response(raw))
    }

    /// Requests the first queued service message.  Poll responses are
    /// type-agnostic, so the raw response is returned as-is.
    pub async fn poll(&mut self) -> Result<RawResponse, Error> {
        self.run(Command::poll(), None).await
    }

    /// Acknowledges (dequeues) the service message with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOperation`] when `message_id` is empty,
    /// before any network I/O happens.
    pub async fn ack(&mut self, message_id: &str) -> Result<RawResponse, Error> {
        if message_id.is_empty() {
            return Err(Error::InvalidOperation(
                "poll ack requires a non-empty message id".into(),
            ));
        }
        self.run(Command::ack(message_id), None).await
    }

    // ── Internals ────────────────────────────────────────────────────────────

    fn resolve(&self, token: &str) -> Result<ObjectKind, Error> {
        token
            .parse()
            .map_err(|()| Error::UnsupportedType(token.to_string()))
    }

    /// The single choke point every business command passes through.
    async fn run(
        &mut self,
        command: Command,
        extension: Option<Element>,
    ) -> Result<RawResponse, Error> {
        self.connection.open_scope().await?;
        let result = self.run_in_scope(&command, extension.as_ref()).await;
        self.connection.close_scope().await;
        result
    }

    async fn run_in_scope(
        &mut self,
        command: &Command,
        extension: Option<&Element>,
    ) -> Result<RawResponse, Error> {
        self.connection.begin_login().await?;
        let result = self.connection.request(command, extension).await;
        self.connection.end_login().await;
        result
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
