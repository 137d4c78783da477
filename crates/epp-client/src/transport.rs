//! Transport layer: the byte stream between client and registry.
//!
//! The [`Transport`] trait is the seam between the session logic and real
//! sockets.  Production code uses [`TcpTransport`] (plain TCP or TLS via
//! rustls); tests substitute scripted implementations.  The trait speaks
//! bytes, not frames — which framing discipline applies depends on the
//! protocol variant and lives in the connection layer.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{lookup_host, TcpStream};
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::TlsConnector;
use tracing::{debug, warn};

use crate::config::SessionConfig;

/// Byte-level connection operations used by the session layer.
///
/// All methods report failures as `std::io::Error`; the connection layer
/// wraps them into the session error type.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send {
    /// Opens the underlying stream.  A no-op when already open.
    async fn open(&mut self) -> io::Result<()>;

    /// Closes the underlying stream and discards any buffered bytes.
    async fn close(&mut self) -> io::Result<()>;

    fn is_open(&self) -> bool;

    /// Writes the whole buffer and flushes.
    async fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Reads exactly `len` bytes.
    async fn read_exact(&mut self, len: usize) -> io::Result<Vec<u8>>;

    /// Reads until `delimiter` has been seen, returning everything up to and
    /// including it.  The delimiter may straddle read boundaries.
    async fn read_until(&mut self, delimiter: &[u8]) -> io::Result<Vec<u8>>;
}

// ── TCP/TLS implementation ────────────────────────────────────────────────────

enum Stream {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

impl Stream {
    async fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        match self {
            Stream::Plain(s) => s.write_all(bytes).await,
            Stream::Tls(s) => s.write_all(bytes).await,
        }
    }

    async fn flush(&mut self) -> io::Result<()> {
        match self {
            Stream::Plain(s) => s.flush().await,
            Stream::Tls(s) => s.flush().await,
        }
    }

    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Stream::Plain(s) => s.read(buf).await,
            Stream::Tls(s) => s.read(buf).await,
        }
    }

    async fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        match self {
            Stream::Plain(s) => s.read_exact(buf).await.map(|_| ()),
            Stream::Tls(s) => s.read_exact(buf).await.map(|_| ()),
        }
    }

    async fn shutdown(&mut self) -> io::Result<()> {
        match self {
            Stream::Plain(s) => s.shutdown().await,
            Stream::Tls(s) => s.shutdown().await,
        }
    }
}

/// The production transport: resolves the configured endpoint, dials each
/// permitted address in resolver order, and optionally wraps the stream in
/// TLS.
pub struct TcpTransport {
    config: Arc<SessionConfig>,
    stream: Option<Stream>,
    /// Bytes read from the socket but not yet consumed by a frame.
    buffer: Vec<u8>,
}

impl TcpTransport {
    pub fn new(config: Arc<SessionConfig>) -> Self {
        Self {
            config,
            stream: None,
            buffer: Vec::new(),
        }
    }

    async fn dial(&self) -> io::Result<TcpStream> {
        let endpoint = self.config.endpoint();
        let family = self.config.options.address_family;
        let candidates: Vec<SocketAddr> = lookup_host(endpoint.as_str())
            .await?
            .filter(|addr| family.permits(addr))
            .collect();
        if candidates.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!("no addresses for {endpoint} match the configured address family"),
            ));
        }

        let mut last_error = None;
        for addr in candidates {
            match TcpStream::connect(addr).await {
                Ok(stream) => {
                    debug!(%addr, "connected");
                    return Ok(stream);
                }
                Err(e) => {
                    warn!(%addr, "connect failed: {e}");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| io::Error::other("no candidate addresses")))
    }

    async fn wrap_tls(&self, tcp: TcpStream) -> io::Result<Stream> {
        let Some(tls) = &self.config.options.tls else {
            return Ok(Stream::Plain(tcp));
        };
        let name = tls
            .server_name
            .clone()
            .unwrap_or_else(|| self.config.host.clone());
        let server_name = ServerName::try_from(name)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let connector = TlsConnector::from(Arc::clone(&tls.client_config));
        let stream = connector.connect(server_name, tcp).await?;
        debug!(host = %self.config.host, "TLS established");
        Ok(Stream::Tls(Box::new(stream)))
    }

    fn stream_mut(&mut self) -> io::Result<&mut Stream> {
        self.stream
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "transport is not open"))
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn open(&mut self) -> io::Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }
        let tcp = self.dial().await?;
        self.stream = Some(self.wrap_tls(tcp).await?);
        self.buffer.clear();
        Ok(())
    }

    async fn close(&mut self) -> io::Result<()> {
        self.buffer.clear();
        if let Some(mut stream) = self.stream.take() {
            stream.shutdown().await?;
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    async fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        let stream = self.stream_mut()?;
        stream.write_all(bytes).await?;
        stream.flush().await
    }

    async fn read_exact(&mut self, len: usize) -> io::Result<Vec<u8>> {
        let mut out = Vec::with_capacity(len);
        let buffered = len.min(self.buffer.len());
        out.extend(self.buffer.drain(..buffered));
        if out.len() < len {
            let mut rest = vec![0u8; len - out.len()];
            self.stream_mut()?.read_exact(&mut rest).await?;
            out.extend_from_slice(&rest);
        }
        Ok(out)
    }

    async fn read_until(&mut self, delimiter: &[u8]) -> io::Result<Vec<u8>> {
        loop {
            if let Some(pos) = find_subsequence(&self.buffer, delimiter) {
                let end = pos + delimiter.len();
                return Ok(self.buffer.drain(..end).collect());
            }
            let mut chunk = [0u8; 4096];
            let n = self.stream_mut()?.read(&mut chunk).await?;
            if n == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed before the frame delimiter",
                ));
            }
            self.buffer.extend_from_slice(&chunk[..n]);
        }
    }
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
