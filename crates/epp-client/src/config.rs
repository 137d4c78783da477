//! Client configuration.
//!
//! [`ClientOptions`] carries everything beyond the three positional
//! construction arguments (tag, password, host).  Every field has a default,
//! and the struct derives serde so embedding applications can read options
//! from their own configuration files; the TLS handle is the one field that
//! cannot come from a file and is skipped.
//!
//! [`SessionConfig`] is the immutable product of construction.  It is built
//! once, validated once, and shared by reference (`Arc`) between the facade
//! and the connection variant it selected.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_rustls::rustls;

use epp_proto::{LoginCommand, ObjectKind};

use crate::error::Error;

/// IANA-assigned EPP port.
pub const DEFAULT_PORT: u16 = 700;

/// Restricts which resolved addresses the transport may dial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressFamily {
    /// Try every resolved address in resolver order.
    #[default]
    Any,
    /// IPv4 addresses only.
    V4,
    /// IPv6 addresses only.
    V6,
}

impl AddressFamily {
    pub(crate) fn permits(&self, addr: &SocketAddr) -> bool {
        match self {
            AddressFamily::Any => true,
            AddressFamily::V4 => addr.is_ipv4(),
            AddressFamily::V6 => addr.is_ipv6(),
        }
    }
}

/// TLS settings for the transport.
///
/// The rustls client config (root store, client certificate, versions) is the
/// caller's to assemble; registries differ too much for a useful default.
#[derive(Clone)]
pub struct TlsConfig {
    pub client_config: Arc<rustls::ClientConfig>,
    /// Name presented for SNI and certificate validation.  Defaults to the
    /// configured host when unset.
    pub server_name: Option<String>,
}

impl TlsConfig {
    pub fn new(client_config: Arc<rustls::ClientConfig>) -> Self {
        Self {
            client_config,
            server_name: None,
        }
    }

    pub fn with_server_name(mut self, server_name: impl Into<String>) -> Self {
        self.server_name = Some(server_name.into());
        self
    }
}

impl fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsConfig")
            .field("server_name", &self.server_name)
            .finish_non_exhaustive()
    }
}

/// The default service URN set advertised during login: the three object
/// namespaces, in dispatch order.
pub fn default_services() -> Vec<String> {
    ObjectKind::ALL
        .iter()
        .map(|kind| kind.xmlns().to_string())
        .collect()
}

fn default_language() -> String {
    "en".into()
}

fn default_version() -> String {
    "1.0".into()
}

/// Optional construction parameters for [`crate::EppClient`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    /// TCP port of the registry server.
    pub port: u16,
    /// TLS settings; `None` means a plaintext connection.
    #[serde(skip)]
    pub tls: Option<TlsConfig>,
    /// Select the legacy protocol variant (unprefixed wire frames).
    pub compatibility: bool,
    /// Text language requested at login.
    pub language: String,
    /// Protocol version requested at login.
    pub version: String,
    /// Extension URNs advertised at login, in order.
    pub extensions: Vec<String>,
    /// Object service URNs advertised at login, in order.
    pub services: Vec<String>,
    /// Which resolved addresses the transport may dial.
    pub address_family: AddressFamily,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            tls: None,
            compatibility: false,
            language: default_language(),
            version: default_version(),
            extensions: Vec::new(),
            services: default_services(),
            address_family: AddressFamily::default(),
        }
    }
}

/// The immutable session configuration: credentials, endpoint, and options.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub tag: String,
    pub password: String,
    pub host: String,
    pub options: ClientOptions,
}

impl SessionConfig {
    /// Validates and freezes the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when the tag or host is empty.
    pub(crate) fn new(
        tag: String,
        password: String,
        host: String,
        options: ClientOptions,
    ) -> Result<Self, Error> {
        if tag.is_empty() {
            return Err(Error::Configuration("tag must not be empty".into()));
        }
        if host.is_empty() {
            return Err(Error::Configuration("host must not be empty".into()));
        }
        Ok(Self {
            tag,
            password,
            host,
            options,
        })
    }

    /// `host:port` endpoint string handed to the resolver.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.options.port)
    }

    /// The login command advertised when a session scope opens.
    pub fn login_command(&self) -> LoginCommand {
        LoginCommand {
            client_id: self.tag.clone(),
            password: self.password.clone(),
            version: self.options.version.clone(),
            language: self.options.language.clone(),
            services: self.options.services.clone(),
            extensions: self.options.extensions.clone(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_match_documented_defaults() {
        let options = ClientOptions::default();

        assert_eq!(options.port, 700);
        assert!(options.tls.is_none());
        assert!(!options.compatibility);
        assert_eq!(options.language, "en");
        assert_eq!(options.version, "1.0");
        assert!(options.extensions.is_empty());
        assert_eq!(options.address_family, AddressFamily::Any);
    }

    #[test]
    fn test_default_services_advertise_all_three_object_namespaces() {
        let services = default_services();

        assert_eq!(
            services,
            vec![
                "urn:ietf:params:xml:ns:domain-1.0",
                "urn:ietf:params:xml:ns:contact-1.0",
                "urn:ietf:params:xml:ns:host-1.0",
            ]
        );
    }

    #[test]
    fn test_options_deserialize_from_toml_with_partial_fields() {
        let options: ClientOptions = toml::from_str(
            r#"
            port = 7700
            compatibility = true
            language = "fr"
            address_family = "v6"
            "#,
        )
        .expect("options parse");

        assert_eq!(options.port, 7700);
        assert!(options.compatibility);
        assert_eq!(options.language, "fr");
        assert_eq!(options.address_family, AddressFamily::V6);
        // Unlisted fields fall back to their defaults.
        assert_eq!(options.version, "1.0");
        assert_eq!(options.services, default_services());
    }

    #[test]
    fn test_session_config_rejects_empty_tag_and_host() {
        let empty_tag = SessionConfig::new(
            String::new(),
            "pw".into(),
            "epp.registry.test".into(),
            ClientOptions::default(),
        );
        assert!(matches!(empty_tag, Err(Error::Configuration(_))));

        let empty_host = SessionConfig::new(
            "TAG".into(),
            "pw".into(),
            String::new(),
            ClientOptions::default(),
        );
        assert!(matches!(empty_host, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_login_command_carries_configured_urn_sets_in_order() {
        let mut options = ClientOptions::default();
        options.extensions = vec!["urn:ext:b".into(), "urn:ext:a".into()];
        let config = SessionConfig::new(
            "TAG".into(),
            "secret".into(),
            "epp.registry.test".into(),
            options,
        )
        .expect("valid config");

        let login = config.login_command();
        assert_eq!(login.client_id, "TAG");
        assert_eq!(login.extensions, vec!["urn:ext:b", "urn:ext:a"]);
        assert_eq!(login.services, default_services());
    }

    #[test]
    fn test_endpoint_joins_host_and_port() {
        let config = SessionConfig::new(
            "TAG".into(),
            "pw".into(),
            "epp.registry.test".into(),
            ClientOptions {
                port: 7700,
                ..ClientOptions::default()
            },
        )
        .expect("valid config");

        assert_eq!(config.endpoint(), "epp.registry.test:7700");
    }

    #[test]
    fn test_address_family_filters() {
        let v4: SocketAddr = "192.0.2.1:700".parse().expect("addr");
        let v6: SocketAddr = "[2001:db8::1]:700".parse().expect("addr");

        assert!(AddressFamily::Any.permits(&v4) && AddressFamily::Any.permits(&v6));
        assert!(AddressFamily::V4.permits(&v4) && !AddressFamily::V4.permits(&v6));
        assert!(AddressFamily::V6.permits(&v6) && !AddressFamily::V6.permits(&v4));
    }
}
