//! Environment-driven configuration and constants.
//!
//! Every setting comes from a fixed set of environment variables, each with a
//! fallback. Lookups go through [`EnvSource`] so handlers can be driven by a
//! fixed map in tests instead of the real process environment.

use std::collections::HashMap;
use std::fmt;
use std::net::{Ipv6Addr, SocketAddr};
use std::num::ParseIntError;
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// Server Constants
// =============================================================================

/// Maximum time a client may take to send the full request head.
pub const HEADER_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// How long in-flight requests may drain after SIGTERM/SIGINT.
pub const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(30);

// =============================================================================
// Fallback Values
// =============================================================================

/// Fallback for identity fields whose variable is unset.
pub const UNKNOWN: &str = "unknown";

/// Fallback namespace, matching the Kubernetes default namespace.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Default listening port.
pub const DEFAULT_PORT: &str = "8080";

// =============================================================================
// Logging
// =============================================================================

/// Default log filter when neither --log-level nor RUST_LOG is set
pub const DEFAULT_LOG_FILTER: &str = "podwhoami=info";

/// Environment variables read by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvKey {
    Port,
    PodName,
    PodIp,
    NodeName,
    PodNamespace,
    Environment,
}

impl EnvKey {
    pub const ALL: [EnvKey; 6] = [
        EnvKey::Port,
        EnvKey::PodName,
        EnvKey::PodIp,
        EnvKey::NodeName,
        EnvKey::PodNamespace,
        EnvKey::Environment,
    ];

    /// Name of the environment variable.
    pub fn var_name(self) -> &'static str {
        match self {
            EnvKey::Port => "PORT",
            EnvKey::PodName => "POD_NAME",
            EnvKey::PodIp => "POD_IP",
            EnvKey::NodeName => "NODE_NAME",
            EnvKey::PodNamespace => "POD_NAMESPACE",
            EnvKey::Environment => "ENVIRONMENT",
        }
    }

    /// Value used when the variable is unset or empty.
    pub fn default_value(self) -> &'static str {
        match self {
            EnvKey::Port => DEFAULT_PORT,
            EnvKey::PodNamespace => DEFAULT_NAMESPACE,
            EnvKey::PodName | EnvKey::PodIp | EnvKey::NodeName | EnvKey::Environment => UNKNOWN,
        }
    }
}

/// Source of raw environment values.
pub trait EnvSource: Send + Sync {
    fn lookup(&self, name: &str) -> Option<String>;
}

/// Reads the real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn lookup(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Environment reader with fallback defaults.
///
/// Cheap to clone; all clones share the same source.
#[derive(Clone)]
pub struct Env {
    source: Arc<dyn EnvSource>,
}

impl Env {
    /// Reader backed by the process environment.
    pub fn process() -> Self {
        Self::from_source(ProcessEnv)
    }

    pub fn from_source(source: impl EnvSource + 'static) -> Self {
        Self {
            source: Arc::new(source),
        }
    }

    /// Returns the variable's value if set and non-empty, else `default`.
    pub fn get(&self, name: &str, default: &str) -> String {
        match self.source.lookup(name) {
            Some(value) if !value.is_empty() => value,
            _ => default.to_string(),
        }
    }

    /// Returns the value for `key`, falling back to its documented default.
    pub fn value(&self, key: EnvKey) -> String {
        self.get(key.var_name(), key.default_value())
    }

    /// Socket address to listen on: every interface, IPv6 and IPv4, on `PORT`.
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = self.value(EnvKey::Port);
        let port: u16 = raw
            .parse()
            .map_err(|source| ConfigError::InvalidPort { value: raw, source })?;
        Ok(SocketAddr::from((Ipv6Addr::UNSPECIFIED, port)))
    }
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for key in EnvKey::ALL {
            map.entry(&key.var_name(), &self.value(key));
        }
        map.finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid PORT {value:?}: {source}")]
    InvalidPort {
        value: String,
        #[source]
        source: ParseIntError,
    },
}
