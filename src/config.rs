use crate::proxy::TrustPolicy;
use std::time::Duration;
use stopper::Stopper;

/// the default `Server` header
pub const SERVER: &str = concat!("quern/", env!("CARGO_PKG_VERSION"));

pub(crate) const DEFAULT_FILE_CHUNK_SIZE: usize = 65_536;

/**
# Engine configuration.

Constructed once at startup and shared by reference with every
request; nothing in here is read from process globals. All parameters
have workable defaults:

```
use quern::{Config, SendfileMode, TrustPolicy};

let config = Config::new()
    .with_server_header("example/1.0")
    .with_sendfile(SendfileMode::InProcess)
    .with_proxy_trust(TrustPolicy::Local);
```
*/
#[derive(Clone)]
#[must_use]
pub struct Config {
    server_header: String,
    use_sendfile: SendfileMode,
    proxy_trust: TrustPolicy,
    idle_timeout: Option<Duration>,
    file_chunk_size: usize,
    stopper: Option<Stopper>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("server_header", &self.server_header)
            .field("use_sendfile", &self.use_sendfile)
            .field("proxy_trust", &self.proxy_trust)
            .field("idle_timeout", &self.idle_timeout)
            .field("file_chunk_size", &self.file_chunk_size)
            .field("stopper", &self.stopper.is_some())
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_header: SERVER.into(),
            use_sendfile: SendfileMode::Disabled,
            proxy_trust: TrustPolicy::None,
            idle_timeout: None,
            file_chunk_size: DEFAULT_FILE_CHUNK_SIZE,
            stopper: None,
        }
    }
}

impl Config {
    /// constructs a default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// sets the `Server` header sent when the controller does not
    /// provide one
    pub fn with_server_header(mut self, server_header: impl Into<String>) -> Self {
        self.server_header = server_header.into();
        self
    }

    /// selects how file-backed bodies are pushed to the transport
    pub fn with_sendfile(mut self, mode: SendfileMode) -> Self {
        self.use_sendfile = mode;
        self
    }

    /// sets the policy deciding which peers may rewrite the request
    /// through `Forwarded` / `X-Forwarded-*` headers
    pub fn with_proxy_trust(mut self, proxy_trust: TrustPolicy) -> Self {
        self.proxy_trust = proxy_trust;
        self
    }

    /// sets the idle deadline the embedding server enforces for a
    /// request. The engine itself keeps no timers; on expiry the
    /// server stops the [`Stopper`] provided below.
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = Some(idle_timeout);
        self
    }

    /// sets the read size for file-backed bodies
    pub fn with_file_chunk_size(mut self, file_chunk_size: usize) -> Self {
        self.file_chunk_size = file_chunk_size;
        self
    }

    /// provides the stopper that cancels in-flight emission on client
    /// disconnect or deadline expiry
    pub fn with_stopper(mut self, stopper: Stopper) -> Self {
        self.stopper = Some(stopper);
        self
    }

    /// the configured `Server` header
    pub fn server_header(&self) -> &str {
        &self.server_header
    }

    /// the configured sendfile mode
    pub fn sendfile(&self) -> SendfileMode {
        self.use_sendfile
    }

    /// the configured proxy trust policy
    pub fn proxy_trust(&self) -> &TrustPolicy {
        &self.proxy_trust
    }

    /// the configured idle deadline, if any
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout
    }

    /// the configured file read size
    pub fn file_chunk_size(&self) -> usize {
        self.file_chunk_size
    }

    /// the configured stopper, if any
    pub fn stopper(&self) -> Option<&Stopper> {
        self.stopper.as_ref()
    }
}

/// How the emitter moves file-backed bodies to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum SendfileMode {
    /// copy through userspace in `file_chunk_size` reads
    #[default]
    Disabled,

    /// copy through userspace with a buffered copy loop
    InProcess,

    /// hand the file to the transport where it supports zero-copy
    /// sends; transports without that support degrade to `InProcess`
    Offload,
}
