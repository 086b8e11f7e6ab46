use crate::{range::RangePlan, Body, Headers, Method, StateSet, Version};
use std::{
    fmt::{self, Debug, Display, Formatter},
    net::IpAddr,
    time::SystemTime,
};

/// the authoritative scheme of a request, after the front door has
/// weighed any proxy claims
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
    /// cleartext http
    #[default]
    Http,
    /// http over tls
    Https,
}

impl Scheme {
    /// "http" or "https"
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }

    /// the port implied by this scheme when none is named
    pub fn default_port(&self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }
}

impl Display for Scheme {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Consulted {
    pub(crate) accept: bool,
    pub(crate) language: bool,
    pub(crate) charset: bool,
    pub(crate) encoding: bool,
}

/**
The single mutable object threaded through every decision of a
request.

A context is built from the parsed request, enriched by the proxy
front door, mutated by the decision engine and the controller's
callbacks, and finally consumed by the response emitter. One request,
one context, one owner at a time.
*/
pub struct Context {
    // request facet
    pub(crate) method: Method,
    pub(crate) raw_path: String,
    pub(crate) version: Version,
    pub(crate) request_headers: Headers,
    pub(crate) peer_ip: Option<IpAddr>,

    // authoritative request identity (front door output)
    pub(crate) scheme: Scheme,
    pub(crate) host: Option<String>,
    pub(crate) port: u16,
    pub(crate) remote_ip: Option<IpAddr>,
    pub(crate) remote: String,
    pub(crate) via_proxy: bool,

    // negotiation results
    pub(crate) media_type: Option<String>,
    pub(crate) charset: Option<String>,
    pub(crate) language: Option<String>,
    pub(crate) encoding: String,

    // response accumulator
    pub(crate) status: Option<u16>,
    pub(crate) response_headers: Headers,
    pub(crate) body: Option<Body>,
    pub(crate) cookies: Vec<String>,
    pub(crate) range_ok: bool,
    pub(crate) range_plan: Option<RangePlan>,

    // decision-path scratch
    pub(crate) new_resource: bool,
    pub(crate) redirect: bool,
    pub(crate) consulted: Consulted,

    // one-shot controller answers, consulted at most once per request
    pub(crate) etag: Option<Option<String>>,
    pub(crate) last_modified: Option<Option<SystemTime>>,
    pub(crate) expires: Option<Option<SystemTime>>,

    // controller-defined state
    pub(crate) state: StateSet,
}

impl Context {
    /// Builds a context from a parsed request. `secure` reflects the
    /// transport the request arrived on; the front door may override
    /// it with a trusted proxy claim.
    pub fn new(
        method: Method,
        raw_path: impl Into<String>,
        version: Version,
        request_headers: Headers,
        peer_ip: Option<IpAddr>,
        secure: bool,
    ) -> Self {
        let scheme = if secure { Scheme::Https } else { Scheme::Http };
        let (host, port) = host_and_port(&request_headers, scheme);
        let remote = peer_ip
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| String::from("unknown"));

        Self {
            method,
            raw_path: raw_path.into(),
            version,
            request_headers,
            peer_ip,
            scheme,
            host,
            port,
            remote_ip: peer_ip,
            remote,
            via_proxy: false,
            media_type: None,
            charset: None,
            language: None,
            encoding: String::from("identity"),
            status: None,
            response_headers: Headers::new(),
            body: None,
            cookies: Vec::new(),
            range_ok: true,
            range_plan: None,
            new_resource: false,
            redirect: false,
            consulted: Consulted::default(),
            etag: None,
            last_modified: None,
            expires: None,
            state: StateSet::new(),
        }
    }

    /// the request method
    pub fn method(&self) -> Method {
        self.method
    }

    /// the request http version
    pub fn version(&self) -> Version {
        self.version
    }

    /// the path part of the request target, up to and excluding any
    /// query component
    pub fn path(&self) -> &str {
        self.raw_path.split('?').next().unwrap_or_default()
    }

    /// the query component of the request target, if present
    pub fn query(&self) -> Option<&str> {
        self.raw_path.split_once('?').map(|(_, q)| q)
    }

    /// the request headers
    pub fn request_headers(&self) -> &Headers {
        &self.request_headers
    }

    /// the address of the directly-connected peer
    pub fn peer_ip(&self) -> Option<IpAddr> {
        self.peer_ip
    }

    /// the authoritative request scheme
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// the authoritative request host
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// the authoritative request port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// the authoritative client address. Equal to [`Context::peer_ip`]
    /// unless a trusted proxy claimed otherwise.
    pub fn remote_ip(&self) -> Option<IpAddr> {
        self.remote_ip
    }

    /// the printable form of the authoritative client. Usually an ip
    /// address; a sanitized token when a trusted proxy forwarded an
    /// obfuscated identifier.
    pub fn remote(&self) -> &str {
        &self.remote
    }

    /// whether a trusted proxy rewrote the request identity
    pub fn via_proxy(&self) -> bool {
        self.via_proxy
    }

    /// the negotiated media type, once content negotiation has run
    pub fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }

    /// the negotiated charset, unless the controller opted out of
    /// charset negotiation
    pub fn charset(&self) -> Option<&str> {
        self.charset.as_deref()
    }

    /// the negotiated content language
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// the negotiated content encoding; `identity` unless negotiated
    /// otherwise
    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    /// the response status, if one has been decided
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// sets the response status
    pub fn set_status(&mut self, status: u16) {
        self.status = Some(status);
    }

    /// the response headers accumulated so far
    pub fn response_headers(&self) -> &Headers {
        &self.response_headers
    }

    /// mutable access to the response headers
    pub fn response_headers_mut(&mut self) -> &mut Headers {
        &mut self.response_headers
    }

    /// sets the response body source, replacing any previous one
    pub fn set_response_body(&mut self, body: impl Into<Body>) {
        self.body = Some(body.into());
    }

    /// the response body source, if one has been set
    pub fn response_body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    /// removes and returns the response body source
    pub fn take_response_body(&mut self) -> Option<Body> {
        self.body.take()
    }

    /// queues a `Set-Cookie` header; each cookie is emitted on its own
    /// line
    pub fn add_cookie(&mut self, cookie: impl Into<String>) {
        self.cookies.push(cookie.into());
    }

    /// Forces a full `200` response for this request even when the
    /// client sent a `Range` header. Only effective before the engine
    /// reads the flag, which happens once, after the decision graph
    /// terminates.
    pub fn disable_range(&mut self) {
        self.range_ok = false;
    }

    /// whether range requests will be honored for this request
    pub fn range_ok(&self) -> bool {
        self.range_ok
    }

    /// Sets `Location` and marks this request so the POST decision
    /// path answers with `303 See Other`.
    pub fn redirect_to(&mut self, location: impl Into<String>) {
        self.response_headers.insert("location", location.into());
        self.redirect = true;
    }

    /// controller-defined request state
    pub fn state(&self) -> &StateSet {
        &self.state
    }

    /// mutable access to controller-defined request state
    pub fn state_mut(&mut self) -> &mut StateSet {
        &mut self.state
    }
}

impl Debug for Context {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("method", &self.method)
            .field("raw_path", &self.raw_path)
            .field("version", &self.version)
            .field("request_headers", &self.request_headers)
            .field("scheme", &self.scheme)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("remote", &self.remote)
            .field("via_proxy", &self.via_proxy)
            .field("status", &self.status)
            .field("response_headers", &self.response_headers)
            .field("body", &self.body)
            .finish()
    }
}

fn host_and_port(headers: &Headers, scheme: Scheme) -> (Option<String>, u16) {
    let Some(value) = headers.get_str("host") else {
        return (None, scheme.default_port());
    };
    let value = value.trim().to_ascii_lowercase();

    if let Some(rest) = value.strip_prefix('[') {
        // bracketed ipv6 literal, optionally followed by :port
        if let Some((literal, rest)) = rest.split_once(']') {
            let port = rest
                .strip_prefix(':')
                .and_then(|p| p.parse().ok())
                .unwrap_or_else(|| scheme.default_port());
            return (Some(format!("[{literal}]")), port);
        }
        return (Some(value), scheme.default_port());
    }

    match value.split_once(':') {
        Some((host, port)) => {
            let port = port.parse().unwrap_or_else(|_| scheme.default_port());
            (Some(host.to_string()), port)
        }
        None => (Some(value), scheme.default_port()),
    }
}
