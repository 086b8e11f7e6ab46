//! The proxy-trust front door: decides whether the directly-connected
//! peer may rewrite the request's scheme, host, port, and client
//! address through `Forwarded` / `X-Forwarded-*` headers, and performs
//! the rewrite when it may.

use crate::{Context, Forwarded, Scheme};
use cidr::AnyIpCidr;
use std::net::IpAddr;

/// When to believe a peer's `Forwarded` / `X-Forwarded-*` claims.
///
/// Use the narrowest rule a deployment allows; an overbroad trust rule
/// lets any client forge its own address and scheme.
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub enum TrustPolicy {
    /// reject all proxy claims
    #[default]
    None,

    /// accept proxy claims from any peer
    Any,

    /// accept proxy claims from loopback, RFC 1918, link-local, and
    /// unique-local peers
    Local,

    /// accept proxy claims from peers within these networks
    IpList(Vec<AnyIpCidr>),
}

impl TrustPolicy {
    /// builds an [`TrustPolicy::IpList`] from ip or cidr strings
    ///
    /// ```
    /// # use quern::TrustPolicy;
    /// let policy = TrustPolicy::ip_list(["10.1.10.1", "192.168.0.0/16"]);
    /// ```
    pub fn ip_list<'a>(ips: impl IntoIterator<Item = &'a str>) -> Self {
        Self::IpList(ips.into_iter().map(|ip| ip.parse().unwrap()).collect())
    }

    /// whether a peer at this address may rewrite the request
    pub fn trusts(&self, ip: Option<IpAddr>) -> bool {
        match (self, ip) {
            (TrustPolicy::None, _) => false,
            (TrustPolicy::Any, _) => true,
            (TrustPolicy::Local, Some(ip)) => is_local(ip),
            (TrustPolicy::IpList(cidrs), Some(ip)) => cidrs.iter().any(|c| c.contains(&ip)),
            (_, None) => false,
        }
    }
}

fn is_local(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback() || v4.is_private() || v4.is_link_local()
        }
        IpAddr::V6(v6) => {
            let segments = v6.segments();
            v6.is_loopback()
                || segments[0] & 0xff00 == 0xfd00 // fd00::/8
                || segments[0] & 0xffc0 == 0xfe80 // fe80::/10
        }
    }
}

/// Rewrites the context's authoritative scheme, host, port, and remote
/// address from the peer's proxy claim, when the policy trusts the
/// peer. Untrusted claims are logged and ignored; the context keeps
/// its direct-connection identity untouched.
///
/// A `for` value that is not an ip address keeps the peer address as
/// `remote_ip` and records the claim, sanitized, as the printable
/// remote. Proxies forwarding obfuscated identifiers land here; so do
/// misconfigured ones.
pub fn apply(cx: &mut Context, policy: &TrustPolicy) {
    let claim = match Forwarded::from_headers(&cx.request_headers) {
        Ok(Some(claim)) => claim,
        Ok(None) => return,
        Err(error) => {
            log::error!("ignoring unparseable proxy claim from {}: {error}", cx.remote);
            return;
        }
    };

    if !policy.trusts(cx.peer_ip) {
        log::error!(
            "ignoring proxy claim from untrusted peer {}: {claim:?}",
            cx.remote
        );
        return;
    }

    cx.via_proxy = true;

    if let Some(proto) = claim.proto() {
        cx.scheme = if proto == "https" {
            Scheme::Https
        } else {
            Scheme::Http
        };
    }

    if let Some(host) = claim.host() {
        cx.host = Some(sanitize_host(host));
    }

    cx.port = claim.port().unwrap_or_else(|| cx.scheme.default_port());

    if let Some(forwarded_for) = claim.forwarded_for() {
        match parse_for(forwarded_for) {
            Some(ip) => {
                cx.remote_ip = Some(ip);
                cx.remote = ip.to_string();
            }
            None => {
                cx.remote = sanitize_token(forwarded_for);
            }
        }
    }
}

/// Extract the address from a `for` value: `[IPv6]:port` and `[IPv6]`
/// forms first, then a bare IPv4/IPv6 parse.
fn parse_for(value: &str) -> Option<IpAddr> {
    if let Some(rest) = value.strip_prefix('[') {
        let end = rest.find(']')?;
        return rest[..end].parse::<std::net::Ipv6Addr>().ok().map(IpAddr::V6);
    }
    value.parse().ok()
}

/// Lowercases, preserves a leading `[IPv6]` literal, keeps
/// `a-z 0-9 . -`, truncates at `:`, and replaces anything else with
/// `-`, so an upstream that does not validate `Host` cannot smuggle
/// header bytes through us.
pub(crate) fn sanitize_host(host: &str) -> String {
    let host = host.to_ascii_lowercase();
    if host.starts_with('[') {
        if let Some(end) = host.find(']') {
            return host[..=end].to_string();
        }
    }

    host.chars()
        .take_while(|c| *c != ':')
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '.' | '-' => c,
            _ => '-',
        })
        .collect()
}

/// Replace anything outside uri-unreserved characters with `-`.
pub(crate) fn sanitize_token(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '.' | '_' | '~' => c,
            _ => '-',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_ranges() {
        for trusted in [
            "127.0.0.1",
            "10.0.0.5",
            "192.168.1.1",
            "172.16.0.1",
            "172.31.255.255",
            "169.254.0.1",
            "::1",
            "fd00::1",
            "fe80::1",
        ] {
            assert!(
                TrustPolicy::Local.trusts(Some(trusted.parse().unwrap())),
                "{trusted} should be trusted by the local policy"
            );
        }

        for untrusted in ["203.0.113.9", "8.8.8.8", "172.32.0.1", "2001:db8::1"] {
            assert!(
                !TrustPolicy::Local.trusts(Some(untrusted.parse().unwrap())),
                "{untrusted} should not be trusted by the local policy"
            );
        }
    }

    #[test]
    fn policy_extremes() {
        let peer = Some("203.0.113.9".parse().unwrap());
        assert!(TrustPolicy::Any.trusts(peer));
        assert!(TrustPolicy::Any.trusts(None));
        assert!(!TrustPolicy::None.trusts(peer));
        assert!(!TrustPolicy::Local.trusts(None));
    }

    #[test]
    fn ip_list_contains() {
        let policy = TrustPolicy::ip_list(["10.1.10.1", "192.168.0.0/16"]);
        assert!(policy.trusts(Some("10.1.10.1".parse().unwrap())));
        assert!(policy.trusts(Some("192.168.4.4".parse().unwrap())));
        assert!(!policy.trusts(Some("10.1.10.2".parse().unwrap())));
    }

    #[test]
    fn for_value_forms() {
        assert_eq!(
            parse_for("[2001:db8:cafe::17]:4711"),
            Some("2001:db8:cafe::17".parse().unwrap())
        );
        assert_eq!(
            parse_for("[2001:db8:cafe::17]"),
            Some("2001:db8:cafe::17".parse().unwrap())
        );
        assert_eq!(parse_for("192.0.2.60"), Some("192.0.2.60".parse().unwrap()));
        assert_eq!(parse_for("2001:db8::1"), Some("2001:db8::1".parse().unwrap()));
        assert_eq!(parse_for("_gazonk"), None);
        assert_eq!(parse_for("[not-an-ip]"), None);
    }

    #[test]
    fn host_sanitization() {
        assert_eq!(sanitize_host("A.Example"), "a.example");
        assert_eq!(sanitize_host("a.example:8443"), "a.example");
        assert_eq!(sanitize_host("[2001:DB8::1]:8443"), "[2001:db8::1]");
        assert_eq!(sanitize_host("evil\r\nx-injected"), "evil--x-injected");
        assert_eq!(sanitize_host("under_score"), "under-score");
    }

    #[test]
    fn token_sanitization() {
        assert_eq!(sanitize_token("_hidden"), "_hidden");
        assert_eq!(sanitize_token("a b\"c"), "a-b-c");
    }
}
