use crate::{
    parse_utils::{parse_quoted_string, parse_token},
    Headers,
};

/// A proxy's claim about the request it relayed, extracted from the
/// [`Forwarded`](https://tools.ietf.org/html/rfc7239) header or, when
/// that is absent, from the historical `X-Forwarded-*` headers.
///
/// A `Forwarded` header may carry one element per relaying proxy; only
/// the last element (the proxy closest to us, the only one whose claim
/// the trust policy can vouch for) is retained.
///
/// ```
/// # use quern::Forwarded;
/// let forwarded = Forwarded::parse(
///     "for=192.0.2.43;proto=http, for=203.0.113.7;proto=https;host=a.example;port=8443"
/// ).unwrap();
/// assert_eq!(forwarded.forwarded_for(), Some("203.0.113.7"));
/// assert_eq!(forwarded.proto(), Some("https"));
/// assert_eq!(forwarded.host(), Some("a.example"));
/// assert_eq!(forwarded.port(), Some(8443));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Forwarded {
    forwarded_for: Option<String>,
    proto: Option<String>,
    host: Option<String>,
    port: Option<u16>,
}

impl Forwarded {
    /// Attempts to extract a proxy claim from the provided request
    /// headers. `Forwarded` wins over the `X-Forwarded-*` family;
    /// `Ok(None)` means no proxy involvement was claimed at all.
    pub fn from_headers(headers: &Headers) -> Result<Option<Self>, ParseError> {
        if let Some(value) = headers.get_str("forwarded") {
            Self::parse(value).map(Some)
        } else {
            Ok(Self::from_x_headers(headers))
        }
    }

    /// parse a `Forwarded` header value, keeping the last element
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let mut rest = input.trim();
        if rest.is_empty() {
            return Err(ParseError::new("empty forwarded header"));
        }

        let mut element = Forwarded::default();
        loop {
            rest = element.parse_pair(rest)?;
            match rest.chars().next() {
                Some(';') => rest = rest[1..].trim_start(),
                Some(',') => {
                    // a later element supersedes everything before it
                    element = Forwarded::default();
                    rest = rest[1..].trim_start();
                }
                None => return Ok(element),
                _ => return Err(ParseError::new("unexpected character after forwarded pair")),
            }
        }
    }

    fn parse_pair<'a>(&mut self, input: &'a str) -> Result<&'a str, ParseError> {
        let (key, rest) = match parse_token(input) {
            (Some(key), rest) => (key, rest),
            (None, _) => return Err(ParseError::new("expected a forwarded key token")),
        };

        let rest = rest
            .strip_prefix('=')
            .ok_or_else(|| ParseError::new("expected `=` after forwarded key"))?;

        let (value, rest) = match parse_token(rest) {
            (Some(token), rest) => (token.to_ascii_lowercase(), rest),
            (None, rest) => match parse_quoted_string(rest) {
                (Some(value), rest) => (value, rest),
                (None, _) => return Err(ParseError::new("expected a forwarded value")),
            },
        };

        match key.to_ascii_lowercase().as_str() {
            "for" => self.forwarded_for = Some(value),
            "proto" => self.proto = Some(value),
            "host" => self.host = Some(value),
            "port" => {
                self.port = Some(
                    value
                        .parse()
                        .map_err(|_| ParseError::new("forwarded port is not a port number"))?,
                );
            }
            _ => { /* extensions are allowed in the grammar */ }
        }

        Ok(rest)
    }

    fn from_x_headers(headers: &Headers) -> Option<Self> {
        let forwarded_for = headers
            .get_str("x-forwarded-for")
            .and_then(|h| h.split(',').next_back())
            .map(|v| v.trim().to_string());

        let proto = headers
            .get_str("x-forwarded-proto")
            .map(|v| v.trim().to_ascii_lowercase())
            .or_else(|| {
                headers
                    .eq_ignore_ascii_case("x-forwarded-ssl", "on")
                    .then(|| String::from("https"))
            });

        let host = headers
            .get_str("x-forwarded-host")
            .map(|v| v.trim().to_string());

        let port = headers
            .get_str("x-forwarded-port")
            .and_then(|v| v.trim().parse().ok());

        if forwarded_for.is_none() && proto.is_none() && host.is_none() && port.is_none() {
            None
        } else {
            Some(Self {
                forwarded_for,
                proto,
                host,
                port,
            })
        }
    }

    /// the claimed client address, verbatim
    pub fn forwarded_for(&self) -> Option<&str> {
        self.forwarded_for.as_deref()
    }

    /// the claimed scheme
    pub fn proto(&self) -> Option<&str> {
        self.proto.as_deref()
    }

    /// the claimed host, unsanitized
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// the claimed port
    pub fn port(&self) -> Option<u16> {
        self.port
    }
}

/// an unparseable `Forwarded` header
#[derive(Debug, Clone, Copy)]
pub struct ParseError(&'static str);

impl ParseError {
    pub(crate) fn new(msg: &'static str) -> Self {
        Self(msg)
    }
}

impl std::error::Error for ParseError {}
impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unable to parse forwarded header: {}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_element() {
        let forwarded =
            Forwarded::parse("for=client.com;proto=https;host=host.com;port=8443").unwrap();
        assert_eq!(forwarded.forwarded_for(), Some("client.com"));
        assert_eq!(forwarded.proto(), Some("https"));
        assert_eq!(forwarded.host(), Some("host.com"));
        assert_eq!(forwarded.port(), Some(8443));
    }

    #[test]
    fn last_element_wins() {
        let forwarded =
            Forwarded::parse("for=192.0.2.43;host=stale.example, for=198.51.100.17").unwrap();
        assert_eq!(forwarded.forwarded_for(), Some("198.51.100.17"));
        // host was claimed by an earlier hop, not the one we can trust
        assert_eq!(forwarded.host(), None);
    }

    #[test]
    fn quoted_values_are_unescaped() {
        let forwarded = Forwarded::parse(r#"For="[2001:db8:cafe::17]:4711""#).unwrap();
        assert_eq!(forwarded.forwarded_for(), Some("[2001:db8:cafe::17]:4711"));

        let forwarded = Forwarded::parse(r#"for="esc\"aped""#).unwrap();
        assert_eq!(forwarded.forwarded_for(), Some(r#"esc"aped"#));
    }

    #[test]
    fn token_values_are_lowercased() {
        let forwarded = Forwarded::parse("PROTO=HTTPS;for=UNKNOWN").unwrap();
        assert_eq!(forwarded.proto(), Some("https"));
        assert_eq!(forwarded.forwarded_for(), Some("unknown"));
    }

    #[test]
    fn extensions_are_skipped() {
        let forwarded = Forwarded::parse("for=192.0.2.60;by=203.0.113.43;secret=_x").unwrap();
        assert_eq!(forwarded.forwarded_for(), Some("192.0.2.60"));
    }

    #[test]
    fn bad_parses() {
        assert!(Forwarded::parse("").is_err());
        assert!(Forwarded::parse("uh oh").is_err());
        assert!(Forwarded::parse("for=").is_err());
        assert!(Forwarded::parse(r#"for="unterminated"#).is_err());
        assert!(Forwarded::parse("for=a valid, for=b").is_err());
        assert!(Forwarded::parse("port=notaport").is_err());
    }

    #[test]
    fn x_headers_fall_back() {
        let headers: Headers = [
            ("x-forwarded-for", "192.0.2.43, 203.0.113.7"),
            ("x-forwarded-proto", "HTTPS"),
            ("x-forwarded-host", "example.com"),
        ]
        .into_iter()
        .collect();

        let forwarded = Forwarded::from_headers(&headers).unwrap().unwrap();
        assert_eq!(forwarded.forwarded_for(), Some("203.0.113.7"));
        assert_eq!(forwarded.proto(), Some("https"));
        assert_eq!(forwarded.host(), Some("example.com"));
    }

    #[test]
    fn x_ssl_on_means_https() {
        let headers: Headers = [("x-forwarded-ssl", "on")].into_iter().collect();
        let forwarded = Forwarded::from_headers(&headers).unwrap().unwrap();
        assert_eq!(forwarded.proto(), Some("https"));
    }

    #[test]
    fn forwarded_beats_x_headers() {
        let headers: Headers = [
            ("forwarded", "for=203.0.113.7"),
            ("x-forwarded-for", "192.0.2.43"),
        ]
        .into_iter()
        .collect();

        let forwarded = Forwarded::from_headers(&headers).unwrap().unwrap();
        assert_eq!(forwarded.forwarded_for(), Some("203.0.113.7"));
    }

    #[test]
    fn no_headers_is_none() {
        assert!(Forwarded::from_headers(&Headers::new()).unwrap().is_none());
    }
}
