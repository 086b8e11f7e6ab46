use crate::Error;
use std::{
    fmt::{self, Display},
    str::FromStr,
};

/// HTTP request methods recognized by the engine.
///
/// Methods are compared byte-exact as uppercase ascii; `get` is not a
/// method. See [RFC7231, Section 4](https://tools.ietf.org/html/rfc7231#section-4)
/// and [RFC4918, Section 9.3](https://tools.ietf.org/html/rfc4918#section-9.3)
/// for MKCOL.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum Method {
    /// The CONNECT method requests a tunnel to the origin identified by
    /// the request target.
    Connect,

    /// The DELETE method requests that the origin server remove the
    /// association between the target resource and its current
    /// functionality.
    Delete,

    /// The GET method requests transfer of a current selected
    /// representation for the target resource.
    Get,

    /// The HEAD method is identical to GET except that the server MUST
    /// NOT send a message body in the response.
    Head,

    /// The MKCOL method creates a new collection resource at the
    /// location specified by the request target.
    Mkcol,

    /// The OPTIONS method requests information about the communication
    /// options available for the target resource.
    Options,

    /// The PATCH method requests that a set of changes described in the
    /// request entity be applied to the target resource.
    Patch,

    /// The POST method requests that the target resource process the
    /// representation enclosed in the request.
    Post,

    /// The PUT method requests that the state of the target resource be
    /// created or replaced with the enclosed representation.
    Put,

    /// The TRACE method requests a remote, application-level loop-back
    /// of the request message.
    Trace,
}

impl Method {
    /// the uppercase wire representation of this method
    pub fn as_str(&self) -> &'static str {
        use Method::*;
        match self {
            Connect => "CONNECT",
            Delete => "DELETE",
            Get => "GET",
            Head => "HEAD",
            Mkcol => "MKCOL",
            Options => "OPTIONS",
            Patch => "PATCH",
            Post => "POST",
            Put => "PUT",
            Trace => "TRACE",
        }
    }

    /// true for GET and HEAD
    pub fn is_read(&self) -> bool {
        matches!(self, Method::Get | Method::Head)
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use Method::*;
        match s {
            "CONNECT" => Ok(Connect),
            "DELETE" => Ok(Delete),
            "GET" => Ok(Get),
            "HEAD" => Ok(Head),
            "MKCOL" => Ok(Mkcol),
            "OPTIONS" => Ok(Options),
            "PATCH" => Ok(Patch),
            "POST" => Ok(Post),
            "PUT" => Ok(Put),
            "TRACE" => Ok(Trace),
            _ => Err(Error::UnrecognizedMethod(s.into())),
        }
    }
}
