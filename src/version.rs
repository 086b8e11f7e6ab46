use std::fmt::{self, Display};

/// The http protocol version of a request.
///
/// The engine speaks http/1.x only; the transport rejects anything
/// else before a context is built.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd, Default)]
#[non_exhaustive]
pub enum Version {
    /// HTTP/1.0
    OneDotZero,

    /// HTTP/1.1
    #[default]
    OneDotOne,
}

impl Version {
    /// the wire representation of this version, as it appears in the
    /// status line
    pub fn as_str(&self) -> &'static str {
        match self {
            Version::OneDotZero => "HTTP/1.0",
            Version::OneDotOne => "HTTP/1.1",
        }
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
