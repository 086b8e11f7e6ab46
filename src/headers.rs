use smartcow::SmartCow;
use smartstring::alias::String as SmartString;
use std::{
    borrow::Cow,
    cmp::Ordering,
    collections::BTreeMap,
    fmt::{self, Debug, Display, Formatter},
    hash::{Hash, Hasher},
    ops::Deref,
};

/// A case-insensitive header name. Names are lowercased on
/// construction, so lookups and wire output are always lowercase.
#[derive(Clone)]
pub struct HeaderName(SmartCow<'static>);

impl HeaderName {
    fn lowercase(s: &str) -> SmartString {
        s.chars().map(|c| c.to_ascii_lowercase()).collect()
    }
}

impl From<&'static str> for HeaderName {
    fn from(s: &'static str) -> Self {
        if s.chars().all(|c| !c.is_ascii_uppercase()) {
            Self(SmartCow::Borrowed(s))
        } else {
            Self(SmartCow::Owned(Self::lowercase(s)))
        }
    }
}

impl From<String> for HeaderName {
    fn from(s: String) -> Self {
        Self(SmartCow::Owned(Self::lowercase(&s)))
    }
}

impl AsRef<str> for HeaderName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for HeaderName {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl PartialEq for HeaderName {
    fn eq(&self, other: &Self) -> bool {
        self.as_ref() == other.as_ref()
    }
}
impl Eq for HeaderName {}

impl PartialOrd for HeaderName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for HeaderName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_ref().cmp(other.as_ref())
    }
}

impl Hash for HeaderName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_ref().hash(state);
    }
}

impl Debug for HeaderName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(self.as_ref(), f)
    }
}

impl Display for HeaderName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self.as_ref(), f)
    }
}

/// The right hand side of a single `name: value` pair. Values are
/// utf8; the transport layer is responsible for rejecting anything
/// else before it reaches the engine.
#[derive(Clone, PartialEq, Eq)]
pub struct HeaderValue(SmartCow<'static>);

impl HeaderValue {
    /// this value as a str
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for HeaderValue {
    fn from(s: &'static str) -> Self {
        Self(SmartCow::Borrowed(s))
    }
}

impl From<String> for HeaderValue {
    fn from(s: String) -> Self {
        Self(SmartCow::Owned(s.as_str().into()))
    }
}

impl From<Cow<'static, str>> for HeaderValue {
    fn from(s: Cow<'static, str>) -> Self {
        match s {
            Cow::Borrowed(b) => b.into(),
            Cow::Owned(o) => o.into(),
        }
    }
}

impl AsRef<str> for HeaderValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Debug for HeaderValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(self.as_str(), f)
    }
}

impl Display for HeaderValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The engine's header map type.
///
/// Keys are case-insensitive and stored lowercased; a name can carry
/// several values (`append`). `Display` writes the wire form,
/// `name: value\r\n` per value, in name order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[must_use]
pub struct Headers(BTreeMap<HeaderName, Vec<HeaderValue>>);

impl Headers {
    /// constructs an empty header map
    pub fn new() -> Self {
        Self::default()
    }

    /// replaces any values for this name with the provided value
    pub fn insert(&mut self, name: impl Into<HeaderName>, value: impl Into<HeaderValue>) {
        self.0.insert(name.into(), vec![value.into()]);
    }

    /// adds a value for this name, retaining any already present
    pub fn append(&mut self, name: impl Into<HeaderName>, value: impl Into<HeaderValue>) {
        self.0.entry(name.into()).or_default().push(value.into());
    }

    /// inserts the value only if the name is not already present
    pub fn try_insert(&mut self, name: impl Into<HeaderName>, value: impl Into<HeaderValue>) {
        self.0.entry(name.into()).or_insert_with(|| vec![value.into()]);
    }

    /// the first value for this name, if present
    pub fn get_str(&self, name: impl Into<HeaderName>) -> Option<&str> {
        self.0
            .get(&name.into())
            .and_then(|values| values.first())
            .map(HeaderValue::as_str)
    }

    /// all values for this name
    pub fn get_values(&self, name: impl Into<HeaderName>) -> &[HeaderValue] {
        self.0
            .get(&name.into())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// whether any value is present for this name
    pub fn has_header(&self, name: impl Into<HeaderName>) -> bool {
        self.0.contains_key(&name.into())
    }

    /// whether the first value for this name matches, ignoring ascii case
    pub fn eq_ignore_ascii_case(&self, name: impl Into<HeaderName>, value: &str) -> bool {
        self.get_str(name)
            .map(|v| v.eq_ignore_ascii_case(value))
            .unwrap_or_default()
    }

    /// removes and returns any values for this name
    pub fn remove(&mut self, name: impl Into<HeaderName>) -> Option<Vec<HeaderValue>> {
        self.0.remove(&name.into())
    }

    /// iterate over `(name, values)` pairs in name order
    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName, &[HeaderValue])> {
        self.0.iter().map(|(n, v)| (n, v.as_slice()))
    }

    /// the number of distinct header names
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// whether this map contains no headers
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for Headers {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (n, values) in &self.0 {
            for v in values {
                f.write_fmt(format_args!("{n}: {v}\r\n"))?;
            }
        }
        Ok(())
    }
}

impl<N, V> FromIterator<(N, V)> for Headers
where
    N: Into<HeaderName>,
    V: Into<HeaderValue>,
{
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        let mut headers = Self::new();
        for (n, v) in iter {
            headers.append(n, v);
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::Headers;

    #[test]
    fn lookups_are_case_insensitive() {
        let mut headers = Headers::new();
        headers.insert("Content-Type", "text/html");
        assert_eq!(headers.get_str("content-type"), Some("text/html"));
        assert_eq!(headers.get_str("CONTENT-TYPE"), Some("text/html"));
        assert!(headers.has_header("Content-type"));
    }

    #[test]
    fn append_retains_and_insert_replaces() {
        let mut headers = Headers::new();
        headers.append("set-cookie", "a=1");
        headers.append("Set-Cookie", "b=2");
        assert_eq!(headers.get_values("set-cookie").len(), 2);

        headers.insert("set-cookie", "c=3");
        assert_eq!(headers.get_values("set-cookie").len(), 1);
    }

    #[test]
    fn try_insert_only_fills_vacancies() {
        let mut headers = Headers::new();
        headers.try_insert("server", "a");
        headers.try_insert("server", "b");
        assert_eq!(headers.get_str("server"), Some("a"));
    }

    #[test]
    fn display_is_wire_form_in_name_order() {
        let mut headers = Headers::new();
        headers.insert("Server", "quern");
        headers.insert("Content-Length", "0");
        assert_eq!(
            headers.to_string(),
            "content-length: 0\r\nserver: quern\r\n"
        );
    }
}
