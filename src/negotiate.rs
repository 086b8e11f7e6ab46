//! q-valued proactive negotiation for the four Accept dimensions.
//!
//! Selection order everywhere: highest q, then most specific match,
//! then first offered by the controller.

use encoding_rs::Encoding;
use std::borrow::Cow;

/// one element of a comma-separated Accept-style header
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Entry {
    pub(crate) value: String,
    pub(crate) q: u16,
}

/// q values are scaled by 1000 so ordering stays integral
pub(crate) fn parse_q(s: &str) -> Option<u16> {
    let s = s.trim();
    let (int, frac) = s.split_once('.').unwrap_or((s, ""));
    let int: u16 = int.parse().ok()?;
    if int > 1 || frac.len() > 3 || frac.chars().any(|c| !c.is_ascii_digit()) {
        return None;
    }
    let mut q = int * 1000;
    for (i, c) in frac.chars().enumerate() {
        q += (c as u16 - '0' as u16) * 10u16.pow(2 - i as u32);
    }
    (q <= 1000).then_some(q)
}

/// Parse a comma-separated header of `value[;params]` elements,
/// extracting the `q` parameter. Unparseable elements are skipped.
pub(crate) fn parse_accept(header: &str) -> Vec<Entry> {
    header
        .split(',')
        .filter_map(|element| {
            let mut parts = element.split(';');
            let value = parts.next()?.trim().to_ascii_lowercase();
            if value.is_empty() {
                return None;
            }
            let mut q = 1000;
            for param in parts {
                if let Some((name, qvalue)) = param.split_once('=') {
                    if name.trim().eq_ignore_ascii_case("q") {
                        q = parse_q(qvalue)?;
                    }
                }
            }
            Some(Entry { value, q })
        })
        .collect()
}

fn split_media(value: &str) -> (&str, &str) {
    let base = value.split(';').next().unwrap_or_default().trim();
    base.split_once('/').unwrap_or((base, ""))
}

/// How well a media range matches an offered type: exact beats
/// `type/*` beats `*/*`; no match is `None`.
fn media_specificity(range: &str, offered: &str) -> Option<u8> {
    let (rt, rs) = split_media(range);
    let (ot, os) = split_media(offered);
    match (rt, rs) {
        ("*", "*") | ("*", "") => Some(0),
        _ if rt == ot && rs == "*" => Some(1),
        _ if rt == ot && rs == os => Some(2),
        _ => None,
    }
}

/// The best of the offered media types against an `Accept` header, or
/// `None` when nothing offered is acceptable.
pub(crate) fn best_media_type(provided: &[Cow<'static, str>], header: &str) -> Option<String> {
    let ranges = parse_accept(header);
    let mut best: Option<(u16, u8, &str)> = None;

    for offered in provided {
        let offered = offered.as_ref();
        let candidate = ranges
            .iter()
            .filter_map(|range| {
                media_specificity(&range.value, offered).map(|spec| (range.q, spec))
            })
            .max();

        if let Some((q, spec)) = candidate {
            if q > 0 && best.map(|(bq, bs, _)| (q, spec) > (bq, bs)).unwrap_or(true) {
                best = Some((q, spec, offered));
            }
        }
    }

    best.map(|(_, _, offered)| offered.to_string())
}

/// The languages the client will take, best first, unacceptable ones
/// dropped. The controller is then asked about each in turn.
pub(crate) fn acceptable_languages(header: &str) -> Vec<String> {
    let mut entries: Vec<(usize, Entry)> = parse_accept(header)
        .into_iter()
        .filter(|e| e.q > 0)
        .enumerate()
        .collect();
    entries.sort_by_key(|(position, entry)| (u16::MAX - entry.q, *position));
    entries.into_iter().map(|(_, e)| e.value).collect()
}

fn charset_matches(label: &str, provided: &str) -> bool {
    if label == "*" || label.eq_ignore_ascii_case(provided) {
        return true;
    }
    match (
        Encoding::for_label(label.as_bytes()),
        Encoding::for_label(provided.as_bytes()),
    ) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// The best of the provided charsets against an `Accept-Charset`
/// header. Charsets absent from the header are unacceptable unless a
/// `*` entry admits them.
pub(crate) fn best_charset(provided: &[Cow<'static, str>], header: &str) -> Option<String> {
    let entries = parse_accept(header);
    let mut best: Option<(u16, &str)> = None;

    for offered in provided {
        let offered = offered.as_ref();
        let q = entries
            .iter()
            .filter(|e| charset_matches(&e.value, offered))
            .map(|e| e.q)
            .max()
            .unwrap_or(0);

        if q > 0 && best.map(|(bq, _)| q > bq).unwrap_or(true) {
            best = Some((q, offered));
        }
    }

    best.map(|(_, offered)| offered.to_string())
}

/// The best of the provided content encodings against an
/// `Accept-Encoding` header. `identity` is acceptable unless
/// explicitly refused (`identity;q=0` or an unmatched `*;q=0`).
pub(crate) fn best_encoding(provided: &[Cow<'static, str>], header: &str) -> Option<String> {
    let entries = parse_accept(header);
    let star = entries.iter().find(|e| e.value == "*").map(|e| e.q);
    let mut best: Option<(u16, bool, &str)> = None;

    for offered in provided {
        let offered = offered.as_ref();
        let listed = entries
            .iter()
            .find(|e| e.value.eq_ignore_ascii_case(offered))
            .map(|e| e.q);
        let q = listed
            .or(star)
            .unwrap_or(if offered.eq_ignore_ascii_case("identity") {
                1000
            } else {
                0
            });
        if q == 0 {
            continue;
        }

        // at equal q, a coding the client named beats identity's
        // implicit default; otherwise first offered keeps ties
        let explicit = listed.is_some();
        let replaces = match best {
            None => true,
            Some((best_q, best_explicit, _)) => {
                q > best_q || (q == best_q && explicit && !best_explicit)
            }
        };
        if replaces {
            best = Some((q, explicit, offered));
        }
    }

    best.map(|(_, _, offered)| offered.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    fn provided(values: &[&'static str]) -> Vec<Cow<'static, str>> {
        values.iter().map(|v| Cow::Borrowed(*v)).collect()
    }

    #[test]
    fn q_parsing() {
        assert_eq!(parse_q("1"), Some(1000));
        assert_eq!(parse_q("1.000"), Some(1000));
        assert_eq!(parse_q("0.7"), Some(700));
        assert_eq!(parse_q("0.05"), Some(50));
        assert_eq!(parse_q("0"), Some(0));
        assert_eq!(parse_q("1.5"), None);
        assert_eq!(parse_q("0.1234"), None);
        assert_eq!(parse_q("abc"), None);
    }

    #[test]
    fn highest_q_wins() {
        assert_eq!(
            best_media_type(
                &provided(&["text/html", "application/json"]),
                "application/json;q=0.9, text/html;q=0.8",
            ),
            Some("application/json".into())
        );
    }

    #[test]
    fn specificity_breaks_q_ties() {
        assert_eq!(
            best_media_type(
                &provided(&["text/plain", "text/html"]),
                "text/*, text/html",
            ),
            Some("text/html".into())
        );
    }

    #[test]
    fn first_offered_breaks_full_ties() {
        assert_eq!(
            best_media_type(&provided(&["text/html", "text/plain"]), "text/*"),
            Some("text/html".into())
        );
    }

    #[test]
    fn wildcard_accepts_anything() {
        assert_eq!(
            best_media_type(&provided(&["application/octet-stream"]), "*/*"),
            Some("application/octet-stream".into())
        );
    }

    #[test]
    fn q_zero_refuses() {
        assert_eq!(
            best_media_type(&provided(&["text/html"]), "text/html;q=0"),
            None
        );
        assert_eq!(best_media_type(&provided(&["text/html"]), "image/png"), None);
    }

    #[test]
    fn languages_sorted_by_preference() {
        assert_eq!(
            acceptable_languages("en;q=0.8, da, de;q=0"),
            vec!["da".to_string(), "en".to_string()]
        );
    }

    #[test]
    fn charset_labels_canonicalize() {
        assert_eq!(
            best_charset(&provided(&["utf-8"]), "UTF8"),
            Some("utf-8".into())
        );
        assert_eq!(
            best_charset(&provided(&["utf-8", "iso-8859-1"]), "iso-8859-1, *;q=0.1"),
            Some("iso-8859-1".into())
        );
        assert_eq!(best_charset(&provided(&["utf-8"]), "koi8-r"), None);
    }

    #[test]
    fn identity_is_implicitly_acceptable() {
        assert_eq!(
            best_encoding(&provided(&["identity"]), "gzip, br"),
            Some("identity".into())
        );
        assert_eq!(best_encoding(&provided(&["identity"]), "identity;q=0"), None);
        assert_eq!(best_encoding(&provided(&["identity"]), "*;q=0"), None);
        assert_eq!(
            best_encoding(&provided(&["identity", "gzip"]), "gzip"),
            Some("gzip".into())
        );
    }

    #[test]
    fn explicitly_equal_codings_keep_offer_order() {
        assert_eq!(
            best_encoding(&provided(&["gzip", "identity"]), "identity, gzip"),
            Some("gzip".into())
        );
        assert_eq!(
            best_encoding(&provided(&["identity", "gzip"]), "gzip;q=0.5, identity;q=0.9"),
            Some("identity".into())
        );
    }
}
