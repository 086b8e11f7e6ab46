//! `Range` header parsing, normalization against a known body size,
//! and multipart/byteranges planning.

/// One raw element of a `Range: bytes=` header: suffix (`-n`), open
/// (`a-`), or closed (`a-b`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ByteRange {
    pub(crate) start: Option<u64>,
    pub(crate) end: Option<u64>,
}

/// Parse a `Range` header value. `None` means the header is not a
/// bytes range spec at all; individual elements that do not parse are
/// dropped, so `Some(vec![])` is possible.
pub(crate) fn parse(header: &str) -> Option<Vec<ByteRange>> {
    let spec = header.trim().strip_prefix("bytes=")?;

    Some(
        spec.split(',')
            .filter_map(|element| {
                let (start, end) = element.trim().split_once('-')?;
                match (start.is_empty(), end.is_empty()) {
                    (true, false) => Some(ByteRange {
                        start: None,
                        end: Some(end.parse().ok()?),
                    }),
                    (false, true) => Some(ByteRange {
                        start: Some(start.parse().ok()?),
                        end: None,
                    }),
                    (false, false) => Some(ByteRange {
                        start: Some(start.parse().ok()?),
                        end: Some(end.parse().ok()?),
                    }),
                    (true, true) => None,
                }
            })
            .collect(),
    )
}

/// Normalize raw ranges against the body size into concrete
/// `(offset, length)` parts. Unsatisfiable and empty parts are
/// dropped; an oversized suffix takes the whole body.
pub(crate) fn normalize(parts: &[ByteRange], size: u64) -> Vec<(u64, u64)> {
    parts
        .iter()
        .filter_map(|part| match (part.start, part.end) {
            (None, Some(n)) if n > size => (size > 0).then_some((0, size)),
            (None, Some(n)) => (n > 0).then_some((size - n, n)),
            (Some(a), None) if a < size => Some((a, size - a)),
            (Some(a), Some(b)) if a <= b && b < size => Some((a, b - a + 1)),
            _ => None,
        })
        .collect()
}

/// A boundary for a multipart/byteranges body: 8 random bytes,
/// hex-encoded. It only has to be unique within the response; on rng
/// failure we degrade to a pseudorandom source rather than failing
/// the request.
pub(crate) fn boundary() -> String {
    let mut bytes = [0u8; 8];
    if getrandom::getrandom(&mut bytes).is_err() {
        log::info!("system rng unavailable; multipart boundary from fallback prng");
        for byte in &mut bytes {
            *byte = fastrand::u8(..);
        }
    }
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}

/// The staged outcome of range negotiation: which byte spans of the
/// representation to emit, against which total, and with which part
/// content type. `boundary` is present iff the response is multipart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangePlan {
    pub(crate) total: u64,
    pub(crate) parts: Vec<(u64, u64)>,
    pub(crate) boundary: Option<String>,
    pub(crate) content_type: String,
}

impl RangePlan {
    pub(crate) fn new(parts: Vec<(u64, u64)>, total: u64, content_type: String) -> Self {
        let boundary = (parts.len() >= 2).then(boundary);
        Self {
            total,
            parts,
            boundary,
            content_type,
        }
    }

    pub(crate) fn is_multipart(&self) -> bool {
        self.boundary.is_some()
    }

    /// the preamble before one part's payload
    pub(crate) fn part_header(&self, offset: u64, len: u64) -> String {
        let boundary = self.boundary.as_deref().unwrap_or_default();
        format!(
            "--{boundary}\r\ncontent-type: {}\r\ncontent-range: bytes {offset}-{}/{}\r\n\r\n",
            self.content_type,
            offset + len - 1,
            self.total,
        )
    }

    /// the closing delimiter after the last part
    pub(crate) fn closing(&self) -> String {
        format!("--{}--\r\n", self.boundary.as_deref().unwrap_or_default())
    }

    /// The exact body length. For multipart this is the sum of every
    /// preamble, payload, and trailing CRLF, plus the closing
    /// delimiter.
    pub(crate) fn content_length(&self) -> u64 {
        if self.is_multipart() {
            self.parts
                .iter()
                .map(|&(offset, len)| self.part_header(offset, len).len() as u64 + len + 2)
                .sum::<u64>()
                + self.closing().len() as u64
        } else {
            self.parts.first().map(|&(_, len)| len).unwrap_or_default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(header: &str) -> Vec<ByteRange> {
        parse(header).unwrap()
    }

    #[test]
    fn parse_forms() {
        assert_eq!(
            bounds("bytes=0-499"),
            vec![ByteRange {
                start: Some(0),
                end: Some(499)
            }]
        );
        assert_eq!(
            bounds("bytes=500-"),
            vec![ByteRange {
                start: Some(500),
                end: None
            }]
        );
        assert_eq!(
            bounds("bytes=-300"),
            vec![ByteRange {
                start: None,
                end: Some(300)
            }]
        );
        assert_eq!(bounds("bytes=0-0,-1").len(), 2);
    }

    #[test]
    fn parse_rejects_other_units_and_garbage() {
        assert!(parse("items=0-4").is_none());
        assert!(parse("0-4").is_none());
        assert_eq!(bounds("bytes=a-b, -, 5"), vec![]);
        // good elements survive bad neighbors
        assert_eq!(bounds("bytes=a-b,0-4").len(), 1);
    }

    #[test]
    fn parse_is_idempotent() {
        let header = "bytes=0-0,-1,7-";
        assert_eq!(parse(header), parse(header));
    }

    #[test]
    fn normalization_table() {
        let size = 10;
        let n = |s: Option<u64>, e: Option<u64>| normalize(&[ByteRange { start: s, end: e }], size);

        // suffix within size
        assert_eq!(n(None, Some(3)), vec![(7, 3)]);
        // suffix over size takes the whole body
        assert_eq!(n(None, Some(100)), vec![(0, 10)]);
        // open-ended from a valid offset
        assert_eq!(n(Some(4), None), vec![(4, 6)]);
        // open-ended from beyond the end is dropped
        assert_eq!(n(Some(10), None), vec![]);
        // closed, inclusive
        assert_eq!(n(Some(2), Some(5)), vec![(2, 4)]);
        // closed with end beyond the body is dropped
        assert_eq!(n(Some(2), Some(10)), vec![]);
        // inverted is dropped
        assert_eq!(n(Some(5), Some(2)), vec![]);
        // zero-length suffix is dropped
        assert_eq!(n(None, Some(0)), vec![]);
    }

    #[test]
    fn normalize_keeps_order_and_drops_invalid() {
        let parts = bounds("bytes=0-0,50-60,-1");
        assert_eq!(normalize(&parts, 10), vec![(0, 1), (9, 1)]);
    }

    #[test]
    fn boundary_is_sixteen_hex_chars() {
        let boundary = boundary();
        assert_eq!(boundary.len(), 16);
        assert!(boundary.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(boundary, super::boundary());
    }

    #[test]
    fn multipart_length_is_exact() {
        let plan = RangePlan::new(vec![(0, 1), (9, 1)], 10, "text/html".into());
        assert!(plan.is_multipart());

        let mut body = Vec::new();
        for &(offset, len) in &plan.parts {
            body.extend_from_slice(plan.part_header(offset, len).as_bytes());
            body.extend_from_slice(&vec![b'x'; len as usize]);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(plan.closing().as_bytes());

        assert_eq!(body.len() as u64, plan.content_length());
    }

    #[test]
    fn single_part_length_is_the_part() {
        let plan = RangePlan::new(vec![(7, 3)], 10, "text/html".into());
        assert!(!plan.is_multipart());
        assert_eq!(plan.content_length(), 3);
    }
}
