use futures_lite::{future::block_on, io::Cursor};
use indoc::formatdoc;
use pretty_assertions::assert_eq;
use quern::{
    Body, Config, Context, Controller, Headers, Method, Outcome, Scheme, TrustPolicy, Version,
    SERVER,
};

const TEST_DATE: &str = "Tue, 21 Nov 2023 21:27:21 GMT";

fn request(method: Method, path: &str, headers: &[(&'static str, &str)]) -> Context {
    let mut request_headers = Headers::new();
    request_headers.insert("host", "a");
    for (name, value) in headers {
        request_headers.insert(*name, value.to_string());
    }
    let mut cx = Context::new(method, path, Version::OneDotOne, request_headers, None, false);
    cx.response_headers_mut().insert("date", TEST_DATE);
    cx
}

async fn run(controller: &impl Controller, mut cx: Context) -> String {
    quern::execute(controller, &mut cx).await;
    let mut transport = Cursor::new(Vec::new());
    quern::emit(&mut cx, &mut transport, &Config::new())
        .await
        .unwrap();
    String::from_utf8(transport.into_inner()).unwrap()
}

struct Hi;

impl Controller for Hi {
    async fn represent(&self, _cx: &mut Context) -> Outcome<Option<Body>> {
        Ok(Some("hi".into()))
    }
}

#[test]
fn simple_get() {
    block_on(async {
        let response = run(&Hi, request(Method::Get, "/x", &[])).await;
        assert_eq!(
            response,
            formatdoc! {"
                HTTP/1.1 200 OK\r
                content-length: 2\r
                content-type: text/html\r
                date: {TEST_DATE}\r
                server: {SERVER}\r
                \r
                hi"
            }
        );
    });
}

struct Digits;

impl Controller for Digits {
    async fn represent(&self, _cx: &mut Context) -> Outcome<Option<Body>> {
        Ok(Some("0123456789".into()))
    }
}

#[test]
fn suffix_range() {
    block_on(async {
        let response = run(
            &Digits,
            request(Method::Get, "/x", &[("range", "bytes=-3")]),
        )
        .await;
        assert_eq!(
            response,
            formatdoc! {"
                HTTP/1.1 206 Partial Content\r
                content-length: 3\r
                content-range: bytes 7-9/10\r
                content-type: text/html\r
                date: {TEST_DATE}\r
                server: {SERVER}\r
                \r
                789"
            }
        );
    });
}

#[test]
fn multipart_range() {
    block_on(async {
        let response = run(
            &Digits,
            request(Method::Get, "/x", &[("range", "bytes=0-0,-1")]),
        )
        .await;

        let (head, body) = response.split_once("\r\n\r\n").unwrap();
        assert!(head.starts_with("HTTP/1.1 206 Partial Content\r\n"));

        let boundary = head
            .lines()
            .find_map(|line| line.strip_prefix("content-type: multipart/byteranges; boundary="))
            .expect("a multipart content type with a boundary");
        assert_eq!(boundary.len(), 16);
        assert!(boundary.chars().all(|c| c.is_ascii_hexdigit()));

        assert_eq!(
            body,
            formatdoc! {"
                --{boundary}\r
                content-type: text/html\r
                content-range: bytes 0-0/10\r
                \r
                0\r
                --{boundary}\r
                content-type: text/html\r
                content-range: bytes 9-9/10\r
                \r
                9\r
                --{boundary}--\r
            "}
        );

        let content_length: usize = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length: "))
            .expect("a content-length")
            .parse()
            .unwrap();
        assert_eq!(content_length, body.len());
    });
}

struct Tagged;

impl Controller for Tagged {
    async fn generate_etag(&self, _cx: &mut Context) -> Outcome<Option<String>> {
        Ok(Some("v1".into()))
    }

    async fn represent(&self, _cx: &mut Context) -> Outcome<Option<Body>> {
        Ok(Some("body".into()))
    }
}

#[test]
fn conditional_get_not_modified() {
    block_on(async {
        let response = run(
            &Tagged,
            request(Method::Get, "/x", &[("if-none-match", "\"v1\"")]),
        )
        .await;
        assert_eq!(
            response,
            formatdoc! {"
                HTTP/1.1 304 Not Modified\r
                date: {TEST_DATE}\r
                etag: \"v1\"\r
                server: {SERVER}\r
                \r
            "}
        );
    });
}

#[test]
fn trusted_proxy_rewrites_identity() {
    let headers: Headers = [
        ("host", "internal"),
        (
            "forwarded",
            "for=203.0.113.7;proto=https;host=a.example;port=8443",
        ),
    ]
    .into_iter()
    .collect();
    let mut cx = Context::new(
        Method::Get,
        "/",
        Version::OneDotOne,
        headers,
        Some("10.0.0.5".parse().unwrap()),
        false,
    );

    quern::proxy::apply(&mut cx, &TrustPolicy::Local);

    assert!(cx.via_proxy());
    assert_eq!(cx.remote(), "203.0.113.7");
    assert_eq!(cx.remote_ip(), Some("203.0.113.7".parse().unwrap()));
    assert_eq!(cx.scheme(), Scheme::Https);
    assert_eq!(cx.host(), Some("a.example"));
    assert_eq!(cx.port(), 8443);
}

#[test]
fn untrusted_proxy_is_ignored() {
    let headers: Headers = [
        ("host", "internal"),
        (
            "forwarded",
            "for=203.0.113.7;proto=https;host=a.example;port=8443",
        ),
    ]
    .into_iter()
    .collect();
    let mut cx = Context::new(
        Method::Get,
        "/",
        Version::OneDotOne,
        headers,
        Some("203.0.113.9".parse().unwrap()),
        false,
    );

    quern::proxy::apply(&mut cx, &TrustPolicy::Local);

    assert!(!cx.via_proxy());
    assert_eq!(cx.remote(), "203.0.113.9");
    assert_eq!(cx.remote_ip(), Some("203.0.113.9".parse().unwrap()));
    assert_eq!(cx.scheme(), Scheme::Http);
    assert_eq!(cx.host(), Some("internal"));
    assert_eq!(cx.port(), 80);
}
