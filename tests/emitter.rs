use futures_lite::{future::block_on, io::Cursor};
use indoc::formatdoc;
use pretty_assertions::assert_eq;
use quern::{
    Body, BodyStream, Chunk, Config, Context, Error, Headers, Method, Stopper, Version, SERVER,
};

const TEST_DATE: &str = "Tue, 21 Nov 2023 21:27:21 GMT";

fn context(method: Method) -> Context {
    let headers: Headers = [("host", "a")].into_iter().collect();
    let mut cx = Context::new(method, "/", Version::OneDotOne, headers, None, false);
    cx.response_headers_mut().insert("date", TEST_DATE);
    cx
}

async fn emit(mut cx: Context, config: &Config) -> String {
    let mut transport = Cursor::new(Vec::new());
    quern::emit(&mut cx, &mut transport, config).await.unwrap();
    String::from_utf8(transport.into_inner()).unwrap()
}

#[test]
fn bytes_body_gets_a_content_length() {
    block_on(async {
        let mut cx = context(Method::Get);
        cx.set_status(200);
        cx.set_response_body("hello world");
        let response = emit(cx, &Config::new()).await;
        assert_eq!(
            response,
            formatdoc! {"
                HTTP/1.1 200 OK\r
                content-length: 11\r
                date: {TEST_DATE}\r
                server: {SERVER}\r
                \r
                hello world"
            }
        );
    });
}

#[test]
fn head_writes_headers_and_zero_body_bytes() {
    block_on(async {
        let mut cx = context(Method::Head);
        cx.set_status(200);
        cx.set_response_body("hello world");
        let response = emit(cx, &Config::new()).await;
        assert!(response.contains("content-length: 11\r\n"));
        assert!(response.ends_with("\r\n\r\n"));
    });
}

#[test]
fn not_modified_sheds_entity_headers() {
    block_on(async {
        let mut cx = context(Method::Get);
        cx.set_status(304);
        cx.response_headers_mut().insert("content-type", "text/html");
        cx.response_headers_mut().insert("etag", "\"v1\"");
        cx.set_response_body("stale body");
        let response = emit(cx, &Config::new()).await;
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
fn stream_bodies_are_chunked_with_empty_chunks_suppressed() {
    block_on(async {
        let mut cx = context(Method::Get);
        cx.set_status(200);
        cx.set_response_body(Body::new_streaming(
            vec![
                Chunk::Data(b"hello ".to_vec()),
                Chunk::Data(Vec::new()),
                Chunk::Data(b"world".to_vec()),
            ]
            .into_iter(),
        ));
        let response = emit(cx, &Config::new()).await;
        assert!(response.contains("transfer-encoding: chunked\r\n"));
        assert!(!response.contains("content-length"));
        let body = response.split_once("\r\n\r\n").unwrap().1;
        assert_eq!(body, "6\r\nhello \r\n5\r\nworld\r\n0\r\n\r\n");
    });
}

#[test]
fn stream_file_chunks_are_spliced() {
    block_on(async {
        let path = std::env::temp_dir().join(format!("quern-splice-{}", std::process::id()));
        std::fs::write(&path, b"abcdef").unwrap();

        let mut cx = context(Method::Get);
        cx.set_status(200);
        cx.set_response_body(Body::new_streaming(
            vec![
                Chunk::Data(b"x".to_vec()),
                Chunk::File {
                    path: path.clone(),
                    offset: 1,
                    len: Some(3),
                },
            ]
            .into_iter(),
        ));
        let response = emit(cx, &Config::new()).await;
        std::fs::remove_file(path).ok();

        let body = response.split_once("\r\n\r\n").unwrap().1;
        assert_eq!(body, "1\r\nx\r\n3\r\nbcd\r\n0\r\n\r\n");
    });
}

#[test]
fn writer_bodies_are_chunked_in_send_order() {
    block_on(async {
        let mut cx = context(Method::Get);
        cx.set_status(200);
        cx.set_response_body(Body::new_writer(|sink| {
            sink.send("hello ");
            sink.finish("world");
        }));
        let response = emit(cx, &Config::new()).await;
        let body = response.split_once("\r\n\r\n").unwrap().1;
        assert_eq!(body, "6\r\nhello \r\n5\r\nworld\r\n0\r\n\r\n");
    });
}

#[test]
fn sized_stream_uses_fixed_framing() {
    block_on(async {
        let mut cx = context(Method::Get);
        cx.set_status(200);
        cx.set_response_body(Body::new_sized(5, |from, to| {
            Box::new(std::iter::once(Chunk::Data(
                b"01234"[from as usize..=to as usize].to_vec(),
            ))) as BodyStream
        }));
        let response = emit(cx, &Config::new()).await;
        assert!(response.contains("content-length: 5\r\n"));
        assert!(response.ends_with("\r\n\r\n01234"));
    });
}

#[test]
fn file_path_bodies_send_the_file() {
    block_on(async {
        let path = std::env::temp_dir().join(format!("quern-file-{}", std::process::id()));
        std::fs::write(&path, b"file contents").unwrap();

        let mut cx = context(Method::Get);
        cx.set_status(200);
        cx.set_response_body(Body::new_path(&path));
        let response = emit(cx, &Config::new()).await;
        std::fs::remove_file(path).ok();

        assert!(response.contains("content-length: 13\r\n"));
        assert!(response.ends_with("\r\n\r\nfile contents"));
    });
}

#[test]
fn bodyless_success_has_an_explicit_zero_length() {
    block_on(async {
        let mut cx = context(Method::Get);
        cx.set_status(200);
        let response = emit(cx, &Config::new()).await;
        assert!(response.contains("content-length: 0\r\n"));
    });
}

#[test]
fn cookies_emit_one_header_each() {
    block_on(async {
        let mut cx = context(Method::Get);
        cx.set_status(200);
        cx.add_cookie("a=1; Path=/");
        cx.add_cookie("b=2; HttpOnly");
        let response = emit(cx, &Config::new()).await;
        assert!(response.contains("set-cookie: a=1; Path=/\r\n"));
        assert!(response.contains("set-cookie: b=2; HttpOnly\r\n"));
    });
}

#[test]
fn existing_server_header_is_preserved() {
    block_on(async {
        let mut cx = context(Method::Get);
        cx.set_status(200);
        cx.response_headers_mut().insert("server", "custom/9");
        let response = emit(cx, &Config::new()).await;
        assert!(response.contains("server: custom/9\r\n"));
        assert!(!response.contains(SERVER));
    });
}

#[test]
fn stopped_emission_unwinds_with_closed() {
    block_on(async {
        let stopper = Stopper::new();
        stopper.stop();
        let config = Config::new().with_stopper(stopper);

        let mut cx = context(Method::Get);
        cx.set_status(200);
        cx.set_response_body("never sent");

        let mut transport = Cursor::new(Vec::new());
        let error = quern::emit(&mut cx, &mut transport, &config)
            .await
            .unwrap_err();
        assert!(matches!(error, Error::Closed));
        assert!(transport.into_inner().is_empty());
    });
}
