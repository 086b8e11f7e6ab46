#![forbid(unsafe_code)]
#![deny(
    clippy::dbg_macro,
    missing_copy_implementations,
    rustdoc::missing_crate_level_docs,
    missing_debug_implementations,
    nonstandard_style,
    unused_qualifications
)]
#![warn(missing_docs)]
#![allow(async_fn_in_trait, clippy::module_name_repetitions)]
/*!
This crate is an http/1.1 resource-processing engine. It sits between
a low-level http server, which parses requests and owns the
connection, and resource controllers, which answer domain questions
about one resource. Per request it runs three stages:

1. the proxy front door weighs `Forwarded` / `X-Forwarded-*` claims
   against a trust policy and fixes the authoritative
   scheme/host/port/remote,
2. the decision graph negotiates content type, language, charset and
   encoding, evaluates preconditions and conflicts, and dispatches
   reads, writes, creates and deletes to the controller,
3. the emitter frames the chosen body source onto the transport,
   including range slices, multipart/byteranges, chunked streams, and
   file-backed bodies.

## Example

```
use futures_lite::io::Cursor;
use quern::{Body, Config, Context, Controller, Headers, Method, Outcome, Version};

struct Hello;

impl Controller for Hello {
    async fn represent(&self, _cx: &mut Context) -> Outcome<Option<Body>> {
        Ok(Some("hello world".into()))
    }
}

futures_lite::future::block_on(async {
    let headers: Headers = [("host", "example.com")].into_iter().collect();
    let cx = Context::new(Method::Get, "/", Version::OneDotOne, headers, None, false);

    let mut transport = Cursor::new(Vec::new());
    let cx = quern::handle(&Hello, cx, &mut transport, &Config::new())
        .await
        .unwrap();

    assert_eq!(cx.status(), Some(200));
    let response = String::from_utf8(transport.into_inner()).unwrap();
    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(response.ends_with("hello world"));
});
```

The stages are also exposed individually as [`proxy::apply`],
[`execute`], and [`emit`] for servers that need to interleave their
own work between them.
*/

mod body;
pub use body::{Body, BodyStream, Chunk, RangeProducer, WriterFn, WriterSink};

mod config;
pub use config::{Config, SendfileMode, SERVER};

mod context;
pub use context::{Context, Scheme};

mod controller;
pub use controller::{Authorized, CharsetsProvided, Controller, Interrupt, Outcome};

mod emitter;
pub use emitter::emit;

mod engine;
pub use engine::execute;

mod error;
pub use error::{Error, Result};

mod forwarded;
pub use forwarded::{Forwarded, ParseError};

mod headers;
pub use headers::{HeaderName, HeaderValue, Headers};

mod method;
pub use method::Method;

mod negotiate;
mod parse_utils;

/// The proxy-trust policy and the authoritative-identity rewrite.
pub mod proxy;
pub use proxy::TrustPolicy;

mod range;
pub use range::RangePlan;

mod state_set;
pub use state_set::StateSet;

mod status;
pub use status::canonical_reason;

mod version;
pub use version::Version;

pub use stopper::Stopper;

use futures_lite::AsyncWrite;

/**
Processes one request end to end: front door, decision graph,
emitter.

The context comes back out so the server can inspect the final status
for logging and decide connection reuse.

# Errors

Transport and file I/O failures while emitting are returned as-is; no
further response bytes are written for this request. Everything the
controller does wrong is already mapped to a status code before the
emitter runs.
*/
pub async fn handle<C, T>(
    controller: &C,
    mut cx: Context,
    transport: &mut T,
    config: &Config,
) -> Result<Context>
where
    C: Controller,
    T: AsyncWrite + Unpin,
{
    proxy::apply(&mut cx, config.proxy_trust());
    execute(controller, &mut cx).await;
    emit(&mut cx, transport, config).await?;
    Ok(cx)
}
