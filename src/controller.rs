use crate::{Body, Context, Method};
use std::{borrow::Cow, time::SystemTime};

/// A controller callback's way of cutting the decision graph short.
///
/// `Halt(code)` finishes the response with that status immediately;
/// `Error(reason)` takes the 500 path. Either way `finish_request` is
/// still invoked and the emitter still runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interrupt {
    /// short-circuit with this status code
    Halt(u16),
    /// something went wrong; respond 500
    Error(String),
}

/// What a controller callback returns: a value, or an [`Interrupt`].
pub type Outcome<T> = Result<T, Interrupt>;

/// The answer to [`Controller::is_authorized`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorized {
    /// the request may proceed
    Granted,
    /// respond `401` with this `WWW-Authenticate` challenge
    Challenge(String),
}

/// The answer to [`Controller::charsets_provided`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CharsetsProvided {
    /// skip charset negotiation entirely; no `; charset=` is appended
    /// to the content type
    #[default]
    NoCharset,
    /// negotiate `Accept-Charset` against these charsets, in
    /// preference order
    Provided(Vec<Cow<'static, str>>),
}

/**
# The resource controller interface.

A controller answers domain questions about one resource: does it
exist, who may touch it, which representations does it have, what
happens on write. Every callback is optional; the default bodies below
are the engine's built-in answers, so an empty `impl Controller for
MyResource {}` serves `GET`/`HEAD` of an empty `text/html` resource.

Callbacks receive the mutable request [`Context`] and may evolve their
own state through [`Context::state_mut`]. Any callback can return
`Err(Interrupt::Halt(code))` or `Err(Interrupt::Error(reason))` to cut
the graph short.

```
use quern::{Body, Context, Controller, Outcome};

struct Greeting;

impl Controller for Greeting {
    async fn represent(&self, _cx: &mut Context) -> Outcome<Option<Body>> {
        Ok(Some("hello world".into()))
    }
}
```
*/
#[allow(unused_variables)]
pub trait Controller: Send + Sync + 'static {
    /// whether the service is up at all; `false` responds `503`
    async fn service_available(&self, cx: &mut Context) -> Outcome<bool> {
        Ok(true)
    }

    /// the methods this service recognizes; anything else is `501`
    async fn known_methods(&self, cx: &mut Context) -> Outcome<Vec<Method>> {
        Ok(vec![
            Method::Get,
            Method::Head,
            Method::Post,
            Method::Put,
            Method::Delete,
            Method::Trace,
            Method::Connect,
            Method::Options,
        ])
    }

    /// whether the request uri is too long; `true` responds `414`
    async fn uri_too_long(&self, cx: &mut Context) -> Outcome<bool> {
        Ok(false)
    }

    /// the methods allowed on this resource; anything else is `405`
    /// with an `Allow` header
    async fn allowed_methods(&self, cx: &mut Context) -> Outcome<Vec<Method>> {
        Ok(vec![Method::Get, Method::Head])
    }

    /// whether the request is malformed; `true` responds `400`
    async fn malformed_request(&self, cx: &mut Context) -> Outcome<bool> {
        Ok(false)
    }

    /// whether this resource requires authorization at all; `false`
    /// skips [`Controller::is_authorized`] entirely
    async fn auth_required(&self, cx: &mut Context) -> Outcome<bool> {
        Ok(true)
    }

    /// whether the request carries acceptable credentials; a
    /// [`Authorized::Challenge`] responds `401` with that
    /// `WWW-Authenticate` value
    async fn is_authorized(&self, cx: &mut Context) -> Outcome<Authorized> {
        Ok(Authorized::Granted)
    }

    /// whether the request is forbidden regardless of credentials;
    /// `true` responds `403`
    async fn forbidden(&self, cx: &mut Context) -> Outcome<bool> {
        Ok(false)
    }

    /// whether the content-* headers on the request make sense;
    /// `false` responds `501`
    async fn valid_content_headers(&self, cx: &mut Context) -> Outcome<bool> {
        Ok(true)
    }

    /// whether the request entity's content type is one this resource
    /// can read; `false` responds `415`
    async fn known_content_type(&self, cx: &mut Context) -> Outcome<bool> {
        Ok(true)
    }

    /// whether the request entity is acceptably sized; `false`
    /// responds `413`
    async fn valid_entity_length(&self, cx: &mut Context) -> Outcome<bool> {
        Ok(true)
    }

    /// extra headers for an `OPTIONS` response, beyond the `Allow`
    /// header the engine composes itself
    async fn options(&self, cx: &mut Context) -> Outcome<Vec<(String, String)>> {
        Ok(Vec::new())
    }

    /// the media types this resource can produce, in preference order
    async fn content_types_provided(&self, cx: &mut Context) -> Outcome<Vec<Cow<'static, str>>> {
        Ok(vec![Cow::Borrowed("text/html")])
    }

    /// whether a representation in this language exists; asked in the
    /// client's preference order until one is available
    async fn language_available(&self, tag: &str, cx: &mut Context) -> Outcome<bool> {
        Ok(true)
    }

    /// the charsets this resource can produce, or the no-charset
    /// sentinel to skip charset negotiation
    async fn charsets_provided(&self, cx: &mut Context) -> Outcome<CharsetsProvided> {
        Ok(CharsetsProvided::NoCharset)
    }

    /// the content encodings this resource can produce
    async fn content_encodings_provided(
        &self,
        cx: &mut Context,
    ) -> Outcome<Vec<Cow<'static, str>>> {
        Ok(vec![Cow::Borrowed("identity")])
    }

    /// transfer encodings this resource offers beyond the framing the
    /// emitter chooses itself
    async fn transfer_encodings_provided(
        &self,
        cx: &mut Context,
    ) -> Outcome<Vec<Cow<'static, str>>> {
        Ok(Vec::new())
    }

    /// request headers beyond the negotiation dimensions that this
    /// resource's representations vary on
    async fn variances(&self, cx: &mut Context) -> Outcome<Vec<Cow<'static, str>>> {
        Ok(Vec::new())
    }

    /// protocols this resource is willing to switch to when the client
    /// asks for an upgrade
    async fn upgrades_provided(&self, cx: &mut Context) -> Outcome<Vec<Cow<'static, str>>> {
        Ok(Vec::new())
    }

    /// whether the resource exists; the `false` branch leads to the
    /// 404/410/301/POST-create family
    async fn resource_exists(&self, cx: &mut Context) -> Outcome<bool> {
        Ok(true)
    }

    /// the entity tag of the current representation, unquoted.
    /// Consulted at most once per request.
    async fn generate_etag(&self, cx: &mut Context) -> Outcome<Option<String>> {
        Ok(None)
    }

    /// when the current representation last changed. Consulted at most
    /// once per request.
    async fn last_modified(&self, cx: &mut Context) -> Outcome<Option<SystemTime>> {
        Ok(None)
    }

    /// when the response stops being fresh
    async fn expires(&self, cx: &mut Context) -> Outcome<Option<SystemTime>> {
        Ok(None)
    }

    /// a permanent location for this resource; `Some` responds `301`
    async fn moved_permanently(&self, cx: &mut Context) -> Outcome<Option<String>> {
        Ok(None)
    }

    /// a temporary location for this resource; `Some` responds `307`
    async fn moved_temporarily(&self, cx: &mut Context) -> Outcome<Option<String>> {
        Ok(None)
    }

    /// whether this resource used to exist; distinguishes `410` from
    /// `404` for missing resources
    async fn previously_existed(&self, cx: &mut Context) -> Outcome<bool> {
        Ok(false)
    }

    /// whether `POST` to a missing resource is acceptable
    async fn allow_missing_post(&self, cx: &mut Context) -> Outcome<bool> {
        Ok(false)
    }

    /// whether the write conflicts with the resource's current state;
    /// `true` responds `409`
    async fn is_conflict(&self, cx: &mut Context) -> Outcome<bool> {
        Ok(false)
    }

    /// whether several representations of this resource exist such
    /// that the engine should respond `300` instead of `200`
    async fn multiple_choices(&self, cx: &mut Context) -> Outcome<bool> {
        Ok(false)
    }

    /// carry out deletion. `false` means the delete could not be
    /// enacted and responds `500`.
    async fn delete_resource(&self, cx: &mut Context) -> Outcome<bool> {
        Ok(false)
    }

    /// whether deletion has fully completed; `false` responds `202`
    async fn delete_completed(&self, cx: &mut Context) -> Outcome<bool> {
        Ok(true)
    }

    /// whether `POST` creates a new resource at [`Controller::create_path`],
    /// in which case the engine synthesizes `201` with a `Location`;
    /// otherwise [`Controller::process_post`] is in charge
    async fn post_is_create(&self, cx: &mut Context) -> Outcome<bool> {
        Ok(false)
    }

    /// the path of the resource a creating `POST` makes
    async fn create_path(&self, cx: &mut Context) -> Outcome<Option<String>> {
        Ok(None)
    }

    /// the base uri that [`Controller::create_path`] values are
    /// resolved against; defaults to the request's own authority
    async fn base_uri(&self, cx: &mut Context) -> Outcome<Option<String>> {
        Ok(None)
    }

    /// Handle a non-creating `POST` outright. `true` means the post
    /// was processed; pair with [`Context::redirect_to`] to answer
    /// `303`. `false` responds `500`.
    async fn process_post(&self, cx: &mut Context) -> Outcome<bool> {
        Ok(false)
    }

    /// Accept the entity of a `PUT` (or creating `POST`). `false`
    /// responds `500`.
    async fn process_put(&self, cx: &mut Context) -> Outcome<bool> {
        Ok(true)
    }

    /// the media types this resource accepts for incoming entities;
    /// when non-empty, other content types respond `415`
    async fn content_types_accepted(&self, cx: &mut Context) -> Outcome<Vec<Cow<'static, str>>> {
        Ok(Vec::new())
    }

    /// produce the response body for the negotiated media type
    async fn represent(&self, cx: &mut Context) -> Outcome<Option<Body>> {
        Ok(None)
    }

    /// Always invoked, on success and error paths alike, before the
    /// emitter runs. Returning `Some(code)` replaces the status.
    async fn finish_request(&self, cx: &mut Context) -> Outcome<Option<u16>> {
        Ok(None)
    }
}
