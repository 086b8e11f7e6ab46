//! The decision graph.
//!
//! The graph is a table: [`step`] maps `(node, verdict)` to the next
//! node or a terminal status, and [`Run::decide`] answers one node's
//! question, asking the controller where the node calls for it. A
//! plain loop drives the two, so traversal is stack-bounded and
//! capped at [`MAX_TRANSITIONS`] visits.

use crate::{
    controller::{Authorized, CharsetsProvided},
    negotiate,
    range::{self, RangePlan},
    Body, Context, Controller, Interrupt, Method, Outcome,
};
use std::time::SystemTime;

/// traversal bound; the longest path through the graph is 40 nodes
const MAX_TRANSITIONS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Node {
    B13,
    B12,
    B11,
    B10,
    B9,
    B8,
    B7,
    B6,
    B5,
    B4,
    B3,
    C3,
    C4,
    D4,
    D5,
    E5,
    E6,
    F6,
    F7,
    G7,
    G8,
    G9,
    G11,
    H7,
    H10,
    H11,
    H12,
    I4,
    I7,
    I12,
    I13,
    J18,
    K13,
    K5,
    K7,
    L5,
    L7,
    L13,
    L14,
    L15,
    L17,
    M5,
    M7,
    M16,
    M20,
    N5,
    N11,
    N16,
    O14,
    O16,
    O18,
    O20,
    P3,
    P11,
}

enum Flow {
    Goto(Node),
    Done(u16),
}

/// the transition table: where each node's verdict leads
fn step(node: Node, verdict: bool) -> Flow {
    use Flow::{Done, Goto};
    use Node::*;

    match (node, verdict) {
        (B13, true) => Goto(B12),
        (B13, false) => Done(503),
        (B12, true) => Goto(B11),
        (B12, false) => Done(501),
        (B11, true) => Done(414),
        (B11, false) => Goto(B10),
        (B10, true) => Goto(B9),
        (B10, false) => Done(405),
        (B9, true) => Done(400),
        (B9, false) => Goto(B8),
        (B8, true) => Goto(B7),
        (B8, false) => Done(401),
        (B7, true) => Done(403),
        (B7, false) => Goto(B6),
        (B6, true) => Goto(B5),
        (B6, false) => Done(501),
        (B5, true) => Goto(B4),
        (B5, false) => Done(415),
        (B4, true) => Goto(B3),
        (B4, false) => Done(413),
        (B3, true) => Done(200),
        (B3, false) => Goto(C3),
        (C3, true) => Goto(C4),
        (C3, false) => Goto(D4),
        (C4, true) => Goto(D4),
        (C4, false) => Done(406),
        (D4, true) => Goto(D5),
        (D4, false) => Goto(E5),
        (D5, true) => Goto(E5),
        (D5, false) => Done(406),
        (E5, true) => Goto(E6),
        (E5, false) => Goto(F6),
        (E6, true) => Goto(F6),
        (E6, false) => Done(406),
        (F6, true) => Goto(F7),
        (F6, false) => Goto(G7),
        (F7, true) => Goto(G7),
        (F7, false) => Done(406),
        (G7, true) => Goto(G8),
        (G7, false) => Goto(H7),
        (G8, true) => Goto(G9),
        (G8, false) => Goto(H10),
        (G9, true) => Goto(H10),
        (G9, false) => Goto(G11),
        (G11, true) => Goto(H10),
        (G11, false) => Done(412),
        (H7, true) => Done(412),
        (H7, false) => Goto(I7),
        (H10, true) => Goto(H11),
        (H10, false) => Goto(I12),
        (H11, true) => Goto(H12),
        (H11, false) => Goto(I12),
        (H12, true) => Done(412),
        (H12, false) => Goto(I12),
        (I4, true) => Done(301),
        (I4, false) => Goto(P3),
        (I7, true) => Goto(I4),
        (I7, false) => Goto(K7),
        (I12, true) => Goto(I13),
        (I12, false) => Goto(L13),
        (I13, true) => Goto(J18),
        (I13, false) => Goto(K13),
        (J18, true) => Done(304),
        (J18, false) => Done(412),
        (K13, true) => Goto(J18),
        (K13, false) => Goto(L13),
        (K5, true) => Done(301),
        (K5, false) => Goto(L5),
        (K7, true) => Goto(K5),
        (K7, false) => Goto(L7),
        (L5, true) => Done(307),
        (L5, false) => Goto(M5),
        (L7, true) => Goto(M7),
        (L7, false) => Done(404),
        (L13, true) => Goto(L14),
        (L13, false) => Goto(M16),
        (L14, true) => Goto(L15),
        (L14, false) => Goto(M16),
        (L15, true) => Goto(M16),
        (L15, false) => Goto(L17),
        (L17, true) => Goto(M16),
        (L17, false) => Done(304),
        (M5, true) => Goto(N5),
        (M5, false) => Done(410),
        (M7, true) => Goto(N11),
        (M7, false) => Done(404),
        (M16, true) => Goto(M20),
        (M16, false) => Goto(N16),
        (M20, true) => Goto(O20),
        (M20, false) => Done(202),
        (N5, true) => Goto(N11),
        (N5, false) => Done(410),
        (N11, true) => Done(303),
        (N11, false) => Goto(P11),
        (N16, true) => Goto(N11),
        (N16, false) => Goto(O16),
        (O14, true) => Done(409),
        (O14, false) => Goto(P11),
        (O16, true) => Goto(O14),
        (O16, false) => Goto(O18),
        (O18, true) => Done(300),
        (O18, false) => Done(200),
        (O20, true) => Goto(O18),
        (O20, false) => Done(204),
        (P3, true) => Done(409),
        (P3, false) => Goto(P11),
        (P11, true) => Done(201),
        (P11, false) => Goto(O20),
    }
}

/**
Runs the decision graph for one request.

On return, the context carries a status code, all decided response
headers, the body source if one was produced, and a staged range plan
when the request asked for and earned a partial response. The
controller's `finish_request` has been invoked, whatever path the
request took.
*/
pub async fn execute<C: Controller>(controller: &C, cx: &mut Context) {
    let mut run = Run {
        controller,
        cx,
        if_unmodified_since: None,
        if_modified_since: None,
    };

    let (status, interrupted) = match run.traverse().await {
        Ok(code) => (code, false),
        Err(Interrupt::Halt(code)) => (code, true),
        Err(Interrupt::Error(reason)) => {
            log::error!("controller error: {reason}");
            if run.cx.body.is_none() {
                run.cx.body = Some(Body::from("Internal Server Error\n"));
                run.cx
                    .response_headers
                    .try_insert("content-type", "text/plain");
            }
            (500, true)
        }
    };
    run.cx.set_status(status);

    if !interrupted {
        if let Err(interrupt) = run.finalize().await {
            match interrupt {
                Interrupt::Halt(code) => run.cx.set_status(code),
                Interrupt::Error(reason) => {
                    log::error!("controller error while finalizing: {reason}");
                    run.cx.set_status(500);
                }
            }
        }
    }

    match run.controller.finish_request(run.cx).await {
        Ok(Some(code)) => run.cx.set_status(code),
        Ok(None) => {}
        Err(Interrupt::Halt(code)) => run.cx.set_status(code),
        Err(Interrupt::Error(reason)) => {
            log::error!("controller error in finish_request: {reason}");
            run.cx.set_status(500);
        }
    }
}

struct Run<'a, C> {
    controller: &'a C,
    cx: &'a mut Context,
    if_unmodified_since: Option<SystemTime>,
    if_modified_since: Option<SystemTime>,
}

impl<C: Controller> Run<'_, C> {
    async fn traverse(&mut self) -> Outcome<u16> {
        let mut node = Node::B13;
        for _ in 0..MAX_TRANSITIONS {
            let verdict = self.decide(node).await?;
            log::trace!("decision {node:?} => {verdict}");
            match step(node, verdict) {
                Flow::Goto(next) => node = next,
                Flow::Done(code) => return Ok(code),
            }
        }

        log::error!("decision graph did not terminate within {MAX_TRANSITIONS} transitions");
        Err(Interrupt::Error("decision graph overran its bound".into()))
    }

    async fn decide(&mut self, node: Node) -> Outcome<bool> {
        match node {
            Node::B13 => self.controller.service_available(self.cx).await,

            Node::B12 => {
                let known = self.controller.known_methods(self.cx).await?;
                Ok(known.contains(&self.cx.method))
            }

            Node::B11 => self.controller.uri_too_long(self.cx).await,

            Node::B10 => {
                let allowed = self.controller.allowed_methods(self.cx).await?;
                if allowed.contains(&self.cx.method) {
                    Ok(true)
                } else {
                    let allow = allow_header(&allowed);
                    self.cx.response_headers.insert("allow", allow);
                    Ok(false)
                }
            }

            Node::B9 => self.controller.malformed_request(self.cx).await,

            Node::B8 => {
                if !self.controller.auth_required(self.cx).await? {
                    return Ok(true);
                }
                match self.controller.is_authorized(self.cx).await? {
                    Authorized::Granted => Ok(true),
                    Authorized::Challenge(challenge) => {
                        self.cx.response_headers.insert("www-authenticate", challenge);
                        Ok(false)
                    }
                }
            }

            Node::B7 => self.controller.forbidden(self.cx).await,

            Node::B6 => {
                self.upgrade_check().await?;
                self.controller.valid_content_headers(self.cx).await
            }

            Node::B5 => self.controller.known_content_type(self.cx).await,

            Node::B4 => self.controller.valid_entity_length(self.cx).await,

            Node::B3 => {
                if self.cx.method != Method::Options {
                    return Ok(false);
                }
                let allowed = self.controller.allowed_methods(self.cx).await?;
                self.cx.response_headers.insert("allow", allow_header(&allowed));
                for (name, value) in self.controller.options(self.cx).await? {
                    self.cx.response_headers.insert(name, value);
                }
                Ok(true)
            }

            Node::C3 => {
                if self.cx.request_headers.has_header("accept") {
                    self.cx.consulted.accept = true;
                    Ok(true)
                } else {
                    let provided = self.controller.content_types_provided(self.cx).await?;
                    self.cx.media_type = provided.first().map(|t| t.to_string());
                    Ok(false)
                }
            }

            Node::C4 => {
                let header = self.header_owned("accept").unwrap_or_default();
                let provided = self.controller.content_types_provided(self.cx).await?;
                match negotiate::best_media_type(&provided, &header) {
                    Some(media_type) => {
                        self.cx.media_type = Some(media_type);
                        Ok(true)
                    }
                    None => Ok(false),
                }
            }

            Node::D4 => {
                if self.cx.request_headers.has_header("accept-language") {
                    self.cx.consulted.language = true;
                    Ok(true)
                } else {
                    Ok(false)
                }
            }

            Node::D5 => {
                let header = self.header_owned("accept-language").unwrap_or_default();
                for tag in negotiate::acceptable_languages(&header) {
                    if self.controller.language_available(&tag, self.cx).await? {
                        if tag != "*" {
                            self.cx.language = Some(tag);
                        }
                        return Ok(true);
                    }
                }
                Ok(false)
            }

            Node::E5 => match self.controller.charsets_provided(self.cx).await? {
                CharsetsProvided::NoCharset => Ok(false),
                CharsetsProvided::Provided(provided) => {
                    if self.cx.request_headers.has_header("accept-charset") {
                        self.cx.consulted.charset = true;
                        Ok(true)
                    } else {
                        self.cx.charset = provided.first().map(|c| c.to_string());
                        Ok(false)
                    }
                }
            },

            Node::E6 => {
                let CharsetsProvided::Provided(provided) =
                    self.controller.charsets_provided(self.cx).await?
                else {
                    return Ok(true);
                };
                let header = self.header_owned("accept-charset").unwrap_or_default();
                match negotiate::best_charset(&provided, &header) {
                    Some(charset) => {
                        self.cx.charset = Some(charset);
                        Ok(true)
                    }
                    None => Ok(false),
                }
            }

            Node::F6 => {
                if self.cx.request_headers.has_header("accept-encoding") {
                    self.cx.consulted.encoding = true;
                    Ok(true)
                } else {
                    Ok(false)
                }
            }

            Node::F7 => {
                let header = self.header_owned("accept-encoding").unwrap_or_default();
                let provided = self.controller.content_encodings_provided(self.cx).await?;
                match negotiate::best_encoding(&provided, &header) {
                    Some(encoding) => {
                        self.cx.encoding = encoding;
                        Ok(true)
                    }
                    None => Ok(false),
                }
            }

            Node::G7 => self.controller.resource_exists(self.cx).await,

            Node::G8 => Ok(self.cx.request_headers.has_header("if-match")),

            Node::G9 | Node::H7 => Ok(self
                .cx
                .request_headers
                .get_str("if-match")
                .map(str::trim)
                == Some("*")),

            Node::G11 => self.etag_matches("if-match", true).await,

            Node::H10 => Ok(self.cx.request_headers.has_header("if-unmodified-since")),

            Node::H11 => {
                self.if_unmodified_since = self
                    .header_owned("if-unmodified-since")
                    .and_then(|v| httpdate::parse_http_date(&v).ok());
                Ok(self.if_unmodified_since.is_some())
            }

            Node::H12 => {
                let Some(if_unmodified_since) = self.if_unmodified_since else {
                    return Ok(false);
                };
                match self.last_modified().await? {
                    Some(last_modified) => Ok(last_modified > if_unmodified_since),
                    None => Ok(false),
                }
            }

            Node::I4 | Node::K5 => match self.controller.moved_permanently(self.cx).await? {
                Some(location) => {
                    self.cx.response_headers.insert("location", location);
                    Ok(true)
                }
                None => Ok(false),
            },

            Node::I7 => {
                if self.cx.method == Method::Put {
                    self.cx.new_resource = true;
                    Ok(true)
                } else {
                    Ok(false)
                }
            }

            Node::I12 => Ok(self.cx.request_headers.has_header("if-none-match")),

            Node::I13 => Ok(self
                .cx
                .request_headers
                .get_str("if-none-match")
                .map(str::trim)
                == Some("*")),

            Node::J18 => Ok(self.cx.method.is_read()),

            Node::K13 => self.etag_matches("if-none-match", false).await,

            Node::K7 => self.controller.previously_existed(self.cx).await,

            Node::L5 => match self.controller.moved_temporarily(self.cx).await? {
                Some(location) => {
                    self.cx.response_headers.insert("location", location);
                    Ok(true)
                }
                None => Ok(false),
            },

            Node::L7 | Node::M5 | Node::N16 => {
                Ok(matches!(self.cx.method, Method::Post | Method::Mkcol))
            }

            Node::L13 => Ok(self.cx.request_headers.has_header("if-modified-since")),

            Node::L14 => {
                self.if_modified_since = self
                    .header_owned("if-modified-since")
                    .and_then(|v| httpdate::parse_http_date(&v).ok());
                Ok(self.if_modified_since.is_some())
            }

            Node::L15 => {
                let Some(if_modified_since) = self.if_modified_since else {
                    return Ok(true);
                };
                Ok(if_modified_since > SystemTime::now())
            }

            Node::L17 => {
                let Some(if_modified_since) = self.if_modified_since else {
                    return Ok(true);
                };
                match self.last_modified().await? {
                    Some(last_modified) => Ok(last_modified > if_modified_since),
                    None => Ok(false),
                }
            }

            Node::M7 | Node::N5 => {
                if self.controller.allow_missing_post(self.cx).await? {
                    self.cx.new_resource = true;
                    Ok(true)
                } else {
                    Ok(false)
                }
            }

            Node::M16 => Ok(self.cx.method == Method::Delete),

            Node::M20 => {
                if !self.controller.delete_resource(self.cx).await? {
                    return Err(Interrupt::Error("delete_resource could not enact the delete".into()));
                }
                self.controller.delete_completed(self.cx).await
            }

            Node::N11 => {
                if self.controller.post_is_create(self.cx).await? {
                    let Some(path) = self.controller.create_path(self.cx).await? else {
                        return Err(Interrupt::Error(
                            "post_is_create requires a create_path".into(),
                        ));
                    };
                    let location = self.location_for(&path).await?;
                    self.cx.response_headers.insert("location", location);
                    self.cx.new_resource = true;
                    self.accept_entity().await?;
                } else if !self.controller.process_post(self.cx).await? {
                    return Err(Interrupt::Error("process_post did not process the post".into()));
                }
                Ok(self.cx.redirect)
            }

            Node::O14 | Node::P3 => self.controller.is_conflict(self.cx).await,

            Node::O16 => Ok(self.cx.method == Method::Put),

            Node::O18 => self.controller.multiple_choices(self.cx).await,

            Node::O20 => Ok(self.cx.body.is_some()),

            Node::P11 => {
                if self.cx.method == Method::Put {
                    self.accept_entity().await?;
                }
                Ok(self.cx.new_resource)
            }
        }
    }

    /// Header hygiene after the graph terminates: representation body,
    /// entity headers, validators, `Vary`, and the range plan.
    async fn finalize(&mut self) -> Outcome<()> {
        let status = self.cx.status.unwrap_or(200);
        let method = self.cx.method;

        if status == 200 && method.is_read() && self.cx.body.is_none() {
            if let Some(body) = self.controller.represent(self.cx).await? {
                self.cx.body = Some(body);
            }
        }

        if status == 200
            && (method.is_read() || self.cx.body.is_some())
            && !self.cx.response_headers.has_header("content-type")
        {
            let media_type = match self.cx.media_type.clone() {
                Some(media_type) => media_type,
                None => self
                    .controller
                    .content_types_provided(self.cx)
                    .await?
                    .first()
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| String::from("text/html")),
            };
            let content_type = match self.cx.charset.as_deref() {
                Some(charset) => format!("{media_type}; charset={charset}"),
                None => media_type,
            };
            self.cx.response_headers.insert("content-type", content_type);
        }

        if let Some(language) = self.cx.language.clone() {
            self.cx
                .response_headers
                .try_insert("content-language", language);
        }
        if self.cx.encoding != "identity" {
            self.cx
                .response_headers
                .try_insert("content-encoding", self.cx.encoding.clone());
        }

        if method.is_read() && matches!(status, 200..=399) {
            if let Some(etag) = self.etag().await? {
                self.cx
                    .response_headers
                    .try_insert("etag", format!("\"{etag}\""));
            }
            if let Some(expires) = self.expires().await? {
                self.cx
                    .response_headers
                    .try_insert("expires", httpdate::fmt_http_date(expires));
            }
            if let Some(last_modified) = self.last_modified().await? {
                self.cx
                    .response_headers
                    .try_insert("last-modified", httpdate::fmt_http_date(last_modified));
            }
        }

        self.compose_vary().await?;
        self.stage_range_plan().await;

        Ok(())
    }

    async fn compose_vary(&mut self) -> Outcome<()> {
        let mut vary: Vec<String> = Vec::new();
        let consulted = self.cx.consulted;
        if consulted.accept {
            vary.push(String::from("accept"));
        }
        if consulted.language {
            vary.push(String::from("accept-language"));
        }
        if consulted.charset {
            vary.push(String::from("accept-charset"));
        }
        if consulted.encoding {
            vary.push(String::from("accept-encoding"));
        }
        for variance in self.controller.variances(self.cx).await? {
            let variance = variance.to_ascii_lowercase();
            if !vary.contains(&variance) {
                vary.push(variance);
            }
        }

        if vary.len() >= 2 {
            self.cx.response_headers.try_insert("vary", vary.join(", "));
        }
        Ok(())
    }

    /// Stages which byte spans to emit. `range_ok` is read exactly
    /// once, here, before the `Range` header is parsed; sources whose
    /// size cannot be known keep the full-body response.
    async fn stage_range_plan(&mut self) {
        if self.cx.method != Method::Get
            || self.cx.status != Some(200)
            || !self.cx.range_ok
        {
            return;
        }
        let Some(parts) = self
            .cx
            .request_headers
            .get_str("range")
            .and_then(range::parse)
        else {
            return;
        };
        let Some(body) = &self.cx.body else { return };
        let Some(total) = body.discover_len().await else {
            return;
        };

        let normalized = range::normalize(&parts, total);
        if normalized.is_empty() {
            // nothing satisfiable; serve the full representation
            return;
        }

        let content_type = self
            .cx
            .response_headers
            .get_str("content-type")
            .unwrap_or("application/octet-stream")
            .to_string();
        self.cx.set_status(206);
        self.cx.range_plan = Some(RangePlan::new(normalized, total, content_type));
    }

    async fn upgrade_check(&mut self) -> Outcome<()> {
        let Some(upgrade) = self.header_owned("upgrade") else {
            return Ok(());
        };
        let connection_requests_upgrade = self
            .cx
            .request_headers
            .get_str("connection")
            .map(|value| {
                value
                    .split(',')
                    .any(|token| token.trim().eq_ignore_ascii_case("upgrade"))
            })
            .unwrap_or_default();
        if !connection_requests_upgrade {
            return Ok(());
        }

        let provided = self.controller.upgrades_provided(self.cx).await?;
        for protocol in upgrade.split(',').map(str::trim) {
            if let Some(matched) = provided.iter().find(|p| p.eq_ignore_ascii_case(protocol)) {
                self.cx.response_headers.insert("connection", "upgrade");
                self.cx.response_headers.insert("upgrade", matched.to_string());
                return Err(Interrupt::Halt(101));
            }
        }
        Ok(())
    }

    async fn accept_entity(&mut self) -> Outcome<()> {
        let accepted = self.controller.content_types_accepted(self.cx).await?;
        if !accepted.is_empty() {
            let content_type = self
                .cx
                .request_headers
                .get_str("content-type")
                .map(|ct| {
                    ct.split(';')
                        .next()
                        .unwrap_or_default()
                        .trim()
                        .to_ascii_lowercase()
                })
                .unwrap_or_default();
            if !accepted
                .iter()
                .any(|a| a.eq_ignore_ascii_case(&content_type))
            {
                return Err(Interrupt::Halt(415));
            }
        }

        if self.controller.process_put(self.cx).await? {
            Ok(())
        } else {
            Err(Interrupt::Error("process_put refused the entity".into()))
        }
    }

    async fn location_for(&mut self, path: &str) -> Outcome<String> {
        let base = match self.controller.base_uri(self.cx).await? {
            Some(base) => base,
            None => match &self.cx.host {
                Some(host) => {
                    if self.cx.port == self.cx.scheme.default_port() {
                        format!("{}://{host}", self.cx.scheme)
                    } else {
                        format!("{}://{host}:{}", self.cx.scheme, self.cx.port)
                    }
                }
                None => return Ok(path.to_string()),
            },
        };
        Ok(format!(
            "{}/{}",
            base.trim_end_matches('/'),
            path.trim_start_matches('/')
        ))
    }

    fn header_owned(&self, name: &'static str) -> Option<String> {
        self.cx.request_headers.get_str(name).map(String::from)
    }

    async fn etag(&mut self) -> Outcome<Option<String>> {
        if self.cx.etag.is_none() {
            let etag = self.controller.generate_etag(self.cx).await?;
            self.cx.etag = Some(etag);
        }
        Ok(self.cx.etag.clone().unwrap_or_default())
    }

    async fn last_modified(&mut self) -> Outcome<Option<SystemTime>> {
        if self.cx.last_modified.is_none() {
            let last_modified = self.controller.last_modified(self.cx).await?;
            self.cx.last_modified = Some(last_modified);
        }
        Ok(self.cx.last_modified.flatten())
    }

    async fn expires(&mut self) -> Outcome<Option<SystemTime>> {
        if self.cx.expires.is_none() {
            let expires = self.controller.expires(self.cx).await?;
            self.cx.expires = Some(expires);
        }
        Ok(self.cx.expires.flatten())
    }

    async fn etag_matches(&mut self, header: &'static str, strong: bool) -> Outcome<bool> {
        let Some(header) = self.header_owned(header) else {
            return Ok(false);
        };
        let Some(etag) = self.etag().await? else {
            return Ok(false);
        };

        Ok(parse_etag_list(&header).iter().any(|(weak, tag)| {
            if strong {
                !*weak && *tag == etag
            } else {
                *tag == etag
            }
        }))
    }
}

fn allow_header(methods: &[Method]) -> String {
    methods
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// entity-tags from an `If-Match` / `If-None-Match` list, unquoted,
/// with their weakness marker
fn parse_etag_list(header: &str) -> Vec<(bool, String)> {
    header
        .split(',')
        .filter_map(|tag| {
            let tag = tag.trim();
            if tag.is_empty() {
                return None;
            }
            let (weak, tag) = match tag.strip_prefix("W/") {
                Some(rest) => (true, rest),
                None => (false, tag),
            };
            Some((weak, tag.trim_matches('"').to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn etag_list_parsing() {
        assert_eq!(
            parse_etag_list(r#""v1", W/"v2""#),
            vec![(false, String::from("v1")), (true, String::from("v2"))]
        );
        assert_eq!(parse_etag_list(""), vec![]);
    }

    #[test]
    fn allow_header_joins_methods() {
        assert_eq!(allow_header(&[Method::Get, Method::Head]), "GET, HEAD");
    }

    #[test]
    fn every_node_has_both_transitions() {
        use Node::*;
        let nodes = [
            B13, B12, B11, B10, B9, B8, B7, B6, B5, B4, B3, C3, C4, D4, D5, E5, E6, F6, F7, G7,
            G8, G9, G11, H7, H10, H11, H12, I4, I7, I12, I13, J18, K13, K5, K7, L5, L7, L13, L14,
            L15, L17, M5, M7, M16, M20, N5, N11, N16, O14, O16, O18, O20, P3, P11,
        ];
        // the table is total: stepping any node with either verdict
        // yields a successor or a terminal without panicking
        for node in nodes {
            for verdict in [true, false] {
                match step(node, verdict) {
                    Flow::Goto(_) | Flow::Done(_) => {}
                }
            }
        }
    }
}
