//! The response emitter: turns (status, headers, body source) into
//! exactly one framed http/1.1 response on the transport.
//!
//! Framing: known-length sources get a `content-length` and a fixed
//! body; pull streams and writer callbacks get chunked encoding; a
//! staged range plan gets `206` slicing, multipart assembly included.
//! HEAD requests get their headers and not a single body byte.

use crate::{
    body::{Body, BodyKind, BodyStream, Chunk, WriterSink},
    range::RangePlan,
    status::canonical_reason,
    Config, Context, Error, Method, Result, SendfileMode,
};
use async_fs::File;
use futures_lite::{AsyncReadExt, AsyncSeekExt, AsyncWrite, AsyncWriteExt};
use std::{
    io::{self, SeekFrom},
    path::Path,
    time::SystemTime,
};

/**
Emits the response accumulated on the context.

The transport only needs to be an [`AsyncWrite`]; reading the request
happened long before the emitter runs. When the configuration carries
a stopper, emission races it and unwinds with [`Error::Closed`] on
cancellation; file handles are dropped on every exit path either way.

# Errors

Transport and file I/O errors abort emission; no further response
bytes are written.
*/
pub async fn emit<T>(cx: &mut Context, transport: &mut T, config: &Config) -> Result<()>
where
    T: AsyncWrite + Unpin,
{
    match config.stopper() {
        Some(stopper) => {
            let stopper = stopper.clone();
            match stopper
                .stop_future(write_response(cx, transport, config))
                .await
            {
                Some(result) => result,
                None => {
                    log::debug!("response emission cancelled");
                    Err(Error::Closed)
                }
            }
        }
        None => write_response(cx, transport, config).await,
    }
}

async fn write_response<T>(cx: &mut Context, transport: &mut T, config: &Config) -> Result<()>
where
    T: AsyncWrite + Unpin,
{
    let status = cx.status.unwrap_or(200);
    let is_head = cx.method == Method::Head;

    cx.response_headers
        .try_insert("server", config.server_header().to_string());
    cx.response_headers
        .try_insert("date", httpdate::fmt_http_date(SystemTime::now()));
    for cookie in std::mem::take(&mut cx.cookies) {
        cx.response_headers.append("set-cookie", cookie);
    }

    let mut body = cx.body.take();
    let mut plan = cx.range_plan.take();

    if matches!(status, 100..=199 | 204 | 304) {
        body = None;
        plan = None;
        cx.response_headers.remove("content-length");
        cx.response_headers.remove("transfer-encoding");
        if status == 304 {
            cx.response_headers.remove("content-type");
        }
    }

    if let Some(plan) = plan {
        return write_ranged(cx, transport, config, body, plan, is_head).await;
    }

    match body.map(|body| body.0) {
        None => {
            if !matches!(status, 100..=199 | 204 | 304) {
                cx.response_headers.try_insert("content-length", "0");
            }
            write_head(cx, transport, status).await?;
        }

        Some(BodyKind::Bytes(bytes)) => {
            cx.response_headers
                .insert("content-length", bytes.len().to_string());
            write_head(cx, transport, status).await?;
            if !is_head {
                transport.write_all(&bytes).await?;
            }
        }

        Some(BodyKind::Path(path)) => {
            let file = File::open(&path).await?;
            write_file_body(cx, transport, config, file, status, is_head).await?;
        }

        Some(BodyKind::File(file)) => {
            write_file_body(cx, transport, config, file, status, is_head).await?;
        }

        Some(BodyKind::Sized { len, producer }) => {
            cx.response_headers
                .insert("content-length", len.to_string());
            write_head(cx, transport, status).await?;
            if !is_head && len > 0 {
                write_stream_raw(transport, config, producer(0, len - 1)).await?;
            }
        }

        Some(BodyKind::Stream(stream)) => {
            set_chunked(cx);
            write_head(cx, transport, status).await?;
            if !is_head {
                write_stream_chunked(transport, config, stream).await?;
                transport.write_all(b"0\r\n\r\n").await?;
            }
        }

        Some(BodyKind::Writer(writer)) => {
            set_chunked(cx);
            write_head(cx, transport, status).await?;
            if !is_head {
                let mut sink = WriterSink::default();
                writer(&mut sink);
                for chunk in sink.into_chunks() {
                    if !chunk.is_empty() {
                        write_chunk(transport, &chunk).await?;
                    }
                }
                transport.write_all(b"0\r\n\r\n").await?;
            }
        }
    }

    transport.flush().await?;
    Ok(())
}

async fn write_ranged<T>(
    cx: &mut Context,
    transport: &mut T,
    config: &Config,
    body: Option<Body>,
    plan: RangePlan,
    is_head: bool,
) -> Result<()>
where
    T: AsyncWrite + Unpin,
{
    let status = cx.status.unwrap_or(206);
    let body = match body.map(|body| body.0) {
        Some(BodyKind::Path(path)) => Some(BodyKind::File(File::open(&path).await?)),
        other => other,
    };

    if !plan.is_multipart() {
        let (offset, len) = plan.parts[0];
        cx.response_headers.insert(
            "content-range",
            format!("bytes {offset}-{}/{}", offset + len - 1, plan.total),
        );
        cx.response_headers
            .insert("content-length", len.to_string());
        write_head(cx, transport, status).await?;
        if !is_head {
            match body {
                Some(BodyKind::Bytes(bytes)) => {
                    transport
                        .write_all(&bytes[offset as usize..(offset + len) as usize])
                        .await?;
                }
                Some(BodyKind::File(mut file)) => {
                    write_file_span(&mut file, transport, offset, len, config.file_chunk_size())
                        .await?;
                }
                Some(BodyKind::Sized { producer, .. }) => {
                    write_stream_raw(transport, config, producer(offset, offset + len - 1)).await?;
                }
                _ => {}
            }
        }
        transport.flush().await?;
        return Ok(());
    }

    cx.response_headers.insert(
        "content-type",
        format!(
            "multipart/byteranges; boundary={}",
            plan.boundary.as_deref().unwrap_or_default()
        ),
    );

    match body {
        Some(BodyKind::Bytes(bytes)) => {
            cx.response_headers
                .insert("content-length", plan.content_length().to_string());
            write_head(cx, transport, status).await?;
            if !is_head {
                for &(offset, len) in &plan.parts {
                    transport
                        .write_all(plan.part_header(offset, len).as_bytes())
                        .await?;
                    transport
                        .write_all(&bytes[offset as usize..(offset + len) as usize])
                        .await?;
                    transport.write_all(b"\r\n").await?;
                }
                transport.write_all(plan.closing().as_bytes()).await?;
            }
        }

        Some(BodyKind::File(mut file)) => {
            cx.response_headers
                .insert("content-length", plan.content_length().to_string());
            write_head(cx, transport, status).await?;
            if !is_head {
                for &(offset, len) in &plan.parts {
                    transport
                        .write_all(plan.part_header(offset, len).as_bytes())
                        .await?;
                    write_file_span(&mut file, transport, offset, len, config.file_chunk_size())
                        .await?;
                    transport.write_all(b"\r\n").await?;
                }
                transport.write_all(plan.closing().as_bytes()).await?;
            }
        }

        Some(BodyKind::Sized { producer, .. }) => {
            // producer-backed parts stream with unknowable chunk sizes
            set_chunked(cx);
            write_head(cx, transport, status).await?;
            if !is_head {
                for &(offset, len) in &plan.parts {
                    write_chunk(transport, plan.part_header(offset, len).as_bytes()).await?;
                    let stream = producer(offset, offset + len - 1);
                    write_stream_chunked(transport, config, stream).await?;
                    write_chunk(transport, b"\r\n").await?;
                }
                write_chunk(transport, plan.closing().as_bytes()).await?;
                transport.write_all(b"0\r\n\r\n").await?;
            }
        }

        _ => {
            write_head(cx, transport, status).await?;
        }
    }

    transport.flush().await?;
    Ok(())
}

async fn write_head<T>(cx: &mut Context, transport: &mut T, status: u16) -> Result<()>
where
    T: AsyncWrite + Unpin,
{
    let reason = canonical_reason(status);
    let mut head = format!("{} {status} {reason}\r\n", cx.version);
    head.push_str(&cx.response_headers.to_string());
    head.push_str("\r\n");
    transport.write_all(head.as_bytes()).await?;
    Ok(())
}

fn set_chunked(cx: &mut Context) {
    cx.response_headers.remove("content-length");
    cx.response_headers.insert("transfer-encoding", "chunked");
}

async fn write_file_body<T>(
    cx: &mut Context,
    transport: &mut T,
    config: &Config,
    mut file: File,
    status: u16,
    is_head: bool,
) -> Result<()>
where
    T: AsyncWrite + Unpin,
{
    let len = file.metadata().await?.len();
    cx.response_headers
        .insert("content-length", len.to_string());
    write_head(cx, transport, status).await?;
    if is_head || len == 0 {
        return Ok(());
    }

    match config.sendfile() {
        SendfileMode::Disabled => {
            write_file_span(&mut file, transport, 0, len, config.file_chunk_size()).await
        }
        SendfileMode::InProcess => {
            futures_lite::io::copy(file.take(len), &mut *transport).await?;
            Ok(())
        }
        SendfileMode::Offload => {
            log::debug!("transport offers no descriptor offload; copying in process");
            futures_lite::io::copy(file.take(len), &mut *transport).await?;
            Ok(())
        }
    }
}

/// write exactly `len` bytes of `file` starting at `offset`
async fn write_file_span<T>(
    file: &mut File,
    transport: &mut T,
    offset: u64,
    len: u64,
    chunk_size: usize,
) -> Result<()>
where
    T: AsyncWrite + Unpin,
{
    file.seek(SeekFrom::Start(offset)).await?;
    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut remaining = len;
    while remaining > 0 {
        let want = remaining.min(buf.len() as u64) as usize;
        let read = file.read(&mut buf[..want]).await?;
        if read == 0 {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "file ended before the declared length",
            )));
        }
        transport.write_all(&buf[..read]).await?;
        remaining -= read as u64;
    }
    Ok(())
}

/// drain a stream with fixed framing; the surrounding content-length
/// already accounts for every byte
async fn write_stream_raw<T>(transport: &mut T, config: &Config, stream: BodyStream) -> Result<()>
where
    T: AsyncWrite + Unpin,
{
    for chunk in stream {
        match chunk {
            Chunk::Data(data) => {
                if !data.is_empty() {
                    transport.write_all(&data).await?;
                }
            }
            Chunk::File { path, offset, len } => {
                let mut file = File::open(&path).await?;
                let len = match len {
                    Some(len) => len,
                    None => file.metadata().await?.len().saturating_sub(offset),
                };
                write_file_span(&mut file, transport, offset, len, config.file_chunk_size())
                    .await?;
            }
        }
    }
    Ok(())
}

/// drain a stream with chunked framing. Empty data chunks are
/// consumed silently; a zero-size chunk on the wire would terminate
/// the body early.
async fn write_stream_chunked<T>(
    transport: &mut T,
    config: &Config,
    stream: BodyStream,
) -> Result<()>
where
    T: AsyncWrite + Unpin,
{
    for chunk in stream {
        match chunk {
            Chunk::Data(data) => {
                if !data.is_empty() {
                    write_chunk(transport, &data).await?;
                }
            }
            Chunk::File { path, offset, len } => {
                splice_file_chunked(transport, config, &path, offset, len).await?;
            }
        }
    }
    Ok(())
}

async fn splice_file_chunked<T>(
    transport: &mut T,
    config: &Config,
    path: &Path,
    offset: u64,
    len: Option<u64>,
) -> Result<()>
where
    T: AsyncWrite + Unpin,
{
    let mut file = File::open(path).await?;
    file.seek(SeekFrom::Start(offset)).await?;
    let mut buf = vec![0u8; config.file_chunk_size().max(1)];
    let mut remaining = len;
    loop {
        let want = match remaining {
            Some(0) => break,
            Some(remaining) => remaining.min(buf.len() as u64) as usize,
            None => buf.len(),
        };
        let read = file.read(&mut buf[..want]).await?;
        if read == 0 {
            if remaining.is_some() {
                return Err(Error::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "file ended before the spliced length",
                )));
            }
            break;
        }
        write_chunk(transport, &buf[..read]).await?;
        if let Some(remaining) = &mut remaining {
            *remaining -= read as u64;
        }
    }
    Ok(())
}

async fn write_chunk<T>(transport: &mut T, data: &[u8]) -> Result<()>
where
    T: AsyncWrite + Unpin,
{
    transport
        .write_all(format!("{:X}\r\n", data.len()).as_bytes())
        .await?;
    transport.write_all(data).await?;
    transport.write_all(b"\r\n").await?;
    Ok(())
}
