use async_fs::File;
use std::{
    borrow::Cow,
    fmt::{self, Debug, Formatter},
    path::PathBuf,
};

/// One item pulled from a streaming body.
///
/// A `File` chunk splices a region of a file into the stream; the
/// emitter opens and frames it in place, so controllers never shuttle
/// file bytes through memory themselves.
pub enum Chunk {
    /// bytes to frame as-is
    Data(Vec<u8>),

    /// a file region to splice into the output
    File {
        /// the file to read from
        path: PathBuf,
        /// where to start reading
        offset: u64,
        /// how many bytes to read; `None` reads to the end
        len: Option<u64>,
    },
}

impl Debug for Chunk {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Chunk::Data(data) => f.debug_tuple("Chunk::Data").field(&data.len()).finish(),
            Chunk::File { path, offset, len } => f
                .debug_struct("Chunk::File")
                .field("path", path)
                .field("offset", offset)
                .field("len", len)
                .finish(),
        }
    }
}

impl From<Vec<u8>> for Chunk {
    fn from(data: Vec<u8>) -> Self {
        Chunk::Data(data)
    }
}

impl From<&str> for Chunk {
    fn from(data: &str) -> Self {
        Chunk::Data(data.as_bytes().to_vec())
    }
}

/// A pull stream of body chunks; exhaustion is the end-of-body marker.
pub type BodyStream = Box<dyn Iterator<Item = Chunk> + Send + Sync + 'static>;

/// Produces the chunk stream for an inclusive byte span of a body
/// whose total size is known up front.
pub type RangeProducer = Box<dyn Fn(u64, u64) -> BodyStream + Send + Sync + 'static>;

/// A callback that drives body emission itself through a [`WriterSink`].
pub type WriterFn = Box<dyn FnOnce(&mut WriterSink) + Send + Sync + 'static>;

/// The sink handed to a [`WriterFn`]; `finish` queues the final chunk
/// and seals the sink.
#[derive(Debug, Default)]
pub struct WriterSink {
    chunks: Vec<Vec<u8>>,
    finished: bool,
}

impl WriterSink {
    /// queue a chunk of body data
    pub fn send(&mut self, data: impl Into<Vec<u8>>) {
        if !self.finished {
            self.chunks.push(data.into());
        }
    }

    /// queue a final chunk and seal the sink; later sends are dropped
    pub fn finish(&mut self, data: impl Into<Vec<u8>>) {
        if !self.finished {
            self.chunks.push(data.into());
            self.finished = true;
        }
    }

    pub(crate) fn into_chunks(self) -> Vec<Vec<u8>> {
        self.chunks
    }
}

/// Where response bytes come from and how to stream them.
///
/// A body is one of six sources: owned bytes, a filesystem path, an
/// open file, a pull stream, a writer callback, or a sized stream
/// whose producer can be asked for arbitrary byte spans. The emitter
/// switches exhaustively on the variant to pick framing.
#[derive(Debug, Default)]
pub struct Body(pub(crate) BodyKind);

pub(crate) enum BodyKind {
    Bytes(Cow<'static, [u8]>),
    Path(PathBuf),
    File(File),
    Stream(BodyStream),
    Writer(WriterFn),
    Sized { len: u64, producer: RangeProducer },
}

impl Default for BodyKind {
    fn default() -> Self {
        BodyKind::Bytes(Cow::Borrowed(b""))
    }
}

impl Body {
    /// a body backed by the file at this path; its length is
    /// discovered when the response is emitted
    pub fn new_path(path: impl Into<PathBuf>) -> Self {
        Self(BodyKind::Path(path.into()))
    }

    /// a body backed by an already-opened file
    pub fn new_file(file: File) -> Self {
        Self(BodyKind::File(file))
    }

    /// a body produced by pulling chunks from an iterator; emitted
    /// with chunked framing
    pub fn new_streaming(stream: impl Iterator<Item = Chunk> + Send + Sync + 'static) -> Self {
        Self(BodyKind::Stream(Box::new(stream)))
    }

    /// a body driven by a writer callback; emitted with chunked framing
    pub fn new_writer(writer: impl FnOnce(&mut WriterSink) + Send + Sync + 'static) -> Self {
        Self(BodyKind::Writer(Box::new(writer)))
    }

    /// a streaming body whose total size is known up front, and whose
    /// producer can be asked for any inclusive byte span
    pub fn new_sized(
        len: u64,
        producer: impl Fn(u64, u64) -> BodyStream + Send + Sync + 'static,
    ) -> Self {
        Self(BodyKind::Sized {
            len,
            producer: Box::new(producer),
        })
    }

    /// Retrieve a borrow of in-memory content. Returns `None` for any
    /// other body source.
    pub fn static_bytes(&self) -> Option<&[u8]> {
        match &self.0 {
            BodyKind::Bytes(content) => Some(content.as_ref()),
            _ => None,
        }
    }

    /// The length of this body, if it is knowable without I/O. File
    /// sources report `None` here; use [`Body::discover_len`].
    pub fn len(&self) -> Option<u64> {
        match &self.0 {
            BodyKind::Bytes(content) => Some(content.len() as u64),
            BodyKind::Sized { len, .. } => Some(*len),
            _ => None,
        }
    }

    /// determine if this body represents no data
    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    /// The length of this body, performing file metadata lookups where
    /// required. `None` means the length is unknowable before emission
    /// (stream and writer sources).
    pub async fn discover_len(&self) -> Option<u64> {
        match &self.0 {
            BodyKind::Path(path) => async_fs::metadata(path).await.ok().map(|m| m.len()),
            BodyKind::File(file) => file.metadata().await.ok().map(|m| m.len()),
            _ => self.len(),
        }
    }
}

impl Debug for BodyKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            BodyKind::Bytes(content) => f
                .debug_struct("Body::Bytes")
                .field("len", &content.len())
                .finish(),
            BodyKind::Path(path) => f.debug_tuple("Body::Path").field(path).finish(),
            BodyKind::File(..) => f.debug_tuple("Body::File").field(&"..").finish(),
            BodyKind::Stream(..) => f.debug_tuple("Body::Stream").field(&"..").finish(),
            BodyKind::Writer(..) => f.debug_tuple("Body::Writer").field(&"..").finish(),
            BodyKind::Sized { len, .. } => f
                .debug_struct("Body::Sized")
                .field("len", len)
                .field("producer", &"..")
                .finish(),
        }
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        s.into_bytes().into()
    }
}

impl From<&'static str> for Body {
    fn from(s: &'static str) -> Self {
        s.as_bytes().into()
    }
}

impl From<&'static [u8]> for Body {
    fn from(content: &'static [u8]) -> Self {
        Self(BodyKind::Bytes(Cow::Borrowed(content)))
    }
}

impl From<Vec<u8>> for Body {
    fn from(content: Vec<u8>) -> Self {
        Self(BodyKind::Bytes(Cow::Owned(content)))
    }
}

impl From<Cow<'static, [u8]>> for Body {
    fn from(content: Cow<'static, [u8]>) -> Self {
        Self(BodyKind::Bytes(content))
    }
}
