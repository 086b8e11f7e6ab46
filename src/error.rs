use thiserror::Error;

/// Concrete errors that occur within the engine
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// [`std::io::Error`]
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// the peer disconnected or the request was cancelled while the
    /// response was being emitted
    #[error("connection closed by client")]
    Closed,

    /// we were unable to parse this http method
    #[error("unrecognized http method {0}")]
    UnrecognizedMethod(String),
}

/// this crate's result type
pub type Result<T> = std::result::Result<T, Error>;
