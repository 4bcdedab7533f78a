use thiserror::Error;

/// All failure modes surfaced by [`crate::RequestFramer::feed`] and by
/// [`crate::Consumer`] callbacks.
///
/// Once any variant other than [`Error::ConnectionClosed`] is returned from
/// `feed`, the parser is dead: every subsequent call returns
/// [`Error::ParserIsDead`] without invoking any consumer callback.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum Error {
    /// Method bytes are not in the known set, or exceeded the 7 byte cap.
    #[error("invalid method")]
    InvalidMethod,

    /// Path was empty, or contained a non-printable byte.
    #[error("invalid path")]
    InvalidPath,

    /// Protocol token was not one of HTTP/0.9, HTTP/1.0, HTTP/1.1.
    #[error("protocol not supported")]
    ProtocolNotSupported,

    /// Header key or value contained a non-printable byte, or the key was empty.
    #[error("invalid header")]
    InvalidHeader,

    /// A configured hard cap (path, header line, chunk size, ...) was exceeded.
    #[error("buffer overflow")]
    BufferOverflow,

    /// `Content-Length` value was not a valid decimal integer.
    #[error("invalid content-length")]
    InvalidContentLength,

    /// Generic framing violation: a lone CR, or a malformed CRLF sequence.
    #[error("request syntax error")]
    RequestSyntaxError,

    /// A connection-close-delimited body exceeded `max_body_length`.
    #[error("body too big")]
    BodyTooBig,

    /// Chunk size line exceeded the configured hex-digit cap.
    #[error("chunk size too big")]
    TooBigChunkSize,

    /// Chunk size line contained a non-hex-digit byte.
    #[error("invalid chunk size")]
    InvalidChunkSize,

    /// Expected a chunk `CRLF` splitter and found something else.
    #[error("invalid chunk splitter")]
    InvalidChunkSplitter,

    /// `feed()` was called after the parser already transitioned dead.
    #[error("parser is dead")]
    ParserIsDead,

    /// Returned by `feed(&[])` (end of stream) after a connection-close body
    /// finished. Not itself a defect: it tells the caller to close the
    /// connection now that the final `MessageComplete` has been emitted.
    #[error("connection closed")]
    ConnectionClosed,

    /// Returned from `Consumer::on_message_complete` to signal a protocol
    /// switch (e.g. `Upgrade: websocket`). Carries the offered protocol
    /// tokens. Treated like any other error by the parser (it transitions
    /// Dead); the caller distinguishes this from a defect by matching the
    /// variant.
    #[error("upgrade requested: {0:?}")]
    Upgrade(Vec<String>),
}

/// Crate-local `Result` alias, matching the teacher's `crate::Result` pattern.
pub type Result<T, E = Error> = core::result::Result<T, E>;
