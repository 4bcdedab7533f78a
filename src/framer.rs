//! Request-line + headers + body framing state machine.
//!
//! This is the core of the crate: a byte-at-a-time automaton over
//! [`State`], deciding body framing from the headers it observes
//! (`Content-Length`, `Transfer-Encoding: chunked`, `Connection: close`)
//! and delegating body bytes to one of three strategies (length-counted,
//! chunked, or connection-close passthrough).

use crate::ascii::{equal_fold, is_printable, is_printable_non_space, parse_decimal};
use crate::chunk::ChunkedBodyDecoder;
use crate::consumer::Consumer;
use crate::error::{Error, Result};
use crate::settings::{Settings, METHOD_MAX_LEN, PROTOCOL_MAX_LEN};

const KNOWN_METHODS: &[&[u8]] = &[
    b"GET", b"HEAD", b"POST", b"PUT", b"DELETE", b"CONNECT", b"OPTIONS", b"TRACE", b"PATCH",
];

const KNOWN_PROTOCOLS: &[&[u8]] = &[b"HTTP/0.9", b"HTTP/1.0", b"HTTP/1.1"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Method,
    Path,
    Protocol,
    ProtocolCr,
    ProtocolLf,
    HeaderKey,
    HeaderColon,
    HeaderValue,
    HeaderValueCr,
    HeaderValueLf,
    HeaderValueDoubleCr,
    Body,
    BodyConnectionClose,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BodyMode {
    None,
    Length,
    Chunked,
    ConnectionClose,
}

enum BodyStep<'a> {
    Pending,
    Done(&'a [u8]),
}

/// Streaming, callback-driven parser for a pipeline of HTTP/1.x requests.
///
/// Owned by exactly one caller (typically a per-connection read loop).
/// Never shared between concurrent executors; `feed` never suspends and
/// holds no locks.
pub struct RequestFramer<C: Consumer> {
    consumer: C,
    settings: Settings,

    state: State,
    body_mode: BodyMode,

    // Start-line scratch: method, then path, then protocol, concatenated.
    start_line: Vec<u8>,
    method_end: usize,
    path_end: usize,

    // Headers scratch: current header's key, then value, concatenated.
    headers: Vec<u8>,
    header_key_end: usize,

    body_left: i64,
    chunked: bool,
    close_connection: bool,
    content_length_seen: bool,
    dead: bool,

    decoder: ChunkedBodyDecoder,
}

impl<C: Consumer> RequestFramer<C> {
    /// Construct a framer and emit the first `on_message_begin` to
    /// `consumer`. If that callback fails, no framer is constructed.
    pub fn new(mut consumer: C, mut settings: Settings) -> Result<Self> {
        let start_line = settings
            .start_line_buffer
            .take()
            .unwrap_or_else(|| Vec::with_capacity(settings.initial_path_buffer_length));
        let headers = settings
            .headers_buffer
            .take()
            .unwrap_or_else(|| Vec::with_capacity(settings.initial_headers_buffer_length));
        let max_chunk_length = settings.max_chunk_length;

        log::trace!("message begin");
        consumer.on_message_begin()?;

        Ok(RequestFramer {
            consumer,
            settings,
            state: State::Method,
            body_mode: BodyMode::None,
            start_line,
            method_end: 0,
            path_end: 0,
            headers,
            header_key_end: 0,
            body_left: 0,
            chunked: false,
            close_connection: false,
            content_length_seen: false,
            dead: false,
            decoder: ChunkedBodyDecoder::new(max_chunk_length),
        })
    }

    /// Drive the state machine over `bytes`. Pass an empty slice to signal
    /// end-of-stream (only meaningful while a connection-close body is in
    /// progress).
    ///
    /// All events for this call are delivered to the consumer before
    /// `feed` returns. On any error the framer transitions to a dead state:
    /// every subsequent call returns [`Error::ParserIsDead`] without
    /// invoking any consumer callback.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<()> {
        if self.dead {
            return Err(Error::ParserIsDead);
        }

        match self.feed_inner(bytes) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.dead = true;
                self.start_line.truncate(0);
                self.headers.truncate(0);
                Err(e)
            }
        }
    }

    fn feed_inner(&mut self, bytes: &[u8]) -> Result<()> {
        let mut remaining = bytes;

        loop {
            match self.state {
                State::Body => match advance_body(self.body_mode, &mut self.body_left, &mut self.decoder, &mut self.consumer, remaining)? {
                    BodyStep::Pending => return Ok(()),
                    BodyStep::Done(residue) => {
                        self.complete_and_restart()?;
                        remaining = residue;
                    }
                },
                State::BodyConnectionClose => {
                    if remaining.is_empty() {
                        log::debug!("connection-close body ended at eof, {} bytes left uncounted", self.body_left);
                        self.consumer.on_message_complete()?;
                        return Err(Error::ConnectionClosed);
                    }
                    let new_left = self.body_left - remaining.len() as i64;
                    if new_left < 0 {
                        return Err(Error::BodyTooBig);
                    }
                    self.consumer.on_body(remaining)?;
                    self.body_left = new_left;
                    return Ok(());
                }
                _ => {
                    let consumed = self.advance_headline(remaining)?;
                    remaining = &remaining[consumed..];
                    if !matches!(self.state, State::Body | State::BodyConnectionClose) {
                        return Ok(());
                    }
                    // Headers just completed; loop back around to drive the
                    // body (or the next pipelined message) with whatever of
                    // `remaining` is left, without recursing.
                }
            }
        }
    }

    /// Walks `input` one byte at a time through the request-line and
    /// header states. Returns the number of bytes consumed. May itself
    /// complete one or more zero-body pipelined messages before returning,
    /// but never recurses: the loop is bounded by `input.len()`.
    fn advance_headline(&mut self, input: &[u8]) -> Result<usize> {
        let mut i = 0;

        while i < input.len() {
            let b = input[i];
            i += 1;

            match self.state {
                State::Method => {
                    if b == b' ' {
                        let method = &self.start_line[..];
                        if !KNOWN_METHODS.contains(&method) {
                            return Err(Error::InvalidMethod);
                        }
                        self.method_end = self.start_line.len();
                        log::trace!("method: {:?}", String::from_utf8_lossy(method));
                        self.consumer.on_method(&self.start_line[..self.method_end])?;
                        self.state = State::Path;
                    } else if is_printable_non_space(b) {
                        if self.start_line.len() >= METHOD_MAX_LEN {
                            return Err(Error::InvalidMethod);
                        }
                        self.start_line.push(b);
                    } else {
                        return Err(Error::InvalidMethod);
                    }
                }

                State::Path => {
                    if b == b' ' {
                        if self.start_line.len() == self.method_end {
                            return Err(Error::InvalidPath);
                        }
                        self.path_end = self.start_line.len();
                        log::trace!(
                            "path: {:?}",
                            String::from_utf8_lossy(&self.start_line[self.method_end..self.path_end])
                        );
                        self.consumer
                            .on_path(&self.start_line[self.method_end..self.path_end])?;
                        self.state = State::Protocol;
                    } else if is_printable_non_space(b) {
                        if self.start_line.len() - self.method_end >= self.settings.max_path_length {
                            return Err(Error::BufferOverflow);
                        }
                        self.start_line.push(b);
                    } else {
                        return Err(Error::InvalidPath);
                    }
                }

                State::Protocol => {
                    if b == b'\r' {
                        self.state = State::ProtocolCr;
                    } else if b == b'\n' {
                        self.state = State::ProtocolLf;
                        self.finish_protocol_line(b)?;
                    } else if is_printable(b) {
                        if self.start_line.len() - self.path_end >= PROTOCOL_MAX_LEN {
                            return Err(Error::BufferOverflow);
                        }
                        self.start_line.push(b);
                    } else {
                        return Err(Error::RequestSyntaxError);
                    }
                }

                State::ProtocolCr => {
                    if b != b'\n' {
                        return Err(Error::RequestSyntaxError);
                    }
                    self.state = State::ProtocolLf;
                    self.finish_protocol_line(b)?;
                }

                State::ProtocolLf => {
                    // `b` here is the first byte of the header block (or
                    // the request's terminating CRLF/LF if there are no
                    // headers at all).
                    if b == b'\r' {
                        self.state = State::HeaderValueDoubleCr;
                    } else if b == b'\n' {
                        self.resolve_headers_complete()?;
                    } else if is_printable(b) && b != b':' {
                        self.headers.push(b);
                        self.state = State::HeaderKey;
                    } else {
                        return Err(Error::InvalidHeader);
                    }
                }

                State::HeaderKey => {
                    if b == b':' {
                        self.header_key_end = self.headers.len();
                        self.state = State::HeaderColon;
                    } else if is_printable(b) {
                        if self.headers.len() >= self.settings.max_header_line_length {
                            return Err(Error::BufferOverflow);
                        }
                        self.headers.push(b);
                    } else {
                        return Err(Error::InvalidHeader);
                    }
                }

                State::HeaderColon => {
                    if b == b' ' {
                        self.state = State::HeaderValue;
                    } else if is_printable_non_space(b) {
                        if self.headers.len() >= self.settings.max_header_line_length {
                            return Err(Error::BufferOverflow);
                        }
                        self.headers.push(b);
                        self.state = State::HeaderValue;
                    } else {
                        return Err(Error::InvalidHeader);
                    }
                }

                State::HeaderValue => {
                    if b == b'\r' {
                        self.state = State::HeaderValueCr;
                    } else if b == b'\n' {
                        self.state = State::HeaderValueLf;
                        self.finish_header_value(b)?;
                    } else if is_printable(b) {
                        if self.headers.len() >= self.settings.max_header_line_length {
                            return Err(Error::BufferOverflow);
                        }
                        self.headers.push(b);
                    } else {
                        return Err(Error::InvalidHeader);
                    }
                }

                State::HeaderValueCr => {
                    if b != b'\n' {
                        return Err(Error::RequestSyntaxError);
                    }
                    self.state = State::HeaderValueLf;
                    self.finish_header_value(b)?;
                }

                State::HeaderValueLf => {
                    // `b` is the first byte of the next header line, or the
                    // terminating CR/LF of the header block.
                    if b == b'\r' {
                        self.state = State::HeaderValueDoubleCr;
                    } else if b == b'\n' {
                        self.resolve_headers_complete()?;
                    } else if is_printable(b) && b != b':' {
                        self.headers.push(b);
                        self.state = State::HeaderKey;
                    } else {
                        return Err(Error::InvalidHeader);
                    }
                }

                State::HeaderValueDoubleCr => {
                    if b != b'\n' {
                        return Err(Error::RequestSyntaxError);
                    }
                    self.resolve_headers_complete()?;
                }

                State::Body | State::BodyConnectionClose => unreachable!("handled by feed_inner"),
            }

            if matches!(self.state, State::Body | State::BodyConnectionClose) {
                return Ok(i);
            }
        }

        Ok(i)
    }

    /// Called when the request line's trailing CR or LF is seen (the `b`
    /// passed in is only used to log; the protocol text itself sits in
    /// `start_line[path_end..]`). Emits `Protocol`/`HeadersBegin` when the
    /// terminator is a bare LF (the `\r\n` path instead emits from
    /// `ProtocolCr`'s LF, via the same call).
    fn finish_protocol_line(&mut self, _terminator: u8) -> Result<()> {
        let protocol = &self.start_line[self.path_end..];
        if !KNOWN_PROTOCOLS.iter().any(|p| equal_fold(protocol, p)) {
            return Err(Error::ProtocolNotSupported);
        }
        log::trace!("protocol: {:?}", String::from_utf8_lossy(protocol));
        self.consumer.on_protocol(protocol)?;
        self.consumer.on_headers_begin()?;
        Ok(())
    }

    fn finish_header_value(&mut self, _terminator: u8) -> Result<()> {
        let key_end = self.header_key_end;
        {
            let (key, value) = self.headers.split_at(key_end);
            self.consumer.on_header(key, value)?;
        }
        self.interpret_header(key_end)?;
        self.headers.truncate(0);
        self.header_key_end = 0;
        Ok(())
    }

    fn interpret_header(&mut self, key_end: usize) -> Result<()> {
        let key = &self.headers[..key_end];
        let value = &self.headers[key_end..];

        if equal_fold(key, b"content-length") {
            let v = parse_decimal(value).ok_or(Error::InvalidContentLength)?;
            self.body_left = v;
            self.content_length_seen = true;
        } else if equal_fold(key, b"transfer-encoding") {
            self.chunked = equal_fold(value, b"chunked");
        } else if equal_fold(key, b"connection") {
            self.close_connection = equal_fold(value, b"close");
        }

        Ok(())
    }

    /// Headers-complete resolution (spec.md §4.1): decide body framing from
    /// the headers observed so far. `Transfer-Encoding: chunked` wins over
    /// `Content-Length`; `Content-Length` wins over `Connection: close`
    /// (the latter is used only when no length was specified at all).
    fn resolve_headers_complete(&mut self) -> Result<()> {
        self.consumer.on_headers_complete()?;

        if self.chunked {
            log::debug!("body mode: chunked");
            self.decoder.clear();
            self.body_mode = BodyMode::Chunked;
            self.state = State::Body;
        } else if self.content_length_seen {
            log::debug!("body mode: length-delimited, {} bytes", self.body_left);
            if self.body_left == 0 {
                self.complete_and_restart()?;
            } else {
                self.body_mode = BodyMode::Length;
                self.state = State::Body;
            }
        } else if self.close_connection {
            log::debug!("body mode: connection-close");
            self.body_left = self.settings.max_body_length;
            self.body_mode = BodyMode::ConnectionClose;
            self.state = State::BodyConnectionClose;
        } else {
            log::debug!("body mode: none");
            self.complete_and_restart()?;
        }

        Ok(())
    }

    fn complete_and_restart(&mut self) -> Result<()> {
        log::trace!("message complete");
        self.consumer.on_message_complete()?;
        self.clear();
        log::trace!("message begin");
        self.consumer.on_message_begin()?;
        Ok(())
    }

    /// Resets framing state to parse the next pipelined message. Does not
    /// emit `on_message_begin` -- callers that want the next message's
    /// begin-event call it themselves (see `complete_and_restart`).
    fn clear(&mut self) {
        self.state = State::Method;
        self.body_mode = BodyMode::None;
        self.start_line.truncate(0);
        self.method_end = 0;
        self.path_end = 0;
        self.headers.truncate(0);
        self.header_key_end = 0;
        self.body_left = 0;
        self.chunked = false;
        self.close_connection = false;
        self.content_length_seen = false;
    }

    /// Consumer access for callers that want to inspect or recover owned
    /// state after the connection ends.
    pub fn into_consumer(self) -> C {
        self.consumer
    }
}

fn advance_body<'a, C: Consumer>(
    mode: BodyMode,
    body_left: &mut i64,
    decoder: &mut ChunkedBodyDecoder,
    consumer: &mut C,
    input: &'a [u8],
) -> Result<BodyStep<'a>> {
    log::trace!("advance_body: mode={:?}, {} bytes in", mode, input.len());
    match mode {
        BodyMode::Length => advance_length(body_left, consumer, input),
        BodyMode::Chunked => advance_chunked(decoder, consumer, input),
        BodyMode::ConnectionClose | BodyMode::None => {
            unreachable!("connection-close and no-body modes never reach advance_body")
        }
    }
}

fn advance_length<'a, C: Consumer>(
    body_left: &mut i64,
    consumer: &mut C,
    input: &'a [u8],
) -> Result<BodyStep<'a>> {
    let left = *body_left as usize;

    if input.len() < left {
        if !input.is_empty() {
            consumer.on_body(input)?;
        }
        *body_left -= input.len() as i64;
        Ok(BodyStep::Pending)
    } else {
        let (data, residue) = input.split_at(left);
        if !data.is_empty() {
            consumer.on_body(data)?;
        }
        *body_left = 0;
        Ok(BodyStep::Done(residue))
    }
}

fn advance_chunked<'a, C: Consumer>(
    decoder: &mut ChunkedBodyDecoder,
    consumer: &mut C,
    input: &'a [u8],
) -> Result<BodyStep<'a>> {
    match decoder.feed(input, consumer)? {
        Some(consumed) => Ok(BodyStep::Done(&input[consumed..])),
        None => Ok(BodyStep::Pending),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        bodies: Vec<Vec<u8>>,
        messages_completed: usize,
    }

    impl Consumer for Recorder {
        fn on_body(&mut self, chunk: &[u8]) -> Result<()> {
            self.bodies.push(chunk.to_vec());
            Ok(())
        }

        fn on_message_complete(&mut self) -> Result<()> {
            self.messages_completed += 1;
            Ok(())
        }
    }

    fn framer() -> RequestFramer<Recorder> {
        RequestFramer::new(Recorder::default(), Settings::default()).unwrap()
    }

    #[test]
    fn bare_lf_line_endings_are_accepted() {
        let mut f = framer();
        f.feed(b"GET / HTTP/1.1\nContent-Length: 2\n\nhi").unwrap();
        assert_eq!(f.consumer.bodies, vec![b"hi".to_vec()]);
        assert_eq!(f.consumer.messages_completed, 1);
    }

    #[test]
    fn path_exceeding_max_length_overflows() {
        let settings = Settings {
            max_path_length: 3,
            ..Default::default()
        };
        let mut f = RequestFramer::new(Recorder::default(), settings).unwrap();
        let err = f.feed(b"GET /abcd HTTP/1.1\r\n\r\n").unwrap_err();
        assert_eq!(err, Error::BufferOverflow);
    }

    #[test]
    fn header_line_exceeding_max_length_overflows() {
        let settings = Settings {
            max_header_line_length: 4,
            ..Default::default()
        };
        let mut f = RequestFramer::new(Recorder::default(), settings).unwrap();
        let err = f.feed(b"GET / HTTP/1.1\r\nX-Too-Long: v\r\n\r\n").unwrap_err();
        assert_eq!(err, Error::BufferOverflow);
    }

    #[test]
    fn lone_cr_in_protocol_is_syntax_error() {
        let mut f = framer();
        let err = f.feed(b"GET / HTTP/1.1\rx").unwrap_err();
        assert_eq!(err, Error::RequestSyntaxError);
    }

    #[test]
    fn lone_cr_in_header_value_is_syntax_error() {
        let mut f = framer();
        let err = f.feed(b"GET / HTTP/1.1\r\nHost: x\rY").unwrap_err();
        assert_eq!(err, Error::RequestSyntaxError);
    }

    #[test]
    fn colon_as_first_header_byte_is_invalid_header() {
        let mut f = framer();
        let err = f.feed(b"GET / HTTP/1.1\r\n: value\r\n\r\n").unwrap_err();
        assert_eq!(err, Error::InvalidHeader);
    }

    #[test]
    fn non_printable_byte_in_header_value_is_invalid_header() {
        let mut f = framer();
        let err = f.feed(b"GET / HTTP/1.1\r\nX: a\x01b\r\n\r\n").unwrap_err();
        assert_eq!(err, Error::InvalidHeader);
    }

    #[test]
    fn invalid_content_length_value() {
        let mut f = framer();
        let err = f.feed(b"GET / HTTP/1.1\r\nContent-Length: abc\r\n\r\n").unwrap_err();
        assert_eq!(err, Error::InvalidContentLength);
    }

    #[test]
    fn connection_close_body_exceeding_max_is_body_too_big() {
        let settings = Settings {
            max_body_length: 2,
            ..Default::default()
        };
        let mut f = RequestFramer::new(Recorder::default(), settings).unwrap();
        let err = f
            .feed(b"GET / HTTP/1.1\r\nConnection: close\r\n\r\nabc")
            .unwrap_err();
        assert_eq!(err, Error::BodyTooBig);
    }

    struct UpgradingConsumer;

    impl Consumer for UpgradingConsumer {
        fn on_message_complete(&mut self) -> Result<()> {
            Err(Error::Upgrade(vec!["websocket".to_string()]))
        }
    }

    #[test]
    fn on_message_complete_upgrade_signal_propagates_and_kills_parser() {
        let mut f = RequestFramer::new(UpgradingConsumer, Settings::default()).unwrap();
        let err = f.feed(b"GET / HTTP/1.1\r\n\r\n").unwrap_err();
        assert_eq!(err, Error::Upgrade(vec!["websocket".to_string()]));
        let err2 = f.feed(b"GET / HTTP/1.1\r\n\r\n").unwrap_err();
        assert_eq!(err2, Error::ParserIsDead);
    }
}
