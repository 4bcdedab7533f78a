//! End-to-end scenarios driving `RequestFramer` through a recording
//! `Consumer`, mirroring the concrete request/response pairs this parser
//! is meant to handle.

use wirehttp::{Consumer, Error, RequestFramer, Result, Settings};

#[derive(Default, Debug)]
struct Recorder {
    events: Vec<String>,
    headers: Vec<(Vec<u8>, Vec<u8>)>,
    bodies: Vec<Vec<u8>>,
    messages_completed: usize,
}

impl Consumer for Recorder {
    fn on_message_begin(&mut self) -> Result<()> {
        self.events.push("begin".into());
        Ok(())
    }

    fn on_method(&mut self, method: &[u8]) -> Result<()> {
        self.events.push(format!("method:{}", String::from_utf8_lossy(method)));
        Ok(())
    }

    fn on_path(&mut self, path: &[u8]) -> Result<()> {
        self.events.push(format!("path:{}", String::from_utf8_lossy(path)));
        Ok(())
    }

    fn on_protocol(&mut self, protocol: &[u8]) -> Result<()> {
        self.events
            .push(format!("protocol:{}", String::from_utf8_lossy(protocol)));
        Ok(())
    }

    fn on_headers_begin(&mut self) -> Result<()> {
        self.events.push("headers_begin".into());
        Ok(())
    }

    fn on_header(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.headers.push((key.to_vec(), value.to_vec()));
        Ok(())
    }

    fn on_headers_complete(&mut self) -> Result<()> {
        self.events.push("headers_complete".into());
        Ok(())
    }

    fn on_body(&mut self, chunk: &[u8]) -> Result<()> {
        self.bodies.push(chunk.to_vec());
        Ok(())
    }

    fn on_message_complete(&mut self) -> Result<()> {
        self.messages_completed += 1;
        self.events.push("complete".into());
        Ok(())
    }
}

fn framer() -> RequestFramer<Recorder> {
    RequestFramer::new(Recorder::default(), Settings::default()).unwrap()
}

#[test]
fn simple_get_no_body() {
    let mut f = framer();
    f.feed(b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n").unwrap();
    let c = f.into_consumer();
    assert_eq!(c.messages_completed, 1);
    assert!(c.bodies.is_empty());
    assert_eq!(
        c.headers,
        vec![(b"Host".to_vec(), b"example.com".to_vec())]
    );
}

#[test]
fn post_with_content_length() {
    let mut f = framer();
    f.feed(b"POST /submit HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello").unwrap();
    let c = f.into_consumer();
    assert_eq!(c.messages_completed, 1);
    assert_eq!(c.bodies, vec![b"hello".to_vec()]);
}

#[test]
fn chunked_body() {
    let mut f = framer();
    f.feed(b"POST /x HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\nd\r\nHello, world!\r\n0\r\n\r\n")
        .unwrap();
    let c = f.into_consumer();
    assert_eq!(c.messages_completed, 1);
    assert_eq!(c.bodies, vec![b"Hello, world!".to_vec()]);
}

#[test]
fn connection_close_body_ends_on_eof() {
    let mut f = framer();
    f.feed(b"GET /x HTTP/1.1\r\nConnection: close\r\n\r\nleftover bytes")
        .unwrap();
    let err = f.feed(b"").unwrap_err();
    assert_eq!(err, Error::ConnectionClosed);
    let c = f.into_consumer();
    assert_eq!(c.messages_completed, 1);
    assert_eq!(c.bodies, vec![b"leftover bytes".to_vec()]);
}

#[test]
fn content_length_wins_over_connection_close() {
    let mut f = framer();
    f.feed(b"GET /x HTTP/1.1\r\nContent-Length: 3\r\nConnection: close\r\n\r\nabc")
        .unwrap();
    let c = f.into_consumer();
    assert_eq!(c.messages_completed, 1);
    assert_eq!(c.bodies, vec![b"abc".to_vec()]);
}

#[test]
fn pipelined_requests_in_one_buffer() {
    let mut f = framer();
    f.feed(b"GET /a HTTP/1.1\r\n\r\nGET /b HTTP/1.1\r\n\r\n").unwrap();
    let c = f.into_consumer();
    assert_eq!(c.messages_completed, 2);
    let paths: Vec<_> = c.events.iter().filter(|e| e.starts_with("path:")).collect();
    assert_eq!(paths, vec!["path:/a", "path:/b"]);
}

#[test]
fn byte_at_a_time_feed_matches_whole_buffer_feed() {
    let input: &[u8] = b"POST /x HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello";

    let mut whole = framer();
    whole.feed(input).unwrap();
    let whole_c = whole.into_consumer();

    let mut split = framer();
    for b in input {
        split.feed(&[*b]).unwrap();
    }
    let split_c = split.into_consumer();

    assert_eq!(whole_c.events, split_c.events);
    assert_eq!(whole_c.bodies, split_c.bodies);
}

#[test]
fn case_insensitive_framing_headers() {
    let mut f = framer();
    f.feed(b"POST /x HTTP/1.1\r\nCONTENT-LENGTH: 2\r\n\r\nhi").unwrap();
    let c = f.into_consumer();
    assert_eq!(c.bodies, vec![b"hi".to_vec()]);
}

#[test]
fn invalid_method_dies_parser() {
    let mut f = framer();
    let err = f.feed(b"G\x01T / HTTP/1.1\r\n\r\n").unwrap_err();
    assert_eq!(err, Error::InvalidMethod);
    let err2 = f.feed(b"GET / HTTP/1.1\r\n\r\n").unwrap_err();
    assert_eq!(err2, Error::ParserIsDead);
}

#[test]
fn no_events_after_error() {
    let mut f = framer();
    let _ = f.feed(b"GET / HTTP/9.9\r\n\r\n");
    let c = f.into_consumer();
    assert!(!c.events.contains(&"headers_complete".to_string()));
}

#[test]
fn unsupported_protocol_rejected() {
    let mut f = framer();
    let err = f.feed(b"GET / HTTP/2.0\r\n\r\n").unwrap_err();
    assert_eq!(err, Error::ProtocolNotSupported);
}

#[test]
fn chunked_wins_over_content_length() {
    let mut f = framer();
    f.feed(
        b"POST /x HTTP/1.1\r\nContent-Length: 999\r\nTransfer-Encoding: chunked\r\n\r\n3\r\nabc\r\n0\r\n\r\n",
    )
    .unwrap();
    let c = f.into_consumer();
    assert_eq!(c.bodies, vec![b"abc".to_vec()]);
}

#[test]
fn caller_supplied_scratch_buffers_are_used() {
    let settings = Settings {
        start_line_buffer: Some(Vec::with_capacity(64)),
        headers_buffer: Some(Vec::with_capacity(64)),
        ..Default::default()
    };

    let mut f = RequestFramer::new(Recorder::default(), settings).unwrap();
    f.feed(b"GET /a HTTP/1.1\r\n\r\nGET /b HTTP/1.1\r\n\r\n").unwrap();
    let c = f.into_consumer();
    assert_eq!(c.messages_completed, 2);
}
