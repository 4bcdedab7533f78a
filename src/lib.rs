//! Sans-IO, streaming HTTP/1.x request parser.
//!
//! wirehttp parses the HTTP/1.x request line, headers, and body framing
//! byte-at-a-time as bytes arrive, without ever assuming a full request is
//! buffered. The caller owns the transport (socket, pipe, in-memory test
//! fixture, whatever); this crate only turns bytes into events delivered to
//! a [`Consumer`] implementation.
//!
//! # In scope:
//!
//! * Request-line, header, and body parsing for HTTP/1.x
//! * `Content-Length`, `Transfer-Encoding: chunked`, and connection-close
//!   body framing
//! * Request pipelining (multiple requests back-to-back in one buffer)
//! * Upgrade signaling via [`Error::Upgrade`]
//!
//! # Out of scope:
//!
//! * Opening/closing sockets, TLS
//! * Response parsing, client-side request building, redirects
//! * Header semantics beyond the three framing headers above (cookies,
//!   content negotiation, auth, compression, ...)

#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![allow(clippy::uninlined_format_args)]

mod ascii;
mod chunk;
mod consumer;
mod error;
mod framer;
mod settings;

pub use consumer::Consumer;
pub use error::{Error, Result};
pub use framer::RequestFramer;
pub use settings::Settings;
