use crate::error::Result;

/// The abstract sink a [`crate::RequestFramer`] drives with semantic
/// parsing events, in strict protocol order:
///
/// ```text
/// on_message_begin -> on_method -> on_path -> on_protocol -> on_headers_begin
///   -> on_header* -> on_headers_complete -> on_body* -> on_message_complete
///   -> on_message_begin (next pipelined request)
/// ```
///
/// Every method has a no-op default, so an implementer only overrides the
/// events it cares about. Byte slices passed to any callback alias into
/// either the caller's `feed()` input or the framer's own scratch buffers;
/// they are valid only for the duration of the call. Copy anything you need
/// to retain past the callback returning.
///
/// Returning `Err` from any callback transitions the framer to `Dead` and
/// that error is surfaced from `feed()` unchanged. `on_message_complete` may
/// additionally return [`crate::Error::Upgrade`] to signal a protocol
/// switch; the framer treats it the same as any other error (it stops), but
/// the caller can distinguish it by matching the variant.
pub trait Consumer {
    /// A new request has started (either the first, or the next pipelined
    /// one following a prior `on_message_complete`).
    fn on_message_begin(&mut self) -> Result<()> {
        Ok(())
    }

    /// The request method, e.g. `b"GET"`.
    fn on_method(&mut self, _method: &[u8]) -> Result<()> {
        Ok(())
    }

    /// The request path/target, e.g. `b"/"`.
    fn on_path(&mut self, _path: &[u8]) -> Result<()> {
        Ok(())
    }

    /// The protocol token, e.g. `b"HTTP/1.1"`.
    fn on_protocol(&mut self, _protocol: &[u8]) -> Result<()> {
        Ok(())
    }

    /// The header block is starting.
    fn on_headers_begin(&mut self) -> Result<()> {
        Ok(())
    }

    /// One header line. `key` preserves its original case; `value` has
    /// exactly one leading optional-whitespace byte stripped per the wire
    /// grammar.
    fn on_header(&mut self, _key: &[u8], _value: &[u8]) -> Result<()> {
        Ok(())
    }

    /// The header block is complete; body framing has been decided.
    fn on_headers_complete(&mut self) -> Result<()> {
        Ok(())
    }

    /// A slice of body bytes. May be called zero or more times depending on
    /// framing (zero for an empty body, many for a multi-chunk or
    /// multi-fragment body).
    fn on_body(&mut self, _chunk: &[u8]) -> Result<()> {
        Ok(())
    }

    /// The request is fully parsed. Never called on an error path.
    fn on_message_complete(&mut self) -> Result<()> {
        Ok(())
    }
}
