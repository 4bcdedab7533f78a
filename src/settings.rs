//! Enumerated tunables for [`crate::RequestFramer`].

/// Configuration for a [`crate::RequestFramer`].
///
/// All fields are plain and public; build one with struct-update syntax
/// from [`Default`]:
///
/// ```
/// use wirehttp::Settings;
///
/// let settings = Settings {
///     max_path_length: 8192,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct Settings {
    /// Hard cap on path bytes. Exceeding it is [`crate::Error::BufferOverflow`].
    pub max_path_length: usize,

    /// Hard cap on combined key+value bytes for a single header line.
    pub max_header_line_length: usize,

    /// Hard cap for a connection-close-delimited body; also the decrement
    /// counter seed for that mode.
    pub max_body_length: i64,

    /// Hard cap on a single chunk; also sizes the chunked decoder's scratch
    /// buffer.
    pub max_chunk_length: usize,

    /// Initial capacity of the start-line scratch buffer.
    pub initial_path_buffer_length: usize,

    /// Initial capacity of the headers scratch buffer.
    pub initial_headers_buffer_length: usize,

    /// Caller-supplied scratch buffer for the start line (method + path +
    /// protocol). When absent, one is allocated at
    /// `initial_path_buffer_length`.
    pub start_line_buffer: Option<Vec<u8>>,

    /// Caller-supplied scratch buffer for headers. When absent, one is
    /// allocated at `initial_headers_buffer_length`.
    pub headers_buffer: Option<Vec<u8>>,
}

/// Method length is fixed at 7 bytes (`"OPTIONS"`/`"CONNECT"` are the
/// longest entries in the known method set).
pub(crate) const METHOD_MAX_LEN: usize = 7;

/// Protocol token length is fixed at 10 bytes (`"HTTP/1.1\r\n"` minus the
/// terminator leaves room for exactly `"HTTP/1.1"` plus slack; the cap
/// itself is on the token bytes before CR/LF).
pub(crate) const PROTOCOL_MAX_LEN: usize = 10;

impl Default for Settings {
    fn default() -> Self {
        Settings {
            max_path_length: 4092,
            max_header_line_length: 4092,
            max_body_length: (1i64 << 31) - 1,
            max_chunk_length: 65535,
            initial_path_buffer_length: 2046,
            initial_headers_buffer_length: 2046,
            start_line_buffer: None,
            headers_buffer: None,
        }
    }
}
