//! Byte-level state machine decoding `chunk-size CRLF chunk-data CRLF ...
//! 0 CRLF CRLF`. Chunk extensions and trailer headers are not recognized
//! (documented non-goal): any byte on a chunk-size line that isn't a hex
//! digit or the CR/LF terminator is a syntax error rather than being
//! skipped, since silently accepting extensions we don't parse would be a
//! correctness trap.

use crate::ascii::{hex_digit_cap, is_hex_digit, parse_hex};
use crate::consumer::Consumer;
use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    ChunkLength,
    ChunkBody,
    SplitterChunkLengthCr,
    SplitterChunkBodyBegin,
    SplitterChunkBodyCr,
    TransferCompleted,
}

/// Streaming decoder for `Transfer-Encoding: chunked` bodies.
///
/// Owns a scratch buffer sized to `max_chunk_length` that holds the
/// currently-accumulating chunk-size digits or chunk body bytes. The buffer
/// never exceeds `hex_cap` while in [`State::ChunkLength`], and never
/// exceeds `chunk_length` while in [`State::ChunkBody`].
pub(crate) struct ChunkedBodyDecoder {
    state: State,
    scratch: Vec<u8>,
    chunk_length: u64,
    hex_cap: usize,
}

impl ChunkedBodyDecoder {
    pub(crate) fn new(max_chunk_length: usize) -> Self {
        ChunkedBodyDecoder {
            state: State::ChunkLength,
            scratch: Vec::with_capacity(max_chunk_length),
            chunk_length: 0,
            hex_cap: hex_digit_cap(max_chunk_length),
        }
    }

    /// Reset to decode a fresh body; capacity is preserved.
    pub(crate) fn clear(&mut self) {
        self.state = State::ChunkLength;
        self.scratch.truncate(0);
        self.chunk_length = 0;
    }

    pub(crate) fn is_ended(&self) -> bool {
        self.state == State::TransferCompleted
    }

    /// Feed raw body bytes through the decoder, calling `consumer.on_body`
    /// for each fully-decoded chunk. Returns the number of leading bytes of
    /// `input` consumed once the transfer completes (everything up to and
    /// including the final CRLF), `None` while still in progress.
    pub(crate) fn feed<C: Consumer>(
        &mut self,
        input: &[u8],
        consumer: &mut C,
    ) -> Result<Option<usize>> {
        if self.state == State::TransferCompleted {
            self.clear();
        }

        let mut i = 0;
        while i < input.len() {
            let b = input[i];

            match self.state {
                State::ChunkLength => {
                    if b == b'\r' {
                        self.finish_chunk_length()?;
                        self.state = State::SplitterChunkLengthCr;
                    } else if b == b'\n' {
                        self.finish_chunk_length()?;
                        self.state = if self.chunk_length == 0 {
                            State::SplitterChunkBodyBegin
                        } else {
                            State::ChunkBody
                        };
                    } else if is_hex_digit(b) {
                        if self.scratch.len() >= self.hex_cap {
                            return Err(Error::TooBigChunkSize);
                        }
                        self.scratch.push(b);
                    } else {
                        return Err(Error::InvalidChunkSize);
                    }
                    i += 1;
                }

                State::SplitterChunkLengthCr => {
                    if b != b'\n' {
                        return Err(Error::InvalidChunkSplitter);
                    }
                    self.state = if self.chunk_length == 0 {
                        State::SplitterChunkBodyBegin
                    } else {
                        State::ChunkBody
                    };
                    i += 1;
                }

                State::ChunkBody => {
                    let remaining = (self.chunk_length as usize) - self.scratch.len();
                    let take = remaining.min(input.len() - i);
                    self.scratch.extend_from_slice(&input[i..i + take]);
                    i += take;

                    if self.scratch.len() as u64 == self.chunk_length {
                        log::trace!("chunk body complete: {} bytes", self.scratch.len());
                        consumer.on_body(&self.scratch)?;
                        self.scratch.truncate(0);
                        self.state = State::SplitterChunkBodyBegin;
                    }
                }

                State::SplitterChunkBodyBegin => {
                    if b == b'\r' {
                        self.state = State::SplitterChunkBodyCr;
                        i += 1;
                    } else if b == b'\n' {
                        i += 1;
                        if self.chunk_length == 0 {
                            log::trace!("chunked transfer completed");
                            self.state = State::TransferCompleted;
                            return Ok(Some(i));
                        }
                        self.state = State::ChunkLength;
                    } else {
                        return Err(Error::InvalidChunkSplitter);
                    }
                }

                State::SplitterChunkBodyCr => {
                    if b != b'\n' {
                        return Err(Error::InvalidChunkSplitter);
                    }
                    i += 1;
                    if self.chunk_length == 0 {
                        log::trace!("chunked transfer completed");
                        self.state = State::TransferCompleted;
                        return Ok(Some(i));
                    }
                    self.state = State::ChunkLength;
                }

                State::TransferCompleted => unreachable!("cleared at top of feed"),
            }
        }

        Ok(None)
    }

    fn finish_chunk_length(&mut self) -> Result<()> {
        let len = parse_hex(&self.scratch).ok_or(Error::InvalidChunkSize)?;
        log::trace!("chunk size: {}", len);
        self.scratch.truncate(0);
        self.chunk_length = len;
        Ok(())
    }
}
