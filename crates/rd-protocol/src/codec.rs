//! Tokio codec for newline-delimited JSON messages
//!
//! Each message is one JSON object terminated by `\n`. Framing errors (an
//! oversized line, I/O failure) are fatal to the stream. A line that frames
//! correctly but does not parse is surfaced as an `Err` *item* so the caller
//! can log it and keep reading.

use std::marker::PhantomData;

use bytes::{BufMut, BytesMut};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::codec::{Decoder, Encoder, LinesCodec, LinesCodecError};

use crate::error::ProtocolError;

/// Maximum length of a single line (64 KiB)
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Codec decoding `In` messages and encoding `Out` messages
#[derive(Debug)]
pub struct JsonLinesCodec<In, Out> {
    lines: LinesCodec,
    max_length: usize,
    _marker: PhantomData<fn(Out) -> In>,
}

impl<In, Out> JsonLinesCodec<In, Out> {
    /// Create a codec with the default line limit
    pub fn new() -> Self {
        Self::with_max_length(MAX_LINE_LENGTH)
    }

    /// Create a codec with a custom line limit
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            lines: LinesCodec::new_with_max_length(max_length),
            max_length,
            _marker: PhantomData,
        }
    }

    /// Maximum accepted line length
    pub fn max_length(&self) -> usize {
        self.max_length
    }
}

impl<In, Out> Default for JsonLinesCodec<In, Out> {
    fn default() -> Self {
        Self::new()
    }
}

impl<In, Out> JsonLinesCodec<In, Out> {
    fn map_lines_error(&self, err: LinesCodecError) -> ProtocolError {
        match err {
            LinesCodecError::MaxLineLengthExceeded => ProtocolError::LineTooLong {
                max: self.max_length,
            },
            LinesCodecError::Io(e) => ProtocolError::Io(e),
        }
    }

    fn parse(line: &str) -> Option<Result<In, serde_json::Error>>
    where
        In: DeserializeOwned,
    {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(serde_json::from_str(trimmed))
    }
}

impl<In: DeserializeOwned, Out> Decoder for JsonLinesCodec<In, Out> {
    type Item = Result<In, serde_json::Error>;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            let line = match self.lines.decode(src) {
                Ok(Some(line)) => line,
                Ok(None) => return Ok(None), // Need more data
                Err(e) => return Err(self.map_lines_error(e)),
            };

            // Blank keepalive lines are skipped
            if let Some(item) = Self::parse(&line) {
                return Ok(Some(item));
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            let line = match self.lines.decode_eof(src) {
                Ok(Some(line)) => line,
                Ok(None) => return Ok(None),
                Err(e) => return Err(self.map_lines_error(e)),
            };

            if let Some(item) = Self::parse(&line) {
                return Ok(Some(item));
            }
        }
    }
}

impl<In, Out: Serialize> Encoder<Out> for JsonLinesCodec<In, Out> {
    type Error = ProtocolError;

    fn encode(&mut self, item: Out, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let payload = serde_json::to_vec(&item)?;

        if payload.len() > self.max_length {
            return Err(ProtocolError::LineTooLong {
                max: self.max_length,
            });
        }

        dst.reserve(payload.len() + 1);
        dst.put_slice(&payload);
        dst.put_u8(b'\n');

        Ok(())
    }
}
