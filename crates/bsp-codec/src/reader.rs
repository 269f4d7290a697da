use std::io::{self, BufRead, BufReader, Read};
use std::marker::PhantomData;

use bsp_types::Digest;
use serde::de::DeserializeOwned;

use crate::error::{CodecError, CodecResult};
use crate::writer::ArrayStats;

/// Reader adapter hashing every byte read through it.
pub struct HashingReader<R> {
    inner: R,
    hasher: blake3::Hasher,
}

impl<R: Read> HashingReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            hasher: blake3::Hasher::new(),
        }
    }

    pub fn digest(&self) -> Digest {
        Digest::from_hash(*self.hasher.finalize().as_bytes())
    }
}

impl<R: Read> Read for HashingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Open,
    First,
    Rest,
    Closed,
    Failed,
}

/// Incremental reader over a JSON array of objects.
///
/// Yields one decoded element per iteration and never holds more than one
/// element in memory. Elements must be JSON objects or arrays: the element
/// decoder stops exactly at the closing bracket, so no byte of the next
/// delimiter is lost. After the first error the iterator is fused.
pub struct JsonArrayReader<R: Read, T> {
    reader: BufReader<HashingReader<R>>,
    state: State,
    ordinal: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<R: Read, T: DeserializeOwned> JsonArrayReader<R, T> {
    pub fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(HashingReader::new(inner)),
            state: State::Open,
            ordinal: 0,
            _marker: PhantomData,
        }
    }

    /// Elements decoded so far.
    pub fn decoded(&self) -> u64 {
        self.ordinal
    }

    /// Consume the rest of the input, which must be whitespace only, and
    /// return the element count and the checksum of every byte read.
    ///
    /// Fails if the closing bracket has not been reached yet.
    pub fn finish(mut self) -> CodecResult<ArrayStats> {
        if self.state != State::Closed {
            return Err(CodecError::StreamAborted);
        }
        if let Some(byte) = self.peek_non_ws()? {
            return Err(self.delimiter_error("end of input", Some(byte)));
        }
        Ok(ArrayStats {
            count: self.ordinal,
            checksum: self.reader.get_ref().digest(),
        })
    }

    fn next_element(&mut self) -> CodecResult<Option<T>> {
        match self.state {
            State::Closed | State::Failed => return Ok(None),
            State::Open => {
                self.expect(b'[', "'['")?;
                self.state = State::First;
            }
            State::First | State::Rest => {}
        }

        match self.peek_non_ws()? {
            Some(b']') => {
                self.reader.consume(1);
                self.state = State::Closed;
                return Ok(None);
            }
            Some(b',') if self.state == State::Rest => self.reader.consume(1),
            other if self.state == State::Rest => {
                return Err(self.delimiter_error("',' or ']'", other));
            }
            None => return Err(self.delimiter_error("an element or ']'", None)),
            Some(_) => {}
        }

        let mut de = serde_json::Deserializer::from_reader(&mut self.reader);
        let item = T::deserialize(&mut de).map_err(|e| CodecError::Decode {
            ordinal: self.ordinal,
            reason: e.to_string(),
        })?;
        self.ordinal += 1;
        self.state = State::Rest;
        Ok(Some(item))
    }

    fn expect(&mut self, byte: u8, expected: &'static str) -> CodecResult<()> {
        match self.peek_non_ws()? {
            Some(b) if b == byte => {
                self.reader.consume(1);
                Ok(())
            }
            other => Err(self.delimiter_error(expected, other)),
        }
    }

    /// Skip whitespace and return the next byte without consuming it.
    fn peek_non_ws(&mut self) -> CodecResult<Option<u8>> {
        loop {
            let buf = self.reader.fill_buf()?;
            if buf.is_empty() {
                return Ok(None);
            }
            let skip = buf.iter().take_while(|b| b.is_ascii_whitespace()).count();
            if skip < buf.len() {
                let byte = buf[skip];
                self.reader.consume(skip);
                return Ok(Some(byte));
            }
            let len = buf.len();
            self.reader.consume(len);
        }
    }

    fn delimiter_error(&self, expected: &'static str, found: Option<u8>) -> CodecError {
        CodecError::Delimiter {
            ordinal: self.ordinal,
            expected,
            found: match found {
                Some(b) => format!("{:?}", char::from(b)),
                None => "end of input".into(),
            },
        }
    }
}

impl<R: Read, T: DeserializeOwned> Iterator for JsonArrayReader<R, T> {
    type Item = CodecResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_element() {
            Ok(item) => item.map(Ok),
            Err(err) => {
                self.state = State::Failed;
                Some(Err(err))
            }
        }
    }
}
