use std::io::{self, BufWriter, Write};

use bsp_types::Digest;
use serde::Serialize;

use crate::error::CodecResult;

/// Count and BLAKE3 checksum of one streamed array.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArrayStats {
    pub count: u64,
    pub checksum: Digest,
}

/// Writer adapter hashing every byte that passes through it.
pub struct HashingWriter<W> {
    inner: W,
    hasher: blake3::Hasher,
}

impl<W: Write> HashingWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: blake3::Hasher::new(),
        }
    }

    pub fn digest(&self) -> Digest {
        Digest::from_hash(*self.hasher.finalize().as_bytes())
    }

    pub fn into_parts(self) -> (W, Digest) {
        let digest = self.digest();
        (self.inner, digest)
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Writes a JSON array one element at a time.
///
/// Output shape: `[` then elements separated by `,` and a newline, then
/// `]`. An empty array is written as `[]`. Nothing is buffered beyond the
/// current element.
pub struct JsonArrayWriter<W: Write> {
    out: HashingWriter<BufWriter<W>>,
    count: u64,
}

impl<W: Write> JsonArrayWriter<W> {
    pub fn new(inner: W) -> CodecResult<Self> {
        let mut out = HashingWriter::new(BufWriter::new(inner));
        out.write_all(b"[")?;
        Ok(Self { out, count: 0 })
    }

    /// Append one element.
    pub fn push<T: Serialize + ?Sized>(&mut self, item: &T) -> CodecResult<()> {
        if self.count > 0 {
            self.out.write_all(b",")?;
        }
        self.out.write_all(b"\n")?;
        serde_json::to_writer(&mut self.out, item)?;
        self.count += 1;
        Ok(())
    }

    /// Elements written so far.
    pub fn len(&self) -> u64 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Close the array and flush. Returns the inner writer and the stats of
    /// the bytes written.
    pub fn finish(mut self) -> CodecResult<(W, ArrayStats)> {
        if self.count > 0 {
            self.out.write_all(b"\n")?;
        }
        self.out.write_all(b"]\n")?;
        self.out.flush()?;
        let (buffered, checksum) = self.out.into_parts();
        let inner = buffered.into_inner().map_err(|e| e.into_error())?;
        Ok((
            inner,
            ArrayStats {
                count: self.count,
                checksum,
            },
        ))
    }
}
