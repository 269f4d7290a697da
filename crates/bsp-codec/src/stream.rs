use std::io::Read;
use std::thread::JoinHandle;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::{CodecError, CodecResult};
use crate::reader::JsonArrayReader;
use crate::writer::ArrayStats;

/// Configuration of the decode producer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Bound of the producer/consumer channel. A full channel blocks the
    /// decoding thread.
    pub channel_capacity: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
        }
    }
}

/// Decoded elements delivered over a bounded channel from a producer thread.
///
/// Every failure, including trailing-byte errors found after the closing
/// bracket, is delivered in-band as the last item before the channel
/// closes. Consumers stop at the first `Err`.
pub struct ArrayStream<T> {
    rx: mpsc::Receiver<CodecResult<T>>,
    handle: Option<JoinHandle<Option<ArrayStats>>>,
}

/// Start decoding `reader` on a dedicated thread.
pub fn spawn_array_stream<R, T>(
    reader: JsonArrayReader<R, T>,
    config: &StreamConfig,
) -> ArrayStream<T>
where
    R: Read + Send + 'static,
    T: DeserializeOwned + Send + 'static,
{
    let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));
    let handle = std::thread::spawn(move || produce(reader, tx));
    ArrayStream {
        rx,
        handle: Some(handle),
    }
}

fn produce<R, T>(
    mut reader: JsonArrayReader<R, T>,
    tx: mpsc::Sender<CodecResult<T>>,
) -> Option<ArrayStats>
where
    R: Read,
    T: DeserializeOwned,
{
    for item in reader.by_ref() {
        let failed = item.is_err();
        if tx.blocking_send(item).is_err() {
            debug!("stream consumer went away, stopping producer");
            return None;
        }
        if failed {
            return None;
        }
    }
    match reader.finish() {
        Ok(stats) => Some(stats),
        Err(err) => {
            // The consumer may already be gone; nothing else to report to.
            let _ = tx.blocking_send(Err(err));
            None
        }
    }
}

impl<T> ArrayStream<T> {
    /// Wait for the producer and return the stats of a fully read array.
    ///
    /// Returns [`CodecError::StreamAborted`] when the array was not read to
    /// completion, either because an error was delivered or because the
    /// consumer stopped early.
    pub fn finish(mut self) -> CodecResult<ArrayStats> {
        self.rx.close();
        // Drain so a producer blocked on a full channel can observe closure.
        while self.rx.blocking_recv().is_some() {}
        let handle = self.handle.take().ok_or(CodecError::StreamAborted)?;
        match handle.join() {
            Ok(Some(stats)) => Ok(stats),
            Ok(None) => Err(CodecError::StreamAborted),
            Err(_) => {
                warn!("stream producer panicked");
                Err(CodecError::ProducerPanicked)
            }
        }
    }
}

impl<T> Iterator for ArrayStream<T> {
    type Item = CodecResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rx.blocking_recv()
    }
}
