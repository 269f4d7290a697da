//! On-disk codec for balance snapshots.
//!
//! A snapshot is a directory of three independent streams:
//!
//! - **`base.json`**: the [`SnapshotHeader`](bsp_types::SnapshotHeader), one pretty-printed record
//! - **`accounts.json`**: JSON array of per-account summaries
//! - **`proofs.json`**: JSON array of per-leaf proofs
//!
//! Arrays are written one element at a time by [`JsonArrayWriter`] and read
//! back incrementally by [`JsonArrayReader`], so neither side ever holds a
//! whole array in memory. Both hash the exact bytes with BLAKE3; the header
//! records the checksums. [`spawn_array_stream`] moves decoding onto a
//! producer thread feeding a bounded channel.

pub mod error;
pub mod layout;
pub mod reader;
pub mod stream;
pub mod writer;

pub use error::{CodecError, CodecResult};
pub use layout::{
    read_header, write_header, SnapshotLayout, ACCOUNTS_FILE, HEADER_FILE, PROOFS_FILE,
};
pub use reader::{HashingReader, JsonArrayReader};
pub use stream::{spawn_array_stream, ArrayStream, StreamConfig};
pub use writer::{ArrayStats, HashingWriter, JsonArrayWriter};

#[cfg(test)]
mod tests {
    use super::*;
    use bsp_types::{Address, Amount, AssetSymbol, Digest, ProofRecord};
    use std::fs::File;

    fn proof(seed: u8) -> ProofRecord {
        ProofRecord {
            address: Address::from_raw([seed; 20]),
            asset: AssetSymbol::new("BNB").unwrap(),
            amount: Amount::new(seed as u128 * 1_000),
            index: None,
            proof: vec![Digest::from_hash([seed; 32]); 3],
        }
    }

    #[test]
    fn proofs_file_roundtrip_through_stream() {
        let dir = tempfile::tempdir().unwrap();
        let layout = SnapshotLayout::new(dir.path());

        let mut writer = JsonArrayWriter::new(File::create(layout.proofs_path()).unwrap()).unwrap();
        for seed in 1..=20 {
            writer.push(&proof(seed)).unwrap();
        }
        let (_, written) = writer.finish().unwrap();

        let reader = JsonArrayReader::<_, ProofRecord>::new(File::open(layout.proofs_path()).unwrap());
        let mut stream = spawn_array_stream(reader, &StreamConfig::default());
        let decoded: Vec<ProofRecord> = stream.by_ref().collect::<CodecResult<_>>().unwrap();
        assert_eq!(decoded.len(), 20);
        assert_eq!(decoded[19], proof(20));
        assert_eq!(stream.finish().unwrap(), written);
    }
}
