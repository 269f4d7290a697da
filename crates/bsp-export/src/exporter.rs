use std::fs;
use std::io::{self, Write};
use std::path::Path;

use bsp_aggregate::{AggregateStats, Aggregator, ExclusionSet, SummarySink};
use bsp_codec::{write_header, CodecError, JsonArrayWriter, SnapshotLayout};
use bsp_crypto::{CryptoResult, LeafEncoder, MerkleTree, DEFAULT_PARALLEL_THRESHOLD};
use bsp_source::{AccountSource, AssetRegistry};
use bsp_types::{
    AccountSummary, AssetPolicy, LeafSchema, ProofRecord, SnapshotHeader, StreamChecksums,
    FORMAT_VERSION,
};
use chrono::Utc;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{ExportError, ExportResult};

/// Export settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Leaf encoding, recorded in the header.
    pub schema: LeafSchema,
    /// Which assets become leaves.
    pub asset_policy: AssetPolicy,
    /// Replace an existing snapshot in the output directory.
    pub overwrite: bool,
    /// Record per-asset totals in the header.
    pub include_assets: bool,
    /// Minimum pairs per level before tree reduction goes parallel.
    pub parallel_threshold: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            schema: LeafSchema::default(),
            asset_policy: AssetPolicy::default(),
            overwrite: false,
            include_assets: true,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

/// Outcome of a successful export.
#[derive(Clone, Debug)]
pub struct ExportSummary {
    pub layout: SnapshotLayout,
    pub header: SnapshotHeader,
    pub stats: AggregateStats,
}

/// Produces a snapshot directory from a ledger source.
pub struct Exporter {
    config: ExportConfig,
    aggregator: Aggregator,
}

impl Exporter {
    pub fn new(config: ExportConfig, exclusions: ExclusionSet) -> Self {
        let aggregator = Aggregator::new(config.schema, config.asset_policy.clone(), exclusions);
        Self { config, aggregator }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Scan `source`, build the tree, and write the three snapshot streams
    /// into `out_dir`.
    ///
    /// Streams are staged as temporary files next to their targets and only
    /// persisted once all of them are complete. The header is persisted
    /// last.
    pub fn export(
        &self,
        source: &dyn AccountSource,
        registry: &dyn AssetRegistry,
        out_dir: &Path,
    ) -> ExportResult<ExportSummary> {
        let layout = SnapshotLayout::new(out_dir);
        fs::create_dir_all(out_dir)?;
        if layout.exists() && !self.config.overwrite {
            return Err(ExportError::AlreadyExists(out_dir.to_path_buf()));
        }
        let context = source.context()?;
        info!(
            chain_id = %context.chain_id,
            height = context.block_height,
            schema = %self.config.schema,
            out = %out_dir.display(),
            "starting export"
        );

        info!("iterating accounts");
        let accounts_tmp = NamedTempFile::new_in(out_dir)?;
        let mut accounts = JsonArrayWriter::new(accounts_tmp.as_file())?;
        let aggregation = self.aggregator.aggregate(
            source,
            registry,
            &mut SummaryStream(&mut accounts),
        )?;
        let (_, accounts_stats) = accounts.finish()?;

        info!(leaves = aggregation.facts.len(), "building Merkle tree");
        let encoder = LeafEncoder::new(self.config.schema);
        let leaves = aggregation
            .facts
            .par_iter()
            .map(|fact| encoder.digest(fact))
            .collect::<CryptoResult<Vec<_>>>()?;
        let tree = MerkleTree::build_with_threshold(leaves, self.config.parallel_threshold);
        let max_proof_length = tree.max_proof_len();

        info!("writing proofs");
        let proofs_tmp = NamedTempFile::new_in(out_dir)?;
        let mut proofs = JsonArrayWriter::new(proofs_tmp.as_file())?;
        for (fact, proof) in aggregation.facts.iter().zip(tree.proofs()) {
            proofs.push(&ProofRecord {
                address: fact.owner,
                asset: fact.asset.clone(),
                amount: fact.amount,
                index: fact.index,
                proof,
            })?;
        }
        let (_, proofs_stats) = proofs.finish()?;
        debug!(max_proof_length, "proofs written");

        let header = SnapshotHeader {
            format_version: FORMAT_VERSION,
            schema: self.config.schema,
            asset_policy: self.config.asset_policy.clone(),
            chain_id: context.chain_id,
            block_height: context.block_height,
            commit_id: context.commit_id,
            state_root: tree.root(),
            leaf_count: proofs_stats.count,
            account_count: accounts_stats.count,
            max_proof_length: max_proof_length as u32,
            exported_at: Utc::now(),
            assets: self
                .config
                .include_assets
                .then(|| aggregation.totals.into_map()),
            checksums: StreamChecksums {
                accounts: accounts_stats.checksum,
                proofs: proofs_stats.checksum,
            },
        };
        let header_tmp = NamedTempFile::new_in(out_dir)?;
        write_header(header_tmp.as_file(), &header)?;

        publish(accounts_tmp, &layout.accounts_path())?;
        publish(proofs_tmp, &layout.proofs_path())?;
        publish(header_tmp, &layout.header_path())?;

        info!(
            root = %header.state_root,
            leaves = header.leaf_count,
            accounts = header.account_count,
            max_proof_length,
            "snapshot written"
        );
        Ok(ExportSummary {
            layout,
            header,
            stats: aggregation.stats,
        })
    }
}

/// Flush a staged file to disk and move it over its target.
fn publish(staged: NamedTempFile, target: &Path) -> io::Result<()> {
    staged.as_file().sync_all()?;
    staged.persist(target).map_err(|e| e.error)?;
    Ok(())
}

/// Feeds aggregator summaries straight into the accounts stream.
struct SummaryStream<'a, W: Write>(&'a mut JsonArrayWriter<W>);

impl<W: Write> SummarySink for SummaryStream<'_, W> {
    fn push_summary(&mut self, summary: AccountSummary) -> io::Result<()> {
        self.0.push(&summary).map_err(|err| match err {
            CodecError::Io(e) => e,
            other => io::Error::other(other),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bsp_codec::{read_header, JsonArrayReader};
    use bsp_crypto::{pair_hash, verify_proof};
    use bsp_source::{AccountRecord, InMemoryLedger, SourceContext, TokenInfo};
    use bsp_types::{Address, AssetSymbol, BalanceFact, Coin, Coins, CommitId, Digest};

    fn sym(s: &str) -> AssetSymbol {
        AssetSymbol::new(s).unwrap()
    }

    fn addr(seed: u8) -> Address {
        Address::from_raw([seed; 20])
    }

    fn ledger(balances: &[(u8, &str, u128)]) -> InMemoryLedger {
        let ledger = InMemoryLedger::new(SourceContext {
            chain_id: "test-chain".into(),
            block_height: 42,
            commit_id: CommitId {
                version: 42,
                hash: Digest::from_hash([4; 32]),
            },
        });
        for symbol in ["X", "BNB"] {
            ledger
                .register_token(TokenInfo {
                    symbol: sym(symbol),
                    owner: addr(0xEE),
                    contract_address: None,
                })
                .unwrap();
        }
        for (seed, symbol, amount) in balances {
            let coins = Coins::new(vec![Coin::new(sym(symbol), *amount)]).unwrap();
            ledger
                .insert_account(AccountRecord::new(addr(*seed), *seed as u64).with_available(coins))
                .unwrap();
        }
        ledger
    }

    fn exporter(config: ExportConfig) -> Exporter {
        Exporter::new(config, ExclusionSet::default())
    }

    fn read_proofs(path: &Path) -> Vec<ProofRecord> {
        JsonArrayReader::<_, ProofRecord>::new(fs::File::open(path).unwrap())
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn two_facts_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger(&[(0xA, "X", 10), (0xB, "X", 5)]);
        let summary = exporter(ExportConfig::default())
            .export(&ledger, &ledger, dir.path())
            .unwrap();

        let enc = LeafEncoder::SUMMED_V1;
        let a = enc.digest(&BalanceFact::new(addr(0xA), sym("X"), 10u64)).unwrap();
        let b = enc.digest(&BalanceFact::new(addr(0xB), sym("X"), 5u64)).unwrap();
        assert_eq!(summary.header.state_root, pair_hash(&a, &b));
        assert_eq!(summary.header.leaf_count, 2);
        assert_eq!(summary.header.max_proof_length, 1);

        let proofs = read_proofs(&summary.layout.proofs_path());
        assert_eq!(proofs[0].proof, vec![b]);
        assert_eq!(proofs[1].proof, vec![a]);
        assert!(verify_proof(&summary.header.state_root, a, &proofs[0].proof));
    }

    #[test]
    fn header_records_source_and_checksums() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger(&[(1, "BNB", 7), (2, "BNB", 3), (3, "X", 1)]);
        let summary = exporter(ExportConfig::default())
            .export(&ledger, &ledger, dir.path())
            .unwrap();

        let header = read_header(summary.layout.header_path()).unwrap();
        assert_eq!(header, summary.header);
        assert_eq!(header.chain_id, "test-chain");
        assert_eq!(header.block_height, 42);
        assert_eq!(header.account_count, 3);
        let accounts_bytes = fs::read(summary.layout.accounts_path()).unwrap();
        assert_eq!(
            header.checksums.accounts.as_bytes(),
            blake3::hash(&accounts_bytes).as_bytes()
        );
        let assets = header.assets.unwrap();
        assert_eq!(assets[&sym("BNB")].amount.get(), 10);
        assert_eq!(assets[&sym("BNB")].owner, addr(0xEE));
    }

    #[test]
    fn excluded_accounts_are_not_exported() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger(&[(1, "BNB", 7)]);
        ledger
            .insert_account(
                AccountRecord::new(Address::ZERO, 0)
                    .with_available(Coins::new(vec![Coin::new(sym("BNB"), 100u64)]).unwrap()),
            )
            .unwrap();
        let summary = exporter(ExportConfig::default())
            .export(&ledger, &ledger, dir.path())
            .unwrap();
        assert_eq!(summary.header.leaf_count, 1);
        assert_eq!(summary.header.account_count, 1);
        let proofs = read_proofs(&summary.layout.proofs_path());
        assert!(proofs.iter().all(|p| p.address != Address::ZERO));
        let assets = summary.header.assets.unwrap();
        assert_eq!(assets[&sym("BNB")].escrowed.get(), 100);
    }

    #[test]
    fn refuses_to_overwrite_without_flag() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger(&[(1, "BNB", 7)]);
        exporter(ExportConfig::default())
            .export(&ledger, &ledger, dir.path())
            .unwrap();
        let err = exporter(ExportConfig::default())
            .export(&ledger, &ledger, dir.path())
            .unwrap_err();
        assert!(matches!(err, ExportError::AlreadyExists(_)));

        let config = ExportConfig {
            overwrite: true,
            ..ExportConfig::default()
        };
        assert!(exporter(config).export(&ledger, &ledger, dir.path()).is_ok());
    }

    #[test]
    fn failed_run_leaves_no_files() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger(&[(1, "BNB", 7), (2, "UNREGISTERED", 1)]);
        let err = exporter(ExportConfig::default())
            .export(&ledger, &ledger, dir.path())
            .unwrap_err();
        assert!(matches!(err, ExportError::Aggregate(_)));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn empty_ledger_exports_sentinel_root() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger(&[]);
        let summary = exporter(ExportConfig::default())
            .export(&ledger, &ledger, dir.path())
            .unwrap();
        assert_eq!(summary.header.state_root, bsp_crypto::EMPTY_ROOT);
        assert_eq!(summary.header.leaf_count, 0);
        assert_eq!(fs::read(summary.layout.proofs_path()).unwrap(), b"[]\n");
    }

    #[test]
    fn config_from_json_uses_defaults() {
        let config: ExportConfig =
            serde_json::from_str(r#"{"schema":"per-category-v2","overwrite":true}"#).unwrap();
        assert_eq!(config.schema, LeafSchema::PerCategoryV2);
        assert!(config.overwrite);
        assert!(config.include_assets);
        assert_eq!(config.parallel_threshold, DEFAULT_PARALLEL_THRESHOLD);
    }
}
