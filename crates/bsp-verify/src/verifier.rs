use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io;
use std::path::Path;

use bsp_aggregate::{AssetTotals, Aggregator, DiscardSummaries, ExclusionSet};
use bsp_codec::{
    read_header, spawn_array_stream, ArrayStats, HashingReader, JsonArrayReader,
    SnapshotLayout, StreamConfig, ACCOUNTS_FILE, PROOFS_FILE,
};
use bsp_crypto::{fold_proof, CryptoResult, LeafEncoder};
use bsp_source::{AccountSource, AssetRegistry};
use bsp_types::{AssetSymbol, AssetTotal, BalanceFact, Digest, ProofRecord, SnapshotHeader};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::{MismatchPolicy, VerifierConfig};
use crate::error::{VerifyError, VerifyResult};
use crate::index::{IndexedProof, ProofIndex};
use crate::progress::ProgressTicker;
use crate::report::{ChecksumFailure, Mismatch, MismatchKind, SupplyDiscrepancy, VerificationReport};

/// Checks a published snapshot against a freshly scanned ledger source.
///
/// The source is re-aggregated with the schema and asset policy recorded in
/// the snapshot header, so the verifier needs nothing from the exporter
/// beyond the snapshot directory itself.
pub struct Verifier {
    config: VerifierConfig,
    stream: StreamConfig,
    exclusions: ExclusionSet,
}

impl Verifier {
    pub fn new(config: VerifierConfig, stream: StreamConfig, exclusions: ExclusionSet) -> Self {
        Self {
            config,
            stream,
            exclusions,
        }
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Verify the snapshot in `dir`.
    ///
    /// Returns `Err` for runs that cannot be judged at all: an unreadable or
    /// undecodable snapshot, a different source state, duplicate proofs, or a
    /// source failure. Otherwise returns a report; call
    /// [`VerificationReport::into_result`] to turn a failed report into an
    /// error.
    pub fn verify(
        &self,
        source: &dyn AccountSource,
        registry: &dyn AssetRegistry,
        dir: &Path,
    ) -> VerifyResult<VerificationReport> {
        let layout = SnapshotLayout::new(dir);
        let header = read_header(layout.header_path())?;
        check_context(&header, source)?;
        info!(
            root = %header.state_root,
            schema = %header.schema,
            leaves = header.leaf_count,
            "verifying snapshot"
        );

        let accounts = hash_file(&layout.accounts_path())?;
        let (mut index, proofs) = self.load_proofs(&layout)?;
        info!(proofs = proofs.count, "proof index loaded");
        let checksum_failures: Vec<ChecksumFailure> = [
            checksum_failure(ACCOUNTS_FILE, header.checksums.accounts, accounts),
            checksum_failure(PROOFS_FILE, header.checksums.proofs, proofs.checksum),
        ]
        .into_iter()
        .flatten()
        .collect();

        let aggregator = Aggregator::new(
            header.schema,
            header.asset_policy.clone(),
            self.exclusions.clone(),
        );
        let aggregation = aggregator.aggregate(source, registry, &mut DiscardSummaries)?;

        let mut report = VerificationReport {
            root: header.state_root,
            expected: aggregation.facts.len() as u64,
            matched: 0,
            proof_count: proofs.count,
            declared_leaf_count: header.leaf_count,
            unclaimed_proofs: 0,
            scan_complete: false,
            mismatches: Vec::new(),
            supply_discrepancies: Vec::new(),
            checksum_failures,
        };
        if !report.population_agrees() {
            warn!(
                expected = report.expected,
                proofs = report.proof_count,
                declared = report.declared_leaf_count,
                "source and snapshot disagree on the leaf population"
            );
        }

        let encoder = LeafEncoder::new(header.schema);
        let complete =
            self.scan(&aggregation.facts, &mut index, encoder, header.state_root, &mut report)?;
        report.scan_complete = complete;
        if complete {
            report.unclaimed_proofs = index.len() as u64;
        }
        if let Some(recorded) = &header.assets {
            report.supply_discrepancies = compare_totals(recorded, &aggregation.totals);
        }

        info!(
            matched = report.matched,
            mismatches = report.mismatches.len(),
            unclaimed = report.unclaimed_proofs,
            passed = report.passed(),
            "verification finished"
        );
        Ok(report)
    }

    fn load_proofs(&self, layout: &SnapshotLayout) -> VerifyResult<(ProofIndex, ArrayStats)> {
        let file = File::open(layout.proofs_path())?;
        let reader = JsonArrayReader::<_, ProofRecord>::new(file);
        let mut stream = spawn_array_stream(reader, &self.stream);
        let mut index = ProofIndex::new();
        for record in stream.by_ref() {
            index.insert(record?)?;
        }
        let stats = stream.finish()?;
        Ok((index, stats))
    }

    /// Fold every expected leaf in source order. Returns whether the scan
    /// ran to the end.
    fn scan(
        &self,
        facts: &[BalanceFact],
        index: &mut ProofIndex,
        encoder: LeafEncoder,
        root: Digest,
        report: &mut VerificationReport,
    ) -> VerifyResult<bool> {
        let fail_fast = self.config.mismatch_policy == MismatchPolicy::FailFast;
        let mut ticker = ProgressTicker::new(self.config.progress_interval());
        let total = facts.len() as u64;
        let mut done = 0u64;

        for batch in facts.chunks(self.config.batch_size.max(1)) {
            let claimed: Vec<(&BalanceFact, Option<IndexedProof>)> = batch
                .iter()
                .map(|fact| (fact, index.take(&fact.key())))
                .collect();
            let outcomes = claimed
                .into_par_iter()
                .map(|(fact, proof)| check_leaf(encoder, &root, fact, proof))
                .collect::<CryptoResult<Vec<_>>>()?;

            for outcome in outcomes {
                done += 1;
                match outcome {
                    None => report.matched += 1,
                    Some(mismatch) => {
                        debug!(%mismatch, "leaf failed verification");
                        report.mismatches.push(mismatch);
                        if fail_fast {
                            warn!(done, total, "stopping at first mismatch");
                            return Ok(false);
                        }
                    }
                }
            }
            ticker.tick(done, total);
        }
        Ok(true)
    }
}

/// `None` when the proof folds to `root` with the source amount.
fn check_leaf(
    encoder: LeafEncoder,
    root: &Digest,
    fact: &BalanceFact,
    proof: Option<IndexedProof>,
) -> CryptoResult<Option<Mismatch>> {
    let kind = match proof {
        None => MismatchKind::MissingProof,
        Some(proof) if proof.amount != fact.amount => MismatchKind::AmountMismatch {
            expected: fact.amount,
            recorded: proof.amount,
        },
        Some(proof) => {
            let computed = fold_proof(encoder.digest(fact)?, &proof.siblings);
            if computed == *root {
                return Ok(None);
            }
            MismatchKind::RootMismatch { computed }
        }
    };
    Ok(Some(Mismatch {
        key: fact.key(),
        kind,
    }))
}

fn check_context(header: &SnapshotHeader, source: &dyn AccountSource) -> VerifyResult<()> {
    let context = source.context()?;
    if header.chain_id != context.chain_id {
        return Err(VerifyError::SourceMismatch {
            field: "chain id",
            snapshot: header.chain_id.clone(),
            ledger: context.chain_id,
        });
    }
    if header.block_height != context.block_height {
        return Err(VerifyError::SourceMismatch {
            field: "block height",
            snapshot: header.block_height.to_string(),
            ledger: context.block_height.to_string(),
        });
    }
    Ok(())
}

fn hash_file(path: &Path) -> VerifyResult<Digest> {
    let mut reader = HashingReader::new(File::open(path)?);
    io::copy(&mut reader, &mut io::sink())?;
    Ok(reader.digest())
}

fn checksum_failure(
    file: &'static str,
    expected: Digest,
    actual: Digest,
) -> Option<ChecksumFailure> {
    if expected == actual {
        return None;
    }
    warn!(file, %expected, %actual, "stream checksum differs from header");
    Some(ChecksumFailure {
        file,
        expected,
        actual,
    })
}

fn compare_totals(
    recorded: &BTreeMap<AssetSymbol, AssetTotal>,
    computed: &AssetTotals,
) -> Vec<SupplyDiscrepancy> {
    let assets: BTreeSet<_> = recorded.keys().chain(computed.as_map().keys()).collect();
    assets
        .into_iter()
        .filter_map(|asset| {
            let recorded = recorded.get(asset);
            let computed = computed.get(asset);
            (recorded != computed).then(|| SupplyDiscrepancy {
                asset: asset.clone(),
                recorded: recorded.cloned(),
                computed: computed.cloned(),
            })
        })
        .collect()
}
