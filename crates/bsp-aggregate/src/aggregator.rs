use std::collections::HashSet;
use std::ops::ControlFlow;

use bsp_source::{AccountSource, AssetRegistry, BalanceAccount};
use bsp_types::{
    AccountSummary, AssetPolicy, AssetSymbol, BalanceCategory, BalanceFact, Coins, LeafSchema,
};
use tracing::{debug, info, warn};

use crate::error::{AggregateError, AggregateResult};
use crate::exclusion::ExclusionSet;
use crate::totals::AssetTotals;

/// Receives one summary row per retained account, in source order.
pub trait SummarySink {
    fn push_summary(&mut self, summary: AccountSummary) -> std::io::Result<()>;
}

impl SummarySink for Vec<AccountSummary> {
    fn push_summary(&mut self, summary: AccountSummary) -> std::io::Result<()> {
        self.push(summary);
        Ok(())
    }
}

/// A sink that drops every summary. Used by verification, which only needs
/// the leaf facts.
#[derive(Clone, Copy, Debug, Default)]
pub struct DiscardSummaries;

impl SummarySink for DiscardSummaries {
    fn push_summary(&mut self, _summary: AccountSummary) -> std::io::Result<()> {
        Ok(())
    }
}

/// Counters for one aggregation run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AggregateStats {
    pub accounts_visited: u64,
    pub accounts_retained: u64,
    pub accounts_excluded: u64,
    pub leaves: u64,
}

/// Output of one aggregation run.
#[derive(Clone, Debug)]
pub struct Aggregation {
    /// Leaf facts in source iteration order.
    pub facts: Vec<BalanceFact>,
    pub totals: AssetTotals,
    pub stats: AggregateStats,
}

/// Turns raw accounts into leaf facts, summaries, and per-asset totals.
///
/// Export and verification run the same aggregator configuration so that
/// both sides derive identical facts from identical source state.
#[derive(Clone, Debug)]
pub struct Aggregator {
    schema: LeafSchema,
    policy: AssetPolicy,
    exclusions: ExclusionSet,
}

impl Aggregator {
    pub fn new(schema: LeafSchema, policy: AssetPolicy, exclusions: ExclusionSet) -> Self {
        Self {
            schema,
            policy,
            exclusions,
        }
    }

    pub fn schema(&self) -> LeafSchema {
        self.schema
    }

    pub fn policy(&self) -> &AssetPolicy {
        &self.policy
    }

    pub fn exclusions(&self) -> &ExclusionSet {
        &self.exclusions
    }

    /// Scan `source` once.
    ///
    /// Excluded accounts produce neither leaves nor summaries; their
    /// holdings only count towards `escrowed` totals. Any registry or
    /// arithmetic failure stops the iteration and is returned.
    pub fn aggregate(
        &self,
        source: &dyn AccountSource,
        registry: &dyn AssetRegistry,
        sink: &mut dyn SummarySink,
    ) -> AggregateResult<Aggregation> {
        let eligible = self.eligible_assets(registry)?;
        let mut run = Run {
            aggregator: self,
            registry,
            eligible,
            sink,
            facts: Vec::new(),
            totals: AssetTotals::new(),
            stats: AggregateStats::default(),
            warned_truncation: HashSet::new(),
        };

        let mut failure: Option<AggregateError> = None;
        source.iterate_accounts(&mut |account| match run.visit(account) {
            Ok(()) => ControlFlow::Continue(()),
            Err(err) => {
                failure = Some(err);
                ControlFlow::Break(())
            }
        })?;
        if let Some(err) = failure {
            return Err(err);
        }

        info!(
            schema = %self.schema,
            accounts = run.stats.accounts_visited,
            retained = run.stats.accounts_retained,
            excluded = run.stats.accounts_excluded,
            leaves = run.stats.leaves,
            assets = run.totals.len(),
            "aggregation complete"
        );
        Ok(Aggregation {
            facts: run.facts,
            totals: run.totals,
            stats: run.stats,
        })
    }

    /// `None` means every asset is eligible.
    fn eligible_assets(
        &self,
        registry: &dyn AssetRegistry,
    ) -> AggregateResult<Option<HashSet<AssetSymbol>>> {
        match &self.policy {
            AssetPolicy::All => Ok(None),
            AssetPolicy::Bridged { native } => {
                let mut allowed: HashSet<AssetSymbol> = registry
                    .tokens()?
                    .into_iter()
                    .filter(|token| token.is_bridged())
                    .map(|token| token.symbol)
                    .collect();
                allowed.insert(native.clone());
                debug!(assets = allowed.len(), "bridged asset policy");
                Ok(Some(allowed))
            }
        }
    }
}

struct Run<'a, 's> {
    aggregator: &'a Aggregator,
    registry: &'a dyn AssetRegistry,
    eligible: Option<HashSet<AssetSymbol>>,
    sink: &'a mut (dyn SummarySink + 's),
    facts: Vec<BalanceFact>,
    totals: AssetTotals,
    stats: AggregateStats,
    warned_truncation: HashSet<AssetSymbol>,
}

impl Run<'_, '_> {
    fn visit(&mut self, account: &dyn BalanceAccount) -> AggregateResult<()> {
        self.stats.accounts_visited += 1;
        let address = account.address();
        let summed = sum_categories(account)?;
        self.resolve_owners(&summed)?;

        if self.aggregator.exclusions.contains(&address) {
            self.stats.accounts_excluded += 1;
            debug!(%address, "skipping excluded account");
            return self.totals.add_escrowed(address, &summed);
        }

        self.stats.accounts_retained += 1;
        self.totals.add_retained(address, &summed)?;

        for coin in summed.iter() {
            if !self.is_eligible(&coin.denom) {
                continue;
            }
            self.warn_if_truncated(&coin.denom);
            match self.aggregator.schema {
                LeafSchema::SummedV1 => {
                    self.push_fact(BalanceFact::new(address, coin.denom.clone(), coin.amount));
                }
                LeafSchema::PerCategoryV2 => {
                    for category in BalanceCategory::ALL {
                        let amount = account.category(category).amount_of(&coin.denom);
                        if amount.is_zero() {
                            continue;
                        }
                        self.push_fact(
                            BalanceFact::new(address, coin.denom.clone(), amount)
                                .with_index(category.ordinal()),
                        );
                    }
                }
            }
        }

        self.sink.push_summary(AccountSummary {
            address,
            account_number: account.account_number(),
            coins: summed,
            available_coins: account.available().clone(),
            frozen_coins: account.frozen().clone(),
            locked_coins: account.locked().clone(),
        })?;
        Ok(())
    }

    fn resolve_owners(&mut self, coins: &Coins) -> AggregateResult<()> {
        for coin in coins.iter() {
            if !self.totals.contains(&coin.denom) {
                let owner = self.registry.resolve_asset_owner(&coin.denom)?;
                self.totals.open(coin.denom.clone(), owner);
            }
        }
        Ok(())
    }

    fn is_eligible(&self, asset: &AssetSymbol) -> bool {
        self.eligible
            .as_ref()
            .map_or(true, |allowed| allowed.contains(asset))
    }

    fn warn_if_truncated(&mut self, asset: &AssetSymbol) {
        if asset.is_truncated_in_leaf() && self.warned_truncation.insert(asset.clone()) {
            warn!(
                asset = %asset,
                "asset symbol exceeds the leaf symbol field and is truncated; \
                 symbols sharing the truncated prefix produce identical leaves"
            );
        }
    }

    fn push_fact(&mut self, fact: BalanceFact) {
        self.stats.leaves += 1;
        self.facts.push(fact);
    }
}

/// Available + frozen + locked, per asset.
fn sum_categories(account: &dyn BalanceAccount) -> AggregateResult<Coins> {
    account
        .available()
        .plus(account.frozen())
        .and_then(|coins| coins.plus(account.locked()))
        .map_err(|source| AggregateError::Overflow {
            address: account.address(),
            source,
        })
}
