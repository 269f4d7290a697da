//! Record aggregation for balance snapshots.
//!
//! The [`Aggregator`] performs a single ordered pass over an
//! [`AccountSource`](bsp_source::AccountSource): it merges the available,
//! frozen, and locked categories of every account, drops custodial accounts
//! listed in the [`ExclusionSet`], and emits leaf facts in source order
//! together with per-account summaries and per-asset [`AssetTotals`].

pub mod aggregator;
pub mod error;
pub mod exclusion;
pub mod totals;

pub use aggregator::{AggregateStats, Aggregation, Aggregator, DiscardSummaries, SummarySink};
pub use error::{AggregateError, AggregateResult};
pub use exclusion::{ExclusionConfig, ExclusionSet, DEFAULT_ESCROW_SEEDS};
pub use totals::AssetTotals;
