use anyhow::Context;
use bsp_aggregate::ExclusionSet;
use bsp_codec::{read_header, SnapshotLayout};
use bsp_export::Exporter;
use bsp_source::InMemoryLedger;
use bsp_types::SnapshotHeader;
use bsp_verify::{MismatchPolicy, VerificationReport, Verifier};
use colored::Colorize;

use crate::cli::*;
use crate::config::CliConfig;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = CliConfig::load(cli.config.as_deref())?;
    match cli.command {
        Command::Export(args) => cmd_export(args, config, &cli.format),
        Command::Verify(args) => cmd_verify(args, config, &cli.format),
        Command::Inspect(args) => cmd_inspect(args, &cli.format),
    }
}

fn load_ledger(path: &std::path::Path) -> anyhow::Result<InMemoryLedger> {
    InMemoryLedger::load_json(path).with_context(|| format!("loading ledger {}", path.display()))
}

fn cmd_export(
    args: ExportArgs,
    mut config: CliConfig,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    if let Some(schema) = args.schema {
        config.export.schema = schema.into();
    }
    config.export.overwrite |= args.overwrite;

    let ledger = load_ledger(&args.ledger)?;
    let exporter = Exporter::new(config.export, ExclusionSet::from_config(&config.exclusions));
    let summary = exporter
        .export(&ledger, &ledger, &args.path)
        .with_context(|| format!("exporting to {}", args.path.display()))?;

    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&summary.header)?);
        return Ok(());
    }
    println!(
        "{} Snapshot written to {}",
        "✓".green().bold(),
        args.path.display().to_string().bold()
    );
    println!("  Root: {}", summary.header.state_root.to_string().cyan());
    println!(
        "  Leaves: {} ({})",
        summary.header.leaf_count.to_string().bold(),
        summary.header.schema
    );
    println!(
        "  Accounts: {} retained, {} excluded",
        summary.stats.accounts_retained, summary.stats.accounts_excluded
    );
    println!("  Max proof length: {}", summary.header.max_proof_length);
    Ok(())
}

fn cmd_verify(
    args: VerifyArgs,
    mut config: CliConfig,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    if args.collect_all {
        config.verify.mismatch_policy = MismatchPolicy::CollectAll;
    }

    let ledger = load_ledger(&args.ledger)?;
    let verifier = Verifier::new(
        config.verify,
        config.stream,
        ExclusionSet::from_config(&config.exclusions),
    );
    let report = verifier
        .verify(&ledger, &ledger, &args.path)
        .with_context(|| format!("verifying {}", args.path.display()))?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report_json(&report))?),
        OutputFormat::Text => print_report(&report),
    }
    report.into_result()?;
    Ok(())
}

fn print_report(report: &VerificationReport) {
    if report.passed() {
        println!("{} Snapshot verified", "✓".green().bold());
    } else {
        println!("{} Snapshot verification failed", "✗".red().bold());
    }
    println!("  Root: {}", report.root.to_string().cyan());
    println!(
        "  Leaves: {} matched of {} expected ({} proofs, {} declared)",
        report.matched.to_string().bold(),
        report.expected,
        report.proof_count,
        report.declared_leaf_count
    );
    if !report.scan_complete {
        println!("  Scan: {}", "stopped at first mismatch".yellow());
    } else if report.unclaimed_proofs > 0 {
        println!("  Unclaimed proofs: {}", report.unclaimed_proofs.to_string().red());
    }
    for mismatch in &report.mismatches {
        println!("  {} {}", "mismatch:".red(), mismatch);
    }
    for discrepancy in &report.supply_discrepancies {
        println!(
            "  {} {} recorded {:?}, computed {:?}",
            "supply:".red(),
            discrepancy.asset,
            discrepancy.recorded.as_ref().map(|t| t.amount.to_string()),
            discrepancy.computed.as_ref().map(|t| t.amount.to_string()),
        );
    }
    for failure in &report.checksum_failures {
        println!(
            "  {} {} hashes to {}, header records {}",
            "checksum:".red(),
            failure.file,
            failure.actual.short_hex(),
            failure.expected.short_hex()
        );
    }
}

fn report_json(report: &VerificationReport) -> serde_json::Value {
    serde_json::json!({
        "passed": report.passed(),
        "root": report.root,
        "expected": report.expected,
        "matched": report.matched,
        "proof_count": report.proof_count,
        "declared_leaf_count": report.declared_leaf_count,
        "unclaimed_proofs": report.unclaimed_proofs,
        "scan_complete": report.scan_complete,
        "mismatches": report.mismatches.iter().map(ToString::to_string).collect::<Vec<_>>(),
        "supply_discrepancies": report
            .supply_discrepancies
            .iter()
            .map(|d| d.asset.to_string())
            .collect::<Vec<_>>(),
        "checksum_failures": report
            .checksum_failures
            .iter()
            .map(|f| f.file)
            .collect::<Vec<_>>(),
    })
}

fn cmd_inspect(args: InspectArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let layout = SnapshotLayout::new(&args.path);
    let header = read_header(layout.header_path())
        .with_context(|| format!("reading snapshot {}", args.path.display()))?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&header)?),
        OutputFormat::Text => print_header(&header),
    }
    Ok(())
}

fn print_header(header: &SnapshotHeader) {
    println!(
        "Snapshot {} (format v{})",
        header.state_root.to_string().cyan().bold(),
        header.format_version
    );
    println!("  Chain: {} at height {}", header.chain_id.bold(), header.block_height);
    println!(
        "  Commit: v{} {}",
        header.commit_id.version,
        header.commit_id.hash.short_hex().dimmed()
    );
    println!("  Schema: {} ({:?})", header.schema.to_string().yellow(), header.asset_policy);
    println!("  Leaves: {}, accounts: {}", header.leaf_count, header.account_count);
    println!("  Max proof length: {}", header.max_proof_length);
    println!("  Exported: {}", header.exported_at.to_rfc3339());
    if let Some(assets) = &header.assets {
        for (asset, total) in assets {
            if total.escrowed.is_zero() {
                println!("  {} {}", asset.to_string().yellow(), total.amount);
            } else {
                println!(
                    "  {} {} (escrowed {})",
                    asset.to_string().yellow(),
                    total.amount,
                    total.escrowed
                );
            }
        }
    }
}
