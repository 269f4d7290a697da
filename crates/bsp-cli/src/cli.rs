use std::path::PathBuf;

use bsp_types::LeafSchema;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "bsp",
    about = "Balance snapshots: export a Merkle-committed snapshot and verify it against a ledger",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML file with export, verify, stream and exclusion settings
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum SchemaArg {
    SummedV1,
    PerCategoryV2,
}

impl From<SchemaArg> for LeafSchema {
    fn from(arg: SchemaArg) -> Self {
        match arg {
            SchemaArg::SummedV1 => LeafSchema::SummedV1,
            SchemaArg::PerCategoryV2 => LeafSchema::PerCategoryV2,
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Export a snapshot of a ledger dump
    Export(ExportArgs),
    /// Verify a snapshot against a ledger dump
    Verify(VerifyArgs),
    /// Show a snapshot header
    Inspect(InspectArgs),
}

#[derive(Args)]
pub struct ExportArgs {
    /// Snapshot directory to create
    pub path: PathBuf,
    /// JSON ledger dump to read balances from
    #[arg(short, long)]
    pub ledger: PathBuf,
    #[arg(long)]
    pub schema: Option<SchemaArg>,
    /// Replace an existing snapshot
    #[arg(long)]
    pub overwrite: bool,
}

#[derive(Args)]
pub struct VerifyArgs {
    /// Snapshot directory to check
    pub path: PathBuf,
    /// JSON ledger dump to re-aggregate
    #[arg(short, long)]
    pub ledger: PathBuf,
    /// Keep scanning after the first mismatch
    #[arg(long)]
    pub collect_all: bool,
}

#[derive(Args)]
pub struct InspectArgs {
    pub path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_export() {
        let cli = Cli::try_parse_from(["bsp", "export", "out", "--ledger", "dump.json"]).unwrap();
        if let Command::Export(args) = cli.command {
            assert_eq!(args.path, PathBuf::from("out"));
            assert_eq!(args.ledger, PathBuf::from("dump.json"));
            assert_eq!(args.schema, None);
            assert!(!args.overwrite);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_export_schema() {
        let cli = Cli::try_parse_from([
            "bsp",
            "export",
            "out",
            "-l",
            "dump.json",
            "--schema",
            "per-category-v2",
            "--overwrite",
        ])
        .unwrap();
        if let Command::Export(args) = cli.command {
            assert_eq!(args.schema.map(LeafSchema::from), Some(LeafSchema::PerCategoryV2));
            assert!(args.overwrite);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_unknown_schema_fails() {
        let parsed = Cli::try_parse_from(["bsp", "export", "out", "-l", "x", "--schema", "v9"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn parse_export_requires_ledger() {
        assert!(Cli::try_parse_from(["bsp", "export", "out"]).is_err());
    }

    #[test]
    fn parse_verify_collect_all() {
        let cli = Cli::try_parse_from([
            "bsp",
            "verify",
            "snap",
            "--ledger",
            "dump.json",
            "--collect-all",
        ])
        .unwrap();
        if let Command::Verify(args) = cli.command {
            assert!(args.collect_all);
            assert_eq!(args.path, PathBuf::from("snap"));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_inspect() {
        let cli = Cli::try_parse_from(["bsp", "inspect", "snap"]).unwrap();
        assert!(matches!(cli.command, Command::Inspect(_)));
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::try_parse_from([
            "bsp",
            "inspect",
            "snap",
            "--verbose",
            "--config",
            "bsp.toml",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("bsp.toml")));
    }

    #[test]
    fn parse_json_format() {
        let cli = Cli::try_parse_from(["bsp", "--format", "json", "inspect", "snap"]).unwrap();
        assert!(matches!(cli.format, OutputFormat::Json));
    }
}
