#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{Parser, Subcommand};
use output::{CliError, OutputMode, render_error};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "forky: fork choice graph layouts from beacon node snapshots",
    long_about = None
)]
struct Cli {
    /// Enable debug logging for forky (overridden by `FORKY_LOG`).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Path to the TOML config file.
    #[arg(long, global = true, default_value = "forky.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Derive the output mode from flags.
    const fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Lay out the fork choice graph of one or more snapshots",
        long_about = "Build the graph for the given snapshot files and print node and edge \
                      positions. One file gives that node's weighted graph; several files are \
                      aggregated into one consensus graph.",
        after_help = "EXAMPLES:\n    # Lay out a single snapshot\n    forky layout lighthouse.json\n\n    # Aggregate three nodes and emit the full projection\n    forky layout lighthouse.json prysm.json teku.json --json"
    )]
    Layout(cmd::layout::LayoutArgs),

    #[command(
        about = "Compare each source's head with the consensus head",
        long_about = "Aggregate the given snapshot files and print one row per source: its head, \
                      its checkpoints and whether its head is the aggregated head.",
        after_help = "EXAMPLES:\n    # Show which nodes agree on the head\n    forky summary lighthouse.json prysm.json\n\n    # Emit machine-readable output\n    forky summary *.json --json"
    )]
    Summary(cmd::summary::SummaryArgs),

    #[command(
        about = "Show how sources disagree about one block",
        long_about = "Aggregate the given snapshot files and describe the block with the given \
                      root: which sources saw it, called it canonical, orphaned it or flagged \
                      its validity.",
        after_help = "EXAMPLES:\n    # Inspect a block\n    forky block 0x4832 lighthouse.json prysm.json\n\n    # Emit machine-readable output\n    forky block 0x4832 *.json --json"
    )]
    Block(cmd::block::BlockArgs),
}

/// Filter used when `FORKY_LOG` is unset.
const fn default_filter(verbose: bool) -> &'static str {
    if verbose { "forky=debug,info" } else { "forky=info,warn" }
}

fn init_tracing(verbose: bool) {
    let verbose = verbose || env::var("DEBUG").is_ok();
    let filter = EnvFilter::try_from_env("FORKY_LOG").unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let format = env::var("FORKY_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry.with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr)).init();
        }
        _ => {
            registry.with(fmt::layer().compact().with_writer(std::io::stderr)).init();
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    if cli.verbose {
        debug!("verbose logging enabled");
    }

    let output = cli.output_mode();
    let command_result = forky_graph::load_config(&cli.config).and_then(|config| match &cli.command {
        Commands::Layout(args) => cmd::layout::run_layout(args, &config, output),
        Commands::Summary(args) => cmd::summary::run_summary(args, &config, output),
        Commands::Block(args) => cmd::block::run_block(args, &config, output),
    });

    match command_result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            render_error(output, &CliError::from(&err))?;
            Ok(ExitCode::FAILURE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_flag_raises_forky_to_debug() {
        let cli = Cli::parse_from(["forky", "layout", "a.json", "-v"]);
        assert!(cli.verbose);
        assert_eq!(default_filter(cli.verbose), "forky=debug,info");
        assert_eq!(default_filter(false), "forky=info,warn");
    }

    #[test]
    fn json_flag_sets_output_mode() {
        let cli = Cli::parse_from(["forky", "--json", "layout", "a.json"]);
        assert!(cli.output_mode().is_json());
    }

    #[test]
    fn json_flag_after_subcommand() {
        let cli = Cli::parse_from(["forky", "summary", "a.json", "--json"]);
        assert!(cli.json);
    }

    #[test]
    fn config_defaults_to_forky_toml() {
        let cli = Cli::parse_from(["forky", "layout", "a.json"]);
        assert_eq!(cli.config, PathBuf::from("forky.toml"));
        assert!(!cli.output_mode().is_json());
    }

    #[test]
    fn layout_accepts_many_files() {
        let cli = Cli::parse_from(["forky", "layout", "a.json", "b.json", "c.json"]);
        match cli.command {
            Commands::Layout(args) => assert_eq!(args.files.len(), 3),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn block_takes_root_then_files() {
        let cli = Cli::parse_from(["forky", "block", "0xab", "a.json"]);
        match cli.command {
            Commands::Block(args) => {
                assert_eq!(args.block_root, "0xab");
                assert_eq!(args.files, [PathBuf::from("a.json")]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn summary_requires_a_file() {
        assert!(Cli::try_parse_from(["forky", "summary"]).is_err());
    }
}
