//! `forky block`: cross-source details for one block root.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Args;
use forky_graph::{BlockSummary, ForkyConfig, aggregate, block_summary};

use crate::output::{OutputMode, kv, render, section};

#[derive(Args, Debug)]
pub struct BlockArgs {
    /// Block root to describe.
    pub block_root: String,

    /// Snapshot JSON files, one per source.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

pub fn run_block(args: &BlockArgs, config: &ForkyConfig, output: OutputMode) -> anyhow::Result<()> {
    let processed = super::load_snapshots(&args.files, config)?;
    let graph = aggregate(&processed);
    let summary = block_summary(&graph, &args.block_root)?;
    render(output, &summary, render_human)
}

fn render_human(summary: &BlockSummary, w: &mut dyn Write) -> io::Result<()> {
    section(w, &format!("Block {}", summary.block_root))?;
    kv(w, "slot", summary.slot.to_string())?;
    kv(w, "weight", summary.highest_weight.to_string())?;
    kv(w, "seen by", summary.seen_by.join(", "))?;
    kv(w, "canonical for", summary.canonical_for.join(", "))?;
    if summary.has_orphaned {
        kv(w, "orphaned in", summary.orphaned_in.join(", "))?;
    }
    for checkpoint in &summary.checkpoints {
        kv(w, "checkpoint", format!("{} ({})", checkpoint.checkpoint, checkpoint.node))?;
    }
    if summary.has_invalid {
        for v in summary.validities.iter().filter(|v| !forky_graph::model::is_valid(&v.validity)) {
            kv(w, "validity", format!("{} ({})", v.validity, v.node))?;
        }
    }
    Ok(())
}
