//! `forky summary`: each source's head next to the consensus head.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Args;
use forky_graph::{ForkyConfig, SourceSummary, aggregate, source_summaries};
use serde::Serialize;

use crate::output::{OutputMode, kv, render, section};

#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// Snapshot JSON files, one per source.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct SummaryReport {
    pub head: Option<String>,
    pub forks: usize,
    pub sources: Vec<SourceSummary>,
}

pub fn run_summary(args: &SummaryArgs, config: &ForkyConfig, output: OutputMode) -> anyhow::Result<()> {
    let processed = super::load_snapshots(&args.files, config)?;
    let graph = aggregate(&processed);
    let report = SummaryReport {
        head: graph.attributes().base.head.clone(),
        forks: graph.attributes().base.forks,
        sources: source_summaries(&processed, &graph),
    };
    render(output, &report, render_human)
}

fn render_human(report: &SummaryReport, w: &mut dyn Write) -> io::Result<()> {
    section(w, "Consensus")?;
    kv(w, "head", report.head.as_deref().unwrap_or("-"))?;
    kv(w, "forks", report.forks.to_string())?;
    writeln!(w)?;

    writeln!(w, "{:<16}  {:>10}  {:<20}  {:<8}  HEAD", "SOURCE", "SLOT", "ROOT", "FINAL")?;
    for row in &report.sources {
        let slot = row.head_slot.map_or_else(|| "-".to_string(), |s| s.to_string());
        let finalized = row.finalized.as_ref().map_or("-", |c| c.epoch.as_str());
        let agrees = if row.is_canonical_head { "yes" } else { "no" };
        writeln!(
            w,
            "{:<16}  {slot:>10}  {:<20}  {finalized:<8}  {agrees}",
            row.source,
            row.head_root.as_deref().unwrap_or("-"),
        )?;
    }
    Ok(())
}
