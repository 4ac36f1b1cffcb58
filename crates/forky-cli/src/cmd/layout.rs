//! `forky layout`: positions for every block and edge.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Args;
use forky_graph::{ForkChoiceView, ForkyConfig, Projection};

use crate::output::{OutputMode, kv, render, section};

#[derive(Args, Debug)]
pub struct LayoutArgs {
    /// Snapshot JSON files. More than one is aggregated.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

pub fn run_layout(args: &LayoutArgs, config: &ForkyConfig, output: OutputMode) -> anyhow::Result<()> {
    let processed = super::load_snapshots(&args.files, config)?;
    let view = ForkChoiceView::from_processed(&processed);
    let projection = view.project(&config.layout);
    render(output, &projection, render_human)
}

fn render_human(projection: &Projection, w: &mut dyn Write) -> io::Result<()> {
    let attributes = &projection.attributes;
    section(w, &format!("Graph {} ({:?})", attributes.id, attributes.kind))?;
    kv(w, "slots", format!("{}..={}", attributes.slot_start, attributes.slot_end))?;
    kv(w, "forks", attributes.forks.to_string())?;
    kv(w, "head", attributes.head.as_deref().unwrap_or("-"))?;
    kv(
        w,
        "lanes",
        format!("{}..={}", projection.min_offset, projection.max_offset),
    )?;
    kv(
        w,
        "size",
        format!("{} nodes, {} edges", projection.nodes.len(), projection.edges.len()),
    )?;
    writeln!(w)?;

    writeln!(w, "{:>10}  {:>6}  {:>9}  {:>9}  ROOT", "SLOT", "LANE", "X", "Y")?;
    for node in &projection.nodes {
        let slot = node.attributes.get("slot").and_then(serde_json::Value::as_u64).unwrap_or_default();
        let offset = node.attributes.get("offset").and_then(serde_json::Value::as_i64).unwrap_or_default();
        let root = node.attributes.get("blockRoot").and_then(serde_json::Value::as_str).unwrap_or("?");
        writeln!(w, "{slot:>10}  {offset:>6}  {:>9.1}  {:>9.1}  {root}", node.x, node.y)?;
    }
    Ok(())
}
