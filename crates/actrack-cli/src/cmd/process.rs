//! `actrack process`: extract and reconcile action items from notes.

use super::Context;
use crate::output::{pretty_kv, pretty_section, render_mode};
use actrack_core::reconcile::ReconcileReport;
use actrack_core::tracker::{ProcessOptions, RunOutcome, Tracker};
use anyhow::Context as _;
use clap::Args;
use serde::Serialize;
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use tracing::info;

#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Project identifier.
    #[arg(short, long)]
    pub project: String,

    /// Notes to process: a file path, `-` for stdin, or the text itself.
    #[arg(short, long)]
    pub input: String,

    /// Ask for a status summary after processing.
    #[arg(long)]
    pub summarize: bool,

    /// Call the model even when the input is empty.
    #[arg(long)]
    pub force_reparse: bool,
}

#[derive(Debug, Serialize)]
struct ProcessView<'a> {
    project: &'a str,
    #[serde(flatten)]
    outcome: RunOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
}

/// Resolve the `--input` argument to note text.
pub fn read_input(raw: &str) -> anyhow::Result<String> {
    if raw == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read notes from stdin")?;
        return Ok(buf);
    }

    let path = Path::new(raw);
    if path.is_file() {
        return fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()));
    }
    Ok(raw.to_string())
}

pub fn run_process(args: &ProcessArgs, ctx: &Context) -> anyhow::Result<()> {
    let notes = read_input(&args.input)?;
    let repo = ctx.repo();
    let lock = repo.lock(&args.project, ctx.config.storage.lock_timeout())?;
    let oracle = ctx.oracle();
    let tracker = Tracker::new(&repo, &oracle);

    let outcome = tracker.process(
        &args.project,
        &notes,
        ProcessOptions {
            force: args.force_reparse,
        },
    )?;
    let summary = if args.summarize {
        tracker.summarize(&args.project)?
    } else {
        None
    };
    lock.release();
    info!(project = %args.project, "process finished");

    let view = ProcessView {
        project: &args.project,
        outcome,
        summary,
    };
    render_mode(ctx.output, &view, write_text, write_pretty)
}

fn write_text(view: &ProcessView<'_>, w: &mut dyn Write) -> io::Result<()> {
    match &view.outcome {
        RunOutcome::SkippedEmptyInput => writeln!(w, "skipped  empty input")?,
        RunOutcome::Unparsed { reason, excerpt } => {
            writeln!(w, "unparsed  {reason}")?;
            writeln!(w, "excerpt  {excerpt}")?;
        }
        RunOutcome::Applied { report, total } => {
            writeln!(
                w,
                "created {}  updated {}  unchanged {}  warnings {}  total {total}",
                report.created.len(),
                report.updated.len(),
                report.unchanged.len(),
                report.warnings.len(),
            )?;
            write_warnings(report, w)?;
        }
    }
    if let Some(summary) = &view.summary {
        writeln!(w, "summary  {}", summary.replace('\n', " "))?;
    }
    Ok(())
}

fn write_pretty(view: &ProcessView<'_>, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, &format!("Project {}", view.project))?;
    match &view.outcome {
        RunOutcome::SkippedEmptyInput => {
            writeln!(
                w,
                "Input is empty; nothing processed. Pass --force-reparse to ask the model anyway."
            )?;
        }
        RunOutcome::Unparsed { reason, excerpt } => {
            writeln!(w, "The model reply could not be used: {reason}")?;
            pretty_kv(w, "reply", excerpt)?;
            writeln!(w, "No items were changed.")?;
        }
        RunOutcome::Applied { report, total } => {
            pretty_kv(w, "created", report.created.len().to_string())?;
            pretty_kv(w, "updated", report.updated.len().to_string())?;
            pretty_kv(w, "unchanged", report.unchanged.len().to_string())?;
            pretty_kv(w, "total", total.to_string())?;
            write_warnings(report, w)?;
        }
    }
    if let Some(summary) = &view.summary {
        writeln!(w)?;
        pretty_section(w, "Summary")?;
        writeln!(w, "{summary}")?;
    }
    Ok(())
}

fn write_warnings(report: &ReconcileReport, w: &mut dyn Write) -> io::Result<()> {
    for warning in &report.warnings {
        writeln!(w, "warning  {warning}")?;
    }
    Ok(())
}
