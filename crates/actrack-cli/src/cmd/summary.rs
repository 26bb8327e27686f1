//! `actrack summary`: model-written status summary of a project.

use super::Context;
use crate::output::render;
use actrack_core::tracker::Tracker;
use clap::Args;
use serde::Serialize;

#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// Project identifier.
    #[arg(short, long)]
    pub project: String,
}

#[derive(Debug, Serialize)]
struct SummaryView<'a> {
    project: &'a str,
    summary: Option<String>,
}

pub fn run_summary(args: &SummaryArgs, ctx: &Context) -> anyhow::Result<()> {
    let repo = ctx.repo();
    let oracle = ctx.oracle();
    let summary = Tracker::new(&repo, &oracle).summarize(&args.project)?;

    let view = SummaryView {
        project: &args.project,
        summary,
    };
    render(ctx.output, &view, |view, w| match &view.summary {
        Some(summary) => writeln!(w, "{summary}"),
        None => writeln!(w, "No action items for project '{}'.", view.project),
    })
}
