//! `actrack list`: items of one project.

use super::{Context, item_json, or_dash};
use crate::output::{Renderable, pretty_kv, pretty_rule, render_list};
use actrack_core::model::{ActionItem, Status};
use clap::Args;
use std::io::{self, Write};

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Project identifier.
    #[arg(short, long)]
    pub project: String,

    /// Include completed and cancelled items.
    #[arg(short, long)]
    pub all: bool,

    /// Only items with this status: open, in_progress, completed, cancelled.
    #[arg(short, long)]
    pub status: Option<Status>,
}

impl Renderable for ActionItem {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "{}  {}", self.id, self.task)?;
        pretty_kv(w, "  status", self.status.as_str())?;
        pretty_kv(w, "  owner", or_dash(self.owner.as_deref()))?;
        pretty_kv(w, "  deadline", or_dash(self.deadline.as_deref()))?;
        pretty_rule(w)
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "{}", item_json(self)?)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{}  {}  {}  {}  {}",
            self.id,
            self.status.as_str(),
            or_dash(self.owner.as_deref()),
            or_dash(self.deadline.as_deref()),
            self.task
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["ID", "STATUS", "OWNER", "DEADLINE", "TASK"]
    }
}

/// Items selected by `args`, in insertion order.
pub fn select<'a>(items: &'a [ActionItem], args: &ListArgs) -> Vec<&'a ActionItem> {
    items
        .iter()
        .filter(|item| match args.status {
            Some(status) => item.status == status,
            None => args.all || item.status.is_active(),
        })
        .collect()
}

pub fn run_list(args: &ListArgs, ctx: &Context) -> anyhow::Result<()> {
    let store = ctx.load_store(&args.project)?;
    let selected: Vec<ActionItem> = select(store.list_all(), args)
        .into_iter()
        .cloned()
        .collect();
    tracing::debug!(project = %args.project, shown = selected.len(), total = store.len(), "listing items");

    if selected.is_empty() && !ctx.output.is_json() {
        println!("No action items for project '{}'.", args.project);
        return Ok(());
    }
    render_list(&selected, ctx.output)?;
    Ok(())
}
