//! `actrack show`: one item with its change history.

use super::{Context, item_json, or_dash};
use crate::output::{Renderable, pretty_kv, pretty_section, render_item};
use actrack_core::model::{ActionItem, ItemId};
use actrack_core::store::StoreError;
use anyhow::bail;
use clap::Args;
use std::io::{self, Write};

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Project identifier.
    #[arg(short, long)]
    pub project: String,

    /// Item ID, or a unique prefix of one.
    pub id: String,
}

/// Full detail view; list rows come from the plain [`ActionItem`] impl.
struct Detail<'a>(&'a ActionItem);

impl Renderable for Detail<'_> {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        let item = self.0;
        pretty_section(w, &item.task)?;
        pretty_kv(w, "id", item.id.as_str())?;
        pretty_kv(w, "project", &item.project_id)?;
        pretty_kv(w, "status", item.status.as_str())?;
        pretty_kv(w, "owner", or_dash(item.owner.as_deref()))?;
        pretty_kv(w, "deadline", or_dash(item.deadline.as_deref()))?;
        pretty_kv(w, "created", item.created_at.to_rfc3339())?;
        pretty_kv(w, "updated", item.updated_at.to_rfc3339())?;
        if let Some(source) = &item.source {
            pretty_kv(w, "source", source)?;
        }
        if item.update_history.is_empty() {
            return Ok(());
        }
        writeln!(w)?;
        pretty_section(w, "History")?;
        for entry in &item.update_history {
            writeln!(
                w,
                "{}  {}: {} -> {}",
                entry.at.format("%Y-%m-%d %H:%M:%S"),
                entry.field.as_str(),
                or_dash(entry.from.as_deref()),
                or_dash(entry.to.as_deref()),
            )?;
        }
        Ok(())
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "{}", item_json(self.0)?)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        let item = self.0;
        writeln!(w, "id  {}", item.id)?;
        writeln!(w, "task  {}", item.task)?;
        writeln!(w, "status  {}", item.status.as_str())?;
        writeln!(w, "owner  {}", or_dash(item.owner.as_deref()))?;
        writeln!(w, "deadline  {}", or_dash(item.deadline.as_deref()))?;
        writeln!(w, "created_at  {}", item.created_at.to_rfc3339())?;
        writeln!(w, "updated_at  {}", item.updated_at.to_rfc3339())?;
        for entry in &item.update_history {
            writeln!(
                w,
                "history  {}  {}  {}  {}",
                entry.at.to_rfc3339(),
                entry.field.as_str(),
                or_dash(entry.from.as_deref()),
                or_dash(entry.to.as_deref()),
            )?;
        }
        Ok(())
    }
}

/// Find the item whose id equals `query`, else the only one it prefixes.
pub fn resolve<'a>(items: &'a [ActionItem], query: &str) -> anyhow::Result<&'a ActionItem> {
    if let Some(item) = items.iter().find(|item| item.id.as_str() == query) {
        return Ok(item);
    }
    let matches: Vec<&ActionItem> = items
        .iter()
        .filter(|item| !query.is_empty() && item.id.as_str().starts_with(query))
        .collect();
    match matches.as_slice() {
        [item] => Ok(*item),
        [] => Err(StoreError::NotFound(ItemId::from(query)).into()),
        many => bail!("ID prefix '{query}' is ambiguous ({} matches)", many.len()),
    }
}

pub fn run_show(args: &ShowArgs, ctx: &Context) -> anyhow::Result<()> {
    let store = ctx.load_store(&args.project)?;
    let item = resolve(store.list_all(), &args.id)?;
    render_item(&Detail(item), ctx.output)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actrack_core::model::{ItemPatch, Status};
    use actrack_core::store::ItemStore;
    use chrono::{TimeZone, Utc};

    fn items() -> Vec<ActionItem> {
        let now = Utc.timestamp_opt(1_746_000_000, 0).unwrap();
        ["abc-1", "abd-2", "xyz-3"]
            .iter()
            .map(|id| ActionItem {
                id: ItemId::from(*id),
                project_id: "p".into(),
                task: format!("task {id}"),
                owner: None,
                deadline: None,
                status: Status::Open,
                created_at: now,
                updated_at: now,
                source: None,
                update_history: Vec::new(),
            })
            .collect()
    }

    #[test]
    fn exact_and_prefix_lookup() {
        let items = items();
        assert_eq!(resolve(&items, "abd-2").unwrap().id.as_str(), "abd-2");
        assert_eq!(resolve(&items, "x").unwrap().id.as_str(), "xyz-3");
    }

    #[test]
    fn ambiguous_prefix_is_an_error() {
        let items = items();
        let err = resolve(&items, "ab").unwrap_err();
        assert!(err.to_string().contains("ambiguous"));
    }

    #[test]
    fn unknown_id_is_not_found() {
        let items = items();
        let err = resolve(&items, "nope").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn history_is_rendered() {
        let mut store = ItemStore::new("p");
        let id = store.create("ship it", None, None).unwrap().id.clone();
        store.update(&id, &ItemPatch::status(Status::Completed)).unwrap();

        let mut buf = Vec::new();
        Detail(store.get(&id).unwrap()).render_human(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("status: open -> completed"));
    }
}
