//! `actrack config`: print the effective configuration.

use super::Context;
use crate::output::render;
use actrack_core::config::{TrackerConfig, user_config_path};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Debug, Serialize)]
struct ConfigView<'a> {
    config_file: Option<PathBuf>,
    data_dir: PathBuf,
    #[serde(flatten)]
    config: &'a TrackerConfig,
}

fn write_human(view: &ConfigView<'_>, w: &mut dyn Write) -> io::Result<()> {
    match &view.config_file {
        Some(path) => writeln!(w, "# config file: {}", path.display())?,
        None => writeln!(w, "# config file: none (defaults)")?,
    }
    writeln!(w, "# data dir: {}", view.data_dir.display())?;
    let body = toml::to_string_pretty(view.config).map_err(io::Error::other)?;
    write!(w, "{body}")
}

pub fn run_config(ctx: &Context, explicit: Option<PathBuf>) -> anyhow::Result<()> {
    let config_file = explicit.or_else(|| user_config_path().filter(|path| path.exists()));
    let view = ConfigView {
        config_file,
        data_dir: ctx.config.storage.resolved_data_dir(),
        config: &ctx.config,
    };
    render(ctx.output, &view, write_human)
}
