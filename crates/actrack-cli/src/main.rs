#![forbid(unsafe_code)]

mod cmd;
mod output;

use actrack_core::config::{EnvOverrides, apply_env_overrides, load_config};
use clap::{CommandFactory, Parser, Subcommand};
use output::{CliError, OutputMode};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "actrack: track action items from meeting notes across runs",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output (shorthand for `--format json`).
    #[arg(long, global = true)]
    json: bool,

    /// Output format: pretty, text, or json.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Config file to use instead of the user config.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the per-project item files.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        output::resolve_output_mode(self.format, self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Extract and reconcile action items from notes",
        long_about = "Send notes and the project's open items to the language model, \
                      merge the returned items into the project, and save it.",
        after_help = "EXAMPLES:\n    # Process a transcript file\n    actrack process -p launch -i meeting.txt\n\n    # Pipe notes and print a summary afterwards\n    cat notes.md | actrack process -p launch -i - --summarize"
    )]
    Process(cmd::process::ProcessArgs),

    #[command(
        about = "List action items",
        after_help = "EXAMPLES:\n    # Open and in-progress items (default)\n    actrack list -p launch\n\n    # Everything, as JSON\n    actrack list -p launch --all --json"
    )]
    List(cmd::list::ListArgs),

    #[command(about = "Show one action item with its history")]
    Show(cmd::show::ShowArgs),

    #[command(about = "Ask the language model for a status summary")]
    Summary(cmd::summary::SummaryArgs),

    #[command(about = "Print the effective configuration")]
    Config,

    #[command(about = "Generate shell completion scripts")]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("ACTRACK_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "actrack=debug,info"
        } else {
            "actrack=info,warn"
        })
    });

    let format = env::var("ACTRACK_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());
    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(cli: Cli, output: OutputMode) -> anyhow::Result<()> {
    if let Commands::Completions(args) = &cli.command {
        let mut command = Cli::command();
        return cmd::completions::run_completions(args.shell, &mut command);
    }

    let mut config = load_config(cli.config.as_deref())?;
    apply_env_overrides(&mut config, EnvOverrides::from_env());
    if let Some(dir) = cli.data_dir {
        config.storage.data_dir = Some(dir);
    }
    debug!(data_dir = %config.storage.resolved_data_dir().display(), "configuration resolved");

    let ctx = cmd::Context { config, output };
    match cli.command {
        Commands::Process(args) => cmd::process::run_process(&args, &ctx),
        Commands::List(args) => cmd::list::run_list(&args, &ctx),
        Commands::Show(args) => cmd::show::run_show(&args, &ctx),
        Commands::Summary(args) => cmd::summary::run_summary(&args, &ctx),
        Commands::Config => cmd::config::run_config(&ctx, cli.config),
        Commands::Completions(_) => Ok(()),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let output = cli.output_mode();

    match run(cli, output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let _ = output::render_error(output, &CliError::from(&err));
            ExitCode::FAILURE
        }
    }
}
