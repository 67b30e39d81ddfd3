use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use triagem_classify::{EngineOptions, TagPolicy};

mod commands;
mod config;

use config::{Config, DEFAULT_CONFIG_FILE};

#[derive(Parser)]
#[command(name = "triagem", version, about = "Rule and history based transaction classifier")]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, global = true, env = "TRIAGEM_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum TagPolicyArg {
    Merge,
    RespectOverwrite,
}

impl From<TagPolicyArg> for TagPolicy {
    fn from(arg: TagPolicyArg) -> Self {
        match arg {
            TagPolicyArg::Merge => TagPolicy::Merge,
            TagPolicyArg::RespectOverwrite => TagPolicy::RespectOverwrite,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Apply rules, then history, to a batch of draft transactions.
    Classify {
        #[arg(long)]
        rules: PathBuf,
        #[arg(long)]
        drafts: PathBuf,
        #[arg(long)]
        subcategories: Option<PathBuf>,
        /// Recent persisted transactions (JSON array).
        #[arg(long)]
        history: Option<PathBuf>,
        /// Overrides `history.window` from the config.
        #[arg(long)]
        window: Option<usize>,
        #[arg(long, value_enum)]
        tag_policy: Option<TagPolicyArg>,
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Print the history index built from a snapshot.
    History {
        #[arg(long)]
        history: PathBuf,
        #[arg(long)]
        window: Option<usize>,
    },
    /// Report rules that are inert, catch-all, or point at bad subcategories.
    CheckRules {
        #[arg(long)]
        rules: PathBuf,
        #[arg(long)]
        subcategories: Option<PathBuf>,
    },
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    init_tracing(&config.log_level);

    match cli.command {
        Command::Classify {
            rules,
            drafts,
            subcategories,
            history,
            window,
            tag_policy,
            output,
        } => {
            let options = EngineOptions {
                tag_policy: tag_policy.map_or(config.engine.tag_policy, TagPolicy::from),
            };
            let input = commands::ClassifyInput {
                rules,
                drafts,
                subcategories,
                history,
                window: window.unwrap_or(config.history.window),
                options,
            };
            let result = commands::classify(&input)?;
            commands::write_output(&result, output.as_deref())
        }
        Command::History { history, window } => {
            let index = commands::history(&history, window.unwrap_or(config.history.window))?;
            commands::write_output(&index, None)
        }
        Command::CheckRules {
            rules,
            subcategories,
        } => {
            let issues = commands::check(&rules, subcategories.as_deref())?;
            if issues.is_empty() {
                tracing::info!("no rule issues found");
            }
            commands::write_output(&serde_json::to_value(&issues)?, None)
        }
    }
}
