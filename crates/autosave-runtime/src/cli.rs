//! CLI definition using clap derive.

use std::path::PathBuf;

use autosave_core::AutoSaveConfig;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "autosave", about = "Debounced draft auto-save for report forms")]
pub struct Cli {
    /// JSON file holding drafts and the stored signature
    #[arg(
        long,
        short = 's',
        global = true,
        env = "AUTOSAVE_STORE",
        default_value = "autosave-drafts.json"
    )]
    pub store: PathBuf,

    #[command(flatten)]
    pub tuning: TuningOpts,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Auto-save newline-delimited JSON form snapshots read from stdin
    Edit(DraftOpts),
    /// Print the stored draft for a form
    Show(DraftOpts),
    /// Manage the stored signature
    #[command(subcommand)]
    Signature(SignatureCommand),
}

#[derive(Args)]
pub struct DraftOpts {
    /// Draft key, e.g. "work-plan:patient-42"
    #[arg(long, short = 'k')]
    pub key: String,
}

#[derive(Subcommand)]
pub enum SignatureCommand {
    /// Store a signature image (data:image/... URL) with the signer's name
    Save {
        #[arg(long)]
        image: String,
        #[arg(long)]
        name: String,
    },
    /// Print the stored signature record
    Show,
    /// Delete the stored signature
    Clear,
}

#[derive(Args, Default)]
pub struct TuningOpts {
    /// JSON config file (debounce_ms, enabled, saved_display_ms, ...)
    #[arg(long, global = true, env = "AUTOSAVE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Debounce in milliseconds (overrides the config file)
    #[arg(long, global = true, env = "AUTOSAVE_DEBOUNCE_MS")]
    pub debounce_ms: Option<u64>,

    /// Fail saves that take longer than this many milliseconds
    #[arg(long, global = true, env = "AUTOSAVE_SAVE_TIMEOUT_MS")]
    pub save_timeout_ms: Option<u64>,

    /// Only save on EOF / Ctrl-C, never on debounce
    #[arg(long, global = true)]
    pub disabled: bool,
}

impl TuningOpts {
    /// Config file first, then flag overrides.
    pub fn resolve(&self) -> anyhow::Result<AutoSaveConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                AutoSaveConfig::from_json_str(&raw)?
            }
            None => AutoSaveConfig::default(),
        };
        if let Some(ms) = self.debounce_ms {
            config = config.with_debounce_ms(ms);
        }
        if let Some(ms) = self.save_timeout_ms {
            config = config.with_save_timeout_ms(ms);
        }
        if self.disabled {
            config = config.with_enabled(false);
        }
        config.validate()?;
        Ok(config)
    }
}
