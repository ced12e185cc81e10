//! autosave: drive draft auto-save sessions from the command line.

use clap::Parser;

mod cli;
mod cmd_edit;
mod cmd_show;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    let filter = std::env::var("AUTOSAVE_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        cli::Command::Edit(opts) => {
            let config = args.tuning.resolve()?;
            tracing::info!(
                key = %opts.key,
                debounce_ms = config.debounce_ms,
                enabled = config.enabled,
                "auto-save session starting"
            );
            cmd_edit::cmd_edit(&args.store, &opts.key, config).await?;
        }
        cli::Command::Show(opts) => {
            cmd_show::cmd_show(&args.store, &opts.key)?;
        }
        cli::Command::Signature(command) => {
            cmd_show::cmd_signature(&args.store, command)?;
        }
    }

    Ok(())
}
