use clap::Parser;

use framereader::cli::{Cli, Commands};
use framereader::commands::{self, ExtractArgs};
use framereader::config::Config;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("framereader=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Extract {
            source,
            language,
            workers,
            json,
            keep_workdir,
        } => {
            let args = ExtractArgs {
                source: &source,
                language: language.as_deref(),
                workers,
                json,
                keep_workdir,
            };
            if let Err(e) = commands::run_extract(&config, args) {
                // Exit code 2 for bad requests, 1 for pipeline failures.
                let input_error = e.is_input_error();
                tracing::error!("extraction failed: {:#}", anyhow::Error::new(e));
                std::process::exit(if input_error { 2 } else { 1 });
            }
            Ok(())
        }
        Commands::Check => commands::run_check(&config),
    }
}
