// src/main.rs
// AI Translator - console entry point

use ai_translator::cli::{Cli, Commands, Settings, run_console};
use ai_translator::config::{EnvConfig, LanguageCatalog, TranslatorConfig};
use anyhow::Result;
use clap::Parser;
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

fn init_logging(log_file: Option<&Path>, verbose: bool) -> Result<()> {
    match log_file {
        Some(path) => {
            let level = if verbose { Level::DEBUG } else { Level::INFO };
            let file = File::create(path)?;
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        None => {
            // stdout is the console; keep stderr quiet unless asked
            let level = if verbose { Level::DEBUG } else { Level::WARN };
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref(), cli.verbose)?;

    let env = EnvConfig::load();
    let file_config = TranslatorConfig::load();
    let catalog = LanguageCatalog::load(cli.languages_file.as_deref())?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let validation = env.validate();
            if !validation.is_valid() {
                anyhow::bail!("{}", validation.report());
            }
            let settings = Settings::resolve(&cli, &env, &file_config, &catalog)?;
            info!(language = %settings.language.code, model = %settings.model, "Starting console");
            run_console(settings, catalog, file_config).await?;
        }
        Commands::Languages => {
            for language in catalog.iter() {
                println!("{:<8} {}", language.code, language.display_name);
            }
        }
        Commands::Config => {
            let settings = Settings::resolve(&cli, &env, &file_config, &catalog)?;
            println!("Config file:   {}", TranslatorConfig::config_path().display());
            println!("{}", settings.summary());
            println!();
            println!("{}", env.validate().report());
        }
    }

    Ok(())
}
