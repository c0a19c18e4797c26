//! Verse Recorder CLI entry point

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use verse_recorder::cli::{
    app::{dir_override, load_merged_config},
    args::{Cli, Commands},
    config_cmd::handle_config_command,
    presenter::Presenter,
    run_export, run_list, run_record, RecordOptions, EXIT_ERROR, EXIT_USAGE_ERROR,
};
use verse_recorder::domain::config::AppConfig;
use verse_recorder::domain::naming::validate_language;
use verse_recorder::domain::reference::Reference;
use verse_recorder::infrastructure::XdgConfigStore;

fn init_tracing() {
    // stdout carries command output; diagnostics go to stderr
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    let presenter = Presenter::new();
    let dir_config = dir_override(cli.dir);

    match cli.command {
        Commands::Config { action } => {
            let store = XdgConfigStore::new();
            if let Err(e) = handle_config_command(action, &store, &presenter).await {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            ExitCode::SUCCESS
        }
        Commands::List(args) => run_list(args, load_merged_config(dir_config).await).await,
        Commands::Export { path, to } => {
            run_export(path, to, load_merged_config(dir_config).await).await
        }
        Commands::Record(args) => {
            let reference = match args.reference_text().parse::<Reference>() {
                Ok(reference) => reference,
                Err(e) => {
                    presenter.error(&e.to_string());
                    return ExitCode::from(EXIT_USAGE_ERROR);
                }
            };

            if let Some(language) = &args.language {
                if let Err(e) = validate_language(language) {
                    presenter.error(&e.to_string());
                    return ExitCode::from(EXIT_USAGE_ERROR);
                }
            }

            // Build CLI config from args
            let cli_config = AppConfig {
                language: args.language.clone(),
                notify: if args.notify { Some(true) } else { None },
                ..Default::default()
            };
            let config = load_merged_config(dir_config.merge(cli_config)).await;

            let options = RecordOptions {
                reference,
                notify: config.notify_or_default(),
            };
            run_record(options, config).await
        }
    }
}
