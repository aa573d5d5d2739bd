// driftwatch/src/main.rs

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands, ReferenceAction};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Setup Logging (Tracing)
    // RUST_LOG=debug driftwatch check ... to see the details
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Log {
            project_dir,
            features,
            prediction,
            probability,
            label,
        } => commands::log::execute(project_dir, features, prediction, probability, label).await,
        Commands::Check {
            project_dir,
            window,
            format,
        } => commands::check::execute(project_dir, window, format).await,
        Commands::Retrain {
            project_dir,
            format,
        } => commands::retrain::execute(project_dir, format).await,
        Commands::Reference {
            action:
                ReferenceAction::Build {
                    project_dir,
                    source,
                    generation,
                    exclude,
                },
        } => commands::reference::build(project_dir, source, generation, exclude),
        Commands::InjectDrift {
            project_dir,
            feature,
            kind,
            magnitude,
            window,
            seed,
        } => commands::inject_drift::execute(project_dir, feature, kind, magnitude, window, seed),
        Commands::Status {
            project_dir,
            format,
        } => commands::status::execute(project_dir, format),
        Commands::Watch {
            project_dir,
            interval,
            iterations,
        } => commands::watch::execute(project_dir, interval, iterations).await,
    }
}
