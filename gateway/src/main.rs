mod config;
mod observability;

use clap::{Args, Parser, Subcommand};
use config::Config;
use insights::credentials::Credentials;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "gong-insights", version, about = "Gong API wrapper for Custom GPT actions")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Serve /insights and /openapi.json
    Run(ConfigArgs),
    /// Print the OpenAPI descriptor to stdout
    Openapi(ConfigArgs),
}

#[derive(Args)]
struct ConfigArgs {
    #[arg(long, env = "GONG_INSIGHTS_CONFIG")]
    config_file: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        CliCommand::Run(args) => run(args),
        CliCommand::Openapi(args) => print_openapi(args),
    }
}

fn load_config(args: &ConfigArgs) -> Result<Config, ExitCode> {
    Config::load(args.config_file.as_deref()).map_err(|e| {
        eprintln!("{e}");
        ExitCode::FAILURE
    })
}

fn print_openapi(args: ConfigArgs) -> ExitCode {
    let config = match load_config(&args) {
        Ok(config) => config,
        Err(code) => return code,
    };

    let descriptor = insights::openapi::descriptor(&config.insights.server_url());
    match serde_json::to_string_pretty(&descriptor) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("could not render descriptor: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: ConfigArgs) -> ExitCode {
    let config = match load_config(&args) {
        Ok(config) => config,
        Err(code) => return code,
    };

    let _sentry_guard = match observability::init_logging(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(metrics_config) = &config.metrics
        && let Err(e) = observability::init_metrics(metrics_config)
    {
        tracing::error!(error = %e, "could not initialize metrics");
        return ExitCode::FAILURE;
    }

    let credentials = match Credentials::from_env() {
        Ok(credentials) => credentials,
        Err(e) => {
            tracing::error!(error = %e, "missing Gong credentials");
            return ExitCode::FAILURE;
        }
    };

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!(error = %e, "could not start runtime");
            return ExitCode::FAILURE;
        }
    };

    rt.block_on(async move {
        tokio::select! {
            result = insights::run(config.insights, credentials) => match result {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    tracing::error!(error = %e, "insights service failed");
                    ExitCode::FAILURE
                }
            },
            _ = shutdown_signal() => {
                tracing::info!("shutting down");
                ExitCode::SUCCESS
            }
        }
    })
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = sigterm.recv() => {},
                }
            }
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
