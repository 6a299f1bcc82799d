//! Specmeta CLI - Header metadata resolver
//!
//! Commands: statuses, licenses, resolve
//! Outputs JSON to stdout, logs to stderr
//! Returns 2 when the resolved configuration carries errors

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use specmeta_core::{
    DocumentContext, EngineSettings, License, ResolutionPipeline, SpecStatus,
};

#[derive(Parser)]
#[command(name = "specmeta-cli")]
#[command(about = "Specmeta CLI - Header metadata resolver", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Origin that relative version URLs resolve against
    #[arg(long, global = true, default_value = specmeta_core::config::DEFAULT_PUBLISHER_ORIGIN)]
    publisher_origin: String,

    /// Base URL of the publication history pages
    #[arg(long, global = true, default_value = specmeta_core::config::DEFAULT_HISTORY_BASE)]
    history_base: String,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// List the status vocabulary
    Statuses,

    /// List the supported licenses
    Licenses,

    /// Resolve a header configuration
    Resolve {
        /// Path to a JSON configuration file
        #[arg(short, long, required_unless_present = "payload", conflicts_with = "payload")]
        config: Option<PathBuf>,

        /// Inline JSON configuration
        #[arg(short, long)]
        payload: Option<String>,

        /// Host document last-modified date (YYYY-MM-DD); defaults to the config file's mtime
        #[arg(long)]
        last_modified: Option<NaiveDate>,

        /// Override today's date (YYYY-MM-DD)
        #[arg(long)]
        today: Option<NaiveDate>,

        /// Never probe the network for history pages
        #[arg(long)]
        offline: bool,

        /// Timeout for the history probe
        #[arg(long)]
        probe_timeout_secs: Option<u64>,

        /// The status section is marked as an updateable Recommendation
        #[arg(long)]
        updateable_rec: bool,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusEntry {
    code: String,
    track: specmeta_core::PublicationTrack,
    text: Option<&'static str>,
    long_text: Option<&'static str>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Statuses => {
            let statuses: Vec<_> = SpecStatus::KNOWN
                .iter()
                .map(|s| StatusEntry {
                    code: s.code().to_string(),
                    track: s.track(),
                    text: s.text(),
                    long_text: s.long_text(),
                })
                .collect();
            emit(&statuses)
        }

        Commands::Licenses => {
            let licenses: Vec<_> = License::ALL
                .iter()
                .map(|l| serde_json::json!({ "key": l.key(), "license": l.descriptor() }))
                .collect();
            emit(&licenses)
        }

        Commands::Resolve {
            config,
            payload,
            last_modified,
            today,
            offline,
            probe_timeout_secs,
            updateable_rec,
        } => {
            let mut context = today.map_or_else(DocumentContext::now, DocumentContext::on);
            if let Some(date) = last_modified {
                context = context.with_last_modified(date);
            }
            context.sotd_updateable_rec = updateable_rec;

            let settings = EngineSettings {
                publisher_origin: cli.publisher_origin,
                history_base: cli.history_base,
                probe_timeout_secs,
            };
            let pipeline = if offline {
                ResolutionPipeline::offline(&settings)
            } else {
                ResolutionPipeline::with_http_probe(&settings)
            };
            let pipeline = match pipeline {
                Ok(p) => p,
                Err(e) => return fail(&e.to_string()),
            };

            let resolution = match (config, payload) {
                (Some(path), _) => pipeline.resolve_file(&path, &context).await,
                (None, Some(json)) => pipeline.resolve_json(&json, &context).await,
                (None, None) => return fail("Either --config or --payload is required"),
            };
            let resolution = match resolution {
                Ok(resolution) => resolution,
                Err(e) => return fail(&e.to_string()),
            };

            match resolution.report() {
                Ok(report) => {
                    let code = emit(&report);
                    if report.valid {
                        code
                    } else {
                        ExitCode::from(2)
                    }
                }
                Err(e) => fail(&e.to_string()),
            }
        }
    }
}

fn emit<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => fail(&format!("Serialization error: {e}")),
    }
}

fn fail(message: &str) -> ExitCode {
    tracing::error!("{message}");
    println!("{}", serde_json::json!({ "valid": false, "error": message }));
    ExitCode::FAILURE
}
