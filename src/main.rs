// src/main.rs
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use emit_report::batch::process_batch;
use emit_report::cli::{Cli, Commands};
use emit_report::config::AppConfig;
use emit_report::error::Error;
use emit_report::model::Credentials;
use emit_report::pipeline::{LocalRequest, Pipeline, RunRequest};

const NO_DATA: &str = "\n --- No data found --- \n";

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    // Band math parallelises within one product; leave a core for I/O.
    let threads = num_cpus::get().saturating_sub(1).max(1);
    if let Err(err) = rayon::ThreadPoolBuilder::new().num_threads(threads).build_global() {
        error!(error = %err, "could not size the worker pool");
    }

    match execute(cli) {
        Ok(()) => {
            println!("--- Finished processing ---");
            ExitCode::SUCCESS
        }
        Err(err) => {
            match err.downcast_ref::<Error>() {
                Some(e) => error!(kind = %e.kind(), error = %e, "run failed"),
                None => error!(error = %err, "run failed"),
            }
            println!("{NO_DATA}");
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: Cli) -> Result<()> {
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    let pipeline = Pipeline::new(config)?;

    match cli.command {
        Commands::Run {
            user,
            password,
            dates,
            bbox,
        } => {
            let request = RunRequest {
                credentials: Credentials {
                    username: user,
                    password,
                },
                bbox,
                dates,
            };
            let outcome = pipeline.run(&request)?;
            println!("Report: {}", outcome.report_path.display());
        }
        Commands::Process {
            reflectance,
            mineral,
            bbox,
            date,
        } => {
            let request = LocalRequest {
                reflectance,
                mineral,
                bbox,
                date_label: date,
            };
            let outcome = pipeline.process_local(&request)?;
            println!("Report: {}", outcome.report_path.display());
        }
        Commands::Batch { jobs } => {
            let summary = process_batch(&jobs, Arc::new(pipeline))?;
            if summary.failed > 0 {
                anyhow::bail!("{} of {} jobs failed", summary.failed, summary.failed + summary.succeeded);
            }
        }
    }
    Ok(())
}
