//! Backup job runner
//!
//! Runs the jobs of a JSON config file: `backuptool [CONFIG] [TRIGGER...]`

// backuptool/src/main.rs
use anyhow::{Context as _, Result};
use backuptool::adapters::AdapterRegistry;
use backuptool::backup::Context;
use backuptool::config::AppConfig;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    match run_app().await {
        Ok(0) => {
            println!("✅ All backup jobs completed successfully.");
            ExitCode::SUCCESS
        }
        Ok(failed) => {
            eprintln!("❌ {} backup job(s) failed.", failed);
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("❌ Error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

/// Runs the selected jobs in order and returns how many failed.
async fn run_app() -> Result<usize> {
    let mut args = env::args().skip(1);
    let config_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.json"));
    let triggers: Vec<String> = args.collect();

    let mut app_config = AppConfig::load_from_json(&config_path).context(format!(
        "Failed to load application configuration from {}",
        config_path.display()
    ))?;
    app_config.settings.apply_env_overrides();

    let ctx = Context::from_settings(&app_config.settings, AdapterRegistry::with_builtins());
    let jobs = app_config.select_jobs(&triggers)?;

    let mut failed = 0;
    for job in jobs {
        println!("🚀 Starting backup '{}' ({})...", job.label, job.trigger);
        let outcome = async {
            let mut model = job
                .build(&ctx)
                .with_context(|| format!("Failed to configure job '{}'", job.trigger))?;
            model
                .run()
                .await
                .with_context(|| format!("Backup job '{}' failed", job.trigger))
        }
        .await;

        match outcome {
            Ok(report) => {
                info!(trigger = %report.trigger, storages = report.storages, "job finished");
                println!("✅ {}: stored {} to {} storage(s)", job.trigger, report.file.display(), report.storages);
            }
            Err(e) => {
                error!(trigger = %job.trigger, error = %format!("{:#}", e), "job failed");
                eprintln!("❌ {}: {:#}", job.trigger, e);
                failed += 1;
            }
        }
    }
    Ok(failed)
}
