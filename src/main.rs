use deskscribe::{AppConfig, AutomationPipeline, ConfigManager};
use std::time::Duration;
use tracing::{error, info, warn};

fn main() {
    tracing_subscriber::fmt().init();

    if let Err(e) = run() {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let manager = ConfigManager::new()?;
    let first_run = !manager.config_exists();
    let config = manager.load()?;
    if first_run {
        // Write the defaults out so they can be hand-edited
        manager.save(&config)?;
    }
    info!(path = ?manager.config_file_path(), "Loaded configuration");

    println!("Starting deskscribe");
    println!(
        "Make sure the '{}' icon is visible on your desktop!",
        config.locator.target_label
    );
    println!("Press Ctrl+C to stop at any time");
    std::thread::sleep(Duration::from_secs(config.startup_delay_secs));

    // The pipeline's HTTP clients must be created outside the async
    // runtime; only their use goes through spawn_blocking.
    let mut pipeline = AutomationPipeline::new(config.clone())?;

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| format!("Failed to start async runtime: {}", e))?;

    runtime.block_on(async {
        if let Err(e) = pipeline.check_detector().await {
            warn!("OCR sidecar not reachable, detection may fail: {}", e);
        }

        let summary = pipeline.run().await?;
        print_summary(&config, &summary);
        Ok(())
    })
}

fn print_summary(config: &AppConfig, summary: &deskscribe::RunSummary) {
    println!();
    println!("Automation completed!");
    println!("Files saved to: {}", config.output.target_dir.display());
    println!(
        "{} completed, {} skipped (icon not found), {} failed",
        summary.completed(),
        summary.skipped(),
        summary.failed()
    );
    if summary.used_fallback {
        println!("NOTE: placeholder data was used due to API failure");
    }
}
