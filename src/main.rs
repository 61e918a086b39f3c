use anyhow::{Context, Result};
use log::{error, info, LevelFilter};
use sun_collector::*;

fn setup_logging() {
    env_logger::builder()
        .filter_level(LevelFilter::Info)
        .format(|buf, record| {
            use std::io::Write;
            writeln!(buf, "[{}] {}: {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();
}

#[tokio::main]
async fn main() {
    setup_logging();

    let config = Config::default();

    println!("==========================================");
    println!("☀️  Sun Collector v{}", VERSION);
    println!("==========================================");
    println!("📋 Configuration:");
    println!("   Target color: {:02X?}", config.target_color);
    println!("   Pacing delay: {:?}", config.pacing_delay);
    println!("   Exit key: {}", config.exit_key);

    let code = match run(config).await {
        Ok(stats) => {
            info!(
                "Done: {} cycles, {} collected, {} retries",
                stats.cycles, stats.collected, stats.retries
            );
            0
        }
        Err(e) => {
            error!("{:#}", e);
            1
        }
    };

    // Runtime shutdown would otherwise block on a stalled collector worker.
    std::process::exit(code);
}

#[cfg(windows)]
async fn run(config: Config) -> Result<CollectorStats> {
    mark_dpi_aware();

    run_until_exit(config, GdiScreen::new(), Win32Pointer, AsyncKeyState)
        .await
        .context("sun collection stopped")
}

#[cfg(not(windows))]
async fn run(_config: Config) -> Result<CollectorStats> {
    Err(CollectorError::UnsupportedPlatform(std::env::consts::OS))
        .context("the collector drives the Windows desktop")
}
