mod simulation;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use std::time::Duration;
use tracing::info;
use webperf_monitor::logging::{init_logging, LogConfig, LogFormat};
use webperf_monitor::{MonitorConfig, PerformanceMonitor};

use simulation::Simulation;

/// Runs the telemetry engine against a simulated host and prints its report
#[derive(Parser, Debug)]
#[command(name = "webperf-monitor", version, about)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long, env = "WEBPERF_CONFIG")]
    config: Option<String>,

    /// Log output format: human or json
    #[arg(long, default_value = "human")]
    log_format: LogFormat,

    /// Log level or filter directive
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Number of simulated page views, one per second
    #[arg(long, default_value_t = 5)]
    simulate_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(
        &LogConfig::default()
            .with_level(cli.log_level.clone())
            .with_format(cli.log_format),
    )?;

    let config = MonitorConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    let simulation = Simulation::new(&config.critical_resources);
    let monitor = PerformanceMonitor::start(
        config,
        simulation.host.clone(),
        simulation.collaborators.clone(),
    );

    info!(views = cli.simulate_secs, "Simulating session");
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    for step in 0..cli.simulate_secs {
        ticker.tick().await;
        simulation.page_view(step);
        monitor.track_api_call(
            "/api/students?page=1&token=demo",
            0.0,
            200.0 + step as f64 * 150.0,
        );
        monitor.track_api_call("/api/classes", 0.0, 120.0);
        monitor.check_memory_usage();
    }

    let scan = monitor.analyze_resource_performance();
    info!(scanned = scan.scanned, large = scan.large, slow = scan.slow, "Resource scan finished");

    let optimization = monitor.perform_optimization().await;
    let report = monitor.performance_report();
    monitor.destroy();

    let output = json!({
        "report": report,
        "optimization": optimization,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
