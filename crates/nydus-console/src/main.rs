use std::time::Duration;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use nydus_protocol::RelayStatus;
use tracing_subscriber::EnvFilter;

use nydus_console::client::DashboardClient;
use nydus_console::config::ConsoleConfig;
use nydus_console::watcher::{RestartProgress, RestartWatcher};

const LOG_REFRESH: Duration = Duration::from_secs(10);
const LOG_TAIL_LINES: usize = 20;

#[derive(Parser)]
#[command(name = "nydus-console", about = "Operate Nydus services from the terminal")]
struct Cli {
    /// Dashboard base URL (overrides ~/.nydus/console.toml)
    #[arg(long, env = "NYDUS_DASHBOARD_URL", global = true)]
    url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Restart a service and follow its progress
    Restart { service: String },
    /// Print a service's recent log output
    Logs {
        service: String,
        /// Keep refreshing every 10 seconds
        #[arg(long)]
        follow: bool,
    },
    /// Show live host usage
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = ConsoleConfig::load()?;
    if cli.url.is_some() {
        config.dashboard.url = cli.url;
    }
    let base_url = config.dashboard_url();
    tracing::debug!(dashboard = %base_url, "nydus-console starting");

    let client = DashboardClient::new(&base_url);

    match cli.command {
        Command::Restart { service } => restart(&base_url, &client, &service).await,
        Command::Logs { service, follow } => logs(&client, &service, follow).await,
        Command::Stats => stats(&client).await,
    }
}

async fn restart(base_url: &str, client: &DashboardClient, service: &str) -> anyhow::Result<()> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} {prefix:.bold} {msg}")?,
    );
    spinner.set_prefix(service.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));

    let watcher = RestartWatcher::new(base_url);
    let last = watcher
        .watch(service, |progress| spinner.set_message(progress.message.clone()))
        .await;

    spinner.finish_with_message(format!("{} {}", marker(&last), last.message));

    if last != RestartProgress::bridge_closed() {
        match client.service_logs(service).await {
            Ok(logs) => print_tail(&logs),
            Err(e) => tracing::warn!(service = %service, error = %e, "could not load logs after restart"),
        }
    }

    if !last.is_success() {
        anyhow::bail!("restart of {} did not complete", service);
    }
    Ok(())
}

async fn logs(client: &DashboardClient, service: &str, follow: bool) -> anyhow::Result<()> {
    if !follow {
        println!("{}", client.service_logs(service).await?);
        return Ok(());
    }

    let mut interval = tokio::time::interval(LOG_REFRESH);
    let mut last = String::new();
    loop {
        interval.tick().await;
        match client.service_logs(service).await {
            Ok(logs) if logs != last => {
                println!("{}", logs);
                last = logs;
            }
            Ok(_) => {}
            Err(e) => eprintln!("Error: {:#}", e),
        }
    }
}

async fn stats(client: &DashboardClient) -> anyhow::Result<()> {
    let stats = client.live_stats().await?;
    println!("CPU  {:>5.1}%", stats.cpu_percent);
    println!("RAM  {:>5.1}%", stats.ram_percent);
    Ok(())
}

fn marker(progress: &RestartProgress) -> &'static str {
    match progress.status {
        RelayStatus::Success => "✓",
        RelayStatus::Error => "✗",
        RelayStatus::Progress => "…",
    }
}

fn print_tail(logs: &str) {
    let lines: Vec<&str> = logs.lines().collect();
    let start = lines.len().saturating_sub(LOG_TAIL_LINES);
    for line in &lines[start..] {
        println!("  {}", line);
    }
}
