/*!
 * HCILINK Control
 * Non-interactive scan and connect for scripts and terminals
 * Onyx Digital Intelligence Development LLC
 */

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use hcilink_core::audit::AuditEntry;
use hcilink_core::{DeviceRecord, HciConfig, UserInputError, Workflow};

#[derive(Parser)]
#[command(name = "hcilinkctl")]
#[command(about = "HCILINK Bluetooth scan and connect")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, default_value = "/etc/hcilink/hcilink.toml")]
    config: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Bring services up and list nearby devices
    Scan {
        /// Print devices as JSON
        #[arg(long)]
        json: bool,
    },
    /// Scan, then connect to the device matching an address or inquiry line
    Connect {
        device: String,
    },
    /// Show the status of the configured services
    Services,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for results
    let log_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(format!("hcilink_core={},hcilinkctl={}", log_level, log_level))
        .with_writer(std::io::stderr)
        .init();

    let config = HciConfig::load(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config))?;

    let mut workflow = Workflow::from_config(&config);
    workflow
        .audit()
        .record(AuditEntry::info("Bluetooth Manager started"));

    match cli.command.unwrap_or(Commands::Scan { json: false }) {
        Commands::Scan { json } => scan(&mut workflow, json).await,
        Commands::Connect { device } => connect(&mut workflow, &device).await,
        Commands::Services => services(&workflow).await,
    }
}

async fn scan(workflow: &mut Workflow, json: bool) -> Result<()> {
    let devices = workflow.scan().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&*devices)?);
        return Ok(());
    }

    if devices.is_empty() {
        println!("No devices found");
    }
    for device in devices.iter() {
        print_device(device);
    }
    Ok(())
}

async fn connect(workflow: &mut Workflow, query: &str) -> Result<()> {
    workflow.scan().await?;

    let Some(device) = workflow.find_device(query) else {
        return Err(UserInputError::UnknownDevice(query.to_string()).into());
    };

    info!("Connecting to {}", device);
    let connected = workflow.connect(Some(&device)).await?;
    println!("Connected to {}", connected);
    Ok(())
}

async fn services(workflow: &Workflow) -> Result<()> {
    for (name, status) in workflow.service_report().await {
        println!("{:<16} {}", name, status);
    }
    Ok(())
}

fn print_device(device: &DeviceRecord) {
    match (&device.address, &device.name) {
        (Some(address), Some(name)) => println!("{}  {}", address, name),
        (Some(address), None) => println!("{}", address),
        _ => println!("{}", device.raw),
    }
}
