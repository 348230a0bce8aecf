//! Synheart Wear Agent CLI
//!
//! Permission-gated sensor acquisition, driven against a simulated wearable.

use anyhow::Context;
use clap::{Parser, Subcommand};
use crossbeam_channel::Receiver;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use synheart_wear_agent::{
    config::Config,
    sensor::{CapabilityProbe, GroupId, SensorReading, SensorStatus},
    simulated::{DeviceProfile, PromptMode, SimulatedDevice, SimulatedPrivacy},
    transparency::create_shared_log_with_persistence,
    SensorAgent, PRIVACY_DECLARATION, VERSION,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "synheart-wear")]
#[command(author = "Synheart")]
#[command(version = VERSION)]
#[command(about = "Permission-gated sensor acquisition for wearables", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Activate the agent and pass readings through until Ctrl+C
    Run {
        /// Device profile to simulate (defaults to the configured one)
        #[arg(long)]
        profile: Option<PathBuf>,

        /// Seconds between activations (defaults to the configured interval)
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Report which sensors and groups the device supports
    Probe {
        /// Device profile to simulate
        #[arg(long)]
        profile: Option<PathBuf>,
    },

    /// Show statistics from previous sessions
    Status,

    /// Display privacy declaration
    Privacy,

    /// Show configuration
    Config,

    /// Write the default device profile
    Profile {
        /// Output file
        #[arg(long, short, default_value = "device-profile.json")]
        output: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { profile, interval } => cmd_run(profile, interval),
        Commands::Probe { profile } => cmd_probe(profile),
        Commands::Status => {
            cmd_status();
            Ok(())
        }
        Commands::Privacy => {
            cmd_privacy();
            Ok(())
        }
        Commands::Config => cmd_config(),
        Commands::Profile { output } => cmd_profile(&output),
    }
}

fn cmd_run(profile_path: Option<PathBuf>, interval: Option<u64>) -> anyhow::Result<()> {
    println!("Synheart Wear Agent v{VERSION}");
    println!();

    let config = Config::load().unwrap_or_default();
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }
    let profile = load_profile(profile_path.as_deref().or(config.profile_path.as_deref()))?;
    let interval = interval
        .map(Duration::from_secs)
        .unwrap_or(config.activation_interval);

    let device = Arc::new(SimulatedDevice::new(profile.clone()));
    let privacy = Arc::new(SimulatedPrivacy::with_privileges(
        &profile,
        PromptMode::from_profile(&profile),
        config.privileges.clone(),
    ));
    let transparency_log = create_shared_log_with_persistence(config.transparency_path());

    let agent = SensorAgent::new(device.clone(), privacy, &config, transparency_log.clone())
        .context("Could not start the sensor subsystem")?;
    println!("Session ID: {}", agent.session_id());
    println!("Activation interval: {}s", interval.as_secs());
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("Error setting Ctrl+C handler")?;

    let mut pump = SimulatedDevice::spawn_pump(
        device.clone(),
        Duration::from_millis(profile.reading_interval_ms),
    );
    let receivers: Vec<(GroupId, Receiver<SensorReading>)> =
        GroupId::ALL.into_iter().map(|g| (g, agent.readings(g))).collect();

    let mut last_activation: Option<Instant> = None;
    let mut last_report = Instant::now();
    let mut counts = [0u64; 3];
    let mut last_usability = None;

    while running.load(Ordering::SeqCst) {
        if last_activation.map_or(true, |t| t.elapsed() >= interval) {
            let usability = agent.on_activated();
            println!("[{}] Activated: {usability}", chrono::Local::now().format("%H:%M:%S"));
            last_usability = Some(usability);
            last_activation = Some(Instant::now());
        }

        // Consent answers arrive in the background
        let usability = agent.usability();
        if last_usability != Some(usability) {
            println!("[{}] Usability changed: {usability}", chrono::Local::now().format("%H:%M:%S"));
            last_usability = Some(usability);
        }

        for (i, (group, receiver)) in receivers.iter().enumerate() {
            let drained = receiver.try_iter().count() as u64;
            if drained > 0 {
                transparency_log.record_readings(*group, drained);
                counts[i] += drained;
            }
        }

        if last_report.elapsed() >= Duration::from_secs(10) && counts.iter().any(|c| *c > 0) {
            println!(
                "[{}] Readings: {} vital, {} motion, {} ambient",
                chrono::Local::now().format("%H:%M:%S"),
                counts[0],
                counts[1],
                counts[2]
            );
            counts = [0; 3];
            last_report = Instant::now();
        }

        thread::sleep(Duration::from_millis(100));
    }

    println!();
    println!("Stopping agent...");
    agent.on_deactivated();
    agent.on_terminate();
    pump.stop();

    if let Err(e) = transparency_log.save() {
        eprintln!("Warning: Could not save transparency log: {e}");
    }

    println!();
    println!("{}", transparency_log.summary());
    Ok(())
}

fn cmd_probe(profile_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = Config::load().unwrap_or_default();
    let profile = load_profile(profile_path.as_deref().or(config.profile_path.as_deref()))?;
    let probe = CapabilityProbe::new(Arc::new(SimulatedDevice::new(profile)));
    let capabilities = probe.capabilities();

    println!("Sensor Capabilities");
    println!("===================");
    println!();
    for (sensor, status) in &capabilities.sensors {
        let mark = match status {
            SensorStatus::Present => "present ✓".to_string(),
            SensorStatus::Absent => "absent ✗".to_string(),
            SensorStatus::QueryFailed(e) => format!("query failed ({e})"),
        };
        println!("  {:<20} {mark}", sensor.name());
    }
    println!();
    println!("Groups:");
    for group in GroupId::ALL {
        println!(
            "  {:<8} {} (scope: {})",
            group.name(),
            if capabilities.group_supported(group) {
                "supported"
            } else {
                "unsupported"
            },
            group.scope()
        );
    }
    Ok(())
}

fn cmd_status() {
    let config = Config::load().unwrap_or_default();

    println!("Synheart Wear Agent Status");
    println!("==========================");
    println!();
    println!("Privileges:");
    println!("  Vital scope: {}", config.privileges.vital);
    println!("  Storage scope: {}", config.privileges.storage);
    println!();

    let stats_path = config.transparency_path();
    if stats_path.exists() {
        if let Ok(content) = std::fs::read_to_string(&stats_path) {
            if let Ok(stats) = serde_json::from_str::<serde_json::Value>(&content) {
                println!("Cumulative Statistics:");
                if let Some(readings) = stats.get("readings").and_then(|r| r.as_array()) {
                    for (group, count) in GroupId::ALL.iter().zip(readings) {
                        println!("  {group} readings: {count}");
                    }
                }
                for (key, label) in [
                    ("consent_prompts", "Consent prompts"),
                    ("consent_grants", "Consent grants"),
                    ("consent_declines", "Consent declines"),
                    ("acquisitions", "Groups acquired"),
                    ("acquisition_failures", "Failed acquisitions"),
                ] {
                    if let Some(value) = stats.get(key) {
                        println!("  {label}: {value}");
                    }
                }
            }
        }
    } else {
        println!("No previous session data found.");
    }
}

fn cmd_privacy() {
    println!("{PRIVACY_DECLARATION}");
}

fn cmd_config() -> anyhow::Result<()> {
    let config = Config::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn cmd_profile(output: &Path) -> anyhow::Result<()> {
    DeviceProfile::default()
        .save(output)
        .with_context(|| format!("Could not write profile to {output:?}"))?;
    println!("Wrote default device profile to {output:?}");
    Ok(())
}

fn load_profile(path: Option<&Path>) -> anyhow::Result<DeviceProfile> {
    match path {
        Some(path) => DeviceProfile::load(path)
            .with_context(|| format!("Could not load device profile {path:?}")),
        None => Ok(DeviceProfile::default()),
    }
}
