//! # Dynamixel Bridge Binary
//!
//! Bridges a servo actuator chain with a periodic control process behind a
//! shared-memory interchange.
//!
//! # Usage
//!
//! ```bash
//! # Run against the software bus backend
//! dxl_bridge --config config/bridge.toml --bus sim
//!
//! # Verbose logging
//! dxl_bridge --config config/bridge.toml -v
//!
//! # JSON logs
//! dxl_bridge --config config/bridge.toml --json
//! ```

use clap::Parser;
use dxl_bridge::batch::BatchEngine;
use dxl_bridge::bus_backends::create_bus;
use dxl_bridge::convert::UnitConverter;
use dxl_bridge::cycle::ControlLoop;
use dxl_bridge::groups::GroupPlan;
use dxl_bridge::init::InitSequencer;
use dxl_bridge::interchange_mem::MemoryInterchange;
use dxl_bridge::registry::ActuatorRegistry;
use dxl_bridge::timing::IntervalTimer;
use dxl_common::config::load_config;
use dxl_common::consts::DEFAULT_CONFIG_PATH;
use dxl_common::interchange::Interchange;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

/// Dynamixel bus synchronization bridge
#[derive(Parser, Debug)]
#[command(name = "dxl_bridge")]
#[command(version)]
#[command(about = "Bridges a servo actuator chain with a shared-memory control process")]
#[command(long_about = None)]
struct Args {
    /// Path to the bridge configuration file (bridge.toml).
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Bus backend to use ("sim" ships with the bridge; hardware backends
    /// are provided by external crates).
    #[arg(long, default_value = "sim")]
    bus: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = run() {
        error!("Bridge startup failed: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    setup_tracing(&args);

    info!("dxl_bridge v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = load_config(&args.config)?;
    let channels = config.channels()?;
    let mode = channels.command_mode()?;
    info!(
        "Loaded config: {} joints, {:?} command mode, period {}s",
        config.joints.len(),
        mode,
        config.hardware.period_s
    );

    let registry = ActuatorRegistry::from_config(&config)?;
    let plan = GroupPlan::build(&registry);
    info!(
        "{} communication groups: {:?}",
        plan.len(),
        plan.groups().iter().map(|g| g.name.as_str()).collect::<Vec<_>>()
    );

    // Bring up the chain.
    let mut bus = create_bus(&args.bus)?;
    let mut sequencer = InitSequencer::new(
        &registry,
        &config.hardware.port_name,
        config.hardware.baud_rate,
    );
    let table = match sequencer.run(&mut *bus) {
        Ok(table) => table,
        Err(e) => {
            error!("Bring-up failed at stage {:?}", sequencer.stage());
            return Err(e.into());
        }
    };

    let engine = BatchEngine::new(&registry, plan, table)?;
    let converter = UnitConverter::new(&registry);
    let timer = IntervalTimer::new(Duration::from_secs_f64(config.hardware.period_s));

    // Bring up the interchange. The in-process implementation serves the
    // sim path; a shared-memory transport crate replaces it in deployment.
    let mut shm = MemoryInterchange::new(registry.len(), channels);
    shm.open(true)?;
    shm.write_header()?;
    info!(
        "Interchange open (key {}, hash {}): {}",
        config.interchange.shm_key,
        config.interchange.hash,
        shm.is_open()
    );

    if detect_rt_mode() {
        info!("Running in real-time mode");
    } else {
        info!("Running in standard (non-RT) mode");
    }

    // Setup signal handler.
    let running = Arc::new(AtomicBool::new(true));
    let running_handler = Arc::clone(&running);
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        running_handler.store(false, Ordering::SeqCst);
    })?;

    let mut control_loop = ControlLoop::new(engine, converter, timer, mode);
    control_loop.seed(&mut *bus, &mut shm)?;
    control_loop.run(&mut *bus, &mut shm, &running)?;

    info!("dxl_bridge shutdown complete");
    Ok(())
}

/// Setup tracing subscriber based on CLI arguments.
fn setup_tracing(args: &Args) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Detect if running in real-time mode by checking scheduler policy.
fn detect_rt_mode() -> bool {
    #[cfg(target_os = "linux")]
    {
        use libc::{SCHED_FIFO, SCHED_RR, sched_getscheduler};
        unsafe {
            let policy = sched_getscheduler(0);
            policy == SCHED_FIFO || policy == SCHED_RR
        }
    }
    #[cfg(not(target_os = "linux"))]
    {
        false
    }
}
