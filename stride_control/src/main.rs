//! # Stride Control
//!
//! Runs the estimator and controller tasks on two RT threads against the
//! simulated stance sensors, following an optional footstep plan.
//!
//! The process stops on Ctrl-C, after `--duration` seconds, or as soon as
//! either task fails (a rejected footstep plan, for example).

use clap::Parser;
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use stride_common::consts::DEFAULT_CONFIG_PATH;
use stride_control::command::NullConsumer;
use stride_control::config::{load_config, LoadedConfig};
use stride_control::cycle::{rt_setup, CycleError, CycleRunner, PeriodicTask};
use stride_control::task::{build_tasks, FixedSoleFrames, SimulatedStance};
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

/// Stride: real-time biped balance and locomotion core
#[derive(Parser, Debug)]
#[command(name = "stride_control")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Estimator/controller RT loops for biped balance and stepping")]
struct Args {
    /// Path to the configuration TOML.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Path to a footstep plan TOML (`[[footsteps]]` entries).
    #[arg(long, value_name = "FILE")]
    plan: Option<PathBuf>,

    /// Stop after this many seconds (runs until Ctrl-C when omitted).
    #[arg(long, value_name = "SECONDS")]
    duration: Option<f64>,

    /// CPU core for the estimator thread.
    #[arg(long, default_value_t = 1)]
    estimator_core: usize,

    /// CPU core for the controller thread.
    #[arg(long, default_value_t = 2)]
    controller_core: usize,

    /// SCHED_FIFO priority of the estimator thread.
    #[arg(long, default_value_t = 82)]
    estimator_priority: i32,

    /// SCHED_FIFO priority of the controller thread.
    #[arg(long, default_value_t = 80)]
    controller_priority: i32,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    setup_tracing(&args);

    info!("Stride Control v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&args) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Stride Control shutdown complete");
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let LoadedConfig { config, footsteps } = load_config(&args.config, args.plan.as_deref())?;
    info!(
        service = %config.shared.service_name,
        estimator_us = config.timing.estimator_period_us,
        controller_us = config.timing.controller_period_us,
        footsteps = footsteps.len(),
        omega = config.icp.omega(),
        "Config OK"
    );

    let sensors = SimulatedStance::new(&config.robot, config.icp.gravity, &footsteps);
    let frames = FixedSoleFrames::new(&config.robot);
    let tasks = build_tasks(&config, footsteps, sensors, frames, NullConsumer::default())?;
    let (mut estimator, mut controller) = (tasks.estimator, tasks.controller);

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })?;

    let epoch = Instant::now();
    let deadline = args.duration.map(Duration::from_secs_f64);

    std::thread::scope(|s| -> Result<(), Box<dyn std::error::Error>> {
        let estimator_thread = s.spawn(|| {
            run_task(
                &mut estimator,
                config.timing.estimator_period_us,
                epoch,
                args.estimator_core,
                args.estimator_priority,
                &running,
            )
        });
        let controller_thread = s.spawn(|| {
            run_task(
                &mut controller,
                config.timing.controller_period_us,
                epoch,
                args.controller_core,
                args.controller_priority,
                &running,
            )
        });

        if let Some(limit) = deadline {
            while running.load(Ordering::Relaxed) && epoch.elapsed() < limit {
                std::thread::sleep(Duration::from_millis(10));
            }
            running.store(false, Ordering::SeqCst);
        }

        let estimator_result = estimator_thread
            .join()
            .map_err(|_| "estimator thread panicked")?;
        let controller_result = controller_thread
            .join()
            .map_err(|_| "controller thread panicked")?;
        estimator_result?;
        controller_result?;
        Ok(())
    })?;

    info!(
        bundles = controller.consumer().consumed,
        last_bundle_commands = controller.consumer().last_command_count,
        "controller handed bundles to the QP consumer"
    );
    Ok(())
}

/// RT-setup the calling thread and pace `task` until the run flag clears.
/// A failing task clears the flag so the other one stops too.
fn run_task<T: PeriodicTask>(
    task: &mut T,
    period_us: u32,
    epoch: Instant,
    cpu_core: usize,
    rt_priority: i32,
    running: &AtomicBool,
) -> Result<(), CycleError> {
    let result = rt_setup(cpu_core, rt_priority).and_then(|()| {
        info!(task = task.name(), cpu_core, rt_priority, "RT setup complete");
        CycleRunner::new(period_us, epoch).run(task, running)
    });
    if let Err(ref e) = result {
        error!("{e}");
        running.store(false, Ordering::SeqCst);
    }
    result
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
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
