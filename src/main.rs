//! perfsight-sampler - version 0.1.0
//!
//! Out-of-process resource sampler with tracing logging.
//! This is the main entry point that wires the control loop, the sampler and
//! the output writer together and handles subcommands.

mod cli;
mod commands;
mod config;
mod startup_checks;

use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;
use tokio::signal;
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info};

use cli::{Args, Commands, LogLevel};
use commands::{command_check, command_config, command_sample, command_scan};
use config::{resolve_config, show_config, validate_effective_config, Config};
use perfsight_sampler::output;
use perfsight_sampler::process::{logical_core_count, ProcfsProbe};
use perfsight_sampler::{run_sampler, ControlLoop, Sampler, SharedConfig, Shutdown};

/// Upper bound on flushing queued events after the control stream ends.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Initializes tracing logging subsystem with configured log level.
/// Logs always go to stderr; stdout carries only protocol events.
fn setup_logging(config: &Config, args: &Args) {
    let level = match &args.log_level {
        Some(LogLevel::Off) => LevelFilter::OFF,
        Some(LogLevel::Error) => LevelFilter::ERROR,
        Some(LogLevel::Warn) => LevelFilter::WARN,
        Some(LogLevel::Info) => LevelFilter::INFO,
        Some(LogLevel::Debug) => LevelFilter::DEBUG,
        Some(LogLevel::Trace) => LevelFilter::TRACE,
        None => config
            .log_level
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(LevelFilter::INFO),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    debug!("Logging initialized with level: {}", level);
}

/// Helper function to load and validate configuration.
/// Exits the process with error code 1 if validation fails.
fn load_validated_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let config = resolve_config(args)?;
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("Configuration invalid: {}", e);
        std::process::exit(1);
    }
    Ok(config)
}

/// Main application entry point.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("Configuration invalid: {}", e);
                std::process::exit(1);
            }
            println!("Configuration is valid");
            return Ok(());
        }

        return show_config(&config, args.config_format);
    }

    // Handle subcommands
    if let Some(command) = &args.command {
        if let Commands::Config {
            output,
            format,
            commented,
        } = command
        {
            return command_config(output.clone(), format.clone(), *commented);
        }

        let config = load_validated_config(&args)?;
        setup_logging(&config, &args);

        return match command {
            Commands::Scan { pretty } => command_scan(*pretty, &config),
            Commands::Sample {
                pids,
                iterations,
                interval,
            } => {
                let pids = pids.clone();
                let (iterations, interval) = (*iterations, *interval);
                tokio::task::spawn_blocking(move || {
                    command_sample(&pids, iterations, interval, &config)
                        .map_err(|e| e.to_string())
                })
                .await?
                .map_err(Into::into)
            }
            Commands::Check => command_check(&config),
            Commands::Config { .. } => unreachable!("Config handled above"),
        };
    }

    // Service mode
    let config = load_validated_config(&args)?;
    setup_logging(&config, &args);

    info!("Starting perfsight-sampler");

    if let Err(e) = startup_checks::validate_requirements(&config.proc_root()) {
        error!("Startup validation failed: {}", e);
        error!("The sampler will start but targets may report null samples");
    }

    let shared = Arc::new(SharedConfig::new(config.default_interval()));
    let (sink, stream) = output::channel(config.channel_capacity());

    let mut writer_task = tokio::spawn(output::run_writer(stream, tokio::io::stdout()));

    let sampler = Sampler::new(ProcfsProbe::new(config.proc_root()), logical_core_count());
    let mut sampler_task = tokio::spawn(run_sampler(
        sampler,
        shared.clone(),
        sink.clone(),
        config.idle_poll(),
    ));

    let control = ControlLoop::new(
        shared,
        sink,
        config.scan_options(),
        config.default_interval(),
    );
    let stdin = BufReader::new(tokio::io::stdin());

    let code = tokio::select! {
        res = control.run(stdin) => match res {
            Ok(Shutdown::ExitCommand) => 0,
            Ok(Shutdown::EndOfInput) => {
                info!("Control input ended, shutting down");
                0
            }
            Err(e) => {
                error!("Failed to read commands: {}", e);
                1
            }
        },
        res = &mut writer_task => {
            match res {
                Ok(Ok(())) => error!("Output writer stopped unexpectedly"),
                Ok(Err(e)) => error!("Output stream failed: {}", e),
                Err(e) => error!("Output writer task failed: {}", e),
            }
            std::process::exit(1);
        }
        res = &mut sampler_task => {
            match res {
                Ok(Ok(())) => error!("Sampler stopped unexpectedly"),
                Ok(Err(e)) => error!("Sampler stopped: {}", e),
                Err(e) => error!("Sampler task failed: {}", e),
            }
            std::process::exit(1);
        }
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received, exiting...");
            0
        }
    };

    // Drop every sink so the writer flushes what is queued and returns.
    drop(control);
    sampler_task.abort();
    let _ = sampler_task.await;

    match tokio::time::timeout(DRAIN_TIMEOUT, writer_task).await {
        Ok(Ok(Ok(()))) => debug!("Output drained"),
        Ok(Ok(Err(e))) => error!("Output stream failed while draining: {}", e),
        Ok(Err(e)) => error!("Output writer task failed: {}", e),
        Err(_) => error!("Timed out draining output"),
    }

    // Stdin is read on a blocking thread that would otherwise hold the runtime open.
    std::process::exit(code);
}
