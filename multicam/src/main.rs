//! multicam: records every attached USB camera in fixed-length sessions.
//!
//! ## Lifecycle
//! 1. Load and validate `config.json` (exit code 2 on any problem).
//! 2. Create the video root if needed.
//! 3. Run the monitor loop: poll `v4l2-ctl`, start/stop one `gst-launch-1.0` per camera,
//!    alternate RECORDING and IDLE phases, watch free space.
//! 4. Stop every capture and exit: 0 after Ctrl-C/SIGTERM, 3 when the disk is full.

mod cli;

use std::fs::OpenOptions;
use std::path::Path;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use env_logger::{Builder, Env, Target};
use multicam_core::{
    ensure_directory, DeviceEnumerator, Monitor, MonitorConfiguration, MonitorError,
    MonitorOptions, ShutdownReason, SystemClock,
};
use multicam_linux::{GstLaunchBackend, SysinfoDiskProbe, V4l2CtlEnumerator};

const EXIT_FAILURE: u8 = 1;
const EXIT_CONFIG: u8 = 2;
const EXIT_DISK_FULL: u8 = 3;

fn main() -> ExitCode {
    let args = cli::Args::parse();

    if let Err(e) = init_logging(args.log_file.as_deref()) {
        eprintln!("cannot open log file: {e}");
        return ExitCode::from(EXIT_FAILURE);
    }

    let enumerator = V4l2CtlEnumerator::new().with_bus_prefix(args.bus_prefix.clone());

    if args.list_devices {
        return list_devices(&enumerator);
    }

    let config = match MonitorConfiguration::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::from(EXIT_CONFIG);
        }
    };
    log::info!(
        "Recording {}s / idle {}s at width {} @ {} fps, disk threshold {} MB",
        config.recording_length_seconds,
        config.recording_interval_seconds,
        config.resolution_width,
        config.framerate,
        config.disk_threshold_mb
    );

    let video_root = args.video_root();
    if let Err(e) = ensure_directory(&video_root) {
        log::error!("{}", e);
        return ExitCode::from(EXIT_FAILURE);
    }

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = interrupted.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
    }) {
        log::error!("Cannot install signal handler: {}", e);
        return ExitCode::from(EXIT_FAILURE);
    }

    let options = MonitorOptions {
        video_root,
        tick_interval: args.tick_interval(),
        disk_check_interval: args.disk_check_interval(),
    };
    let mut monitor = Monitor::new(
        &config,
        options,
        enumerator,
        Arc::new(GstLaunchBackend::new()),
        SysinfoDiskProbe::new(),
        SystemClock,
    );

    match monitor.run(&interrupted) {
        Ok(ShutdownReason::Interrupted) => {
            log::info!("Shut down after interrupt");
            ExitCode::SUCCESS
        }
        Ok(ShutdownReason::DiskExhausted {
            free_mb,
            threshold_mb,
        }) => {
            log::error!(
                "Shut down: {} MB free is below the {} MB threshold",
                free_mb,
                threshold_mb
            );
            ExitCode::from(EXIT_DISK_FULL)
        }
        Err(e) => {
            log::error!("{}", e);
            ExitCode::from(exit_code_for(&e))
        }
    }
}

fn init_logging(log_file: Option<&Path>) -> std::io::Result<()> {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    if let Some(path) = log_file {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        builder.target(Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn list_devices(enumerator: &V4l2CtlEnumerator) -> ExitCode {
    match enumerator.enumerate() {
        Ok(devices) if devices.is_empty() => {
            println!("No cameras attached");
            ExitCode::SUCCESS
        }
        Ok(devices) => {
            for device in devices {
                let paths: Vec<String> = device
                    .device_paths()
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect();
                println!("{}  {}  [{}]", device.bus_id(), device.name(), paths.join(", "));
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{}", e);
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn exit_code_for(error: &MonitorError) -> u8 {
    if error.is_configuration() {
        EXIT_CONFIG
    } else {
        EXIT_FAILURE
    }
}
