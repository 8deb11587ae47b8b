//! pulsewardend - The pulsewarden background service
//!
//! This is the main entry point for the pulsewarden service.
//! It wires together all the components:
//! - Configuration loading
//! - Linux host collaborators (launcher, config writer, scheduler)
//! - The audio backend supervisor
//! - Signal handling for pause/resume/restart/shutdown

use anyhow::{Context, Result};
use clap::Parser;
use pulsewarden_config::{load_config, DaemonConfig};
use pulsewarden_core::{Collaborators, SocketEndpoint, Supervisor};
use pulsewarden_host_linux::{FsConfigWriter, LauncherEvent, LinuxLauncher, TokioScheduler};
use pulsewarden_util::default_config_path;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// pulsewardend - Keeps one audio server running for the guest environment
#[derive(Parser, Debug)]
#[command(name = "pulsewardend")]
#[command(about = "Supervises the audio server: SIGUSR1 pauses, SIGUSR2 resumes, SIGHUP restarts", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/pulsewarden/config.toml)
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Socket path override (or set PULSEWARDEN_SOCKET env var)
    #[arg(short, long, env = "PULSEWARDEN_SOCKET")]
    socket: Option<PathBuf>,

    /// Sink gain override
    #[arg(long)]
    volume: Option<f32>,

    /// Sink performance mode override
    #[arg(long)]
    performance_mode: Option<u8>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

/// Main service state
struct Service {
    supervisor: Supervisor,
    launcher: Arc<LinuxLauncher>,
}

impl Service {
    fn new(args: &Args) -> Result<Self> {
        let config = load_config(&args.config)
            .with_context(|| format!("Failed to load config from {:?}", args.config))?;
        let config = apply_overrides(config, args);

        info!(
            config_path = %args.config.display(),
            socket_path = %config.socket_path.display(),
            working_dir = %config.backend.working_dir.display(),
            "Configuration loaded"
        );

        let launcher = Arc::new(LinuxLauncher::new());
        let collaborators = Collaborators::new(
            launcher.clone(),
            Arc::new(FsConfigWriter::new()),
            Arc::new(TokioScheduler::current()),
        );

        let supervisor = Supervisor::new(
            config.backend,
            SocketEndpoint::new(config.socket_path),
            collaborators,
        )
        .with_settings(config.audio);

        Ok(Self {
            supervisor,
            launcher,
        })
    }

    async fn run(self) -> Result<()> {
        let _monitor_handle = self.launcher.start_monitor();
        let mut launcher_events = self
            .launcher
            .subscribe()
            .context("Launcher events already taken")?;

        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
        let mut sigint =
            signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;
        let mut sighup =
            signal(SignalKind::hangup()).context("Failed to create SIGHUP handler")?;
        let mut sigusr1 = signal(SignalKind::user_defined1())
            .context("Failed to create SIGUSR1 handler")?;
        let mut sigusr2 = signal(SignalKind::user_defined2())
            .context("Failed to create SIGUSR2 handler")?;

        self.supervisor.start();

        info!("Service running");

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully");
                    break;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully");
                    break;
                }

                // SIGHUP - restart the backend with the current settings
                _ = sighup.recv() => {
                    info!("Received SIGHUP, restarting audio backend");
                    self.supervisor.start();
                }

                _ = sigusr1.recv() => {
                    info!("Received SIGUSR1, pausing audio");
                    self.supervisor.pause();
                }
                _ = sigusr2.recv() => {
                    info!("Received SIGUSR2, resuming audio");
                    self.supervisor.resume();
                }

                Some(event) = launcher_events.recv() => {
                    self.handle_launcher_event(event);
                }
            }
        }

        info!("Shutting down pulsewardend");
        self.supervisor.stop();
        info!("Shutdown complete");
        Ok(())
    }

    fn handle_launcher_event(&self, event: LauncherEvent) {
        match event {
            LauncherEvent::Exited { pid, status } => {
                if self.supervisor.notify_exited(pid) {
                    warn!(pid = %pid, status = ?status, "Audio backend exited unexpectedly");
                } else {
                    debug!(pid = %pid, status = ?status, "Helper process exited");
                }
            }
        }
    }
}

fn apply_overrides(mut config: DaemonConfig, args: &Args) -> DaemonConfig {
    if let Some(socket) = &args.socket {
        config.socket_path = socket.clone();
    }
    if let Some(volume) = args.volume {
        config.audio.volume = volume;
    }
    if let Some(mode) = args.performance_mode {
        config.audio.performance_mode = mode;
    }
    config
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "pulsewardend starting"
    );

    let service = Service::new(&args)?;
    service.run().await
}
