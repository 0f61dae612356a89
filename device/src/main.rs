use std::path::PathBuf;
use std::sync::Arc;

use cam_relay::{config, logging, server};
use cam_relay::{HostLink, HttpUploader, LogFlash, RelayError, ReplaySensor, ServerState};
use clap::{Parser, Subcommand};
use log::{error, info, warn};
use pipeline::{
    Acquisition, Connectivity, FlashMode, FrameSlot, PipelineStats, ResultCache,
    TransmitSettings, Transmission,
};
use tokio::net::TcpListener;
use tokio::sync::watch;

/// Capture frames, post them for inference and serve the latest result
#[derive(Parser, Debug)]
#[command(name = "cam-relay", version, about)]
struct Cli {
    /// JSON config, or a postcard blob from `pack-config`
    #[arg(long)]
    config: Option<PathBuf>,

    /// JPEG file or directory of JPEGs to replay as camera frames
    #[arg(long, default_value = "frames")]
    frames: PathBuf,

    /// Camera frame buffers available to the sensor
    #[arg(long, default_value_t = 2)]
    fb_count: usize,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a JSON config into the binary blob stored on the device
    PackConfig { input: PathBuf, output: PathBuf },
}

#[tokio::main]
async fn main() {
    logging::init();

    if let Err(e) = run(Cli::parse()).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), RelayError> {
    if let Some(Command::PackConfig { input, output }) = cli.command {
        let len = config::pack(&input, &output)?;
        info!("Wrote {}-byte config blob to {}", len, output.display());
        return Ok(());
    }

    info!("Initializing cam-relay v{} (pipeline v{})", cam_relay::VERSION, pipeline::VERSION);
    let config = config::load(cli.config.as_deref())?;

    let sensor = Arc::new(ReplaySensor::open(&cli.frames, cli.fb_count)?);
    info!("Camera initialized with {} frame buffer(s)", sensor.fb_count());

    let link = Arc::new(HostLink::for_endpoint(config.endpoint.as_str()).await);
    match link.local_addr() {
        Some(ip) => info!("Network connected. IP Address: {}", ip),
        None => warn!("No route to {} yet", config.endpoint),
    }

    let slot = Arc::new(FrameSlot::new(sensor));
    let cache = Arc::new(ResultCache::new());
    let stats = Arc::new(PipelineStats::new());

    let flash_mode = if config.flash_enabled {
        FlashMode::On { settle: config.flash_settle() }
    } else {
        FlashMode::Off
    };
    let acquisition = Acquisition::new(
        Arc::clone(&slot),
        LogFlash::new(),
        flash_mode,
        Arc::clone(&stats),
    );
    let transmission = Transmission::new(
        slot,
        Arc::clone(&cache),
        Arc::clone(&link),
        HttpUploader::new(config.upload_timeout())?,
        TransmitSettings::from(&config),
        Arc::clone(&stats),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let listener = TcpListener::bind(config.listen_addr).await?;
    let state = ServerState::new(cache, stats, link);
    let server = tokio::spawn(server::serve(listener, state, shutdown_rx.clone()));

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutting down"),
            Err(e) => warn!("Cannot listen for Ctrl-C ({}), shutting down", e),
        }
        let _ = shutdown_tx.send(true);
    });

    tokio::join!(
        acquisition.run(config.capture_period(), shutdown_rx.clone()),
        transmission.run(config.transmit_period(), shutdown_rx),
    );

    match server.await {
        Ok(result) => result?,
        Err(e) => error!("HTTP server task failed: {}", e),
    }
    Ok(())
}
