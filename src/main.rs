use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use orbit_gesture::config::Config;
use orbit_gesture::session::{run_session, SessionError};

#[derive(Parser, Debug)]
#[command(name = "orbit_gesture", about = "Hand gesture → orbit camera server")]
struct Cli {
    /// 設定ファイル
    #[arg(long, default_value = "config.toml")]
    config: String,

    /// [server] listen_addr を上書き
    #[arg(long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "orbit_gesture=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::load_or_default(&cli.config);
    if let Some(addr) = cli.listen {
        config.server.listen_addr = addr;
    }

    info!("Orbit Gesture ({})", env!("GIT_VERSION"));
    info!(
        "Gesture: pinch < {}, fist radius {}, zoom gain {}",
        config.gesture.pinch_threshold, config.gesture.fist_radius, config.gesture.zoom_gain
    );
    info!("Smooth: delta={}", config.smooth.delta);
    info!(
        "Camera: distance [{}, {}], zoom guard [{}, {}], auto-rotate {}",
        config.camera.min_distance,
        config.camera.max_distance,
        config.camera.inner_guard,
        config.camera.outer_guard,
        config.camera.auto_rotate_speed
    );
    info!("Render: {} fps, publish camera: {}", config.server.render_fps, config.server.publish_camera);

    let bind_addr: SocketAddr = config
        .server
        .listen_addr
        .parse()
        .context("invalid listen_addr")?;
    let listener = TcpListener::bind(bind_addr).await?;
    info!("Listening on {}", bind_addr);

    loop {
        let (stream, addr) = tokio::select! {
            accepted = listener.accept() => accepted?,
            _ = tokio::signal::ctrl_c() => break,
        };
        stream.set_nodelay(true)?;
        info!("Detector connected: {}", addr);

        tokio::select! {
            result = run_session(stream, &config) => match result {
                Ok(summary) => info!(
                    "Detector disconnected ({} frames, {} duplicate, {} malformed)",
                    summary.frames, summary.duplicate_frames, summary.malformed_frames
                ),
                Err(e @ (SessionError::DetectorInit(_) | SessionError::CapturePermission(_))) => {
                    error!("{}", e);
                }
                Err(e) => warn!("Session ended: {:#}", e),
            },
            _ = tokio::signal::ctrl_c() => break,
        }

        info!("Waiting for next connection...");
    }

    info!("Shutting down...");
    Ok(())
}
