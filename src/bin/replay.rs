//! 記録済みランドマークを固定レートでパイプラインに流し、
//! カメラ軌跡を CSV で標準出力へ書く
//!
//! 入力: JSON lines (1行 = 検出1回分)
//! `{"timestamp_ms": 33.3, "hands": [[[x, y, z], ... 21 points]]}`

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::{info, warn};

use orbit_gesture::config::Config;
use orbit_gesture::hand::LandmarkFrame;
use orbit_gesture::session::{gesture_slot, InferenceTick, RenderTick};

/// 最後のフレーム以降も自動周回の様子を見るための余白
const TAIL_MS: f64 = 500.0;

#[derive(Parser, Debug)]
#[command(name = "replay", about = "Replay recorded hand landmarks through the orbit camera pipeline")]
struct Cli {
    /// 記録ファイル (JSON lines)
    input: PathBuf,

    #[arg(long, default_value = "config.toml")]
    config: String,

    /// 描画ティック/秒 (省略時は [server] render_fps)
    #[arg(long)]
    fps: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RecordedFrame {
    timestamp_ms: f64,
    #[serde(default)]
    hands: Vec<Vec<[f32; 3]>>,
}

fn read_recording(path: &PathBuf) -> Result<Vec<RecordedFrame>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let mut frames: Vec<RecordedFrame> = Vec::new();
    for (i, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let frame: RecordedFrame = serde_json::from_str(line)
            .with_context(|| format!("{}:{}: invalid frame", path.display(), i + 1))?;
        if let Some(prev) = frames.last() {
            if frame.timestamp_ms < prev.timestamp_ms {
                warn!(
                    "line {}: timestamp {} goes backwards (prev {}), skipped",
                    i + 1,
                    frame.timestamp_ms,
                    prev.timestamp_ms
                );
                continue;
            }
        }
        frames.push(frame);
    }
    Ok(frames)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "orbit_gesture=info,replay=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load_or_default(&cli.config);
    let fps = cli.fps.unwrap_or(config.server.render_fps);
    if fps == 0 {
        bail!("fps must be positive");
    }

    let frames = read_recording(&cli.input)?;
    info!("Replay ({}): {} frames at {} fps", env!("GIT_VERSION"), frames.len(), fps);

    let (slot_tx, slot_rx) = gesture_slot();
    let mut inference = InferenceTick::new(&config, slot_tx);
    let mut render = RenderTick::new(&config.camera, slot_rx);

    let dt_ms = 1000.0 / fps as f64;
    let start = frames.first().map(|f| f.timestamp_ms).unwrap_or(0.0);
    let end = frames.last().map(|f| f.timestamp_ms).unwrap_or(0.0) + TAIL_MS;

    println!("time_ms,mode,delta_x,delta_y,zoom_factor,azimuth,polar,distance,auto_rotate");

    let mut clock = start;
    let mut next = 0;
    let mut duplicates = 0u32;
    while clock <= end {
        while next < frames.len() && frames[next].timestamp_ms <= clock {
            let recorded = &frames[next];
            let frame = LandmarkFrame::from_raw(recorded.timestamp_ms, &recorded.hands);
            if inference.process(&frame).is_none() {
                duplicates += 1;
            }
            next += 1;
        }

        let sample = render.tick((dt_ms / 1000.0) as f32);
        let t = render.controls().transform();
        println!(
            "{:.1},{},{:.5},{:.5},{:.5},{:.5},{:.5},{:.4},{}",
            clock - start,
            sample.mode.as_str(),
            sample.delta_x,
            sample.delta_y,
            sample.zoom_factor,
            t.azimuth,
            t.polar,
            t.distance,
            render.controls().auto_rotate()
        );

        clock += dt_ms;
    }

    info!("Done ({} duplicate frames skipped)", duplicates);
    Ok(())
}
