//! 推論ティック・描画ティックと、それらを回す接続単位のセッション
//!
//! 2つのティックは互いを待たない。推論側は平滑化済みサンプルで watch スロットを
//! 上書きし、描画側はタイマー発火時にスロットにある最新値を読むだけ。

use std::time::{Duration, Instant};

use futures::StreamExt;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::camera::{CameraMapper, OrbitControls};
use crate::config::{CameraConfig, Config};
use crate::gesture::{DeltaSmoother, GestureClassifier, GestureMode, GestureSample, TrackState};
use crate::hand::{HandLandmarkIndex, LandmarkFrame};
use crate::protocol::{self, CameraSnapshot, DetectorMessage, ServerMessage};

#[derive(Debug, Error)]
pub enum SessionError {
    /// セッション終了 (再試行しない)
    #[error("hand landmark detector failed to initialize: {0}")]
    DetectorInit(String),
    /// セッション終了 (再試行しない)
    #[error("camera permission denied or unavailable: {0}")]
    CapturePermission(String),
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

pub type GestureSender = watch::Sender<GestureSample>;
pub type GestureReceiver = watch::Receiver<GestureSample>;

/// 推論 → 描画の受け渡し (1スロット・後勝ち)
pub fn gesture_slot() -> (GestureSender, GestureReceiver) {
    watch::channel(GestureSample::no_hand())
}

// ===========================================================================
// Inference tick
// ===========================================================================

pub struct InferenceTick {
    classifier: GestureClassifier,
    smoother: DeltaSmoother,
    track: TrackState,
    last_timestamp_ms: Option<f64>,
    slot: GestureSender,
}

impl InferenceTick {
    pub fn new(config: &Config, slot: GestureSender) -> Self {
        Self {
            classifier: GestureClassifier::new(config.gesture.clone()),
            smoother: DeltaSmoother::from_config(&config.smooth),
            track: TrackState::default(),
            last_timestamp_ms: None,
            slot,
        }
    }

    /// 1フレーム分を分類 → 平滑化 → スロットへ書き込み
    ///
    /// 直前と同じタイムスタンプのフレームは状態に触れず `None` を返す
    pub fn process(&mut self, frame: &LandmarkFrame) -> Option<GestureSample> {
        if self.last_timestamp_ms == Some(frame.timestamp_ms) {
            return None;
        }
        self.last_timestamp_ms = Some(frame.timestamp_ms);

        let (raw, next) = self.classifier.classify(frame.hand.as_ref(), &self.track);
        self.track = next;
        let smoothed = self.smoother.apply(raw);
        self.slot.send_replace(smoothed);
        Some(smoothed)
    }

    pub fn track_state(&self) -> &TrackState {
        &self.track
    }
}

// ===========================================================================
// Render tick
// ===========================================================================

pub struct RenderTick {
    mapper: CameraMapper,
    controls: OrbitControls,
    slot: GestureReceiver,
}

impl RenderTick {
    pub fn new(config: &CameraConfig, slot: GestureReceiver) -> Self {
        Self {
            mapper: CameraMapper::from_config(config),
            controls: OrbitControls::from_config(config),
            slot,
        }
    }

    /// 最新サンプルを適用し、オービットを `dt` 秒進める
    pub fn tick(&mut self, dt: f32) -> GestureSample {
        let sample = *self.slot.borrow_and_update();
        self.mapper.apply(&sample, &mut self.controls);
        self.controls.update(dt);
        sample
    }

    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    pub fn snapshot(&self, mode: GestureMode) -> CameraSnapshot {
        CameraSnapshot::capture(&self.controls, mode)
    }
}

/// 描画 → 送信キューの深さ
const OUT_QUEUE: usize = 4;

async fn render_loop(
    mut render: RenderTick,
    fps: u32,
    publish_camera: bool,
    out_tx: mpsc::Sender<ServerMessage>,
) {
    let period = Duration::from_secs_f64(1.0 / fps.max(1) as f64);
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut last_tick = Instant::now();
    let mut last_mode = GestureMode::None;
    let mut frame_count = 0u32;
    let mut fps_timer = Instant::now();

    loop {
        interval.tick().await;
        let now = Instant::now();
        let dt = now.duration_since(last_tick).as_secs_f32();
        last_tick = now;

        let sample = render.tick(dt);

        // モード変化は送れるまで毎ティック再送。未送信の間はスナップショットで枠を埋めない
        let mut gesture_pending = false;
        if sample.mode != last_mode {
            match out_tx.try_send(ServerMessage::Gesture(sample)) {
                Ok(()) => {
                    debug!("gesture: {}", sample.mode.status_text());
                    last_mode = sample.mode;
                }
                Err(mpsc::error::TrySendError::Full(_)) => gesture_pending = true,
                Err(mpsc::error::TrySendError::Closed(_)) => return,
            }
        }
        // スナップショットは取りこぼしてよい (次ティックがより新しい)
        if publish_camera && !gesture_pending {
            let _ = out_tx.try_send(ServerMessage::Camera(render.snapshot(sample.mode)));
        }

        frame_count += 1;
        let elapsed = fps_timer.elapsed().as_secs_f32();
        if elapsed >= 1.0 {
            let t = render.controls().transform();
            info!(
                "FPS: {:.1} | {} | azimuth {:.3} polar {:.3} distance {:.2}{}",
                frame_count as f32 / elapsed,
                sample.mode.status_text(),
                t.azimuth,
                t.polar,
                t.distance,
                if render.controls().auto_rotate() { " [AUTO]" } else { "" }
            );
            frame_count = 0;
            fps_timer = Instant::now();
        }
    }
}

/// drop 時にタスクを中断 (セッション future のキャンセル時も含む)
struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

// ===========================================================================
// Session
// ===========================================================================

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    pub frames: u64,
    pub duplicate_frames: u64,
    pub malformed_frames: u64,
}

/// 検出器1接続分のセッション。切断か終了エラーまで回す
///
/// 追跡・平滑化・カメラの状態は「手なし」から始まり、セッションと共に破棄される
pub async fn run_session(stream: TcpStream, config: &Config) -> Result<SessionSummary, SessionError> {
    let framed = protocol::message_stream(stream);
    let (mut sink, mut reader) = framed.split();

    protocol::send_to_sink(&mut sink, &ServerMessage::Configure { num_hands: 1 }).await?;

    let (slot_tx, slot_rx) = gesture_slot();
    let mut inference = InferenceTick::new(config, slot_tx);
    let render = RenderTick::new(&config.camera, slot_rx);

    let (out_tx, mut out_rx) = mpsc::channel::<ServerMessage>(OUT_QUEUE);
    let _render_task = AbortOnDrop(tokio::spawn(render_loop(
        render,
        config.server.render_fps,
        config.server.publish_camera,
        out_tx,
    )));

    let mut summary = SessionSummary::default();
    loop {
        tokio::select! {
            next = reader.next() => {
                let bytes = match next {
                    Some(Ok(b)) => b,
                    Some(Err(e)) => return Err(SessionError::Transport(e.into())),
                    None => break,
                };
                let msg: DetectorMessage = match protocol::decode(&bytes) {
                    Ok(m) => m,
                    Err(e) => {
                        warn!("dropping undecodable detector message: {:#}", e);
                        continue;
                    }
                };
                match msg {
                    DetectorMessage::Ready => info!("detector ready"),
                    DetectorMessage::InitFailed { reason } => {
                        return Err(SessionError::DetectorInit(reason));
                    }
                    DetectorMessage::CaptureDenied { reason } => {
                        return Err(SessionError::CapturePermission(reason));
                    }
                    DetectorMessage::Landmarks { timestamp_ms, hands } => {
                        let frame = LandmarkFrame::from_raw(timestamp_ms, &hands);
                        if inference.process(&frame).is_none() {
                            summary.duplicate_frames += 1;
                            continue;
                        }
                        summary.frames += 1;
                        if frame.hand.is_none() && !hands.is_empty() {
                            debug!(
                                "malformed hand ({} points, expected {}), treating as no hand",
                                hands[0].len(),
                                HandLandmarkIndex::COUNT
                            );
                            summary.malformed_frames += 1;
                        }
                    }
                }
            }
            Some(out) = out_rx.recv() => {
                protocol::send_to_sink(&mut sink, &out).await?;
            }
        }
    }

    Ok(summary)
}
