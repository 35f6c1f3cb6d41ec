//! TCP protocol for detector ↔ gesture-core communication.
//!
//! The detector process owns the camera and the hand landmark model; it pushes
//! landmark frames here and receives camera snapshots back for rendering.

use bytes::{Bytes, BytesMut};
use futures::{Sink, SinkExt, StreamExt};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

use crate::camera::OrbitControls;
use crate::gesture::{GestureMode, GestureSample};

// --- Message types ---

/// Detector → core
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum DetectorMessage {
    /// Model loaded and capture running.
    Ready,
    /// The landmark model could not be created.
    InitFailed { reason: String },
    /// Camera permission denied or no device.
    CaptureDenied { reason: String },
    /// One detector pass. `hands` is ordered by confidence; only the first is used.
    Landmarks { timestamp_ms: f64, hands: Vec<Vec<[f32; 3]>> },
}

/// Core → detector/renderer
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ServerMessage {
    /// Sent once on connect.
    Configure { num_hands: u8 },
    Camera(CameraSnapshot),
    /// Sent when the gesture mode changes.
    Gesture(GestureSample),
}

/// Camera state for the renderer, taken after a render tick.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct CameraSnapshot {
    pub azimuth: f32,
    pub polar: f32,
    pub distance: f32,
    pub position: [f32; 3],
    pub auto_rotate: bool,
    pub mode: GestureMode,
}

impl CameraSnapshot {
    pub fn capture(controls: &OrbitControls, mode: GestureMode) -> Self {
        let t = controls.transform();
        let p = controls.position();
        Self {
            azimuth: t.azimuth,
            polar: t.polar,
            distance: t.distance,
            position: [p.x, p.y, p.z],
            auto_rotate: controls.auto_rotate(),
            mode,
        }
    }
}

// --- TCP codec helpers ---

pub type MessageStream = Framed<TcpStream, LengthDelimitedCodec>;

/// Create a framed message stream with length-delimited framing.
pub fn message_stream(stream: TcpStream) -> MessageStream {
    let codec = LengthDelimitedCodec::builder()
        .max_frame_length(16 * 1024 * 1024) // 16MB
        .new_codec();
    Framed::new(stream, codec)
}

pub fn encode<T: Serialize>(msg: &T) -> anyhow::Result<Bytes> {
    Ok(Bytes::from(bincode::serialize(msg)?))
}

pub fn decode<T: DeserializeOwned>(bytes: &BytesMut) -> anyhow::Result<T> {
    Ok(bincode::deserialize(bytes)?)
}

/// Send a serializable message (bincode + length prefix).
pub async fn send_message<T: Serialize>(
    stream: &mut MessageStream,
    msg: &T,
) -> anyhow::Result<()> {
    stream.send(encode(msg)?).await?;
    Ok(())
}

/// Same as [`send_message`] for the write half of a split stream.
pub async fn send_to_sink<S, T>(sink: &mut S, msg: &T) -> anyhow::Result<()>
where
    S: Sink<Bytes, Error = std::io::Error> + Unpin,
    T: Serialize,
{
    sink.send(encode(msg)?).await?;
    Ok(())
}

/// Receive and deserialize a message.
pub async fn recv_message<T: DeserializeOwned>(
    stream: &mut MessageStream,
) -> anyhow::Result<T> {
    match stream.next().await {
        Some(Ok(bytes)) => decode(&bytes),
        Some(Err(e)) => Err(e.into()),
        None => Err(anyhow::anyhow!("connection closed")),
    }
}
