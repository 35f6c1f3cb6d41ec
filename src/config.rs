use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub gesture: GestureConfig,
    #[serde(default)]
    pub smooth: SmoothConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// ジェスチャー判定の閾値 (正規化座標)
#[derive(Debug, Deserialize, Clone)]
pub struct GestureConfig {
    /// 親指先端と人差し指先端の距離がこれ未満ならピンチ
    #[serde(default = "default_pinch_threshold")]
    pub pinch_threshold: f32,
    /// 4本の指先すべてが手首からこの半径内なら握りこぶし
    #[serde(default = "default_fist_radius")]
    pub fist_radius: f32,
    /// ピンチ中の手首の縦移動 → ズーム量の倍率
    #[serde(default = "default_zoom_gain")]
    pub zoom_gain: f32,
}

fn default_pinch_threshold() -> f32 { 0.05 }
fn default_fist_radius() -> f32 { 0.2 }
fn default_zoom_gain() -> f32 { 2.0 }

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            pinch_threshold: default_pinch_threshold(),
            fist_radius: default_fist_radius(),
            zoom_gain: default_zoom_gain(),
        }
    }
}

/// 回転デルタの平滑化係数
#[derive(Debug, Deserialize, Clone)]
pub struct SmoothConfig {
    /// 新しい値の重み (0.5 = 前回値との平均)
    #[serde(default = "default_smooth_delta")]
    pub delta: f32,
}

fn default_smooth_delta() -> f32 { 0.5 }

impl Default for SmoothConfig {
    fn default() -> Self {
        Self { delta: default_smooth_delta() }
    }
}

/// カメラ操作の感度と制限
#[derive(Debug, Deserialize, Clone)]
pub struct CameraConfig {
    #[serde(default = "default_rotate_sensitivity")]
    pub rotate_sensitivity: f32,
    /// 正規化座標のデルタを角度 (rad) に落とすスケール
    #[serde(default = "default_rotate_scale")]
    pub rotate_scale: f32,
    #[serde(default = "default_zoom_sensitivity")]
    pub zoom_sensitivity: f32,
    /// この距離以下では寄る方向のズームを止める
    #[serde(default = "default_inner_guard")]
    pub inner_guard: f32,
    /// この距離以上では引く方向のズームを止める
    #[serde(default = "default_outer_guard")]
    pub outer_guard: f32,
    #[serde(default = "default_min_distance")]
    pub min_distance: f32,
    #[serde(default = "default_max_distance")]
    pub max_distance: f32,
    #[serde(default)]
    pub min_polar_angle: f32,
    #[serde(default = "default_max_polar_angle")]
    pub max_polar_angle: f32,
    /// 自動周回速度 (2.0 で 60fps 時 30秒/周)
    #[serde(default = "default_auto_rotate_speed")]
    pub auto_rotate_speed: f32,
    #[serde(default = "default_enable_damping")]
    pub enable_damping: bool,
    #[serde(default = "default_damping_factor")]
    pub damping_factor: f32,
    /// 初期カメラ位置 (注視点は原点)
    #[serde(default = "default_initial_position")]
    pub initial_position: [f32; 3],
}

fn default_rotate_sensitivity() -> f32 { 2.5 }
fn default_rotate_scale() -> f32 { 0.001 }
fn default_zoom_sensitivity() -> f32 { 0.02 }
fn default_inner_guard() -> f32 { 5.0 }
fn default_outer_guard() -> f32 { 25.0 }
fn default_min_distance() -> f32 { 4.0 }
fn default_max_distance() -> f32 { 30.0 }
fn default_max_polar_angle() -> f32 { std::f32::consts::PI }
fn default_auto_rotate_speed() -> f32 { 0.5 }
fn default_enable_damping() -> bool { true }
fn default_damping_factor() -> f32 { 0.1 }
fn default_initial_position() -> [f32; 3] { [10.0, 6.0, 10.0] }

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            rotate_sensitivity: default_rotate_sensitivity(),
            rotate_scale: default_rotate_scale(),
            zoom_sensitivity: default_zoom_sensitivity(),
            inner_guard: default_inner_guard(),
            outer_guard: default_outer_guard(),
            min_distance: default_min_distance(),
            max_distance: default_max_distance(),
            min_polar_angle: 0.0,
            max_polar_angle: default_max_polar_angle(),
            auto_rotate_speed: default_auto_rotate_speed(),
            enable_damping: default_enable_damping(),
            damping_factor: default_damping_factor(),
            initial_position: default_initial_position(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// 検出器プロセスからの接続を待つアドレス
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    #[serde(default = "default_render_fps")]
    pub render_fps: u32,
    /// 描画ティックごとにカメラ状態をクライアントへ送るか
    #[serde(default = "default_publish_camera")]
    pub publish_camera: bool,
}

fn default_listen_addr() -> String { "127.0.0.1:39600".to_string() }
fn default_render_fps() -> u32 { 60 }
fn default_publish_camera() -> bool { true }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            render_fps: default_render_fps(),
            publish_camera: default_publish_camera(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// 読めなければデフォルト設定で続行
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path.as_ref()) {
            Ok(config) => config,
            Err(e) => {
                warn!("config {} not loaded ({:#}), using defaults", path.as_ref().display(), e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.gesture.pinch_threshold, 0.05);
        assert_eq!(config.gesture.fist_radius, 0.2);
        assert_eq!(config.smooth.delta, 0.5);
        assert_eq!(config.camera.min_distance, 4.0);
        assert_eq!(config.camera.max_distance, 30.0);
        assert_eq!(config.camera.initial_position, [10.0, 6.0, 10.0]);
        assert_eq!(config.server.render_fps, 60);
    }

    #[test]
    fn test_partial_table_override() {
        let config = Config::parse(
            r#"
            [gesture]
            pinch_threshold = 0.04

            [camera]
            outer_guard = 20.0
            "#,
        )
        .unwrap();
        assert_eq!(config.gesture.pinch_threshold, 0.04);
        assert_eq!(config.gesture.fist_radius, 0.2);
        assert_eq!(config.camera.outer_guard, 20.0);
        assert_eq!(config.camera.inner_guard, 5.0);
    }

    #[test]
    fn test_invalid_toml_is_error() {
        assert!(Config::parse("[gesture\npinch_threshold = ").is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = Config::load_or_default("does/not/exist.toml");
        assert_eq!(config.server.listen_addr, "127.0.0.1:39600");
    }
}
