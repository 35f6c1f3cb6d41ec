use crate::camera::orbit::OrbitControls;
use crate::config::CameraConfig;
use crate::gesture::{GestureMode, GestureSample};

/// 平滑化済みジェスチャー → オービットカメラ操作
///
/// - Rotate: 方位角/極角をデルタ分だけ逆方向へ (掴んで回す感覚)
/// - Zoom: 視線方向に沿って前後移動 (ガード帯つき)
/// - None: 自動周回
/// - Idle: 何もしない (自動周回も止める)
#[derive(Debug, Clone)]
pub struct CameraMapper {
    rotate_sensitivity: f32,
    rotate_scale: f32,
    zoom_sensitivity: f32,
    inner_guard: f32,
    outer_guard: f32,
}

impl CameraMapper {
    pub fn from_config(config: &CameraConfig) -> Self {
        Self {
            rotate_sensitivity: config.rotate_sensitivity,
            rotate_scale: config.rotate_scale,
            zoom_sensitivity: config.zoom_sensitivity,
            inner_guard: config.inner_guard,
            outer_guard: config.outer_guard,
        }
    }

    pub fn apply(&self, sample: &GestureSample, controls: &mut OrbitControls) {
        controls.set_auto_rotate(sample.mode == GestureMode::None);

        match sample.mode {
            GestureMode::Rotate => self.rotate(sample, controls),
            GestureMode::Zoom => self.zoom(sample.zoom_factor, controls),
            GestureMode::None | GestureMode::Idle => {}
        }
    }

    fn rotate(&self, sample: &GestureSample, controls: &mut OrbitControls) {
        let gain = self.rotate_sensitivity * self.rotate_scale;
        // 極角は OrbitControls 側でクランプされる
        controls.set_azimuth_angle(controls.azimuth_angle() - sample.delta_x * gain);
        controls.set_polar_angle(controls.polar_angle() - sample.delta_y * gain);
    }

    fn zoom(&self, zoom_factor: f32, controls: &mut OrbitControls) {
        if zoom_factor == 0.0 {
            return;
        }
        let distance = controls.distance();
        let moving_in = zoom_factor > 0.0;
        let moving_out = !moving_in;

        // ガードは方向ごとに判定: 境界上でも安全側には動ける
        let inward_ok = distance > self.inner_guard || !moving_in;
        let outward_ok = distance < self.outer_guard || !moving_out;
        if !(inward_ok && outward_ok) {
            return;
        }

        let step = zoom_factor * self.zoom_sensitivity;
        let next = if moving_in {
            (distance - step).max(controls.min_distance())
        } else {
            (distance - step).min(self.outer_guard)
        };

        let direction = controls.view_direction();
        controls.translate(direction * (distance - next));
    }
}
