use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

use crate::config::CameraConfig;

/// 極でのビュー反転を防ぐための余白
const POLE_EPS: f32 = 1e-6;

/// 注視点まわりの球座標
///
/// theta: +Z 軸から +X 方向への方位角、phi: +Y 軸からの極角
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spherical {
    pub radius: f32,
    pub theta: f32,
    pub phi: f32,
}

impl Spherical {
    pub fn from_offset(offset: &Vector3<f32>) -> Self {
        let radius = offset.norm();
        if radius == 0.0 {
            return Self { radius, theta: 0.0, phi: 0.0 };
        }
        Self {
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    pub fn to_offset(&self) -> Vector3<f32> {
        let ring = self.radius * self.phi.sin();
        Vector3::new(
            ring * self.theta.sin(),
            self.radius * self.phi.cos(),
            ring * self.theta.cos(),
        )
    }
}

/// カメラの現在姿勢 (方位角・極角・距離)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraTransform {
    pub azimuth: f32,
    pub polar: f32,
    pub distance: f32,
}

/// 原点を注視するオービットカメラ操作面
///
/// 距離と極角のハード制限、自動周回、減衰はここで保証する。
/// ジェスチャー側は角度と位置を直接書き換え、毎ティック `update` を呼ぶ。
#[derive(Debug, Clone)]
pub struct OrbitControls {
    position: Vector3<f32>,
    target: Vector3<f32>,
    min_distance: f32,
    max_distance: f32,
    min_polar_angle: f32,
    max_polar_angle: f32,
    auto_rotate: bool,
    auto_rotate_speed: f32,
    damping_factor: Option<f32>,
    /// 減衰中の角度変化 (theta, phi)
    spherical_delta: [f32; 2],
}

impl OrbitControls {
    pub fn new(position: Vector3<f32>) -> Self {
        Self::from_config(&CameraConfig {
            initial_position: [position.x, position.y, position.z],
            ..CameraConfig::default()
        })
    }

    pub fn from_config(config: &CameraConfig) -> Self {
        let [x, y, z] = config.initial_position;
        Self {
            position: Vector3::new(x, y, z),
            target: Vector3::zeros(),
            min_distance: config.min_distance,
            max_distance: config.max_distance,
            min_polar_angle: config.min_polar_angle,
            max_polar_angle: config.max_polar_angle,
            auto_rotate: false,
            auto_rotate_speed: config.auto_rotate_speed,
            damping_factor: config.enable_damping.then_some(config.damping_factor),
            spherical_delta: [0.0, 0.0],
        }
    }

    pub fn position(&self) -> Vector3<f32> {
        self.position
    }

    pub fn target(&self) -> Vector3<f32> {
        self.target
    }

    pub fn spherical(&self) -> Spherical {
        Spherical::from_offset(&(self.position - self.target))
    }

    pub fn transform(&self) -> CameraTransform {
        let s = self.spherical();
        CameraTransform {
            azimuth: s.theta,
            polar: s.phi,
            distance: s.radius,
        }
    }

    pub fn azimuth_angle(&self) -> f32 {
        self.spherical().theta
    }

    pub fn polar_angle(&self) -> f32 {
        self.spherical().phi
    }

    pub fn distance(&self) -> f32 {
        (self.position - self.target).norm()
    }

    pub fn min_distance(&self) -> f32 {
        self.min_distance
    }

    pub fn max_distance(&self) -> f32 {
        self.max_distance
    }

    pub fn set_azimuth_angle(&mut self, angle: f32) {
        let mut s = self.spherical();
        s.theta = angle;
        self.position = self.target + s.to_offset();
    }

    /// 極をまたがないよう即座にクランプする
    pub fn set_polar_angle(&mut self, angle: f32) {
        let mut s = self.spherical();
        s.phi = self.clamp_polar(angle);
        self.position = self.target + s.to_offset();
    }

    /// カメラから注視点への単位ベクトル (注視点と重なっていればゼロ)
    pub fn view_direction(&self) -> Vector3<f32> {
        (self.target - self.position)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::zeros)
    }

    pub fn translate(&mut self, offset: Vector3<f32>) {
        self.position += offset;
    }

    pub fn auto_rotate(&self) -> bool {
        self.auto_rotate
    }

    pub fn set_auto_rotate(&mut self, enabled: bool) {
        self.auto_rotate = enabled;
    }

    /// speed 2.0 で 60fps 時 30秒/周
    fn auto_rotation_angle(&self, dt: f32) -> f32 {
        2.0 * PI / 60.0 * self.auto_rotate_speed * dt
    }

    fn clamp_polar(&self, phi: f32) -> f32 {
        phi.clamp(self.min_polar_angle, self.max_polar_angle)
            .clamp(POLE_EPS, PI - POLE_EPS)
    }

    /// 1描画ティック分の更新: 自動周回・減衰・距離/極角の制限
    pub fn update(&mut self, dt: f32) {
        if self.auto_rotate {
            self.spherical_delta[0] -= self.auto_rotation_angle(dt);
        }

        let mut s = self.spherical();
        let step = self.damping_factor.unwrap_or(1.0);
        s.theta += self.spherical_delta[0] * step;
        s.phi += self.spherical_delta[1] * step;

        s.phi = self.clamp_polar(s.phi);
        s.radius = s.radius.clamp(self.min_distance, self.max_distance);
        self.position = self.target + s.to_offset();

        match self.damping_factor {
            Some(f) => {
                self.spherical_delta[0] *= 1.0 - f;
                self.spherical_delta[1] *= 1.0 - f;
            }
            None => self.spherical_delta = [0.0, 0.0],
        }
    }
}
