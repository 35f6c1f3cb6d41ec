//! フレーム単位の手形状分類と動きの積分
//!
//! 分類器自体は状態を持たない。フレーム間の記憶は呼び出し側が受け渡す
//! [`TrackState`] だけ。

use serde::{Deserialize, Serialize};

use crate::config::GestureConfig;
use crate::hand::{Hand, HandLandmarkIndex};

/// ジェスチャーモード (1フレームにつき1つ)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GestureMode {
    /// 手なし
    #[default]
    None,
    /// 手はあるが認識できる形ではない
    Idle,
    /// 握り拳
    Rotate,
    /// 親指と人差し指のピンチ
    Zoom,
}

impl GestureMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Idle => "idle",
            Self::Rotate => "rotate",
            Self::Zoom => "zoom",
        }
    }

    /// カメラプレビュー横の表示文言
    pub fn status_text(&self) -> &'static str {
        match self {
            Self::None => "NO HAND DETECTED",
            Self::Idle => "HAND DETECTED",
            Self::Rotate => "ROTATING (Fist + Move)",
            Self::Zoom => "ZOOMING (Pinch + Up/Down)",
        }
    }
}

/// 1フレーム分の分類結果
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GestureSample {
    pub mode: GestureMode,
    /// 手首の x 移動量 (正規化座標)。`Rotate` 以外では 0
    pub delta_x: f32,
    /// 手首の y 移動量 (正規化座標)。`Rotate` 以外では 0
    pub delta_y: f32,
    /// 正ならズームイン。`Zoom` 以外では 0
    pub zoom_factor: f32,
    pub is_hand_detected: bool,
}

impl GestureSample {
    pub fn no_hand() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2D {
    pub x: f32,
    pub y: f32,
}

impl Point2D {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// 手が映り続けている間だけ引き継ぐ記憶
///
/// 手を見失った時点で両方 `None` に戻る
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrackState {
    pub previous_hand_position: Option<Point2D>,
    /// ピンチ時に記録、それ以外のフレームでは前回値を引き継ぐ。
    /// ズーム量は手首の上下移動から求めるのでここは参照しない
    pub previous_pinch_distance: Option<f32>,
}

impl TrackState {
    pub fn is_empty(&self) -> bool {
        self.previous_hand_position.is_none() && self.previous_pinch_distance.is_none()
    }
}

/// 動きを見る前の、そのフレーム単体の手の形
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandPose {
    Pinch,
    Fist,
    Open,
}

impl HandPose {
    /// ピンチ判定が握り拳より優先。親指-人差し指の距離も返す
    pub fn detect(hand: &Hand, config: &GestureConfig) -> (Self, f32) {
        let pinch_distance = hand
            .get(HandLandmarkIndex::ThumbTip)
            .planar_distance(hand.get(HandLandmarkIndex::IndexTip));

        let wrist = hand.wrist();
        let is_fist = HandLandmarkIndex::FINGER_TIPS
            .iter()
            .all(|tip| hand.get(*tip).planar_distance(wrist) < config.fist_radius);

        let pose = if pinch_distance < config.pinch_threshold {
            Self::Pinch
        } else if is_fist {
            Self::Fist
        } else {
            Self::Open
        };
        (pose, pinch_distance)
    }
}

/// 手のランドマーク → ジェスチャーモードと生デルタ
#[derive(Debug, Clone)]
pub struct GestureClassifier {
    config: GestureConfig,
}

impl GestureClassifier {
    pub fn new(config: GestureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// 1フレーム分類。`hand = None` (不正なランドマークも含む) なら
    /// `GestureMode::None` と空の追跡状態を返す
    pub fn classify(&self, hand: Option<&Hand>, prior: &TrackState) -> (GestureSample, TrackState) {
        let hand = match hand {
            Some(h) => h,
            None => return (GestureSample::no_hand(), TrackState::default()),
        };

        let wrist = hand.wrist();
        let current = Point2D::new(wrist.x, wrist.y);
        let previous = prior.previous_hand_position;
        let (pose, pinch_distance) = HandPose::detect(hand, &self.config);

        let mut sample = GestureSample {
            is_hand_detected: true,
            ..GestureSample::default()
        };
        let mut next = TrackState {
            previous_hand_position: Some(current),
            previous_pinch_distance: prior.previous_pinch_distance,
        };

        match pose {
            HandPose::Pinch => {
                sample.mode = GestureMode::Zoom;
                if let Some(prev) = previous {
                    // 画像の y は下向き: 手を上げるとズームイン
                    sample.zoom_factor = (prev.y - current.y) * self.config.zoom_gain;
                }
                next.previous_pinch_distance = Some(pinch_distance);
            }
            HandPose::Fist => {
                sample.mode = GestureMode::Rotate;
                if let Some(prev) = previous {
                    sample.delta_x = current.x - prev.x;
                    sample.delta_y = current.y - prev.y;
                }
            }
            HandPose::Open => {
                sample.mode = GestureMode::Idle;
            }
        }

        (sample, next)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::hand::LandmarkPoint;

    fn approx_eq_f32(a: f32, b: f32, eps: f32) -> bool {
        (a - b).abs() < eps
    }

    fn hand_from(
        wrist: (f32, f32),
        thumb_tip: (f32, f32),
        index_tip: (f32, f32),
        other_tips: (f32, f32),
    ) -> Hand {
        // joints that the classifier never reads sit on the far tip position
        let mut landmarks =
            [LandmarkPoint::new(other_tips.0, other_tips.1, 0.0); HandLandmarkIndex::COUNT];
        landmarks[HandLandmarkIndex::Wrist as usize] = LandmarkPoint::new(wrist.0, wrist.1, 0.0);
        landmarks[HandLandmarkIndex::ThumbTip as usize] =
            LandmarkPoint::new(thumb_tip.0, thumb_tip.1, 0.0);
        landmarks[HandLandmarkIndex::IndexTip as usize] =
            LandmarkPoint::new(index_tip.0, index_tip.1, 0.0);
        Hand::new(landmarks)
    }

    /// Fingers curled to ~0.11 from the wrist, thumb/index 0.3 apart.
    pub(crate) fn fist_at(x: f32, y: f32) -> Hand {
        hand_from((x, y), (x - 0.25, y - 0.1), (x + 0.05, y - 0.1), (x + 0.05, y - 0.1))
    }

    /// Thumb/index 0.03 apart, other fingers extended.
    pub(crate) fn pinch_at(x: f32, y: f32) -> Hand {
        hand_from((x, y), (x + 0.1, y - 0.3), (x + 0.13, y - 0.3), (x, y - 0.4))
    }

    /// Fingers extended 0.4 from the wrist, no pinch.
    pub(crate) fn open_at(x: f32, y: f32) -> Hand {
        hand_from((x, y), (x - 0.2, y - 0.2), (x + 0.1, y - 0.4), (x, y - 0.4))
    }

    fn classifier() -> GestureClassifier {
        GestureClassifier::new(GestureConfig::default())
    }

    #[test]
    fn test_no_hand_resets_state() {
        let prior = TrackState {
            previous_hand_position: Some(Point2D::new(0.4, 0.4)),
            previous_pinch_distance: Some(0.02),
        };
        let (sample, next) = classifier().classify(None, &prior);
        assert_eq!(sample, GestureSample::no_hand());
        assert_eq!(sample.mode, GestureMode::None);
        assert!(!sample.is_hand_detected);
        assert!(next.is_empty());
    }

    #[test]
    fn test_fist_scenario_is_rotate() {
        let hand = fist_at(0.5, 0.5);
        let (pose, pinch) = HandPose::detect(&hand, &GestureConfig::default());
        assert_eq!(pose, HandPose::Fist);
        assert!(approx_eq_f32(pinch, 0.3, 1e-5));

        let (sample, _) = classifier().classify(Some(&hand), &TrackState::default());
        assert_eq!(sample.mode, GestureMode::Rotate);
        assert!(sample.is_hand_detected);
    }

    #[test]
    fn test_rotate_deltas_follow_wrist() {
        let c = classifier();
        let (first, state) = c.classify(Some(&fist_at(0.5, 0.5)), &TrackState::default());
        assert_eq!(first.delta_x, 0.0);
        assert_eq!(first.delta_y, 0.0);

        let (second, state) = c.classify(Some(&fist_at(0.6, 0.5)), &state);
        assert_eq!(second.mode, GestureMode::Rotate);
        assert!(approx_eq_f32(second.delta_x, 0.1, 1e-6));
        assert!(approx_eq_f32(second.delta_y, 0.0, 1e-6));
        assert_eq!(second.zoom_factor, 0.0);
        assert_eq!(state.previous_hand_position, Some(Point2D::new(0.6, 0.5)));
    }

    #[test]
    fn test_pinch_scenario_zoom_factor() {
        let c = classifier();
        let (first, state) = c.classify(Some(&pinch_at(0.5, 0.6)), &TrackState::default());
        assert_eq!(first.mode, GestureMode::Zoom);
        assert_eq!(first.zoom_factor, 0.0);

        let (second, state) = c.classify(Some(&pinch_at(0.5, 0.5)), &state);
        assert_eq!(second.mode, GestureMode::Zoom);
        assert!(approx_eq_f32(second.zoom_factor, 0.2, 1e-5));
        assert_eq!(second.delta_x, 0.0);
        assert_eq!(second.delta_y, 0.0);
        assert!(approx_eq_f32(state.previous_pinch_distance.unwrap(), 0.03, 1e-5));
    }

    #[test]
    fn test_zoom_uses_prior_position_from_any_mode() {
        let c = classifier();
        let (_, state) = c.classify(Some(&open_at(0.5, 0.7)), &TrackState::default());
        let (sample, _) = c.classify(Some(&pinch_at(0.5, 0.6)), &state);
        assert!(approx_eq_f32(sample.zoom_factor, 0.2, 1e-5));
    }

    #[test]
    fn test_moving_hand_down_zooms_out() {
        let c = classifier();
        let (_, state) = c.classify(Some(&pinch_at(0.5, 0.4)), &TrackState::default());
        let (sample, _) = c.classify(Some(&pinch_at(0.5, 0.5)), &state);
        assert!(sample.zoom_factor < 0.0);
    }

    #[test]
    fn test_pinch_wins_over_fist() {
        let hand = hand_from((0.5, 0.5), (0.52, 0.4), (0.53, 0.41), (0.55, 0.42));
        let (pose, _) = HandPose::detect(&hand, &GestureConfig::default());
        assert_eq!(pose, HandPose::Pinch);
        let (sample, _) = classifier().classify(Some(&hand), &TrackState::default());
        assert_eq!(sample.mode, GestureMode::Zoom);
    }

    #[test]
    fn test_partial_fist_is_idle() {
        let mut hand = fist_at(0.5, 0.5);
        hand.landmarks[HandLandmarkIndex::PinkyTip as usize] = LandmarkPoint::new(0.5, 0.1, 0.0);
        let (sample, _) = classifier().classify(Some(&hand), &TrackState::default());
        assert_eq!(sample.mode, GestureMode::Idle);
    }

    #[test]
    fn test_open_hand_is_idle_with_zero_deltas() {
        let c = classifier();
        let (_, state) = c.classify(Some(&open_at(0.3, 0.3)), &TrackState::default());
        let (sample, state) = c.classify(Some(&open_at(0.6, 0.7)), &state);
        assert_eq!(sample.mode, GestureMode::Idle);
        assert_eq!(sample.delta_x, 0.0);
        assert_eq!(sample.delta_y, 0.0);
        assert_eq!(sample.zoom_factor, 0.0);
        assert!(sample.is_hand_detected);
        // position is still tracked while idle
        assert_eq!(state.previous_hand_position, Some(Point2D::new(0.6, 0.7)));
    }

    #[test]
    fn test_reappearing_hand_starts_from_zero() {
        let c = classifier();
        let (_, state) = c.classify(Some(&fist_at(0.2, 0.2)), &TrackState::default());
        let (_, state) = c.classify(None, &state);
        let (sample, _) = c.classify(Some(&fist_at(0.8, 0.9)), &state);
        assert_eq!(sample.mode, GestureMode::Rotate);
        assert_eq!(sample.delta_x, 0.0);
        assert_eq!(sample.delta_y, 0.0);

        let (_, state) = c.classify(Some(&pinch_at(0.2, 0.2)), &TrackState::default());
        let (_, state) = c.classify(None, &state);
        let (sample, _) = c.classify(Some(&pinch_at(0.2, 0.9)), &state);
        assert_eq!(sample.zoom_factor, 0.0);
    }

    #[test]
    fn test_mode_independent_of_prior_state() {
        let c = classifier();
        let primed = TrackState {
            previous_hand_position: Some(Point2D::new(0.1, 0.9)),
            previous_pinch_distance: Some(0.01),
        };
        for hand in [fist_at(0.5, 0.5), pinch_at(0.5, 0.5), open_at(0.5, 0.5)] {
            let (a, _) = c.classify(Some(&hand), &TrackState::default());
            let (b, _) = c.classify(Some(&hand), &primed);
            assert_eq!(a.mode, b.mode);
        }
    }

    #[test]
    fn test_custom_threshold() {
        let c = GestureClassifier::new(GestureConfig {
            pinch_threshold: 0.01,
            ..GestureConfig::default()
        });
        let (sample, _) = c.classify(Some(&pinch_at(0.5, 0.5)), &TrackState::default());
        assert_eq!(sample.mode, GestureMode::Idle);
    }

    #[test]
    fn test_status_text() {
        assert_eq!(GestureMode::None.status_text(), "NO HAND DETECTED");
        assert_eq!(GestureMode::Rotate.status_text(), "ROTATING (Fist + Move)");
        assert_eq!(GestureMode::Zoom.as_str(), "zoom");
    }
}
