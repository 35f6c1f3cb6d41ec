use crate::config::SmoothConfig;
use crate::gesture::classifier::GestureSample;

/// 回転デルタ用の1次IIRローパスフィルタ
///
/// delta_x / delta_y: 前回出力とのEMA (係数0.5なら単純平均)
/// zoom_factor / mode / is_hand_detected: そのまま通す (ズームは即応させる)
///
/// 初回は前回出力を 0 とみなすので、最初の出力は生の値の半分になる。
pub struct DeltaSmoother {
    alpha: f32,
    prev_delta: [f32; 2],
}

impl DeltaSmoother {
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha,
            prev_delta: [0.0, 0.0],
        }
    }

    pub fn from_config(config: &SmoothConfig) -> Self {
        Self::new(config.delta)
    }

    pub fn apply(&mut self, sample: GestureSample) -> GestureSample {
        let a = self.alpha;
        let delta_x = a * sample.delta_x + (1.0 - a) * self.prev_delta[0];
        let delta_y = a * sample.delta_y + (1.0 - a) * self.prev_delta[1];
        self.prev_delta = [delta_x, delta_y];

        GestureSample {
            delta_x,
            delta_y,
            ..sample
        }
    }

    /// 前回出力を 0 に戻す (セッション開始時のみ。手の消失では呼ばない)
    pub fn reset(&mut self) {
        self.prev_delta = [0.0, 0.0];
    }
}
