/// 手ランドマーク検出器の 21 点インデックス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum HandLandmarkIndex {
    Wrist = 0,
    ThumbCmc = 1,
    ThumbMcp = 2,
    ThumbIp = 3,
    ThumbTip = 4,
    IndexMcp = 5,
    IndexPip = 6,
    IndexDip = 7,
    IndexTip = 8,
    MiddleMcp = 9,
    MiddlePip = 10,
    MiddleDip = 11,
    MiddleTip = 12,
    RingMcp = 13,
    RingPip = 14,
    RingDip = 15,
    RingTip = 16,
    PinkyMcp = 17,
    PinkyPip = 18,
    PinkyDip = 19,
    PinkyTip = 20,
}

impl HandLandmarkIndex {
    pub const COUNT: usize = 21;

    /// 親指以外の指先
    pub const FINGER_TIPS: [HandLandmarkIndex; 4] = [
        Self::IndexTip,
        Self::MiddleTip,
        Self::RingTip,
        Self::PinkyTip,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Wrist),
            1 => Some(Self::ThumbCmc),
            2 => Some(Self::ThumbMcp),
            3 => Some(Self::ThumbIp),
            4 => Some(Self::ThumbTip),
            5 => Some(Self::IndexMcp),
            6 => Some(Self::IndexPip),
            7 => Some(Self::IndexDip),
            8 => Some(Self::IndexTip),
            9 => Some(Self::MiddleMcp),
            10 => Some(Self::MiddlePip),
            11 => Some(Self::MiddleDip),
            12 => Some(Self::MiddleTip),
            13 => Some(Self::RingMcp),
            14 => Some(Self::RingPip),
            15 => Some(Self::RingDip),
            16 => Some(Self::RingTip),
            17 => Some(Self::PinkyMcp),
            18 => Some(Self::PinkyPip),
            19 => Some(Self::PinkyDip),
            20 => Some(Self::PinkyTip),
            _ => None,
        }
    }
}

/// 単一ランドマーク
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LandmarkPoint {
    /// 正規化されたX座標 (0.0〜1.0, 左上原点)
    pub x: f32,
    /// 正規化されたY座標 (0.0〜1.0, 下向き正)
    pub y: f32,
    /// 相対深度 (ジェスチャー判定では未使用)
    pub z: f32,
}

impl LandmarkPoint {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// x-y 平面上の距離
    pub fn planar_distance(&self, other: &LandmarkPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// 21点からなる片手
#[derive(Debug, Clone, PartialEq)]
pub struct Hand {
    pub landmarks: [LandmarkPoint; HandLandmarkIndex::COUNT],
}

impl Hand {
    pub fn new(landmarks: [LandmarkPoint; HandLandmarkIndex::COUNT]) -> Self {
        Self { landmarks }
    }

    /// 検出器の生データ ([x, y, z] の列) から構築する。
    ///
    /// 21点に満たない、または非有限値を含む場合は None (手なし扱い)。
    /// 21点を超える分は無視する。
    pub fn from_points(points: &[[f32; 3]]) -> Option<Self> {
        if points.len() < HandLandmarkIndex::COUNT {
            return None;
        }
        let mut landmarks = [LandmarkPoint::default(); HandLandmarkIndex::COUNT];
        for (slot, [x, y, z]) in landmarks.iter_mut().zip(points.iter()) {
            *slot = LandmarkPoint::new(*x, *y, *z);
            if !slot.is_finite() {
                return None;
            }
        }
        Some(Self { landmarks })
    }

    pub fn get(&self, index: HandLandmarkIndex) -> &LandmarkPoint {
        &self.landmarks[index as usize]
    }

    pub fn wrist(&self) -> &LandmarkPoint {
        self.get(HandLandmarkIndex::Wrist)
    }
}

/// 検出器1回分の結果
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkFrame {
    /// キャプチャ時刻 (ms, 単調非減少)
    pub timestamp_ms: f64,
    pub hand: Option<Hand>,
}

impl LandmarkFrame {
    pub fn new(timestamp_ms: f64, hand: Option<Hand>) -> Self {
        Self { timestamp_ms, hand }
    }

    /// 複数手の生データから最も信頼度の高い1つ目だけを採用する
    pub fn from_raw(timestamp_ms: f64, hands: &[Vec<[f32; 3]>]) -> Self {
        let hand = hands.first().and_then(|points| Hand::from_points(points));
        Self { timestamp_ms, hand }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_points(n: usize) -> Vec<[f32; 3]> {
        (0..n).map(|i| [i as f32 * 0.01, 0.5, 0.0]).collect()
    }

    #[test]
    fn test_landmark_index_count() {
        assert_eq!(HandLandmarkIndex::COUNT, 21);
    }

    #[test]
    fn test_landmark_index_from_index() {
        assert_eq!(HandLandmarkIndex::from_index(0), Some(HandLandmarkIndex::Wrist));
        assert_eq!(HandLandmarkIndex::from_index(4), Some(HandLandmarkIndex::ThumbTip));
        assert_eq!(HandLandmarkIndex::from_index(20), Some(HandLandmarkIndex::PinkyTip));
        assert_eq!(HandLandmarkIndex::from_index(21), None);
    }

    #[test]
    fn test_tip_indices_match_detector_layout() {
        assert_eq!(HandLandmarkIndex::ThumbTip as usize, 4);
        let tips: Vec<usize> = HandLandmarkIndex::FINGER_TIPS.iter().map(|i| *i as usize).collect();
        assert_eq!(tips, vec![8, 12, 16, 20]);
    }

    #[test]
    fn test_planar_distance_ignores_z() {
        let a = LandmarkPoint::new(0.0, 0.0, 0.0);
        let b = LandmarkPoint::new(0.3, 0.4, 5.0);
        assert!((a.planar_distance(&b) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_from_points_short_set_is_none() {
        assert!(Hand::from_points(&flat_points(20)).is_none());
        assert!(Hand::from_points(&[]).is_none());
    }

    #[test]
    fn test_from_points_non_finite_is_none() {
        let mut points = flat_points(21);
        points[7][1] = f32::NAN;
        assert!(Hand::from_points(&points).is_none());
    }

    #[test]
    fn test_from_points_keeps_order() {
        let hand = Hand::from_points(&flat_points(25)).unwrap();
        assert!((hand.get(HandLandmarkIndex::IndexTip).x - 0.08).abs() < 1e-6);
        assert_eq!(hand.wrist().x, 0.0);
    }

    #[test]
    fn test_frame_from_raw_uses_first_hand() {
        let first = flat_points(21);
        let mut second = flat_points(21);
        second[0] = [0.9, 0.9, 0.0];
        let frame = LandmarkFrame::from_raw(16.0, &[first, second]);
        assert_eq!(frame.hand.unwrap().wrist().x, 0.0);
    }

    #[test]
    fn test_frame_from_raw_empty() {
        let frame = LandmarkFrame::from_raw(0.0, &[]);
        assert!(frame.hand.is_none());
    }
}
