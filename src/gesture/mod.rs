pub mod classifier;
pub mod smooth;

pub use classifier::{
    GestureClassifier, GestureMode, GestureSample, HandPose, Point2D, TrackState,
};
pub use smooth::DeltaSmoother;
