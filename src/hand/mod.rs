pub mod landmark;

pub use landmark::{Hand, HandLandmarkIndex, LandmarkFrame, LandmarkPoint};
