pub mod mapper;
pub mod orbit;

pub use mapper::CameraMapper;
pub use orbit::{CameraTransform, OrbitControls, Spherical};
