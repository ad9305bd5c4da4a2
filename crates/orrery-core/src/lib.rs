pub mod constants;
pub mod coordinates;
pub mod frame;


pub use coordinates::{CartesianPosition, LocalPosition};
pub use frame::{FrameRotation, RotationAngles};
