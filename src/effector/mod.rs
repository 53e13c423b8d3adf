//! 执行器层：能力表、执行器 trait、表情资源与模拟机器人

pub mod faces;
pub mod registry;
pub mod simulated;
pub mod traits;

pub use faces::{FaceImage, FaceLibrary};
pub use registry::{Capability, CapabilitySet};
pub use simulated::{EffectorCall, SimulatedRobot};
pub use traits::{ActionCompleter, ActionHandle, ArgValue, Effector, EffectorError};
