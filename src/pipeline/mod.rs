//! 流水线接口：信息单元、更新消息与动作执行模块

pub mod module;
pub mod unit;

pub use module::{AbortedUnit, ActionExecutionModule, ProcessedUpdate, COMPLETION_MARKER};
pub use unit::{InformationUnit, UpdateMessage, UpdateType};
