//! 核心层：错误类型、跳过原因与恢复策略

pub mod error;
pub mod recovery;

pub use error::{ActionError, RecoveryAction, SkipReason};
pub use recovery::RecoveryEngine;
