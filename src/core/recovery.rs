//! 错误恢复引擎
//!
//! 根据 ActionError 类型返回 RecoveryAction，供批处理循环决定是跳过当前 token 还是终止整批。
//! 「已知指令形状但资源暂不可用」可恢复；「完全不认识的指令」致命。

use crate::core::{ActionError, RecoveryAction, SkipReason};

/// 将错误映射为可执行动作（跳过 / 终止）
#[derive(Debug, Default)]
pub struct RecoveryEngine;

impl RecoveryEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, err: &ActionError) -> RecoveryAction {
        match err {
            ActionError::UnknownCapability(_) => RecoveryAction::AbortBatch,
            ActionError::AssetMissing(_) => RecoveryAction::SkipToken(SkipReason::MissingAsset),
            ActionError::DeviceBusy(_) => RecoveryAction::SkipToken(SkipReason::DeviceBusy),
            ActionError::MalformedToken { .. } => {
                RecoveryAction::SkipToken(SkipReason::MalformedArguments)
            }
            ActionError::Image(_) => RecoveryAction::SkipToken(SkipReason::MissingAsset),
            ActionError::ActionTimeout(_) | ActionError::ActionFailed(_) => {
                RecoveryAction::SkipToken(SkipReason::ActionFailed)
            }
        }
    }
}
