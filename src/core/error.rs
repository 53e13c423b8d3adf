//! 动作执行错误类型与恢复动作
//!
//! 与 RecoveryEngine 配合：根据 ActionError 决定跳过当前 token 还是终止整批指令。

use thiserror::Error;

use crate::effector::EffectorError;

/// 解释与执行动作指令时可能出现的错误
#[derive(Error, Debug)]
pub enum ActionError {
    /// 通用回退在所有前缀长度上都找不到能力名（致命）
    #[error("Unknown capability: {0}")]
    UnknownCapability(String),

    #[error("Face asset not found: {0}")]
    AssetMissing(String),

    #[error("Device busy: {0}")]
    DeviceBusy(String),

    #[error("Malformed token '{token}': {reason}")]
    MalformedToken { token: String, reason: String },

    #[error("Image error: {0}")]
    Image(String),

    #[error("Action timeout: {0}")]
    ActionTimeout(String),

    #[error("Action failed: {0}")]
    ActionFailed(String),
}

impl ActionError {
    pub fn malformed(token: &str, reason: impl Into<String>) -> Self {
        Self::MalformedToken {
            token: token.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<EffectorError> for ActionError {
    fn from(err: EffectorError) -> Self {
        match err {
            EffectorError::Busy(msg) => ActionError::DeviceBusy(msg),
            EffectorError::UnknownCapability(name) => ActionError::UnknownCapability(name),
            EffectorError::Failed(msg) => ActionError::ActionFailed(msg),
            EffectorError::Disconnected => ActionError::ActionFailed("effector disconnected".to_string()),
        }
    }
}

impl From<image::ImageError> for ActionError {
    fn from(err: image::ImageError) -> Self {
        ActionError::Image(err.to_string())
    }
}

/// 可恢复错误对应的跳过原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingAsset,
    DeviceBusy,
    MalformedArguments,
    ActionFailed,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::MissingAsset => write!(f, "missing_asset"),
            SkipReason::DeviceBusy => write!(f, "device_busy"),
            SkipReason::MalformedArguments => write!(f, "malformed_arguments"),
            SkipReason::ActionFailed => write!(f, "action_failed"),
        }
    }
}

/// 恢复引擎根据错误类型给出的建议动作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryAction {
    /// 记录诊断后跳过当前 token，继续处理后续 token
    SkipToken(SkipReason),
    /// 终止当前指令串（后续 token 与收尾复位都不再执行）
    AbortBatch,
}
