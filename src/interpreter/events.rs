//! 批处理过程事件：用于向上层展示每个 token 的处理情况

use serde::Serialize;

use crate::core::SkipReason;

/// 单步过程事件（可序列化为 JSON）
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionEvent {
    /// 开始处理第 index 个 token
    TokenReceived { index: usize, token: String },
    /// 指令已下发（blocking 时表示已完成）
    Dispatched { name: String, blocking: bool },
    /// 被屏蔽的指令族
    Ignored { token: String },
    /// 可恢复错误，跳过该 token
    Skipped {
        token: String,
        reason: SkipReason,
        detail: String,
    },
    /// 致命错误，整批终止
    Aborted { token: String, error: String },
    /// 收尾复位升降臂
    ResetIssued { height: f64, completed: bool },
    BatchComplete {
        dispatched: usize,
        ignored: usize,
        skipped: usize,
    },
}
