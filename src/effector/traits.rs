//! 执行器抽象
//!
//! 所有机器人后端实现 Effector：说话、显示表情、原地转向、设置升降臂高度，
//! 以及按能力名的通用调用 invoke。每次调用返回 ActionHandle，调用方决定是否等待完成。

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::oneshot;

use crate::effector::faces::FaceImage;
use crate::effector::CapabilitySet;

/// 执行器侧错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EffectorError {
    #[error("Effector busy: {0}")]
    Busy(String),

    #[error("Unknown capability: {0}")]
    UnknownCapability(String),

    #[error("Action failed: {0}")]
    Failed(String),

    #[error("Effector disconnected")]
    Disconnected,
}

/// 通用调用的参数值：整数、浮点或字符串
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ArgValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl ArgValue {
    /// 先尝试整数，再尝试浮点，都失败则保留字符串
    pub fn coerce(raw: &str) -> Self {
        if let Ok(i) = raw.parse::<i64>() {
            ArgValue::Int(i)
        } else if let Ok(f) = raw.parse::<f64>() {
            ArgValue::Float(f)
        } else {
            ArgValue::Text(raw.to_string())
        }
    }
}

impl std::fmt::Display for ArgValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArgValue::Int(i) => write!(f, "{}", i),
            ArgValue::Float(x) => write!(f, "{}", x),
            ArgValue::Text(s) => write!(f, "{:?}", s),
        }
    }
}

/// 已下发动作的句柄；丢弃句柄不会取消设备上的动作
#[derive(Debug)]
pub struct ActionHandle {
    action: String,
    done: Option<oneshot::Receiver<Result<(), EffectorError>>>,
}

/// 动作完成时由执行器一侧调用
#[derive(Debug)]
pub struct ActionCompleter {
    tx: oneshot::Sender<Result<(), EffectorError>>,
}

impl ActionCompleter {
    pub fn complete(self, result: Result<(), EffectorError>) {
        let _ = self.tx.send(result);
    }
}

impl ActionHandle {
    /// 已经完成的动作（如瞬时动作）
    pub fn completed(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            done: None,
        }
    }

    /// 尚在执行的动作：返回句柄与完成通知端
    pub fn pending(action: impl Into<String>) -> (Self, ActionCompleter) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                action: action.into(),
                done: Some(rx),
            },
            ActionCompleter { tx },
        )
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    /// 等待设备报告动作完成；完成端被丢弃视为断开
    pub async fn wait_for_completed(self) -> Result<(), EffectorError> {
        match self.done {
            None => Ok(()),
            Some(rx) => rx.await.unwrap_or(Err(EffectorError::Disconnected)),
        }
    }
}

/// 执行器 trait：能力表 + 五类调用；in_parallel 表示允许与后续动作并行执行
#[async_trait]
pub trait Effector: Send + Sync {
    /// 该执行器支持的能力表（构造解释器时注入，解释器不会修改）
    fn capabilities(&self) -> CapabilitySet;

    /// 表情屏原生尺寸 (宽, 高)
    fn face_dimensions(&self) -> (u32, u32);

    async fn say_text(&self, text: &str, in_parallel: bool) -> Result<ActionHandle, EffectorError>;

    async fn display_face_image(
        &self,
        image: &FaceImage,
        duration_ms: f64,
        in_parallel: bool,
    ) -> Result<ActionHandle, EffectorError>;

    async fn turn_in_place(
        &self,
        angle_deg: i64,
        accel: i64,
        in_parallel: bool,
    ) -> Result<ActionHandle, EffectorError>;

    /// duration 为 None 时由设备自行决定速度
    async fn set_lift_height(
        &self,
        height: f64,
        duration: Option<f64>,
        in_parallel: bool,
    ) -> Result<ActionHandle, EffectorError>;

    /// 按能力名调用，参数已完成类型转换
    async fn invoke(
        &self,
        name: &str,
        args: &[ArgValue],
        in_parallel: bool,
    ) -> Result<ActionHandle, EffectorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_int_float_text() {
        assert_eq!(ArgValue::coerce("30"), ArgValue::Int(30));
        assert_eq!(ArgValue::coerce("-10"), ArgValue::Int(-10));
        assert_eq!(ArgValue::coerce("0.5"), ArgValue::Float(0.5));
        assert_eq!(ArgValue::coerce("1e3"), ArgValue::Float(1000.0));
        assert_eq!(ArgValue::coerce("Happy"), ArgValue::Text("Happy".to_string()));
        assert_eq!(ArgValue::coerce(""), ArgValue::Text(String::new()));
    }

    #[tokio::test]
    async fn test_pending_handle_completes() {
        let (handle, completer) = ActionHandle::pending("say_text");
        assert_eq!(handle.action(), "say_text");
        completer.complete(Ok(()));
        assert_eq!(handle.wait_for_completed().await, Ok(()));
    }

    #[tokio::test]
    async fn test_dropped_completer_is_disconnect() {
        let (handle, completer) = ActionHandle::pending("turn_in_place");
        drop(completer);
        assert_eq!(
            handle.wait_for_completed().await,
            Err(EffectorError::Disconnected)
        );
    }
}
