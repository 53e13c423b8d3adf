//! 指令分发器
//!
//! 持有执行器与表情库，dispatch 把 ParsedCommand 映射到对应的执行器调用；
//! blocking 指令在超时内等待完成，超时转为 ActionTimeout。每次分发输出结构化审计日志（JSON）。

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::timeout;

use crate::core::ActionError;
use crate::effector::{ActionHandle, Effector, FaceLibrary};
use crate::interpreter::command::{CommandKind, ParsedCommand};

/// 分发器：对 blocking 指令施加等待超时，并将执行器错误映射为 ActionError
pub struct ActionExecutor {
    effector: Arc<dyn Effector>,
    faces: FaceLibrary,
    timeout: Duration,
}

impl ActionExecutor {
    pub fn new(effector: Arc<dyn Effector>, faces: FaceLibrary, timeout_secs: u64) -> Self {
        Self {
            effector,
            faces,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// 分发一条指令；Ok 表示已下发（blocking 时表示已完成）
    pub async fn dispatch(&self, command: &ParsedCommand) -> Result<(), ActionError> {
        let start = Instant::now();
        let result = self.dispatch_inner(command).await;

        let outcome = match &result {
            Ok(()) => "dispatched",
            Err(ActionError::ActionTimeout(_)) => "timeout",
            Err(ActionError::UnknownCapability(_)) => "fatal",
            Err(_) => "error",
        };
        let audit = serde_json::json!({
            "event": "action_audit",
            "name": command.name(),
            "kind": command.kind.label(),
            "blocking": command.blocking,
            "parallel": command.parallel,
            "outcome": outcome,
            "duration_ms": start.elapsed().as_millis() as u64,
            "args": command.arguments(),
        });
        tracing::info!(audit = %audit, "action");

        result
    }

    async fn dispatch_inner(&self, command: &ParsedCommand) -> Result<(), ActionError> {
        let in_parallel = command.parallel;
        let handle = match &command.kind {
            CommandKind::Speech { text } => self.effector.say_text(text, in_parallel).await?,
            CommandKind::FaceDisplay { image, duration_ms } => {
                let face = self.faces.load(image, self.effector.face_dimensions())?;
                self.effector
                    .display_face_image(&face, *duration_ms, in_parallel)
                    .await?
            }
            CommandKind::Turn { angle_deg, accel } => {
                self.effector
                    .turn_in_place(*angle_deg, *accel, in_parallel)
                    .await?
            }
            CommandKind::LiftHeight { height, duration } => {
                self.effector
                    .set_lift_height(*height, Some(*duration), in_parallel)
                    .await?
            }
            CommandKind::Generic { name, args } => {
                self.effector.invoke(name, args, in_parallel).await?
            }
        };
        if command.blocking {
            self.await_completion(handle).await?;
        }
        Ok(())
    }

    /// 在超时内等待动作完成
    pub async fn await_completion(&self, handle: ActionHandle) -> Result<(), ActionError> {
        let action = handle.action().to_string();
        match timeout(self.timeout, handle.wait_for_completed()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(ActionError::ActionTimeout(format!(
                "{} did not complete within {}s",
                action,
                self.timeout.as_secs_f64()
            ))),
        }
    }

    /// 收尾复位：把升降臂放到基准高度并等待完成，避免挡住摄像头
    pub async fn reset_lift(&self, height: f64) -> Result<(), ActionError> {
        let handle = self.effector.set_lift_height(height, None, true).await?;
        self.await_completion(handle).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effector::{
        ActionHandle, ArgValue, CapabilitySet, EffectorCall, EffectorError, FaceImage,
        SimulatedRobot,
    };
    use async_trait::async_trait;

    fn executor(robot: Arc<SimulatedRobot>, faces_dir: &std::path::Path) -> ActionExecutor {
        ActionExecutor::new(robot, FaceLibrary::new(faces_dir, "png"), 5)
    }

    #[tokio::test]
    async fn test_missing_face_produces_no_call() {
        let tmp = tempfile::tempdir().unwrap();
        let robot = Arc::new(SimulatedRobot::new(0.0));
        let exec = executor(robot.clone(), tmp.path());
        let err = exec
            .dispatch(&ParsedCommand::face("Happy", 3000.0))
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::AssetMissing(_)));
        assert!(robot.journal().await.is_empty());
    }

    #[tokio::test]
    async fn test_lift_dispatch_uses_floats() {
        let tmp = tempfile::tempdir().unwrap();
        let robot = Arc::new(SimulatedRobot::new(0.0));
        let exec = executor(robot.clone(), tmp.path());
        exec.dispatch(&ParsedCommand::lift(50.0, 2.0)).await.unwrap();
        assert_eq!(
            robot.journal().await,
            vec![EffectorCall::SetLiftHeight {
                height: 50.0,
                duration: Some(2.0),
                in_parallel: true
            }]
        );
    }

    #[tokio::test]
    async fn test_generic_dispatch() {
        let tmp = tempfile::tempdir().unwrap();
        let robot = Arc::new(SimulatedRobot::new(0.0));
        let exec = executor(robot.clone(), tmp.path());
        exec.dispatch(&ParsedCommand::generic("set_volume", vec![ArgValue::Int(30)]))
            .await
            .unwrap();
        assert_eq!(
            robot.journal().await,
            vec![EffectorCall::Invoke {
                name: "set_volume".to_string(),
                args: vec![ArgValue::Int(30)],
                in_parallel: false
            }]
        );
    }

    /// 动作永远不完成的执行器，用于验证等待超时；lift_stuck 控制升降臂是否也卡住
    struct StuckEffector {
        lift_stuck: bool,
    }

    fn never_completes(action: &str) -> ActionHandle {
        let (handle, completer) = ActionHandle::pending(action);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(60)).await;
            completer.complete(Ok(()));
        });
        handle
    }

    #[async_trait]
    impl Effector for StuckEffector {
        fn capabilities(&self) -> CapabilitySet {
            CapabilitySet::new().with("say_text", Some(1), "")
        }

        fn face_dimensions(&self) -> (u32, u32) {
            (8, 8)
        }

        async fn say_text(&self, _text: &str, _p: bool) -> Result<ActionHandle, EffectorError> {
            Ok(never_completes("say_text"))
        }

        async fn display_face_image(
            &self,
            _image: &FaceImage,
            _ms: f64,
            _p: bool,
        ) -> Result<ActionHandle, EffectorError> {
            Err(EffectorError::Busy("stuck".to_string()))
        }

        async fn turn_in_place(&self, _a: i64, _b: i64, _p: bool) -> Result<ActionHandle, EffectorError> {
            Err(EffectorError::Failed("stuck".to_string()))
        }

        async fn set_lift_height(
            &self,
            _h: f64,
            _d: Option<f64>,
            _p: bool,
        ) -> Result<ActionHandle, EffectorError> {
            if self.lift_stuck {
                return Ok(never_completes("set_lift_height"));
            }
            Ok(ActionHandle::completed("set_lift_height"))
        }

        async fn invoke(&self, name: &str, _a: &[ArgValue], _p: bool) -> Result<ActionHandle, EffectorError> {
            Err(EffectorError::UnknownCapability(name.to_string()))
        }
    }

    #[tokio::test]
    async fn test_blocking_timeout() {
        let tmp = tempfile::tempdir().unwrap();
        let stuck = StuckEffector { lift_stuck: false };
        let exec = ActionExecutor::new(Arc::new(stuck), FaceLibrary::new(tmp.path(), "png"), 5)
            .with_timeout(Duration::from_millis(20));
        let err = exec.dispatch(&ParsedCommand::speech("Hi")).await.unwrap_err();
        assert!(matches!(err, ActionError::ActionTimeout(_)));
    }

    #[tokio::test]
    async fn test_lift_waits_for_completion() {
        let tmp = tempfile::tempdir().unwrap();
        let stuck = StuckEffector { lift_stuck: true };
        let exec = ActionExecutor::new(Arc::new(stuck), FaceLibrary::new(tmp.path(), "png"), 5)
            .with_timeout(Duration::from_millis(20));
        let err = exec
            .dispatch(&ParsedCommand::lift(0.5, 1.0))
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::ActionTimeout(ref m) if m.contains("set_lift_height")));
        let err = exec.reset_lift(0.0).await.unwrap_err();
        assert!(matches!(err, ActionError::ActionTimeout(_)));
    }

    #[tokio::test]
    async fn test_effector_errors_map() {
        let tmp = tempfile::tempdir().unwrap();
        let stuck = StuckEffector { lift_stuck: false };
        let exec = ActionExecutor::new(Arc::new(stuck), FaceLibrary::new(tmp.path(), "png"), 5);
        let err = exec.dispatch(&ParsedCommand::turn(90, 1)).await.unwrap_err();
        assert!(matches!(err, ActionError::ActionFailed(_)));
        exec.reset_lift(0.0).await.unwrap();
    }
}
