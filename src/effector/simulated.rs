//! 模拟机器人执行器（用于本地运行与测试，无需真实设备）
//!
//! 记录每次调用到 journal；动作时长按 time_scale 缩放后由后台任务报告完成，
//! time_scale 为 0 时所有动作立即完成。表情在显示期内再次下发会返回 Busy。

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::effector::faces::FaceImage;
use crate::effector::{ActionHandle, ArgValue, CapabilitySet, Effector, EffectorError};

/// 表情屏原生尺寸
pub const FACE_WIDTH: u32 = 128;
pub const FACE_HEIGHT: u32 = 32;

/// 每个字符的估算朗读时长（秒），下限 SPEECH_MIN_SECS
const SPEECH_SECS_PER_CHAR: f64 = 0.06;
const SPEECH_MIN_SECS: f64 = 0.4;
/// 原地转向：每 90 度耗时（秒）
const TURN_SECS_PER_90_DEG: f64 = 1.0;
/// 未指定时长时升降臂动作时长（秒）
const LIFT_DEFAULT_SECS: f64 = 0.3;
const INVOKE_DEFAULT_SECS: f64 = 0.2;
/// 显示期无法表示时使用的忙碌窗口（约 30 年）
const FACE_BUSY_FOREVER: Duration = Duration::from_secs(86400 * 365 * 30);

/// journal 中的一次调用
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum EffectorCall {
    SayText {
        text: String,
        in_parallel: bool,
    },
    DisplayFaceImage {
        width: u32,
        height: u32,
        lit_pixels: usize,
        duration_ms: f64,
        in_parallel: bool,
    },
    TurnInPlace {
        angle_deg: i64,
        accel: i64,
        in_parallel: bool,
    },
    SetLiftHeight {
        height: f64,
        duration: Option<f64>,
        in_parallel: bool,
    },
    Invoke {
        name: String,
        args: Vec<ArgValue>,
        in_parallel: bool,
    },
}

#[derive(Debug, Default)]
struct SimState {
    journal: Vec<EffectorCall>,
    face_busy_until: Option<Instant>,
}

/// 模拟机器人：默认能力表 + 调用记录 + 按比例缩放的动作时长
pub struct SimulatedRobot {
    capabilities: CapabilitySet,
    time_scale: f64,
    state: Mutex<SimState>,
}

impl SimulatedRobot {
    pub fn new(time_scale: f64) -> Self {
        Self {
            capabilities: Self::default_capabilities(),
            time_scale: time_scale.max(0.0),
            state: Mutex::new(SimState::default()),
        }
    }

    /// 替换能力表（测试中注入自定义能力）
    pub fn with_capabilities(mut self, capabilities: CapabilitySet) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// 追加能力名（参数个数不定）
    pub fn with_extra_capabilities<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.capabilities = self
                .capabilities
                .with(name.as_ref(), None, "configured capability");
        }
        self
    }

    /// 小型桌面机器人的默认能力表
    pub fn default_capabilities() -> CapabilitySet {
        CapabilitySet::new()
            .with("say_text", Some(1), "Speak a sentence")
            .with("display_oled_face_image", Some(2), "Show an image on the face screen")
            .with("turn_in_place", Some(2), "Turn by angle (degrees) with acceleration")
            .with("set_lift_height", Some(2), "Move the lift to a height fraction")
            .with("drive_wheels", Some(4), "Drive wheels: left/right speed and acceleration")
            .with("move_head", Some(4), "Move head: pitch, roll, yaw, velocity")
            .with("move_lift", Some(1), "Move the lift at a speed")
            .with("set_head_angle", Some(1), "Set head angle in degrees")
            .with("set_robot_volume", Some(1), "Set speaker volume (0.0-1.0)")
            .with("set_volume", Some(1), "Set speaker volume (0-100)")
            .with("play_anim", Some(1), "Play an animation by name")
            .with("play_anim_trigger", Some(1), "Play an animation trigger by name")
            .with("set_backpack_lights", None, "Set backpack light colors")
            .with("stop_all_motors", Some(0), "Stop every motor")
    }

    /// 截至目前的调用记录（按下发顺序）
    pub async fn journal(&self) -> Vec<EffectorCall> {
        self.state.lock().await.journal.clone()
    }

    /// 超出 Duration 表示范围的时长饱和为 Duration::MAX（动作永不完成）
    fn scaled(&self, secs: f64) -> Duration {
        let secs = secs * self.time_scale;
        if secs.is_nan() || secs <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }

    /// 记录调用并生成句柄；时长为 0 时立即完成
    async fn record(&self, action: &str, call: EffectorCall, secs: f64) -> ActionHandle {
        tracing::debug!(action = %action, call = ?call, "simulated robot");
        self.state.lock().await.journal.push(call);
        let duration = self.scaled(secs);
        if duration.is_zero() {
            return ActionHandle::completed(action);
        }
        let (handle, completer) = ActionHandle::pending(action);
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            completer.complete(Ok(()));
        });
        handle
    }
}

#[async_trait]
impl Effector for SimulatedRobot {
    fn capabilities(&self) -> CapabilitySet {
        self.capabilities.clone()
    }

    fn face_dimensions(&self) -> (u32, u32) {
        (FACE_WIDTH, FACE_HEIGHT)
    }

    async fn say_text(&self, text: &str, in_parallel: bool) -> Result<ActionHandle, EffectorError> {
        let secs = (text.chars().count() as f64 * SPEECH_SECS_PER_CHAR).max(SPEECH_MIN_SECS);
        let call = EffectorCall::SayText {
            text: text.to_string(),
            in_parallel,
        };
        Ok(self.record("say_text", call, secs).await)
    }

    async fn display_face_image(
        &self,
        image: &FaceImage,
        duration_ms: f64,
        in_parallel: bool,
    ) -> Result<ActionHandle, EffectorError> {
        let secs = duration_ms / 1000.0;
        {
            let mut state = self.state.lock().await;
            let now = Instant::now();
            if let Some(until) = state.face_busy_until {
                if until > now {
                    return Err(EffectorError::Busy(
                        "a face image is already being displayed".to_string(),
                    ));
                }
            }
            // Instant 溢出视为一直忙碌
            state.face_busy_until = Some(
                now.checked_add(self.scaled(secs))
                    .unwrap_or_else(|| now + FACE_BUSY_FOREVER),
            );
        }
        let call = EffectorCall::DisplayFaceImage {
            width: image.width,
            height: image.height,
            lit_pixels: image.lit_pixels(),
            duration_ms,
            in_parallel,
        };
        Ok(self.record("display_oled_face_image", call, secs).await)
    }

    async fn turn_in_place(
        &self,
        angle_deg: i64,
        accel: i64,
        in_parallel: bool,
    ) -> Result<ActionHandle, EffectorError> {
        let secs = angle_deg.unsigned_abs() as f64 / 90.0 * TURN_SECS_PER_90_DEG;
        let call = EffectorCall::TurnInPlace {
            angle_deg,
            accel,
            in_parallel,
        };
        Ok(self.record("turn_in_place", call, secs).await)
    }

    async fn set_lift_height(
        &self,
        height: f64,
        duration: Option<f64>,
        in_parallel: bool,
    ) -> Result<ActionHandle, EffectorError> {
        let secs = duration.unwrap_or(LIFT_DEFAULT_SECS);
        let call = EffectorCall::SetLiftHeight {
            height,
            duration,
            in_parallel,
        };
        Ok(self.record("set_lift_height", call, secs).await)
    }

    async fn invoke(
        &self,
        name: &str,
        args: &[ArgValue],
        in_parallel: bool,
    ) -> Result<ActionHandle, EffectorError> {
        if !self.capabilities.contains(name) {
            return Err(EffectorError::UnknownCapability(name.to_string()));
        }
        let call = EffectorCall::Invoke {
            name: name.to_string(),
            args: args.to_vec(),
            in_parallel,
        };
        Ok(self.record(name, call, INVOKE_DEFAULT_SECS).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_face() -> FaceImage {
        FaceImage {
            width: FACE_WIDTH,
            height: FACE_HEIGHT,
            data: vec![0; 16 * 32],
        }
    }

    #[tokio::test]
    async fn test_journal_records_in_order() {
        let robot = SimulatedRobot::new(0.0);
        robot.say_text("Hi", true).await.unwrap();
        robot.turn_in_place(90, 10, true).await.unwrap();
        let journal = robot.journal().await;
        assert_eq!(journal.len(), 2);
        assert!(matches!(&journal[0], EffectorCall::SayText { text, .. } if text == "Hi"));
        assert!(matches!(
            journal[1],
            EffectorCall::TurnInPlace { angle_deg: 90, accel: 10, .. }
        ));
    }

    #[tokio::test]
    async fn test_face_busy_while_displaying() {
        let robot = SimulatedRobot::new(1.0);
        robot.display_face_image(&blank_face(), 5000.0, true).await.unwrap();
        let second = robot.display_face_image(&blank_face(), 1000.0, true).await;
        assert!(matches!(second, Err(EffectorError::Busy(_))));
        assert_eq!(robot.journal().await.len(), 1);
    }

    #[tokio::test]
    async fn test_pending_action_completes_after_duration() {
        let robot = SimulatedRobot::new(0.01);
        let handle = robot.set_lift_height(1.0, Some(2.0), true).await.unwrap();
        assert_eq!(handle.wait_for_completed().await, Ok(()));
    }

    #[tokio::test]
    async fn test_huge_duration_saturates() {
        let robot = SimulatedRobot::new(1.0);
        assert_eq!(robot.scaled(1e30), Duration::MAX);
        assert_eq!(robot.scaled(f64::INFINITY), Duration::MAX);
        assert_eq!(robot.scaled(f64::NAN), Duration::ZERO);

        let handle = robot.set_lift_height(0.0, Some(1e30), true).await.unwrap();
        let waited =
            tokio::time::timeout(Duration::from_millis(20), handle.wait_for_completed()).await;
        assert!(waited.is_err());

        robot.display_face_image(&blank_face(), 1e33, true).await.unwrap();
        let second = robot.display_face_image(&blank_face(), 10.0, true).await;
        assert!(matches!(second, Err(EffectorError::Busy(_))));
    }

    #[tokio::test]
    async fn test_invoke_unknown_capability() {
        let robot = SimulatedRobot::new(0.0);
        let err = robot.invoke("fly", &[], false).await.unwrap_err();
        assert_eq!(err, EffectorError::UnknownCapability("fly".to_string()));
    }

    #[test]
    fn test_extra_capabilities() {
        let robot = SimulatedRobot::new(0.0).with_extra_capabilities(["wave_arm"]);
        assert!(robot.capabilities().contains("wave_arm"));
        assert!(robot.capabilities().contains("say_text"));
        assert!(!robot.capabilities().contains("drive_straight"));
    }
}
