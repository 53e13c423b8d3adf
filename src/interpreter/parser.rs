//! Token 分类与解析
//!
//! 按字面前缀依次匹配已知形状（先匹配者胜）：say_text / display_oled_face_image /
//! turn_in_place / set_lift_height / drive_straight（屏蔽）；都不匹配时走通用回退：
//! 按下划线切段，在能力表上找最长的前缀能力名，剩余段作为参数并做类型转换。

use std::str::FromStr;
use std::sync::Arc;

use crate::core::ActionError;
use crate::effector::{ArgValue, CapabilitySet};
use crate::interpreter::command::{
    ParsedCommand, SpeechSubstitutions, DRIVE_STRAIGHT_PREFIX, FACE_PREFIX, LIFT_PREFIX,
    SPEECH_PREFIX, TURN_PREFIX,
};

/// 解析器：持有注入的能力表与朗读替换表，不依赖具体执行器
#[derive(Debug, Clone)]
pub struct CommandParser {
    capabilities: Arc<CapabilitySet>,
    substitutions: SpeechSubstitutions,
}

impl CommandParser {
    pub fn new(capabilities: Arc<CapabilitySet>, substitutions: SpeechSubstitutions) -> Self {
        Self {
            capabilities,
            substitutions,
        }
    }

    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    pub fn substitutions(&self) -> &SpeechSubstitutions {
        &self.substitutions
    }

    /// 解析单个 token。
    ///
    /// - `Ok(Some(cmd))`：可下发的指令
    /// - `Ok(None)`：被屏蔽的指令族（drive_straight），不做任何事
    /// - `Err(MalformedToken)`：已知形状但参数无法解析（可恢复）
    /// - `Err(UnknownCapability)`：通用回退找不到能力名（致命）
    pub fn parse(&self, token: &str) -> Result<Option<ParsedCommand>, ActionError> {
        if let Some(rest) = token.strip_prefix(SPEECH_PREFIX) {
            return self.parse_speech(token, rest).map(Some);
        }
        if let Some(rest) = token.strip_prefix(FACE_PREFIX) {
            let (image, timeout) = last_two(token, rest)?;
            let seconds: f64 = parse_arg(token, timeout, "timeout")?;
            if !seconds.is_finite() || seconds < 0.0 {
                return Err(ActionError::malformed(token, "timeout must be a non-negative number"));
            }
            return Ok(Some(ParsedCommand::face(image, seconds * 1000.0)));
        }
        if let Some(rest) = token.strip_prefix(TURN_PREFIX) {
            let (angle, accel) = last_two(token, rest)?;
            return Ok(Some(ParsedCommand::turn(
                parse_arg(token, angle, "angle")?,
                parse_arg(token, accel, "acceleration")?,
            )));
        }
        if let Some(rest) = token.strip_prefix(LIFT_PREFIX) {
            let (height, duration) = last_two(token, rest)?;
            return Ok(Some(ParsedCommand::lift(
                parse_arg(token, height, "height")?,
                parse_arg(token, duration, "duration")?,
            )));
        }
        if token.starts_with(DRIVE_STRAIGHT_PREFIX) {
            return Ok(None);
        }
        self.parse_generic(token).map(Some)
    }

    /// 只取前缀后的第一个下划线段作为朗读内容，其余段（如时长）丢弃
    fn parse_speech(&self, token: &str, rest: &str) -> Result<ParsedCommand, ActionError> {
        let text = rest.split('_').next().unwrap_or_default();
        if text.trim().is_empty() {
            return Err(ActionError::malformed(token, "empty speech text"));
        }
        Ok(ParsedCommand::speech(self.substitutions.apply(text)))
    }

    fn parse_generic(&self, token: &str) -> Result<ParsedCommand, ActionError> {
        let segments: Vec<&str> = token.split('_').collect();
        let Some(name_len) = self.capabilities.longest_prefix(&segments) else {
            return Err(ActionError::UnknownCapability(token.to_string()));
        };
        let name = segments[..name_len].join("_");
        let args: Vec<ArgValue> = segments[name_len..]
            .iter()
            .map(|s| ArgValue::coerce(s))
            .collect();
        if let Some(arity) = self.capabilities.get(&name).and_then(|c| c.arity) {
            if arity != args.len() {
                tracing::debug!(
                    capability = %name,
                    expected = arity,
                    got = args.len(),
                    "argument count differs from capability signature"
                );
            }
        }
        Ok(ParsedCommand::generic(name, args))
    }
}

/// 取最后两个下划线段
fn last_two<'a>(token: &str, rest: &'a str) -> Result<(&'a str, &'a str), ActionError> {
    let mut parts = rest.rsplit('_');
    match (parts.next(), parts.next()) {
        (Some(last), Some(second_last)) => Ok((second_last, last)),
        _ => Err(ActionError::malformed(token, "expected two trailing arguments")),
    }
}

fn parse_arg<T: FromStr>(token: &str, raw: &str, what: &str) -> Result<T, ActionError> {
    raw.parse::<T>()
        .map_err(|_| ActionError::malformed(token, format!("invalid {}: '{}'", what, raw)))
}
