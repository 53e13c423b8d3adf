//! 解析后的指令：封闭的指令种类（标签联合）+ 执行方式

use std::collections::HashMap;

use serde::Serialize;

pub use crate::effector::ArgValue;

pub const SPEECH_PREFIX: &str = "say_text_";
pub const FACE_PREFIX: &str = "display_oled_face_image_";
pub const TURN_PREFIX: &str = "turn_in_place_";
pub const LIFT_PREFIX: &str = "set_lift_height_";
/// 直线行驶被有意屏蔽：匹配到该前缀的 token 一律不执行
pub const DRIVE_STRAIGHT_PREFIX: &str = "drive_straight_";

/// 指令种类：四种已知形状 + 通用回退
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandKind {
    Speech { text: String },
    FaceDisplay { image: String, duration_ms: f64 },
    Turn { angle_deg: i64, accel: i64 },
    LiftHeight { height: f64, duration: f64 },
    Generic { name: String, args: Vec<ArgValue> },
}

impl CommandKind {
    pub fn label(&self) -> &'static str {
        match self {
            CommandKind::Speech { .. } => "speech",
            CommandKind::FaceDisplay { .. } => "face_display",
            CommandKind::Turn { .. } => "turn",
            CommandKind::LiftHeight { .. } => "lift_height",
            CommandKind::Generic { .. } => "generic",
        }
    }
}

/// 一个 token 对应的指令；每条指令至多对应一次执行器调用
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedCommand {
    pub kind: CommandKind,
    /// 是否等待设备报告完成后才处理下一个 token
    pub blocking: bool,
    /// 是否允许与后续动作并行执行
    pub parallel: bool,
}

impl ParsedCommand {
    pub fn speech(text: impl Into<String>) -> Self {
        Self {
            kind: CommandKind::Speech { text: text.into() },
            blocking: true,
            parallel: true,
        }
    }

    pub fn face(image: impl Into<String>, duration_ms: f64) -> Self {
        Self {
            kind: CommandKind::FaceDisplay {
                image: image.into(),
                duration_ms,
            },
            blocking: false,
            parallel: true,
        }
    }

    pub fn turn(angle_deg: i64, accel: i64) -> Self {
        Self {
            kind: CommandKind::Turn { angle_deg, accel },
            blocking: false,
            parallel: true,
        }
    }

    pub fn lift(height: f64, duration: f64) -> Self {
        Self {
            kind: CommandKind::LiftHeight { height, duration },
            blocking: true,
            parallel: true,
        }
    }

    /// 通用调用：直接下发，不等待
    pub fn generic(name: impl Into<String>, args: Vec<ArgValue>) -> Self {
        Self {
            kind: CommandKind::Generic {
                name: name.into(),
                args,
            },
            blocking: false,
            parallel: false,
        }
    }

    /// 目标能力名
    pub fn name(&self) -> &str {
        match &self.kind {
            CommandKind::Speech { .. } => "say_text",
            CommandKind::FaceDisplay { .. } => "display_oled_face_image",
            CommandKind::Turn { .. } => "turn_in_place",
            CommandKind::LiftHeight { .. } => "set_lift_height",
            CommandKind::Generic { name, .. } => name,
        }
    }

    /// 按调用顺序排列的类型化参数
    pub fn arguments(&self) -> Vec<ArgValue> {
        match &self.kind {
            CommandKind::Speech { text } => vec![ArgValue::Text(text.clone())],
            CommandKind::FaceDisplay { image, duration_ms } => {
                vec![ArgValue::Text(image.clone()), ArgValue::Float(*duration_ms)]
            }
            CommandKind::Turn { angle_deg, accel } => {
                vec![ArgValue::Int(*angle_deg), ArgValue::Int(*accel)]
            }
            CommandKind::LiftHeight { height, duration } => {
                vec![ArgValue::Float(*height), ArgValue::Float(*duration)]
            }
            CommandKind::Generic { args, .. } => args.clone(),
        }
    }
}

/// 朗读文本替换表（整词精确匹配）；内置 yawn → aawwhn，让语音合成发出打哈欠的声音
#[derive(Debug, Clone)]
pub struct SpeechSubstitutions {
    table: HashMap<String, String>,
}

impl Default for SpeechSubstitutions {
    fn default() -> Self {
        let mut table = HashMap::new();
        table.insert("yawn".to_string(), "aawwhn".to_string());
        Self { table }
    }
}

impl SpeechSubstitutions {
    /// 不含任何条目的空表
    pub fn empty() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    pub fn insert(&mut self, word: impl Into<String>, spoken: impl Into<String>) {
        self.table.insert(word.into(), spoken.into());
    }

    pub fn extend<I, K, V>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in entries {
            self.insert(k, v);
        }
    }

    pub fn apply(&self, text: &str) -> String {
        self.table
            .get(text)
            .cloned()
            .unwrap_or_else(|| text.to_string())
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
