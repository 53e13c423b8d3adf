//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `EMOTE__*` 覆盖（双下划线表示嵌套，如 `EMOTE__FACES__DIR=/opt/faces`）。

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSection,
    #[serde(default)]
    pub actions: ActionsSection,
    #[serde(default)]
    pub faces: FacesSection,
    #[serde(default)]
    pub robot: RobotSection,
}

/// [app] 段
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppSection {
    pub name: Option<String>,
}

/// [actions] 段：完成标记、收尾复位高度、等待超时、朗读替换表
#[derive(Debug, Clone, Deserialize)]
pub struct ActionsSection {
    /// 一批指令完成后输出单元的内容
    #[serde(default = "default_completion_marker")]
    pub completion_marker: String,
    /// 收尾时升降臂复位的高度
    #[serde(default)]
    pub reset_lift_height: f64,
    /// 等待单个动作完成的上限（秒）
    #[serde(default = "default_action_timeout_secs")]
    pub action_timeout_secs: u64,
    /// 追加到内置 yawn → aawwhn 之上的替换条目
    #[serde(default)]
    pub speech_substitutions: HashMap<String, String>,
}

fn default_completion_marker() -> String {
    "Emotion Actions Complete".to_string()
}

fn default_action_timeout_secs() -> u64 {
    30
}

impl Default for ActionsSection {
    fn default() -> Self {
        Self {
            completion_marker: default_completion_marker(),
            reset_lift_height: 0.0,
            action_timeout_secs: default_action_timeout_secs(),
            speech_substitutions: HashMap::new(),
        }
    }
}

/// [faces] 段：表情图片目录、扩展名、是否反色
#[derive(Debug, Clone, Deserialize)]
pub struct FacesSection {
    #[serde(default = "default_faces_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_faces_extension")]
    pub extension: String,
    #[serde(default)]
    pub invert: bool,
}

fn default_faces_dir() -> PathBuf {
    PathBuf::from("assets/faces")
}

fn default_faces_extension() -> String {
    "png".to_string()
}

impl Default for FacesSection {
    fn default() -> Self {
        Self {
            dir: default_faces_dir(),
            extension: default_faces_extension(),
            invert: false,
        }
    }
}

/// [robot] 段：模拟机器人的时间倍率与额外能力名
#[derive(Debug, Clone, Deserialize)]
pub struct RobotSection {
    /// 1.0 为真实时长，0.0 为立即完成
    #[serde(default = "default_time_scale")]
    pub time_scale: f64,
    #[serde(default)]
    pub extra_capabilities: Vec<String>,
}

fn default_time_scale() -> f64 {
    1.0
}

impl Default for RobotSection {
    fn default() -> Self {
        Self {
            time_scale: default_time_scale(),
            extra_capabilities: Vec::new(),
        }
    }
}

/// 未显式指定配置文件时依次尝试的默认位置（取第一个存在的）
const DEFAULT_CONFIG_FILES: [&str; 2] = ["config/default.toml", "../config/default.toml"];

/// 加载配置：默认文件 → 显式文件 → 环境变量 EMOTE__*，后者覆盖前者
///
/// 显式传入的文件必须存在，否则返回错误；默认文件缺失时只用内置默认值。
pub fn load_config(config_path: Option<&Path>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    if let Some(default_file) = DEFAULT_CONFIG_FILES
        .into_iter()
        .map(Path::new)
        .find(|p| p.exists())
    {
        builder = builder.add_source(config::File::from(default_file));
    }

    if let Some(path) = config_path {
        builder = builder.add_source(config::File::from(path).required(true));
    }

    builder
        .add_source(
            config::Environment::with_prefix("EMOTE")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}
