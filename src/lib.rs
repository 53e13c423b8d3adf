//! Emote - 机器人表情动作指令解释器
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型、跳过原因与恢复策略
//! - **effector**: 执行器抽象、能力表、表情图片与模拟机器人
//! - **interpreter**: 指令串切分、分类解析、分发与批处理主循环
//! - **observability**: 日志初始化
//! - **pipeline**: 信息单元、更新消息与动作执行模块

pub mod config;
pub mod core;
pub mod effector;
pub mod interpreter;
pub mod observability;
pub mod pipeline;

pub use interpreter::{BatchReport, CommandInterpreter, TokenOutcome};
pub use pipeline::ActionExecutionModule;
