//! Emote - 机器人表情动作指令解释器
//!
//! 入口：初始化日志、加载配置、创建模拟机器人与动作执行模块；
//! 从 stdin 逐行读取指令串，每行作为一个 ADD 单元处理，输出的更新消息以 JSON 行写到 stdout。

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use emote::config::{load_config, AppConfig};
use emote::effector::{Effector, SimulatedRobot};
use emote::pipeline::{ActionExecutionModule, InformationUnit, UpdateMessage, UpdateType};
use emote::CommandInterpreter;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    emote::observability::init();

    // 可选第一个参数：配置文件路径；显式指定的文件读不到直接退出
    let cfg = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => load_config(Some(path.as_path()))
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => load_config(None).unwrap_or_else(|e| {
            tracing::warn!("Config load failed ({}), using defaults", e);
            AppConfig::default()
        }),
    };

    let robot = SimulatedRobot::new(cfg.robot.time_scale)
        .with_extra_capabilities(&cfg.robot.extra_capabilities);
    for (name, description) in robot.capabilities().descriptions() {
        tracing::debug!(capability = %name, "{}", description);
    }
    tracing::info!(
        "Simulated robot ready ({} capabilities, faces from {})",
        robot.capabilities().len(),
        cfg.faces.dir.display()
    );

    let interpreter = CommandInterpreter::from_config(Arc::new(robot), &cfg);
    let module = ActionExecutionModule::new(interpreter)
        .with_completion_marker(cfg.actions.completion_marker.clone());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        if line.trim().is_empty() {
            continue;
        }
        let source = InformationUnit::new("text", line.clone());
        let input = InformationUnit::grounded("text", line, &source);
        let processed = module
            .process_update(UpdateMessage::from_iu(input, UpdateType::Add))
            .await;
        for aborted in &processed.aborted {
            tracing::error!(iu = %aborted.iu, "Batch aborted: {}", aborted.error);
        }
        if let Some(output) = processed.output {
            let json = serde_json::to_string(&output).context("Failed to encode update")?;
            println!("{}", json);
        }
    }

    Ok(())
}
