//! 动作执行模块：流水线中消费指令串 IU、产出完成标记 IU
//!
//! 对每个 ADD 单元执行一整批指令，完成后输出一个以该单元为来源的「完成」单元；
//! 其余更新类型忽略。某个单元致命中止时只跳过它的完成单元，其他单元照常执行与输出。

use uuid::Uuid;

use crate::core::ActionError;
use crate::interpreter::CommandInterpreter;
use crate::pipeline::{InformationUnit, UpdateMessage, UpdateType};

/// 默认完成标记
pub const COMPLETION_MARKER: &str = "Emotion Actions Complete";

/// 一个被致命错误中止的输入单元
#[derive(Debug)]
pub struct AbortedUnit {
    pub iu: Uuid,
    pub error: ActionError,
}

/// process_update 的结果：已完成批次的完成单元 + 被中止的输入单元
#[derive(Debug, Default)]
pub struct ProcessedUpdate {
    /// 没有任何批次完成时为 None
    pub output: Option<UpdateMessage>,
    pub aborted: Vec<AbortedUnit>,
}

impl ProcessedUpdate {
    pub fn is_aborted(&self) -> bool {
        !self.aborted.is_empty()
    }
}

pub struct ActionExecutionModule {
    interpreter: CommandInterpreter,
    completion_marker: String,
}

impl ActionExecutionModule {
    pub fn name() -> &'static str {
        "Action Execution Module"
    }

    pub fn description() -> &'static str {
        "Execute generated action commands on the robot."
    }

    pub fn new(interpreter: CommandInterpreter) -> Self {
        Self {
            interpreter,
            completion_marker: COMPLETION_MARKER.to_string(),
        }
    }

    pub fn with_completion_marker(mut self, marker: impl Into<String>) -> Self {
        self.completion_marker = marker.into();
        self
    }

    pub fn interpreter(&self) -> &CommandInterpreter {
        &self.interpreter
    }

    /// 处理一条更新消息；每个 ADD 单元独立执行，中止的单元记入 aborted
    pub async fn process_update(&self, message: UpdateMessage) -> ProcessedUpdate {
        let mut output = UpdateMessage::new();
        let mut aborted = Vec::new();
        for (iu, update_type) in message {
            if update_type != UpdateType::Add {
                continue;
            }
            tracing::info!(iu = %iu.id, payload = %iu.payload, "Executing action IU");
            let report = match self.interpreter.execute(&iu.payload).await {
                Ok(report) => report,
                Err(error) => {
                    tracing::error!(iu = %iu.id, "Action IU aborted: {}", error);
                    aborted.push(AbortedUnit { iu: iu.id, error });
                    continue;
                }
            };
            tracing::info!(
                iu = %iu.id,
                tokens = report.tokens,
                dispatched = report.dispatched,
                ignored = report.ignored,
                skipped = report.skipped.len(),
                reset = report.reset_completed,
                "Action IU complete"
            );
            let done = InformationUnit::grounded(Self::name(), self.completion_marker.clone(), &iu);
            output.add_iu(done, UpdateType::Add);
        }
        ProcessedUpdate {
            output: if output.is_empty() { None } else { Some(output) },
            aborted,
        }
    }
}
