//! 指令串批处理主循环
//!
//! 切分 -> 逐 token 解析 -> 分发；可恢复错误交给 RecoveryEngine 转为跳过，
//! 未知能力终止整批。全部 token 处理完后无条件复位升降臂并等待完成。

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::config::AppConfig;
use crate::core::{ActionError, RecoveryAction, RecoveryEngine, SkipReason};
use crate::effector::{CapabilitySet, Effector, FaceLibrary};
use crate::interpreter::command::SpeechSubstitutions;
use crate::interpreter::{split_tokens, ActionEvent, ActionExecutor, CommandParser};

/// 默认等待超时（秒）
const DEFAULT_ACTION_TIMEOUT_SECS: u64 = 30;

/// 单个 token 的处理结果（致命错误走 Err）
#[derive(Debug, Clone, PartialEq)]
pub enum TokenOutcome {
    Dispatched,
    /// 被屏蔽的指令族，不做任何事
    Ignored,
    Skipped { reason: SkipReason, detail: String },
}

/// 一批指令的处理汇总（只用于日志与测试，不向流水线上游暴露）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub tokens: usize,
    pub dispatched: usize,
    pub ignored: usize,
    pub skipped: Vec<(String, SkipReason)>,
    pub reset_completed: bool,
}

impl BatchReport {
    fn record(&mut self, token: &str, outcome: &TokenOutcome) {
        self.tokens += 1;
        match outcome {
            TokenOutcome::Dispatched => self.dispatched += 1,
            TokenOutcome::Ignored => self.ignored += 1,
            TokenOutcome::Skipped { reason, .. } => {
                self.skipped.push((token.to_string(), *reason));
            }
        }
    }
}

/// 指令解释器：解析器 + 分发器 + 恢复引擎 + 收尾复位高度
pub struct CommandInterpreter {
    parser: CommandParser,
    executor: ActionExecutor,
    recovery: RecoveryEngine,
    reset_height: f64,
    event_tx: Option<mpsc::UnboundedSender<ActionEvent>>,
}

impl CommandInterpreter {
    /// 使用执行器自带能力表与默认替换表创建
    pub fn new(effector: Arc<dyn Effector>, faces: FaceLibrary) -> Self {
        let capabilities = Arc::new(effector.capabilities());
        Self {
            parser: CommandParser::new(capabilities, SpeechSubstitutions::default()),
            executor: ActionExecutor::new(effector, faces, DEFAULT_ACTION_TIMEOUT_SECS),
            recovery: RecoveryEngine::new(),
            reset_height: 0.0,
            event_tx: None,
        }
    }

    /// 按配置创建：表情目录、替换表、复位高度、等待超时
    pub fn from_config(effector: Arc<dyn Effector>, cfg: &AppConfig) -> Self {
        let faces = FaceLibrary::new(cfg.faces.dir.clone(), cfg.faces.extension.clone())
            .with_invert(cfg.faces.invert);
        let mut substitutions = SpeechSubstitutions::default();
        substitutions.extend(cfg.actions.speech_substitutions.clone());
        Self::new(effector, faces)
            .with_substitutions(substitutions)
            .with_reset_height(cfg.actions.reset_lift_height)
            .with_action_timeout(Duration::from_secs(cfg.actions.action_timeout_secs))
    }

    /// 注入能力表（覆盖执行器自带的）
    pub fn with_capabilities(mut self, capabilities: CapabilitySet) -> Self {
        let substitutions = self.parser.substitutions().clone();
        self.parser = CommandParser::new(Arc::new(capabilities), substitutions);
        self
    }

    pub fn with_substitutions(mut self, substitutions: SpeechSubstitutions) -> Self {
        let capabilities = Arc::new(self.parser.capabilities().clone());
        self.parser = CommandParser::new(capabilities, substitutions);
        self
    }

    pub fn with_reset_height(mut self, height: f64) -> Self {
        self.reset_height = height;
        self
    }

    pub fn with_action_timeout(mut self, timeout: Duration) -> Self {
        self.executor = self.executor.with_timeout(timeout);
        self
    }

    pub fn with_event_tx(mut self, tx: mpsc::UnboundedSender<ActionEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    pub fn parser(&self) -> &CommandParser {
        &self.parser
    }

    fn send_event(&self, ev: ActionEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(ev);
        }
    }

    /// 执行一整条指令串；未知能力返回 Err，此时后续 token 与收尾复位都不执行
    pub async fn execute(&self, raw: &str) -> Result<BatchReport, ActionError> {
        let mut report = BatchReport::default();

        for (index, token) in split_tokens(raw).into_iter().enumerate() {
            self.send_event(ActionEvent::TokenReceived {
                index,
                token: token.to_string(),
            });
            let outcome = match self.process_token(token).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    self.send_event(ActionEvent::Aborted {
                        token: token.to_string(),
                        error: e.to_string(),
                    });
                    return Err(e);
                }
            };
            report.record(token, &outcome);
        }

        report.reset_completed = match self.executor.reset_lift(self.reset_height).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Lift reset to {} failed: {}", self.reset_height, e);
                false
            }
        };
        self.send_event(ActionEvent::ResetIssued {
            height: self.reset_height,
            completed: report.reset_completed,
        });
        self.send_event(ActionEvent::BatchComplete {
            dispatched: report.dispatched,
            ignored: report.ignored,
            skipped: report.skipped.len(),
        });
        Ok(report)
    }

    /// 处理单个 token：可恢复错误在此边界内转为 Skipped，不会向外传播
    pub async fn process_token(&self, token: &str) -> Result<TokenOutcome, ActionError> {
        let command = match self.parser.parse(token) {
            Ok(Some(command)) => command,
            Ok(None) => {
                tracing::debug!(token = %token, "disabled command ignored");
                self.send_event(ActionEvent::Ignored {
                    token: token.to_string(),
                });
                return Ok(TokenOutcome::Ignored);
            }
            Err(e) => return self.recover(token, e),
        };

        match self.executor.dispatch(&command).await {
            Ok(()) => {
                self.send_event(ActionEvent::Dispatched {
                    name: command.name().to_string(),
                    blocking: command.blocking,
                });
                Ok(TokenOutcome::Dispatched)
            }
            Err(e) => self.recover(token, e),
        }
    }

    fn recover(&self, token: &str, err: ActionError) -> Result<TokenOutcome, ActionError> {
        match self.recovery.handle(&err) {
            RecoveryAction::SkipToken(reason) => {
                tracing::warn!("Skipping '{}' ({}): {}. Continuing execution.", token, reason, err);
                self.send_event(ActionEvent::Skipped {
                    token: token.to_string(),
                    reason,
                    detail: err.to_string(),
                });
                Ok(TokenOutcome::Skipped {
                    reason,
                    detail: err.to_string(),
                })
            }
            RecoveryAction::AbortBatch => {
                tracing::error!("Aborting batch at '{}': {}", token, err);
                Err(err)
            }
        }
    }
}
