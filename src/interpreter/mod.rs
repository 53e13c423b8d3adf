//! 指令解释层：切分、分类解析、分发、批处理主循环与过程事件

pub mod batch;
pub mod command;
pub mod events;
pub mod executor;
pub mod parser;
pub mod tokenizer;

pub use batch::{BatchReport, CommandInterpreter, TokenOutcome};
pub use command::{ArgValue, CommandKind, ParsedCommand, SpeechSubstitutions};
pub use events::ActionEvent;
pub use executor::ActionExecutor;
pub use parser::CommandParser;
pub use tokenizer::split_tokens;
