pub mod input;

use std::collections::BTreeMap;
use std::str::FromStr;

/// User actions. Each maps to one handler in the poller's dispatch table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SelectSymbol(String),
    SelectTimeframe(String),
    PauseScanner,
    ResumeScanner,
    RunBacktest,
    ExportHistory,
    Advise(BTreeMap<String, String>),
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error("{0} needs an argument")]
    MissingArgument(&'static str),

    #[error("Expected key=value, got: {0}")]
    BadField(String),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let verb = parts.next().ok_or(CommandError::Empty)?;

        match verb.to_ascii_lowercase().as_str() {
            "symbol" | "s" => {
                let symbol = parts.next().ok_or(CommandError::MissingArgument("symbol"))?;
                Ok(Command::SelectSymbol(symbol.to_ascii_uppercase()))
            }
            "timeframe" | "tf" => {
                let timeframe = parts.next().ok_or(CommandError::MissingArgument("timeframe"))?;
                Ok(Command::SelectTimeframe(timeframe.to_ascii_uppercase()))
            }
            "pause" => Ok(Command::PauseScanner),
            "resume" => Ok(Command::ResumeScanner),
            "backtest" => Ok(Command::RunBacktest),
            "export" => Ok(Command::ExportHistory),
            "advise" => {
                let mut fields = BTreeMap::new();
                for part in parts {
                    let (key, value) = part
                        .split_once('=')
                        .filter(|(k, _)| !k.is_empty())
                        .ok_or_else(|| CommandError::BadField(part.to_string()))?;
                    fields.insert(key.to_string(), value.to_string());
                }
                Ok(Command::Advise(fields))
            }
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}
