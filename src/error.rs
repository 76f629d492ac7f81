use std::error::Error as StdError;
use std::path::PathBuf;

use thiserror::Error;

/// Error raised by a [`BotEngine`](crate::engine::BotEngine) operation.
pub type EngineError = Box<dyn StdError + Send + Sync>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration '{}': {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("syntax error on line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("key '{key}' holds '{value}', which is not a valid {expected}")]
    Type {
        key: String,
        value: String,
        expected: &'static str,
    },

    #[error("cyclic interpolation of key '{0}'")]
    Interpolation(String),

    #[error("configuration '{}' includes itself", .0.display())]
    Include(PathBuf),
}

#[derive(Debug, Error)]
pub enum BotError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to connect to {host}")]
    Connect {
        host: String,
        #[source]
        source: EngineError,
    },

    #[error("failed to join {channel}")]
    Join {
        channel: String,
        #[source]
        source: EngineError,
    },
}
