//! Configures an IRC bot from a Java-style properties file: identity, server
//! connection and the channels to join.

pub mod bot;
pub mod ctcp;
pub mod engine;
pub mod error;
pub mod irc_engine;
pub mod properties;
pub mod settings;

pub use bot::ConfigurableBot;
pub use engine::BotEngine;
pub use error::{BotError, ConfigError, EngineError};
pub use irc_engine::IrcEngine;
pub use properties::Properties;
pub use settings::{ConnectionSettings, channel_list};
