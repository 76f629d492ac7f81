//! Recording [`BotEngine`] for integration tests.
//!
//! Every call is appended to `calls` in order so tests can assert on exactly
//! what the bot did, without a network.

use async_trait::async_trait;
use configurable_ircbot::{BotEngine, ConnectionSettings, EngineError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Verbose(bool),
    Name(String),
    UserName(String),
    RealName(String),
    Version(String),
    Finger(String),
    Connect(ConnectionSettings),
    Join(String),
}

#[derive(Debug, Default)]
pub struct MockEngine {
    pub calls: Vec<Call>,
    /// Makes `connect` fail with this message.
    pub fail_connect: Option<String>,
    /// Makes `join_channel` fail for this channel.
    pub fail_join: Option<String>,
}

impl MockEngine {
    pub fn connects(&self) -> Vec<&ConnectionSettings> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Connect(settings) => Some(settings),
                _ => None,
            })
            .collect()
    }

    pub fn joins(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Join(channel) => Some(channel.as_str()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl BotEngine for MockEngine {
    fn set_verbose(&mut self, verbose: bool) {
        self.calls.push(Call::Verbose(verbose));
    }

    fn set_name(&mut self, name: &str) {
        self.calls.push(Call::Name(name.to_owned()));
    }

    fn set_user_name(&mut self, user_name: &str) {
        self.calls.push(Call::UserName(user_name.to_owned()));
    }

    fn set_real_name(&mut self, real_name: &str) {
        self.calls.push(Call::RealName(real_name.to_owned()));
    }

    fn set_version(&mut self, version: &str) {
        self.calls.push(Call::Version(version.to_owned()));
    }

    fn set_finger(&mut self, finger: &str) {
        self.calls.push(Call::Finger(finger.to_owned()));
    }

    async fn connect(&mut self, settings: ConnectionSettings) -> Result<(), EngineError> {
        self.calls.push(Call::Connect(settings));
        match &self.fail_connect {
            Some(message) => Err(message.clone().into()),
            None => Ok(()),
        }
    }

    async fn join_channel(&mut self, channel: &str) -> Result<(), EngineError> {
        self.calls.push(Call::Join(channel.to_owned()));
        if self.fail_join.as_deref() == Some(channel) {
            return Err(format!("cannot join {}", channel).into());
        }
        Ok(())
    }
}
