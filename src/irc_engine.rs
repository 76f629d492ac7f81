use std::time::Duration;

use async_trait::async_trait;
use futures::stream::StreamExt;
use irc::client::ClientStream;
use irc::client::prelude::*;
use thiserror::Error;

use crate::ctcp::{CtcpRequest, CtcpResponder};
use crate::engine::BotEngine;
use crate::error::EngineError;
use crate::settings::ConnectionSettings;

const REGISTRATION_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum IrcEngineError {
    #[error("not connected to a server")]
    NotConnected,

    #[error("server closed the connection before registration completed")]
    RegistrationClosed,

    #[error("no welcome from the server within {0:?}")]
    RegistrationTimeout(Duration),

    #[error(transparent)]
    Irc(#[from] irc::error::Error),
}

/// [`BotEngine`] backed by the `irc` crate.
pub struct IrcEngine {
    identity: Config,
    verbose: bool,
    ctcp: CtcpResponder,
    client: Option<Client>,
    stream: Option<ClientStream>,
}

impl Default for IrcEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl IrcEngine {
    pub fn new() -> Self {
        let version = format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        IrcEngine {
            identity: Config {
                nickname: Some(env!("CARGO_PKG_NAME").to_owned()),
                version: Some(version.clone()),
                ..Config::default()
            },
            verbose: false,
            ctcp: CtcpResponder {
                version,
                ..CtcpResponder::default()
            },
            client: None,
            stream: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    /// Reads messages until the server closes the connection, answering
    /// CTCP queries along the way.
    pub async fn run(&mut self) -> Result<(), IrcEngineError> {
        let mut stream = self.stream.take().ok_or(IrcEngineError::NotConnected)?;

        while let Some(message) = stream.next().await.transpose()? {
            if let Err(e) = self.handle_message(&message) {
                log::error!("Error handling message: {}", e);
            }
        }

        log::info!("Disconnected");
        self.client = None;
        Ok(())
    }

    fn handle_message(&self, message: &Message) -> Result<(), IrcEngineError> {
        trace(self.verbose, "<<", &message.to_string());

        let Command::PRIVMSG(_, text) = &message.command else {
            return Ok(());
        };
        let (Some(request), Some(sender)) = (CtcpRequest::parse(text), message.source_nickname()) else {
            return Ok(());
        };

        match self.ctcp.respond(&request) {
            Some(reply) => {
                let client = self.client.as_ref().ok_or(IrcEngineError::NotConnected)?;
                trace(self.verbose, ">>", &format!("NOTICE {} :{}", sender, reply));
                client.send_notice(sender, reply)?;
            }
            None => log::debug!("Ignoring CTCP {} from {}", request.command, sender),
        }
        Ok(())
    }

    fn client_config(&self, settings: &ConnectionSettings) -> Config {
        Config {
            server: Some(settings.host.clone()),
            port: Some(settings.port),
            use_tls: Some(settings.use_ssl),
            dangerously_accept_invalid_certs: Some(!settings.verify_ssl),
            password: settings.password.clone(),
            ..self.identity.clone()
        }
    }

    async fn open(&mut self, settings: ConnectionSettings) -> Result<(), IrcEngineError> {
        let config = self.client_config(&settings);

        let nick = config.nickname.clone().unwrap_or_default();
        self.ctcp.user_name = config.username.clone().unwrap_or_else(|| nick.clone());
        self.ctcp.real_name = config.realname.clone().unwrap_or_else(|| nick.clone());
        self.ctcp.nick = nick;

        let mut client = Client::from_config(config).await?;
        client.identify()?;
        let mut stream = client.stream()?;
        tokio::time::timeout(REGISTRATION_TIMEOUT, await_welcome(&mut stream, self.verbose))
            .await
            .map_err(|_| IrcEngineError::RegistrationTimeout(REGISTRATION_TIMEOUT))??;

        log::info!("Registered with {} as {}", settings, self.ctcp.nick);
        self.client = Some(client);
        self.stream = Some(stream);
        Ok(())
    }
}

fn trace(verbose: bool, direction: &str, line: &str) {
    let line = line.trim_end();
    if verbose {
        log::info!("{} {}", direction, line);
    } else {
        log::debug!("{} {}", direction, line);
    }
}

/// Consumes messages until RPL_WELCOME, after which JOIN is accepted.
async fn await_welcome(stream: &mut ClientStream, verbose: bool) -> Result<(), IrcEngineError> {
    while let Some(message) = stream.next().await.transpose()? {
        trace(verbose, "<<", &message.to_string());
        if let Command::Response(Response::RPL_WELCOME, _) = message.command {
            return Ok(());
        }
    }
    Err(IrcEngineError::RegistrationClosed)
}

#[async_trait]
impl BotEngine for IrcEngine {
    fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    fn set_name(&mut self, name: &str) {
        self.identity.nickname = Some(name.to_owned());
    }

    fn set_user_name(&mut self, user_name: &str) {
        self.identity.username = Some(user_name.to_owned());
    }

    fn set_real_name(&mut self, real_name: &str) {
        self.identity.realname = Some(real_name.to_owned());
    }

    fn set_version(&mut self, version: &str) {
        self.identity.version = Some(version.to_owned());
        self.ctcp.version = version.to_owned();
    }

    fn set_finger(&mut self, finger: &str) {
        self.ctcp.finger = Some(finger.to_owned());
    }

    async fn connect(&mut self, settings: ConnectionSettings) -> Result<(), EngineError> {
        Ok(self.open(settings).await?)
    }

    async fn join_channel(&mut self, channel: &str) -> Result<(), EngineError> {
        let client = self.client.as_ref().ok_or(IrcEngineError::NotConnected)?;
        trace(self.verbose, ">>", &format!("JOIN {}", channel));
        client.send_join(channel).map_err(IrcEngineError::from)?;
        Ok(())
    }
}
