use std::io::Read;
use std::path::Path;

use crate::engine::BotEngine;
use crate::error::BotError;
use crate::properties::Properties;
use crate::settings::{ConnectionSettings, channel_list};

/// Sets up a [`BotEngine`] from a properties file: identity first, then the
/// server connection and channel joins.
pub struct ConfigurableBot<E> {
    engine: E,
    configuration: Option<Properties>,
}

impl<E: BotEngine> ConfigurableBot<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            configuration: None,
        }
    }

    /// The configuration passed to the last `init_bot*` call, if any.
    pub fn configuration(&self) -> Option<&Properties> {
        self.configuration.as_ref()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn into_engine(self) -> E {
        self.engine
    }

    pub async fn init_bot_from_path(&mut self, path: impl AsRef<Path>) -> Result<(), BotError> {
        let config = Properties::load(path)?;
        self.init_bot(config).await
    }

    pub async fn init_bot_from_reader<R: Read>(&mut self, reader: R) -> Result<(), BotError> {
        let config = Properties::from_reader(reader)?;
        self.init_bot(config).await
    }

    /// Applies `config` to the engine: identity first, then the connection,
    /// then channel joins. Nothing is connected unless
    /// `Server` is set, and `Channels` is ignored without it. The first error
    /// stops the remaining steps; settings already applied and requests
    /// already sent are not undone.
    pub async fn init_bot(&mut self, config: Properties) -> Result<(), BotError> {
        let config = &*self.configuration.insert(config);
        let engine = &mut self.engine;

        if let Some(verbose) = config.get_bool("Verbose")? {
            engine.set_verbose(verbose);
        }
        if let Some(nick) = config.get_string("Nick")? {
            log::debug!("Nick: {}", nick);
            engine.set_name(&nick);
        }
        if let Some(user_name) = config.get_string("UserName")? {
            engine.set_user_name(&user_name);
        }
        if let Some(real_name) = config.get_string("RealName")? {
            engine.set_real_name(&real_name);
        }
        if let Some(version) = config.get_string("Version")? {
            engine.set_version(&version);
        }
        if let Some(finger) = config.get_string("Finger")? {
            engine.set_finger(&finger);
        }

        let Some(connection) = ConnectionSettings::from_properties(config)? else {
            if config.contains_key("Channels") {
                log::debug!("Channels configured without a Server; not joining");
            }
            return Ok(());
        };

        log::info!("Connecting to {}", connection);
        let host = connection.host.clone();
        engine
            .connect(connection)
            .await
            .map_err(|source| BotError::Connect { host, source })?;

        for channel in channel_list(config)? {
            log::info!("Joining {}", channel);
            if let Err(source) = engine.join_channel(&channel).await {
                return Err(BotError::Join { channel, source });
            }
        }

        Ok(())
    }
}
