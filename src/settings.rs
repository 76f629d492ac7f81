use std::fmt::{self, Display, Formatter};

use crate::error::ConfigError;
use crate::properties::Properties;

pub const DEFAULT_PORT: u16 = 6667;

const CHANNEL_SEPARATOR: char = ',';

/// Where and how to reach the IRC server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub host: String,
    pub port: u16,
    pub use_ssl: bool,
    pub verify_ssl: bool,
    pub password: Option<String>,
}

impl ConnectionSettings {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            use_ssl: false,
            verify_ssl: true,
            password: None,
        }
    }

    /// `None` when `Server` is absent; `Port`, `SSL` and `VerifySSL` are only
    /// read, and only checked, when it is present.
    pub fn from_properties(config: &Properties) -> Result<Option<Self>, ConfigError> {
        let Some(host) = config.get_string("Server")? else {
            return Ok(None);
        };

        let mut connection = ConnectionSettings::new(host);
        if let Some(port) = config.get_int::<u16>("Port")? {
            connection.port = port;
        }
        if let Some(use_ssl) = config.get_bool("SSL")? {
            connection.use_ssl = use_ssl;
        }
        if let Some(verify_ssl) = config.get_bool("VerifySSL")? {
            connection.verify_ssl = verify_ssl;
        }
        connection.password = config.get_string("Password")?;
        Ok(Some(connection))
    }
}

impl Display for ConnectionSettings {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)?;
        if self.use_ssl {
            write!(f, " (ssl{})", if self.verify_ssl { "" } else { ", unverified" })?;
        }
        if self.password.is_some() {
            write!(f, " password=...")?;
        }
        Ok(())
    }
}

/// Channel names from every `Channels` value, split on commas and trimmed.
/// Empty entries are dropped.
pub fn channel_list(config: &Properties) -> Result<Vec<String>, ConfigError> {
    Ok(config
        .get_string_list("Channels")?
        .iter()
        .flat_map(|value| value.split(CHANNEL_SEPARATOR))
        .map(str::trim)
        .filter(|channel| !channel.is_empty())
        .map(str::to_owned)
        .collect())
}
