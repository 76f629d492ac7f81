use async_trait::async_trait;

use crate::error::EngineError;
use crate::settings::ConnectionSettings;

/// The IRC client a [`ConfigurableBot`](crate::bot::ConfigurableBot) drives.
///
/// Identity setters are expected to take effect on the next `connect`, since
/// the nick and user name go out during registration.
#[async_trait]
pub trait BotEngine: Send {
    fn set_verbose(&mut self, verbose: bool);

    fn set_name(&mut self, name: &str);

    fn set_user_name(&mut self, user_name: &str);

    fn set_real_name(&mut self, real_name: &str);

    fn set_version(&mut self, version: &str);

    fn set_finger(&mut self, finger: &str);

    async fn connect(&mut self, settings: ConnectionSettings) -> Result<(), EngineError>;

    async fn join_channel(&mut self, channel: &str) -> Result<(), EngineError>;
}
