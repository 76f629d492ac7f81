use std::env;
use std::error::Error;

use configurable_ircbot::{ConfigurableBot, IrcEngine};
use dotenv::dotenv;

const DEFAULT_CONFIG: &str = "bot.properties";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // .env may set BOT_CONFIG and RUST_LOG
    dotenv().ok();

    if env::var_os("RUST_LOG").is_none() {
        pretty_env_logger::formatted_timed_builder()
            .filter(Some("configurable_ircbot"), log::LevelFilter::Info)
            .init();
    } else {
        pretty_env_logger::init();
    }

    let path = env::args()
        .nth(1)
        .or_else(|| env::var("BOT_CONFIG").ok())
        .unwrap_or_else(|| DEFAULT_CONFIG.to_owned());

    let mut bot = ConfigurableBot::new(IrcEngine::new());
    bot.init_bot_from_path(&path).await?;

    if bot.engine().is_connected() {
        bot.engine_mut().run().await?;
    } else {
        log::warn!("No Server in {}; nothing to do", path);
    }
    Ok(())
}
