mod settings;

use crate::config::settings::PartialSettings;
use config::{Config, ConfigError, Environment, File};

pub use settings::{
    ClientConfig, ClientSettings, HeartbeatIdPolicy, LoggingSettings, PartialClientSettings,
    Settings,
};

/// Prefix for environment overrides, e.g. `COAP_PUBSUB_CLIENT__SERVER_ADDR`.
pub const ENV_PREFIX: &str = "COAP_PUBSUB";

/// Loads the configuration from the default file and environment variables
/// Merges the configuration with default values
pub fn load_config() -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("topics")
                .try_parsing(true),
        );

    let config = builder.build()?;
    let partial: PartialSettings = config.try_deserialize()?;
    let default = Settings::default();

    Ok(Settings {
        client: match partial.client {
            Some(client) => client.merge(default.client),
            None => default.client,
        },
        logging: LoggingSettings {
            level: partial
                .logging
                .and_then(|l| l.level)
                .unwrap_or(default.logging.level),
        },
        topics: partial.topics.unwrap_or(default.topics),
    })
}

#[cfg(test)]
mod tests;
