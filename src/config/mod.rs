//! Layered configuration.
//!
//! Sources, lowest precedence first: built-in defaults, the optional
//! `config/default.*` file, then `SOCIALHUB_*` environment variables with
//! `__` between nesting levels (`SOCIALHUB_SERVER__PORT=9000`).

mod settings;

use config::{Config, ConfigError, Environment, File};

use settings::PartialSettings;

pub use settings::{HubSettings, LoggingSettings, ServerSettings, Settings, StorageSettings};

pub const ENV_PREFIX: &str = "SOCIALHUB";

/// Loads the configuration from the default file and environment variables,
/// merged over the built-in defaults.
pub fn load_config() -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

    let config = builder.build()?;
    let partial: PartialSettings = config.try_deserialize()?;

    Ok(partial.merge_with_defaults())
}
