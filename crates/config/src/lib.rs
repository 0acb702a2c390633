// Configuration loading

pub mod secrets;
pub mod settings;

pub use secrets::{get_password, SecretLookup, SecretSource};
pub use settings::{CompareSettings, ConfigError, EpmSettings, LoggingSettings, Settings};
