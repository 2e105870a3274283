pub mod app;

pub use app::{AppConfig, LogFormat, DEFAULT_CONFIG_PATH, ENV_CONFIG_PATH};
