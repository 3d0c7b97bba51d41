pub mod error;
pub mod models;
pub mod store;

pub use error::ConfigError;
pub use models::Configuration;
pub use store::{ConfigStore, APP_DIR_NAME, CONFIG_FILE_NAME};
