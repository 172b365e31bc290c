pub mod loader;

pub use loader::{load_config, load_config_from_env, parse_config, validate_config};
