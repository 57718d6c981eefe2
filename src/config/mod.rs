mod settings;

pub use settings::{Config, SearchConfig, StorageConfig, EXAMPLE_CONFIG};
