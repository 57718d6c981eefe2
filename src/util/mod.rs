//! Utility modules

mod dates;
mod paths;

pub use dates::{is_valid_date, now_iso, parse_date, to_iso_string};
pub use paths::{config_path, data_dir, database_path, init_data_dir, log_file_path, logs_dir};
