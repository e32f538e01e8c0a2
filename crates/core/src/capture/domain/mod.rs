pub mod capture_config;
pub mod capture_error;
pub mod capture_source;
