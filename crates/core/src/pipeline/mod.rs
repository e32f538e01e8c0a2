pub mod capture_use_case;
pub mod pipeline_logger;
