mod log_level;
mod options;

pub use log_level::LogLevel;
pub use options::{ColorChoice, CompareFormat, Side};
