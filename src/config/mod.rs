mod settings;

pub use settings::{ExpanderConfig, LogConfig, Settings};
