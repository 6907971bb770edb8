use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub expander: ExpanderConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExpanderConfig {
    /// Nested re-expansions allowed below a top-level placeholder
    #[serde(default = "default_budget")]
    pub budget: i32,
    /// Percent-encode resolved values
    #[serde(default = "default_encode")]
    pub encode: bool,
    /// Back the `hash` filter with the built-in SHA-384 digest
    #[serde(default = "default_hash_enabled")]
    pub hash_enabled: bool,
    /// Variables left as `${...}` for a later expansion pass
    #[serde(default)]
    pub freeze_vars: Vec<String>,
}

fn default_budget() -> i32 {
    2
}

fn default_encode() -> bool {
    true
}

fn default_hash_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Filter directive used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            // Start with default values
            .set_default("expander.budget", default_budget())?
            .set_default("expander.encode", default_encode())?
            .set_default("expander.hash_enabled", default_hash_enabled())?
            .set_default("log.level", default_log_level())?
            .set_default("log.json", false)?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // EXPANDER__BUDGET, EXPANDER__FREEZE_VARS=a,b, LOG__LEVEL, ...
            .add_source(
                Environment::default()
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("expander.freeze_vars"),
            );

        builder.build()?.try_deserialize()
    }
}

impl Default for ExpanderConfig {
    fn default() -> Self {
        Self {
            budget: default_budget(),
            encode: default_encode(),
            hash_enabled: default_hash_enabled(),
            freeze_vars: vec![],
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
