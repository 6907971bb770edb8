// Infrastructure
pub mod config;
pub mod error;
pub mod metrics;
pub mod telemetry;

// Expansion engine
pub mod template;
