use std::path::Path;

use anyhow::{bail, Context, Result};

use ara_macro_expander::config::Settings;
use ara_macro_expander::template::{create_expander, ExpansionOptions, ScopeSet};
use ara_macro_expander::telemetry::init_tracing;

const USAGE: &str = "usage: ara-expand <template> [scopes.json]";

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::new().context("Failed to load configuration")?;

    // Initialize tracing
    init_tracing(&settings.log)?;

    let mut args = std::env::args().skip(1);
    let Some(template) = args.next() else {
        bail!(USAGE);
    };

    let scopes = match args.next() {
        Some(path) => ScopeSet::load(Path::new(&path))
            .with_context(|| format!("Failed to load scopes from {}", path))?,
        None => ScopeSet::default(),
    };

    let expander = create_expander(&settings.expander);
    let options = ExpansionOptions::from_config(&settings.expander);

    tracing::debug!(budget = options.budget, encode = options.encode, "Expanding template");
    let expanded = expander.expand(&template, &scopes, &options).await;

    println!("{}", expanded);
    Ok(())
}
