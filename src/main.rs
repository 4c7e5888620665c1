//! xml-relay
//!
//! Relays XML POSTs to the URL named in their `<redirect_url>` element.
//!
//! # Architecture Overview
//!
//! ```text
//!     Caller                         xml-relay                          Destination
//!       │  POST (XML body)   ┌───────────────────────────┐                  │
//!       │───────────────────▶│ server: request id, trace │                  │
//!       │                    │ relay: <redirect_url>     │  POST (same body) │
//!       │                    │        header filtering   │─────────────────▶│
//!       │                    │        X-Forwarded-*      │                  │
//!       │  status, headers,  │ response: filtered copy,  │  status, headers, │
//!       │◀───────────────────│           streamed body   │◀─────────────────│
//!       │      body          └───────────────────────────┘       body       │
//! ```

use std::path::PathBuf;

use clap::Parser;

use xml_relay::config::{load_config, validate_config, ConfigError, RelayConfig};
use xml_relay::lifecycle::startup;

#[derive(Parser)]
#[command(name = "xml-relay")]
#[command(about = "Relay XML POSTs to the URL named in their <redirect_url> element", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RelayConfig::default(),
    };

    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
        validate_config(&config).map_err(ConfigError::Validation)?;
    }

    startup::run(config).await?;
    Ok(())
}
