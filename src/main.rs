//! cfx-send - submit one transaction intent read from stdin
//!
//! Settings come from the TOML file named by `CFX_SENDER_CONFIG`. Private
//! keys listed in `wallet.private_key_envs` are loaded for local signing;
//! any other sender is signed by the node.

use anyhow::{Context, Result};
use cfx_tx_sender::config::{LoggingConfig, Settings};
use cfx_tx_sender::{
    metrics, Credential, HttpTransport, LocalKeyring, TransactionIntent, TransactionSender,
};
use std::io::Read;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load()?;

    // Initialize logging
    init_logging(&settings.logging);

    info!("Starting cfx-send v{}", env!("CARGO_PKG_VERSION"));

    let transport = HttpTransport::new(&settings.rpc).context("Failed to set up RPC transport")?;
    info!("Using RPC endpoint {}", transport.active_url());

    let keyring = Arc::new(load_keyring(&settings)?);
    info!("Loaded {} local account(s)", keyring.len());

    let password = settings
        .wallet
        .password_env
        .as_deref()
        .and_then(|name| std::env::var(name).ok())
        .map(Credential::new);

    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read intent from stdin")?;
    let intent = TransactionIntent::from_json(&input)?;

    let sender = TransactionSender::new(Arc::new(transport), keyring, &settings.sender);
    let result = sender.send_transaction(&intent, password.as_ref()).await;

    if settings.metrics.enabled {
        debug!("Metrics:\n{}", metrics::render());
    }

    let tx_hash = result.context("Transaction was not sent")?;
    println!("{:#x}", tx_hash);
    Ok(())
}

fn load_keyring(settings: &Settings) -> Result<LocalKeyring> {
    let keyring = LocalKeyring::new();

    for name in &settings.wallet.private_key_envs {
        let Ok(key) = std::env::var(name) else {
            warn!("Private key variable {} is not set, skipping", name);
            continue;
        };
        let account = keyring
            .add_private_key(&key)
            .with_context(|| format!("Invalid private key in {}", name))?;
        info!("Local account {:#x} from {}", account.address(), name);
    }

    Ok(keyring)
}

fn init_logging(config: &LoggingConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,cfx_tx_sender=debug"));

    // Logs go to stderr; stdout carries only the hash
    let registry = tracing_subscriber::registry().with(filter);
    if config.json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
