//! Cert Cache - command line access to the certificate cache
//!
//! Usage:
//!   cert_cache get NAME          write the decoded record to stdout
//!   cert_cache put NAME FILE     store the contents of FILE under NAME
//!   cert_cache delete NAME       delete the record
//!   cert_cache probe             write, read, list and delete a throwaway record

use std::io::Write;

use anyhow::{bail, Context};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cert_cache::cache::deadline_token;
use cert_cache::{CacheClient, Config};

const PROBE_NAME: &str = "cert-cache-probe";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cert_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = Config::from_env();
    info!(
        "Configuration loaded: redis_addr={}, namespace={}, policy={:?}, op_timeout={}ms",
        config.redis_addr, config.namespace, config.index_policy, config.op_timeout_ms
    );

    let client = CacheClient::connect(&config)
        .await
        .with_context(|| format!("connecting to {}", config.redis_addr))?;

    let root = CancellationToken::new();
    tokio::spawn(cancel_on_ctrl_c(root.clone()));
    let token = deadline_token(&root, config.op_timeout());

    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["get", name] => {
            let data = client
                .get(&token, name)
                .await
                .with_context(|| format!("reading {}", name))?;
            std::io::stdout()
                .write_all(&data)
                .context("writing record to stdout")?;
        }
        ["put", name, file] => {
            let data = tokio::fs::read(file)
                .await
                .with_context(|| format!("reading {}", file))?;
            client
                .put(&token, name, &data)
                .await
                .with_context(|| format!("storing {}", name))?;
            info!("Stored {} ({} bytes)", name, data.len());
        }
        ["delete", name] => {
            client
                .delete(&token, name)
                .await
                .with_context(|| format!("deleting {}", name))?;
            info!("Deleted {}", name);
        }
        ["probe"] => probe(&client, &token).await?,
        _ => bail!("usage: cert_cache <get NAME | put NAME FILE | delete NAME | probe>"),
    }

    Ok(())
}

/// Exercises every operation against the configured store and prints the
/// resulting counters as JSON.
async fn probe(client: &CacheClient, token: &CancellationToken) -> anyhow::Result<()> {
    let payload = b"cert-cache probe payload";

    client.put(token, PROBE_NAME, payload).await.context("probe put")?;
    let read = client.get(token, PROBE_NAME).await.context("probe get")?;
    if read != payload {
        bail!("probe read back {} bytes that differ from what was written", read.len());
    }

    let all = client.get_all(token).await.context("probe get_all")?;
    info!("Enumerated {} record(s)", all.len());

    client.delete(token, PROBE_NAME).await.context("probe delete")?;
    match client.get(token, PROBE_NAME).await {
        Err(err) if err.is_miss() => {}
        Ok(_) => bail!("probe record still present after delete"),
        Err(err) => return Err(err).context("probe get after delete"),
    }

    let stats = client.stats().await;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

/// Cancels `token` when Ctrl+C is received.
async fn cancel_on_ctrl_c(token: CancellationToken) {
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Received Ctrl+C, cancelling in-flight operation...");
            token.cancel();
        }
        Err(err) => warn!("Failed to install Ctrl+C handler: {}", err),
    }
}
