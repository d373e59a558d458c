use anyhow::Result;
use kube::Client;
use tokio::sync::watch;
use tracing::{debug, error, info};
use tracing_subscriber::fmt::init as tracing_init;
use watcher_core::{Snapshot, Watcher, WatcherConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_init();

    info!("Starting ingress-watcher...");

    let config = WatcherConfig::from_env()?;
    debug!("Watcher configuration: {:?}", config);

    let client = Client::try_default().await?;
    let watcher = Watcher::new(client, config, log_snapshot);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received, stopping watcher..."),
            Err(e) => error!("Failed to listen for shutdown signal: {}", e),
        }
        let _ = shutdown_tx.send(true);
    });

    watcher.run(shutdown_rx).await?;

    info!("ingress-watcher exited");
    Ok(())
}

fn log_snapshot(snapshot: Snapshot) {
    info!(
        "Received snapshot with {} ingresses and {} certificates",
        snapshot.ingresses.len(),
        snapshot.tls_certificates.len()
    );

    for payload in &snapshot.ingresses {
        let hosts: Vec<String> = payload
            .ingress
            .spec
            .iter()
            .flat_map(|spec| spec.rules.iter().flatten())
            .filter_map(|rule| rule.host.clone())
            .collect();

        info!(
            ingress = %format!("{}/{}", payload.namespace(), payload.name()),
            hosts = ?hosts,
            services = ?payload.service_ports,
            "Ingress resolved"
        );
    }
}
