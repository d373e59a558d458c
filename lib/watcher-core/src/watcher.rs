//! Watches Ingresses, Services and Secrets and delivers snapshots

use crate::debounce::stopped;
use crate::{Collection, Debouncer, Snapshot, SnapshotBuilder, WatchError, WatcherConfig};
use futures::future::join_all;
use futures::stream::BoxStream;
use futures::StreamExt;
use k8s_openapi::api::core::v1::{Secret, Service};
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::NamespaceResourceScope;
use kube::{Api, Client, Resource};
use kube_runtime::reflector::{self, store::Writer};
use kube_runtime::{watcher, WatchStreamExt};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Stream of watch events for one collection
pub type EventStream<K> = BoxStream<'static, watcher::Result<watcher::Event<K>>>;

/// Keeps a [`Snapshot`] of Ingresses, their backend Services and their TLS
/// Secrets up to date, calling `on_change` after every successful rebuild.
pub struct Watcher<F> {
    config: WatcherConfig,
    ingresses: EventStream<Ingress>,
    services: EventStream<Service>,
    secrets: EventStream<Secret>,
    on_change: F,
}

impl<F> Watcher<F>
where
    F: Fn(Snapshot) + Send + Sync + 'static,
{
    /// Watch the cluster behind `client`
    pub fn new(client: Client, config: WatcherConfig, on_change: F) -> Self {
        let namespace = config.namespace.as_deref();

        let mut ingress_config = watcher::Config::default();
        if let Some(selector) = config.ingress_label_selector.as_deref() {
            ingress_config = ingress_config.labels(selector);
        }

        let ingresses = watch_stream(api::<Ingress>(&client, namespace), ingress_config);
        let services = watch_stream(api::<Service>(&client, namespace), watcher::Config::default());
        let secrets = watch_stream(api::<Secret>(&client, namespace), watcher::Config::default());

        Self::from_streams(config, ingresses, services, secrets, on_change)
    }

    /// Build a watcher over arbitrary event streams
    pub fn from_streams(
        config: WatcherConfig,
        ingresses: EventStream<Ingress>,
        services: EventStream<Service>,
        secrets: EventStream<Secret>,
        on_change: F,
    ) -> Self {
        Self {
            config,
            ingresses,
            services,
            secrets,
            on_change,
        }
    }

    /// Run until `shutdown` turns true (or its sender is dropped).
    ///
    /// Returns only after every delivery loop and the rebuild task have
    /// stopped. A rebuild that is already running is allowed to finish.
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> Result<(), WatchError> {
        self.config.validate()?;

        let (ingress_cache, ingress_writer) = Collection::<Ingress>::new("ingresses");
        let (service_cache, service_writer) = Collection::<Service>::new("services");
        let (secret_cache, secret_writer) = Collection::<Secret>::new("secrets");

        let builder = SnapshotBuilder::new(
            Arc::new(ingress_cache.clone()),
            Arc::new(service_cache.clone()),
            Arc::new(secret_cache.clone()),
        );
        let on_change = Arc::new(self.on_change);

        // Certificate parsing and the consumer callback stay off the async workers
        let (debouncer, rebuild_task) = Debouncer::spawn(self.config.debounce, shutdown.clone(), move || {
            let builder = builder.clone();
            let on_change = on_change.clone();
            async move {
                let result =
                    tokio::task::spawn_blocking(move || rebuild(&builder, on_change.as_ref())).await;
                if let Err(e) = result {
                    error!("Snapshot rebuild task failed: {}", e);
                }
            }
        });

        let mut tasks = vec![
            tokio::spawn(deliver(
                self.ingresses,
                ingress_writer,
                ingress_cache,
                debouncer.clone(),
                shutdown.clone(),
            )),
            tokio::spawn(deliver(
                self.services,
                service_writer,
                service_cache,
                debouncer.clone(),
                shutdown.clone(),
            )),
            tokio::spawn(deliver(
                self.secrets,
                secret_writer,
                secret_cache,
                debouncer.clone(),
                shutdown.clone(),
            )),
        ];

        if let Some(period) = self.config.resync_interval {
            tasks.push(tokio::spawn(resync(period, debouncer.clone(), shutdown.clone())));
        }

        info!(
            "Watching ingresses, services and secrets in {}",
            self.config.namespace.as_deref().unwrap_or("all namespaces")
        );

        let results = join_all(tasks).await;
        let rebuild_result = rebuild_task.await;

        for result in results {
            result?;
        }
        rebuild_result?;

        info!("Watcher stopped");
        Ok(())
    }
}

fn api<K>(client: &Client, namespace: Option<&str>) -> Api<K>
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>,
{
    match namespace {
        Some(ns) => Api::namespaced(client.clone(), ns),
        None => Api::all(client.clone()),
    }
}

fn watch_stream<K>(api: Api<K>, config: watcher::Config) -> EventStream<K>
where
    K: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug + Send + 'static,
{
    watcher(api, config).default_backoff().boxed()
}

fn rebuild<F: Fn(Snapshot)>(builder: &SnapshotBuilder, on_change: &F) {
    match builder.build() {
        Ok(snapshot) => {
            info!(
                ingresses = snapshot.ingresses.len(),
                certificates = snapshot.tls_certificates.len(),
                "Snapshot rebuilt"
            );
            on_change(snapshot);
        }
        Err(e) => error!("Failed to build snapshot: {}", e),
    }
}

/// Apply one collection's events to its cache and signal a rebuild for each
async fn deliver<K>(
    events: EventStream<K>,
    writer: Writer<K>,
    collection: Collection<K>,
    debouncer: Debouncer,
    mut shutdown: watch::Receiver<bool>,
) where
    K: Resource<DynamicType = ()> + Clone + Send + Sync + 'static,
{
    let kind = collection.kind();
    let mut events = reflector::reflector(writer, events).boxed();

    loop {
        tokio::select! {
            biased;
            _ = stopped(&mut shutdown) => break,
            event = events.next() => match event {
                Some(Ok(event)) => {
                    if matches!(event, watcher::Event::InitDone) {
                        collection.mark_synced();
                        info!(kind, objects = collection.len(), "Initial sync complete");
                    }
                    debouncer.signal();
                }
                Some(Err(e)) => warn!(kind, "Watch error: {}", e),
                None => {
                    warn!(kind, "Watch stream ended");
                    break;
                }
            }
        }
    }

    debug!(kind, "Delivery loop stopped");
}

async fn resync(period: Duration, debouncer: Debouncer, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(period);
    // The first tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            biased;
            _ = stopped(&mut shutdown) => break,
            _ = ticker.tick() => {
                debug!("Periodic resync");
                debouncer.signal();
            }
        }
    }
}
