//! Ingress watcher core
//!
//! This library provides:
//! - Read-through caches over the watched Ingresses, Services and Secrets
//! - Backend and TLS certificate resolution
//! - Snapshot rebuilding, debounced across bursts of watch events
//! - The watcher that ties the three watches to one consumer callback

pub mod builder;
pub mod config;
pub mod credentials;
pub mod debounce;
pub mod error;
pub mod resolver;
pub mod snapshot;
pub mod store;
pub mod tls;
pub mod watcher;

#[cfg(test)]
mod fixtures;

pub use builder::SnapshotBuilder;
pub use config::WatcherConfig;
pub use credentials::CredentialLoader;
pub use debounce::Debouncer;
pub use error::{ListError, ResolveError, TlsError, WatchError};
pub use resolver::ServiceResolver;
pub use snapshot::{IngressPayload, PortMap, Snapshot};
pub use store::{Collection, ResourceCache};
pub use watcher::{EventStream, Watcher};
