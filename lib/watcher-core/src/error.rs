use thiserror::Error;

/// Failure to enumerate a whole collection. Aborts the current rebuild.
#[derive(Error, Debug)]
pub enum ListError {
    #[error("{0} cache has not completed its initial sync")]
    NotSynced(&'static str),
}

/// Failure to resolve a single reference. Logged and skipped by the builder.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Service not found: {namespace}/{name}")]
    ServiceNotFound { namespace: String, name: String },

    #[error("Secret not found: {namespace}/{name}")]
    SecretNotFound { namespace: String, name: String },

    #[error("Secret {namespace}/{name} has no {key} entry")]
    MissingSecretKey {
        namespace: String,
        name: String,
        key: &'static str,
    },

    #[error("Invalid TLS certificate in {namespace}/{name}: {source}")]
    InvalidCertificate {
        namespace: String,
        name: String,
        #[source]
        source: TlsError,
    },
}

/// Errors raised while turning PEM material into a certified key.
#[derive(Error, Debug)]
pub enum TlsError {
    #[error("No certificates found in PEM data")]
    NoCertificates,

    #[error("No private key found in PEM data")]
    NoPrivateKey,

    #[error("Failed to read PEM data: {0}")]
    Pem(#[from] std::io::Error),

    #[error("Unsupported private key: {0}")]
    UnsupportedKey(#[from] rustls::Error),

    #[error("Certificate is malformed or does not match the private key: {0}")]
    KeyMismatch(#[source] rustls::Error),
}

/// Errors returned by [`crate::Watcher::run`].
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Invalid watcher configuration: {0}")]
    Config(String),

    #[error("Watcher task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
