//! Load TLS certificates referenced by Ingresses

use crate::tls::{parse_key_pair, TLS_CERT_KEY, TLS_PRIVATE_KEY};
use crate::{ResolveError, ResourceCache};
use k8s_openapi::api::core::v1::Secret;
use rustls::sign::CertifiedKey;
use std::sync::Arc;

/// Fetches TLS secrets from the Secret cache and parses them
#[derive(Clone)]
pub struct CredentialLoader {
    secrets: Arc<dyn ResourceCache<Secret>>,
}

impl CredentialLoader {
    pub fn new(secrets: Arc<dyn ResourceCache<Secret>>) -> Self {
        Self { secrets }
    }

    /// Load and parse the key pair stored in Secret `namespace/name`
    pub fn load(&self, namespace: &str, name: &str) -> Result<Arc<CertifiedKey>, ResolveError> {
        let secret = self
            .secrets
            .get(namespace, name)
            .ok_or_else(|| ResolveError::SecretNotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })?;

        let entry = |key: &'static str| {
            secret
                .data
                .as_ref()
                .and_then(|data| data.get(key))
                .map(|bytes| bytes.0.as_slice())
                .ok_or_else(|| ResolveError::MissingSecretKey {
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                    key,
                })
        };

        let cert_pem = entry(TLS_CERT_KEY)?;
        let key_pem = entry(TLS_PRIVATE_KEY)?;

        parse_key_pair(cert_pem, key_pem).map_err(|source| ResolveError::InvalidCertificate {
            namespace: namespace.to_string(),
            name: name.to_string(),
            source,
        })
    }
}
