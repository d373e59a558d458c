//! Correlates Ingresses, Services and Secrets into a Snapshot

use crate::{CredentialLoader, IngressPayload, ListError, ResourceCache, ServiceResolver, Snapshot};
use k8s_openapi::api::core::v1::{Secret, Service};
use k8s_openapi::api::networking::v1::{Ingress, IngressBackend};
use kube::ResourceExt;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Rebuilds a full [`Snapshot`] from the current state of all three caches
#[derive(Clone)]
pub struct SnapshotBuilder {
    ingresses: Arc<dyn ResourceCache<Ingress>>,
    resolver: ServiceResolver,
    credentials: CredentialLoader,
}

impl SnapshotBuilder {
    pub fn new(
        ingresses: Arc<dyn ResourceCache<Ingress>>,
        services: Arc<dyn ResourceCache<Service>>,
        secrets: Arc<dyn ResourceCache<Secret>>,
    ) -> Self {
        Self {
            ingresses,
            resolver: ServiceResolver::new(services),
            credentials: CredentialLoader::new(secrets),
        }
    }

    /// Build a snapshot.
    ///
    /// Fails only if the Ingress cache cannot be listed. Missing services,
    /// missing secrets and unparsable certificates are logged and left out.
    pub fn build(&self) -> Result<Snapshot, ListError> {
        let ingresses = self.ingresses.list()?;

        let mut snapshot = Snapshot::default();
        let mut loaded_secrets = HashSet::new();

        for ingress in ingresses {
            let namespace = ingress.namespace().unwrap_or_default();
            let mut payload = IngressPayload::new(ingress.clone());

            if let Some(spec) = ingress.spec.as_ref() {
                if let Some(backend) = spec.default_backend.as_ref() {
                    self.add_backend(&mut payload, &namespace, backend);
                }

                for rule in spec.rules.iter().flatten() {
                    // A rule without http content contributes no backends
                    let Some(http) = rule.http.as_ref() else {
                        debug!(
                            namespace = %namespace,
                            ingress = %ingress.name_any(),
                            host = rule.host.as_deref().unwrap_or("*"),
                            "skipping rule without http paths"
                        );
                        continue;
                    };
                    for path in &http.paths {
                        self.add_backend(&mut payload, &namespace, &path.backend);
                    }
                }

                for tls in spec.tls.iter().flatten() {
                    let Some(secret_name) = tls.secret_name.as_deref().filter(|n| !n.is_empty()) else {
                        continue;
                    };
                    if !loaded_secrets.insert((namespace.clone(), secret_name.to_string())) {
                        continue;
                    }
                    match self.credentials.load(&namespace, secret_name) {
                        Ok(certificate) => {
                            snapshot
                                .tls_certificates
                                .insert(secret_name.to_string(), certificate);
                        }
                        Err(e) => {
                            warn!(namespace = %namespace, name = %secret_name, "skipping tls secret: {}", e);
                        }
                    }
                }
            }

            snapshot.ingresses.push(payload);
        }

        debug!(
            "Built snapshot with {} ingresses and {} certificates",
            snapshot.ingresses.len(),
            snapshot.tls_certificates.len()
        );
        Ok(snapshot)
    }

    fn add_backend(&self, payload: &mut IngressPayload, namespace: &str, backend: &IngressBackend) {
        let Some(service) = backend.service.as_ref() else {
            debug!(namespace = %namespace, "ignoring non-service backend");
            return;
        };

        match self.resolver.resolve(namespace, &service.name) {
            Ok(ports) => {
                payload.service_ports.insert(service.name.clone(), ports);
            }
            Err(e) => {
                warn!(namespace = %namespace, name = %service.name, "unknown service: {}", e);
            }
        }
    }
}
