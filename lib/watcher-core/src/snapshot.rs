//! Snapshot types handed to the consumer after every rebuild

use k8s_openapi::api::networking::v1::Ingress;
use kube::ResourceExt;
use rustls::sign::CertifiedKey;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Port name to port number for a single Service
pub type PortMap = HashMap<String, i32>;

/// An Ingress together with the ports of every Service it references
/// that could be resolved at build time.
#[derive(Clone, Debug)]
pub struct IngressPayload {
    pub ingress: Arc<Ingress>,
    /// Keyed by Service name. Unresolved services are absent.
    pub service_ports: HashMap<String, PortMap>,
}

impl IngressPayload {
    pub fn new(ingress: Arc<Ingress>) -> Self {
        Self {
            ingress,
            service_ports: HashMap::new(),
        }
    }

    pub fn namespace(&self) -> String {
        self.ingress.namespace().unwrap_or_default()
    }

    pub fn name(&self) -> String {
        self.ingress.name_any()
    }

    /// Port number of `port_name` on `service`, if it was resolved
    pub fn port(&self, service: &str, port_name: &str) -> Option<i32> {
        self.service_ports.get(service)?.get(port_name).copied()
    }
}

/// An immutable, fully rebuilt view of every Ingress and every TLS
/// certificate that could be loaded.
#[derive(Clone, Default)]
pub struct Snapshot {
    /// In the order the Ingress cache listed them.
    pub ingresses: Vec<IngressPayload>,
    /// Keyed by Secret name only; equal names in different namespaces collide.
    pub tls_certificates: HashMap<String, Arc<CertifiedKey>>,
}

impl Snapshot {
    /// Find the payload for a single Ingress
    pub fn ingress(&self, namespace: &str, name: &str) -> Option<&IngressPayload> {
        self.ingresses
            .iter()
            .find(|p| p.ingress.namespace().as_deref() == Some(namespace) && p.ingress.name_any() == name)
    }

    pub fn certificate(&self, secret_name: &str) -> Option<&Arc<CertifiedKey>> {
        self.tls_certificates.get(secret_name)
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut certificates: Vec<_> = self.tls_certificates.keys().collect();
        certificates.sort();
        f.debug_struct("Snapshot")
            .field(
                "ingresses",
                &self
                    .ingresses
                    .iter()
                    .map(|p| format!("{}/{}", p.namespace(), p.name()))
                    .collect::<Vec<_>>(),
            )
            .field("tls_certificates", &certificates)
            .finish()
    }
}
