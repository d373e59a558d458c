//! Resolve Ingress backends to Service port maps

use crate::{PortMap, ResolveError, ResourceCache};
use k8s_openapi::api::core::v1::Service;
use std::sync::Arc;

/// Looks up backend Services in the Service cache
#[derive(Clone)]
pub struct ServiceResolver {
    services: Arc<dyn ResourceCache<Service>>,
}

impl ServiceResolver {
    pub fn new(services: Arc<dyn ResourceCache<Service>>) -> Self {
        Self { services }
    }

    /// Every named port of Service `namespace/name`.
    ///
    /// The backend's own port selector is not applied; callers pick the
    /// port they need from the full map.
    pub fn resolve(&self, namespace: &str, name: &str) -> Result<PortMap, ResolveError> {
        let service = self
            .services
            .get(namespace, name)
            .ok_or_else(|| ResolveError::ServiceNotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })?;

        let ports = service
            .spec
            .as_ref()
            .and_then(|spec| spec.ports.as_ref())
            .map(|ports| {
                ports
                    .iter()
                    .map(|port| (port.name.clone().unwrap_or_default(), port.port))
                    .collect()
            })
            .unwrap_or_default();

        Ok(ports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{service, MemoryCache};

    #[test]
    fn test_resolve_returns_all_ports() {
        let cache = MemoryCache::new(vec![service("ns", "api", &[("http", 80), ("https", 443)])]);
        let resolver = ServiceResolver::new(cache);

        let ports = resolver.resolve("ns", "api").unwrap();
        assert_eq!(ports.len(), 2);
        assert_eq!(ports["http"], 80);
        assert_eq!(ports["https"], 443);
    }

    #[test]
    fn test_resolve_missing_service() {
        let cache = MemoryCache::new(vec![service("other", "api", &[("http", 80)])]);
        let resolver = ServiceResolver::new(cache);

        let result = resolver.resolve("ns", "api");
        assert!(matches!(
            result,
            Err(ResolveError::ServiceNotFound { ref namespace, ref name }) if namespace == "ns" && name == "api"
        ));
    }

    #[test]
    fn test_resolve_unnamed_port() {
        let svc: Service = serde_json::from_value(serde_json::json!({
            "metadata": { "namespace": "ns", "name": "single" },
            "spec": { "ports": [{ "port": 8080 }] }
        }))
        .unwrap();
        let resolver = ServiceResolver::new(MemoryCache::new(vec![svc]));

        let ports = resolver.resolve("ns", "single").unwrap();
        assert_eq!(ports.get(""), Some(&8080));
    }

    #[test]
    fn test_resolve_service_without_spec() {
        let svc: Service = serde_json::from_value(serde_json::json!({
            "metadata": { "namespace": "ns", "name": "bare" }
        }))
        .unwrap();
        let resolver = ServiceResolver::new(MemoryCache::new(vec![svc]));

        assert!(resolver.resolve("ns", "bare").unwrap().is_empty());
    }
}
