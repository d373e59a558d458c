//! Shared test fixtures

use crate::{ListError, ResourceCache};
use k8s_openapi::api::core::v1::{Secret, Service};
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::ByteString;
use kube::ResourceExt;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

pub const CERT: &[u8] = include_bytes!("../testdata/tls.crt");
pub const KEY: &[u8] = include_bytes!("../testdata/tls.key");
pub const OTHER_KEY: &[u8] = include_bytes!("../testdata/other.key");

/// In-memory cache whose listing can be made to fail
pub struct MemoryCache<K> {
    items: RwLock<Vec<Arc<K>>>,
    fail_listing: AtomicBool,
}

impl<K: kube::Resource> MemoryCache<K> {
    pub fn new(items: Vec<K>) -> Arc<Self> {
        Arc::new(Self {
            items: RwLock::new(items.into_iter().map(Arc::new).collect()),
            fail_listing: AtomicBool::new(false),
        })
    }

    pub fn set_fail_listing(&self, fail: bool) {
        self.fail_listing.store(fail, Ordering::SeqCst);
    }

    pub fn insert(&self, item: K) {
        self.items.write().unwrap().push(Arc::new(item));
    }
}

impl<K: kube::Resource + Send + Sync> ResourceCache<K> for MemoryCache<K> {
    fn list(&self) -> Result<Vec<Arc<K>>, ListError> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(ListError::NotSynced("memory"));
        }
        Ok(self.items.read().unwrap().clone())
    }

    fn get(&self, namespace: &str, name: &str) -> Option<Arc<K>> {
        self.items
            .read()
            .unwrap()
            .iter()
            .find(|item| item.namespace().as_deref() == Some(namespace) && item.name_any() == name)
            .cloned()
    }
}

pub fn service(namespace: &str, name: &str, ports: &[(&str, i32)]) -> Service {
    let ports: Vec<Value> = ports
        .iter()
        .map(|(port_name, port)| json!({ "name": port_name, "port": port }))
        .collect();
    serde_json::from_value(json!({
        "metadata": { "namespace": namespace, "name": name },
        "spec": { "ports": ports }
    }))
    .unwrap()
}

pub fn tls_secret(namespace: &str, name: &str, cert: &[u8], key: &[u8]) -> Secret {
    let mut data = BTreeMap::new();
    data.insert("tls.crt".to_string(), ByteString(cert.to_vec()));
    data.insert("tls.key".to_string(), ByteString(key.to_vec()));
    let mut secret: Secret = serde_json::from_value(json!({
        "metadata": { "namespace": namespace, "name": name },
        "type": "kubernetes.io/tls"
    }))
    .unwrap();
    secret.data = Some(data);
    secret
}

/// Build an Ingress from a JSON `spec` value
pub fn ingress(namespace: &str, name: &str, spec: Value) -> Ingress {
    serde_json::from_value(json!({
        "metadata": { "namespace": namespace, "name": name },
        "spec": spec
    }))
    .unwrap()
}

pub fn backend(service: &str, port_name: &str) -> Value {
    json!({ "service": { "name": service, "port": { "name": port_name } } })
}
