//! Watcher configuration

use crate::WatchError;
use std::time::Duration;

pub const ENV_DEBOUNCE_MS: &str = "WATCHER_DEBOUNCE_MS";
pub const ENV_NAMESPACE: &str = "WATCHER_NAMESPACE";
pub const ENV_INGRESS_SELECTOR: &str = "WATCHER_INGRESS_SELECTOR";
pub const ENV_RESYNC_SECS: &str = "WATCHER_RESYNC_SECS";

/// Watcher configuration
#[derive(Clone, Debug, PartialEq)]
pub struct WatcherConfig {
    /// Quiet period after the last change before a rebuild runs
    pub debounce: Duration,
    /// Restrict all three watches to one namespace
    pub namespace: Option<String>,
    /// Label selector applied to the Ingress watch
    pub ingress_label_selector: Option<String>,
    /// Rebuild periodically even without changes. `None` disables it.
    pub resync_interval: Option<Duration>,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_secs(1),
            namespace: None,
            ingress_label_selector: None,
            resync_interval: Some(Duration::from_secs(60)),
        }
    }
}

impl WatcherConfig {
    /// Read configuration from `WATCHER_*` environment variables
    pub fn from_env() -> Result<Self, WatchError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, WatchError> {
        let mut config = Self::default();

        if let Some(ms) = lookup(ENV_DEBOUNCE_MS) {
            config.debounce = Duration::from_millis(parse_number(ENV_DEBOUNCE_MS, &ms)?);
        }
        if let Some(secs) = lookup(ENV_RESYNC_SECS) {
            let secs = parse_number(ENV_RESYNC_SECS, &secs)?;
            config.resync_interval = (secs > 0).then(|| Duration::from_secs(secs));
        }
        config.namespace = lookup(ENV_NAMESPACE).filter(|ns| !ns.is_empty());
        config.ingress_label_selector = lookup(ENV_INGRESS_SELECTOR).filter(|s| !s.is_empty());

        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration can drive a watcher
    pub fn validate(&self) -> Result<(), WatchError> {
        if self.debounce.is_zero() {
            return Err(WatchError::Config("debounce window must be greater than zero".into()));
        }
        if self.resync_interval.is_some_and(|interval| interval.is_zero()) {
            return Err(WatchError::Config("resync interval must be greater than zero".into()));
        }
        Ok(())
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64, WatchError> {
    value
        .trim()
        .parse()
        .map_err(|e| WatchError::Config(format!("{}={:?}: {}", key, value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = WatcherConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, WatcherConfig::default());
        assert_eq!(config.debounce, Duration::from_secs(1));
    }

    #[test]
    fn test_reads_all_variables() {
        let config = WatcherConfig::from_lookup(lookup(&[
            (ENV_DEBOUNCE_MS, "250"),
            (ENV_NAMESPACE, "edge"),
            (ENV_INGRESS_SELECTOR, "app=web"),
            (ENV_RESYNC_SECS, "60"),
        ]))
        .unwrap();

        assert_eq!(config.debounce, Duration::from_millis(250));
        assert_eq!(config.namespace.as_deref(), Some("edge"));
        assert_eq!(config.ingress_label_selector.as_deref(), Some("app=web"));
        assert_eq!(config.resync_interval, Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_default_resyncs_every_minute() {
        let config = WatcherConfig::default();
        assert_eq!(config.resync_interval, Some(Duration::from_secs(60)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_resync_disables_it() {
        let config = WatcherConfig::from_lookup(lookup(&[(ENV_RESYNC_SECS, "0")])).unwrap();
        assert_eq!(config.resync_interval, None);
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(WatcherConfig::from_lookup(lookup(&[(ENV_DEBOUNCE_MS, "soon")])).is_err());
        assert!(WatcherConfig::from_lookup(lookup(&[(ENV_DEBOUNCE_MS, "0")])).is_err());
    }

    #[test]
    fn test_empty_namespace_means_all() {
        let config = WatcherConfig::from_lookup(lookup(&[(ENV_NAMESPACE, "")])).unwrap();
        assert_eq!(config.namespace, None);
    }
}
