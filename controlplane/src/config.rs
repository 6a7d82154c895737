/*
Copyright 2024 The Kubernetes Authors.

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

use std::time::Duration;

use crate::consts::{
    DEFAULT_DEBOUNCE_MILLIS, DEFAULT_ERROR_REQUEUE_SECS, DEFAULT_RESYNC_INTERVAL_SECS,
};

use clap::Parser;

#[derive(Debug, Parser, Clone)]
#[clap(name = "controller", about = "Reconciles MicroService load balancing resources")]
pub struct Config {
    /// Only watch MicroServices in this namespace. Watches all namespaces if unset.
    #[clap(short, long, env = "KUBESERVICE_NAMESPACE")]
    pub namespace: Option<String>,

    /// Seconds between periodic resyncs of a MicroService that reconciled successfully.
    #[clap(long, env = "KUBESERVICE_RESYNC_INTERVAL_SECS", default_value_t = DEFAULT_RESYNC_INTERVAL_SECS)]
    pub resync_interval_secs: u64,

    /// Seconds to wait before retrying a MicroService that failed to reconcile.
    #[clap(long, env = "KUBESERVICE_ERROR_REQUEUE_SECS", default_value_t = DEFAULT_ERROR_REQUEUE_SECS)]
    pub error_requeue_secs: u64,

    /// Milliseconds to wait for further changes to a MicroService or the objects it owns
    /// before reconciling it.
    #[clap(long, env = "KUBESERVICE_DEBOUNCE_MILLIS", default_value_t = DEFAULT_DEBOUNCE_MILLIS)]
    pub debounce_millis: u64,

    /// Print the MicroService CustomResourceDefinition as YAML and exit.
    #[clap(long)]
    pub crd: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            namespace: None,
            resync_interval_secs: DEFAULT_RESYNC_INTERVAL_SECS,
            error_requeue_secs: DEFAULT_ERROR_REQUEUE_SECS,
            debounce_millis: DEFAULT_DEBOUNCE_MILLIS,
            crd: false,
        }
    }
}

impl Config {
    pub fn resync_interval(&self) -> Duration {
        Duration::from_secs(self.resync_interval_secs)
    }

    pub fn error_requeue(&self) -> Duration {
        Duration::from_secs(self.error_requeue_secs)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["controller"]).unwrap();
        assert_eq!(config.namespace, None);
        assert_eq!(config.resync_interval(), Duration::from_secs(300));
        assert_eq!(config.error_requeue(), Duration::from_secs(5));
        assert_eq!(config.debounce(), Duration::from_millis(500));
        assert!(!config.crd);
    }

    #[test]
    fn flags() {
        let config = Config::try_parse_from([
            "controller",
            "--namespace",
            "shop",
            "--resync-interval-secs",
            "30",
            "--error-requeue-secs",
            "1",
            "--debounce-millis",
            "0",
            "--crd",
        ])
        .unwrap();
        assert_eq!(config.namespace.as_deref(), Some("shop"));
        assert_eq!(config.resync_interval(), Duration::from_secs(30));
        assert_eq!(config.error_requeue(), Duration::from_secs(1));
        assert_eq!(config.debounce(), Duration::ZERO);
        assert!(config.crd);
    }
}
