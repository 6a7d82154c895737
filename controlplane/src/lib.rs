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

use kube::Client;
use thiserror::Error;

pub use microservice_controller::controller as microservice_controller;

pub mod config;
pub mod consts;
pub mod converge;
pub mod crd;
pub mod loadbalance;
mod microservice_controller;
pub mod service_utils;
pub mod traits;

#[cfg(test)]
mod test_utils;

// Context for our reconciler
#[derive(Clone)]
pub struct Context {
    /// Kubernetes client
    pub client: Client,
    /// Runtime configuration of the controller
    pub config: config::Config,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("kube error: {0}")]
    KubeError(#[source] kube::Error),
    #[error("invalid configuration: `{0}`")]
    InvalidConfigError(String),
    #[error("unable to set owner reference on {kind} `{name}`: owner has no name or uid")]
    OwnerReferenceError { kind: String, name: String },
    #[error("error querying MicroService CRD: `{0}`; is the CRD installed?")]
    CRDNotFoundError(#[source] kube::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamespacedName {
    pub name: String,
    pub namespace: String,
}

impl std::fmt::Display for NamespacedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}
