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

//! The MicroService custom resource.
//!
//! A MicroService declares a set of deployable versions and, optionally, how
//! traffic reaches them: a shared Service, an Ingress, or both.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::ServiceSpec;
use k8s_openapi::api::networking::v1::IngressSpec;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Serialize, Deserialize, Debug, Clone, Default, JsonSchema, PartialEq)]
#[kube(
    group = "app.kubeservice.io",
    version = "v1",
    kind = "MicroService",
    namespaced,
    shortname = "ms"
)]
#[serde(rename_all = "camelCase")]
pub struct MicroServiceSpec {
    /// Versions of the application, in declaration order.
    #[serde(default)]
    pub versions: Vec<DeployVersion>,
    /// Name of the version that currently receives traffic through the
    /// shared Service. Falls back to the first version when it matches none.
    #[serde(default)]
    pub current_version_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_balance: Option<LoadBalance>,
}

/// A single deployable version of a MicroService.
#[derive(Serialize, Deserialize, Debug, Clone, Default, JsonSchema, PartialEq, Eq)]
pub struct DeployVersion {
    pub name: String,
    /// Labels identifying the pods that belong to this version.
    #[serde(default)]
    pub selector: BTreeMap<String, String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, JsonSchema, PartialEq)]
pub struct LoadBalance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<ServiceLoadBalance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingress: Option<IngressLoadBalance>,
}

/// Template for the shared Service and the per-version Services.
///
/// When `spec.selector` is unset the shared Service selects the current
/// version's pods.
#[derive(Serialize, Deserialize, Debug, Clone, Default, JsonSchema, PartialEq)]
pub struct ServiceLoadBalance {
    #[serde(default)]
    pub spec: ServiceSpec,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, JsonSchema, PartialEq)]
pub struct IngressLoadBalance {
    pub name: String,
    #[serde(default)]
    pub spec: IngressSpec,
}

impl MicroServiceSpec {
    pub fn version(&self, name: &str) -> Option<&DeployVersion> {
        self.versions.iter().find(|v| v.name == name)
    }
}
