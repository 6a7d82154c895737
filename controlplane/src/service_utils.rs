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

use std::collections::BTreeMap;

use crate::{
    consts::VERSION_SERVICE_SEPARATOR,
    crd::{DeployVersion, IngressLoadBalance, MicroService},
    *,
};

use k8s_openapi::api::core::v1::{Service, ServiceSpec};
use k8s_openapi::api::networking::v1::Ingress;
use kube::{core::ObjectMeta, Resource, ResourceExt};

// Builds a Service with the provided identity and labels whose spec is a copy of svc_spec.
pub fn make_service(
    name: &str,
    namespace: &str,
    labels: &BTreeMap<String, String>,
    svc_spec: &ServiceSpec,
) -> Service {
    Service {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(labels.clone()),
            ..ObjectMeta::default()
        },
        spec: Some(svc_spec.clone()),
        status: None,
    }
}

// Builds the Ingress described by the provided load balancing configuration.
pub fn make_ingress(
    ingress_lb: &IngressLoadBalance,
    namespace: &str,
    labels: &BTreeMap<String, String>,
) -> Ingress {
    Ingress {
        metadata: ObjectMeta {
            name: Some(ingress_lb.name.clone()),
            namespace: Some(namespace.to_string()),
            labels: Some(labels.clone()),
            ..ObjectMeta::default()
        },
        spec: Some(ingress_lb.spec.clone()),
        status: None,
    }
}

// Returns a copy of the shared Service spec selecting only the pods of the provided version.
pub fn version_service_spec(shared: &ServiceSpec, version: &DeployVersion) -> ServiceSpec {
    let mut spec = shared.clone();
    spec.selector = Some(version.selector.clone());
    spec
}

pub fn version_service_name(owner: &str, version: &str) -> String {
    format!("{owner}{VERSION_SERVICE_SEPARATOR}{version}")
}

// Marks the provided MicroService as the controlling owner of obj, so the object is garbage
// collected when the MicroService is deleted.
pub fn set_owner<K: Resource<DynamicType = ()>>(
    obj: &mut K,
    owner: &MicroService,
) -> Result<()> {
    let owner_ref = owner
        .controller_owner_ref(&())
        .ok_or_else(|| Error::OwnerReferenceError {
            kind: K::kind(&()).to_string(),
            name: obj.name_any(),
        })?;

    let owner_refs = obj.meta_mut().owner_references.get_or_insert_with(Vec::new);
    match owner_refs.iter_mut().find(|r| r.uid == owner_ref.uid) {
        Some(existing) => *existing = owner_ref,
        None => owner_refs.push(owner_ref),
    }
    Ok(())
}

// Returns true if obj is controlled by the provided MicroService.
pub fn is_owned_by<K: Resource>(obj: &K, owner: &MicroService) -> bool {
    let Some(uid) = owner.meta().uid.as_deref() else {
        return false;
    };
    obj.owner_references()
        .iter()
        .any(|r| r.uid == uid && r.controller == Some(true))
}
