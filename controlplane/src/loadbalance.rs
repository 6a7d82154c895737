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

//! Converges the Services and Ingress that route traffic to a MicroService.
//!
//! A MicroService with load balancing configured gets:
//!
//! * a shared Service named after the MicroService, selecting the current
//!   version's pods unless an explicit selector is configured;
//! * an Ingress, if one is configured;
//! * one Service per declared version, named `<microservice>-<version>`,
//!   derived from the shared Service's spec. These only exist while the
//!   shared Service is configured.
//!
//! Every object is owned by the MicroService and is therefore garbage
//! collected with it. Per-version Services whose version has been removed
//! from the MicroService are deleted.

use std::fmt;

use crate::{
    consts::VERSION_SERVICE_SEPARATOR,
    converge::{converge, is_not_found, ConvergeAction},
    crd::{DeployVersion, LoadBalance, MicroService, MicroServiceSpec},
    service_utils::*,
    traits::ObjectStore,
    *,
};

use k8s_openapi::api::core::v1::Service;
use k8s_openapi::api::networking::v1::Ingress;
use kube::{Resource, ResourceExt};

/// What a reconciliation did to a single managed object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectAction {
    Created,
    Updated,
    Unchanged,
    Deleted,
}

impl From<ConvergeAction> for ObjectAction {
    fn from(action: ConvergeAction) -> Self {
        match action {
            ConvergeAction::Created => Self::Created,
            ConvergeAction::Updated => Self::Updated,
            ConvergeAction::Unchanged => Self::Unchanged,
        }
    }
}

impl fmt::Display for ObjectAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Updated => write!(f, "updated"),
            Self::Unchanged => write!(f, "unchanged"),
            Self::Deleted => write!(f, "deleted"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Converged {
    pub kind: String,
    pub key: NamespacedName,
    pub action: ObjectAction,
}

/// Every managed object touched by a reconciliation, in the order they were processed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadBalanceReport {
    pub converged: Vec<Converged>,
}

impl LoadBalanceReport {
    fn record<K, A>(&mut self, obj: &K, action: A)
    where
        K: Resource<DynamicType = ()>,
        A: Into<ObjectAction>,
    {
        self.converged.push(Converged {
            kind: K::kind(&()).to_string(),
            key: NamespacedName {
                name: obj.name_any(),
                namespace: obj.namespace().unwrap_or_default(),
            },
            action: action.into(),
        });
    }

    // Returns true if any object was written.
    pub fn changed(&self) -> bool {
        self.converged
            .iter()
            .any(|c| c.action != ObjectAction::Unchanged)
    }

    #[cfg(test)]
    pub fn action_for(&self, kind: &str, name: &str) -> Option<ObjectAction> {
        self.converged
            .iter()
            .find(|c| c.kind == kind && c.key.name == name)
            .map(|c| c.action)
    }
}

// Returns the version whose name is current_version_name, or the first declared version if
// none matches. Returns None only if no versions are declared.
pub fn resolve_current_version(spec: &MicroServiceSpec) -> Option<&DeployVersion> {
    spec.version(&spec.current_version_name)
        .or_else(|| spec.versions.first())
}

pub async fn reconcile_load_balance<S, I>(
    microservice: &MicroService,
    services: &S,
    ingresses: &I,
) -> Result<LoadBalanceReport>
where
    S: ObjectStore<Service>,
    I: ObjectStore<Ingress>,
{
    let mut report = LoadBalanceReport::default();

    let Some(current_version) = resolve_current_version(&microservice.spec) else {
        return Ok(report);
    };

    let name = microservice
        .metadata
        .name
        .as_deref()
        .ok_or(Error::InvalidConfigError("invalid name".to_string()))?;

    let ns = microservice
        .metadata
        .namespace
        .as_deref()
        .ok_or(Error::InvalidConfigError("invalid namespace".to_string()))?;

    let labels = microservice.labels();

    let default_lb = LoadBalance::default();
    let lb = microservice.spec.load_balance.as_ref().unwrap_or(&default_lb);

    let shared_spec = lb.service.as_ref().map(|svc_lb| {
        let mut spec = svc_lb.spec.clone();
        spec.selector
            .get_or_insert_with(|| current_version.selector.clone());
        spec
    });

    if let Some(spec) = &shared_spec {
        let mut svc = make_service(name, ns, labels, spec);
        set_owner(&mut svc, microservice)?;
        let action = converge(services, &svc).await?;
        report.record(&svc, action);
    }

    if let Some(ingress_lb) = &lb.ingress {
        let mut ingress = make_ingress(ingress_lb, ns, labels);
        set_owner(&mut ingress, microservice)?;
        let action = converge(ingresses, &ingress).await?;
        report.record(&ingress, action);
    }

    // Per-version Services are templated from the shared Service.
    let Some(shared_spec) = shared_spec else {
        return Ok(report);
    };

    for version in &microservice.spec.versions {
        let mut svc = make_service(
            &version_service_name(name, &version.name),
            ns,
            labels,
            &version_service_spec(&shared_spec, version),
        );
        set_owner(&mut svc, microservice)?;
        let action = converge(services, &svc).await?;
        report.record(&svc, action);
    }

    prune_version_services(microservice, name, services, &mut report).await?;

    Ok(report)
}

// Deletes the per-version Services owned by the MicroService whose version is no longer declared.
async fn prune_version_services<S>(
    microservice: &MicroService,
    name: &str,
    services: &S,
    report: &mut LoadBalanceReport,
) -> Result<()>
where
    S: ObjectStore<Service>,
{
    let prefix = format!("{name}{VERSION_SERVICE_SEPARATOR}");
    let orphans: Vec<Service> = services
        .list()
        .await
        .map_err(Error::KubeError)?
        .into_iter()
        .filter(|svc| is_owned_by(svc, microservice))
        .filter(|svc| {
            svc.name_any()
                .strip_prefix(&prefix)
                .is_some_and(|version| microservice.spec.version(version).is_none())
        })
        .collect();

    for svc in orphans {
        match services.delete(&svc.name_any()).await {
            Ok(()) => report.record(&svc, ObjectAction::Deleted),
            Err(err) if is_not_found(&err) => {}
            Err(err) => return Err(Error::KubeError(err)),
        }
    }
    Ok(())
}
