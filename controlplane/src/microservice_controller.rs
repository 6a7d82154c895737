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

use std::{
    ops::Sub,
    sync::Arc,
    time::Instant,
};

use crate::{
    crd::MicroService,
    loadbalance::{reconcile_load_balance, LoadBalanceReport, ObjectAction},
    *,
};

use futures::StreamExt;
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::api::networking::v1::Ingress;
use kube::{
    api::{Api, ListParams},
    runtime::{
        controller::{self, Action},
        watcher::Config,
        Controller,
    },
    ResourceExt,
};
use tracing::{debug, info, warn};

pub async fn reconcile(microservice: Arc<MicroService>, ctx: Arc<Context>) -> Result<Action> {
    let start = Instant::now();
    let client = ctx.client.clone();

    let name = microservice.name_any();
    let ns = microservice
        .metadata
        .namespace
        .clone()
        .ok_or(Error::InvalidConfigError("invalid namespace".to_string()))?;

    if microservice.metadata.deletion_timestamp.is_some() {
        debug!("microservice {}/{} is being deleted", ns, name);
        return Ok(Action::await_change());
    }

    let service_api: Api<Service> = Api::namespaced(client.clone(), &ns);
    let ingress_api: Api<Ingress> = Api::namespaced(client, &ns);

    let report = reconcile_load_balance(microservice.as_ref(), &service_api, &ingress_api).await?;
    log_report(&report);

    let duration = Instant::now().sub(start);
    info!(
        microservice = %name,
        namespace = %ns,
        changed = report.changed(),
        "finished reconciling in {:?} ms",
        duration.as_millis()
    );
    Ok(Action::requeue(ctx.config.resync_interval()))
}

fn log_report(report: &LoadBalanceReport) {
    for converged in &report.converged {
        match converged.action {
            ObjectAction::Unchanged => debug!(
                kind = %converged.kind,
                object = %converged.key,
                action = %converged.action,
                "object is up to date"
            ),
            ObjectAction::Created | ObjectAction::Updated | ObjectAction::Deleted => info!(
                kind = %converged.kind,
                object = %converged.key,
                action = %converged.action,
                "{} {} {}",
                converged.action,
                converged.kind,
                converged.key
            ),
        }
    }
}

pub async fn controller(ctx: Context) -> Result<()> {
    let client = ctx.client.clone();
    let (microservices, services, ingresses) = match ctx.config.namespace.as_deref() {
        Some(ns) => (
            Api::<MicroService>::namespaced(client.clone(), ns),
            Api::<Service>::namespaced(client.clone(), ns),
            Api::<Ingress>::namespaced(client, ns),
        ),
        None => (
            Api::<MicroService>::all(client.clone()),
            Api::<Service>::all(client.clone()),
            Api::<Ingress>::all(client),
        ),
    };

    microservices
        .list(&ListParams::default().limit(1))
        .await
        .map_err(Error::CRDNotFoundError)?;

    // Our own writes to owned objects come back as watch events; debouncing coalesces them
    // with the reconcile that caused them.
    let controller_config = controller::Config::default().debounce(ctx.config.debounce());

    Controller::new(microservices, Config::default().any_semantic())
        .with_config(controller_config)
        .owns(services, Config::default())
        .owns(ingresses, Config::default())
        .shutdown_on_signal()
        .run(reconcile, error_policy, Arc::new(ctx))
        .filter_map(|x| async move { std::result::Result::ok(x) })
        .for_each(|_| futures::future::ready(()))
        .await;

    Ok(())
}

fn error_policy(microservice: Arc<MicroService>, error: &Error, ctx: Arc<Context>) -> Action {
    warn!(
        microservice = %microservice.name_any(),
        "reconcile failed: {:?}",
        error
    );
    Action::requeue(ctx.config.error_requeue())
}
