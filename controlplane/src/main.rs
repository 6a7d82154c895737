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

use controlplane::{config::Config, crd::MicroService, *};

use anyhow::Context as _;
use clap::Parser;
use kube::{Client, CustomResourceExt};
use tracing::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    if config.crd {
        let crd = serde_yaml::to_string(&MicroService::crd())
            .context("failed to serialize MicroService CRD")?;
        println!("{crd}");
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let client = Client::try_default()
        .await
        .context("failed to create kube Client")?;

    info!(
        namespace = config.namespace.as_deref().unwrap_or("*"),
        "starting microservice controller"
    );

    let ctx = Context { client, config };
    if let Err(error) = microservice_controller(ctx).await {
        error!("failed to start controller: {error:?}");
        std::process::exit(1);
    }
    Ok(())
}
