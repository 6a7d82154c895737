use std::fmt::Debug;
use std::future::Future;

use crate::consts::KUBESERVICE_FIELD_MANAGER;

use k8s_openapi::api::core::v1::{Service, ServiceSpec};
use k8s_openapi::api::networking::v1::{Ingress, IngressSpec};
use kube::{
    api::{Api, DeleteParams, ListParams, PostParams},
    Resource, ResourceExt,
};
use serde::{de::DeserializeOwned, Serialize};

// Gives uniform access to the desired-state body of a managed object, so the
// same convergence logic can be used for every kind we manage.
pub trait HasSpec {
    type Spec: Clone + PartialEq + Debug + Send + Sync;

    fn spec(&self) -> Option<&Self::Spec>;
    fn spec_mut(&mut self) -> &mut Option<Self::Spec>;
}

impl HasSpec for Service {
    type Spec = ServiceSpec;

    fn spec(&self) -> Option<&ServiceSpec> {
        self.spec.as_ref()
    }

    fn spec_mut(&mut self) -> &mut Option<ServiceSpec> {
        &mut self.spec
    }
}

impl HasSpec for Ingress {
    type Spec = IngressSpec;

    fn spec(&self) -> Option<&IngressSpec> {
        self.spec.as_ref()
    }

    fn spec_mut(&mut self) -> &mut Option<IngressSpec> {
        &mut self.spec
    }
}

/// Read/write access to the objects of one kind within one namespace.
///
/// Errors are passed through as `kube::Error`; a 404 API error from `get`
/// means the object does not exist. `replace` must be called with an object
/// carrying the resource version it was read at, so that a concurrent
/// modification is rejected by the API server with a conflict.
pub trait ObjectStore<K>: Send + Sync {
    fn get(&self, name: &str) -> impl Future<Output = kube::Result<K>> + Send;
    fn create(&self, obj: &K) -> impl Future<Output = kube::Result<K>> + Send;
    fn replace(&self, obj: &K) -> impl Future<Output = kube::Result<K>> + Send;
    fn list(&self) -> impl Future<Output = kube::Result<Vec<K>>> + Send;
    fn delete(&self, name: &str) -> impl Future<Output = kube::Result<()>> + Send;
}

impl<K> ObjectStore<K> for Api<K>
where
    K: Resource + Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn get(&self, name: &str) -> kube::Result<K> {
        Api::get(self, name).await
    }

    async fn create(&self, obj: &K) -> kube::Result<K> {
        Api::create(self, &post_params(), obj).await
    }

    async fn replace(&self, obj: &K) -> kube::Result<K> {
        Api::replace(self, &obj.name_any(), &post_params(), obj).await
    }

    async fn list(&self) -> kube::Result<Vec<K>> {
        Ok(Api::list(self, &ListParams::default()).await?.items)
    }

    async fn delete(&self, name: &str) -> kube::Result<()> {
        Api::delete(self, name, &DeleteParams::background())
            .await
            .map(|_| ())
    }
}

fn post_params() -> PostParams {
    PostParams {
        field_manager: Some(KUBESERVICE_FIELD_MANAGER.to_string()),
        ..PostParams::default()
    }
}
