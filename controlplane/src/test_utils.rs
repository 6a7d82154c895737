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

//! In-memory stand-ins for the API server used by unit tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use crate::crd::{DeployVersion, LoadBalance, MicroService, MicroServiceSpec};
use crate::traits::ObjectStore;

use kube::{core::ErrorResponse, Resource, ResourceExt};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Call {
    Get(String),
    Create(String),
    Replace(String),
    List,
    Delete(String),
}

impl Call {
    pub fn is_write(&self) -> bool {
        matches!(self, Call::Create(_) | Call::Replace(_) | Call::Delete(_))
    }
}

pub fn api_error(code: u16, reason: &str) -> kube::Error {
    kube::Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message: format!("injected {reason}"),
        reason: reason.to_string(),
        code,
    })
}

// Keeps objects of a single kind in a single namespace and records every call made against it.
// Creates and replaces assign a new resource version; replacing with a stale one is a conflict.
pub struct FakeStore<K> {
    objects: Mutex<BTreeMap<String, K>>,
    calls: Mutex<Vec<Call>>,
    failures: Mutex<HashMap<Call, (u16, String)>>,
    next_version: Mutex<u64>,
}

impl<K> Default for FakeStore<K> {
    fn default() -> Self {
        Self {
            objects: Mutex::new(BTreeMap::new()),
            calls: Mutex::new(vec![]),
            failures: Mutex::new(HashMap::new()),
            next_version: Mutex::new(1),
        }
    }
}

impl<K: Resource + Clone> FakeStore<K> {
    pub fn new() -> Self {
        Self::default()
    }

    // Stores obj as if it had been created outside of the code under test.
    pub fn seed(&self, mut obj: K) {
        obj.meta_mut().resource_version = Some(self.bump_version());
        self.objects.lock().unwrap().insert(obj.name_any(), obj);
    }

    // Makes the next matching call fail with the provided API error.
    pub fn fail(&self, call: Call, code: u16, reason: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(call, (code, reason.to_string()));
    }

    pub fn object(&self, name: &str) -> Option<K> {
        self.objects.lock().unwrap().get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_write).collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: Call) -> kube::Result<()> {
        self.calls.lock().unwrap().push(call.clone());
        match self.failures.lock().unwrap().remove(&call) {
            Some((code, reason)) => Err(api_error(code, &reason)),
            None => Ok(()),
        }
    }

    fn bump_version(&self) -> String {
        let mut next = self.next_version.lock().unwrap();
        let version = next.to_string();
        *next += 1;
        version
    }
}

impl<K> ObjectStore<K> for FakeStore<K>
where
    K: Resource + Clone + Send + Sync,
{
    async fn get(&self, name: &str) -> kube::Result<K> {
        self.record(Call::Get(name.to_string()))?;
        self.object(name)
            .ok_or_else(|| api_error(404, "NotFound"))
    }

    async fn create(&self, obj: &K) -> kube::Result<K> {
        let name = obj.name_any();
        self.record(Call::Create(name.clone()))?;
        if self.object(&name).is_some() {
            return Err(api_error(409, "AlreadyExists"));
        }
        let mut created = obj.clone();
        created.meta_mut().resource_version = Some(self.bump_version());
        self.objects.lock().unwrap().insert(name, created.clone());
        Ok(created)
    }

    async fn replace(&self, obj: &K) -> kube::Result<K> {
        let name = obj.name_any();
        self.record(Call::Replace(name.clone()))?;
        let current = self
            .object(&name)
            .ok_or_else(|| api_error(404, "NotFound"))?;
        if current.resource_version() != obj.resource_version() {
            return Err(api_error(409, "Conflict"));
        }
        let mut replaced = obj.clone();
        replaced.meta_mut().resource_version = Some(self.bump_version());
        self.objects.lock().unwrap().insert(name, replaced.clone());
        Ok(replaced)
    }

    async fn list(&self) -> kube::Result<Vec<K>> {
        self.record(Call::List)?;
        Ok(self.objects.lock().unwrap().values().cloned().collect())
    }

    async fn delete(&self, name: &str) -> kube::Result<()> {
        self.record(Call::Delete(name.to_string()))?;
        self.objects
            .lock()
            .unwrap()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| api_error(404, "NotFound"))
    }
}

pub fn version_selector(owner: &str, version: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("app".to_string(), owner.to_string()),
        ("version".to_string(), version.to_string()),
    ])
}

// Builds a MicroService in namespace "shop" as returned by the API server.
pub fn microservice(
    name: &str,
    versions: &[&str],
    current_version_name: &str,
    load_balance: Option<LoadBalance>,
) -> MicroService {
    let mut ms = MicroService::new(
        name,
        MicroServiceSpec {
            versions: versions
                .iter()
                .map(|v| DeployVersion {
                    name: v.to_string(),
                    selector: version_selector(name, v),
                })
                .collect(),
            current_version_name: current_version_name.to_string(),
            load_balance,
        },
    );
    ms.metadata.namespace = Some("shop".to_string());
    ms.metadata.uid = Some(format!("uid-{name}"));
    ms.metadata.labels = Some(BTreeMap::from([(
        "team".to_string(),
        "checkout".to_string(),
    )]));
    ms
}
