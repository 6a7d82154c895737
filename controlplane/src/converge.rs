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

use crate::traits::{HasSpec, ObjectStore};
use crate::*;

use kube::{Resource, ResourceExt};

/// What a convergence step did to the live object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConvergeAction {
    Created,
    Updated,
    Unchanged,
}

// Returns true if the provided error is a not found error.
pub fn is_not_found(error: &kube::Error) -> bool {
    matches!(error, kube::Error::Api(response) if response.code == 404)
}

// Brings the live object named after desired in line with it: creates it if it does not exist,
// otherwise copies the desired spec onto the live object and replaces it if the specs differ or
// the live object lacks one of the desired owner references.
//
// Only the spec and missing owner references are carried over on update; the rest of the live
// object's metadata, including its resource version, is kept so that the API server rejects the
// write if the object changed since it was read.
//
// Specs are compared in full, so fields the API server defaults on its side (e.g. a Service's
// clusterIP) make the live object differ from one that leaves them unset.
pub async fn converge<K, S>(store: &S, desired: &K) -> Result<ConvergeAction>
where
    K: Resource + HasSpec + Clone,
    S: ObjectStore<K>,
{
    let name = desired.name_any();
    let mut found = match store.get(&name).await {
        Ok(found) => found,
        Err(err) if is_not_found(&err) => {
            store.create(desired).await.map_err(Error::KubeError)?;
            return Ok(ConvergeAction::Created);
        }
        Err(err) => return Err(Error::KubeError(err)),
    };

    let missing_owners: Vec<_> = desired
        .owner_references()
        .iter()
        .filter(|owner| !found.owner_references().iter().any(|r| r.uid == owner.uid))
        .cloned()
        .collect();

    if found.spec() == desired.spec() && missing_owners.is_empty() {
        return Ok(ConvergeAction::Unchanged);
    }

    *found.spec_mut() = desired.spec().cloned();
    found
        .meta_mut()
        .owner_references
        .get_or_insert_with(Vec::new)
        .extend(missing_owners);
    store.replace(&found).await.map_err(Error::KubeError)?;
    Ok(ConvergeAction::Updated)
}
