//! Serializable custom resources that are submitted to the cluster. Core Kubernetes types come
//! from the `kubernetes` models, the Shipwright and Tekton types are defined here because only a
//! small part of their API is used.

pub mod shipwright;
pub mod tekton;

use serde::{Deserialize, Serialize};

/// A reference to an object in the same namespace by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalObjectReference {
    pub name: String,
}
