//! Target resolution
//!
//! Resolves a [`TargetSpec`] to the node hosting the pod and the runtime id
//! of the requested container. Every lookup is a fresh read; nothing is
//! cached between invocations.

use std::fmt;
use thiserror::Error;

use super::identifier::TargetSpec;
use crate::config::ContainerSelection;
use crate::kubernetes::{ClusterTopology, KubeClientError, KubeNode, KubePod};

#[derive(Debug, Error)]
pub enum LocateError {
    #[error("pod {namespace}/{pod} not found")]
    PodNotFound { namespace: String, pod: String },

    #[error("pod {namespace}/{pod} is not scheduled on a node yet")]
    PodNotScheduled { namespace: String, pod: String },

    #[error("node {node} hosting pod {pod} not found")]
    NodeNotFound { node: String, pod: String },

    #[error("pod {pod} has several containers; name one as \"{pod}: <container>\"")]
    ContainerRequired { pod: String },

    #[error("pod {pod} declares no containers")]
    NoContainers { pod: String },

    #[error("container {container} not found in pod {pod}")]
    ContainerNotFound { container: String, pod: String },

    #[error("container {container} in pod {pod} has no runtime id; it has not started")]
    ContainerNotStarted { container: String, pod: String },

    #[error(transparent)]
    Topology(#[from] KubeClientError),
}

/// Where a root shell is opened: the node container to exec into and the
/// runtime container inside it.
///
/// Valid for one invocation only; the pod may move between runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeTarget {
    pub namespace: String,
    pub pod: String,
    pub container: String,
    /// Node name, which is also the k3d node container's name
    pub node: String,
    /// Runtime container id without its engine scheme
    pub container_id: String,
}

impl fmt::Display for BridgeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}: {} on node {} (container {})",
            self.namespace, self.pod, self.container, self.node, self.container_id
        )
    }
}

/// Strip the engine scheme (`containerd://`, `docker://`, `cri-o://`) from a
/// runtime container id
pub fn strip_engine_scheme(container_id: &str) -> &str {
    match container_id.split_once("://") {
        Some((_, id)) => id,
        None => container_id,
    }
}

/// Resolves targets against a cluster
pub struct TargetLocator<'a, T: ?Sized> {
    topology: &'a T,
    selection: ContainerSelection,
}

impl<'a, T> TargetLocator<'a, T>
where
    T: ClusterTopology + ?Sized,
{
    pub fn new(topology: &'a T, selection: ContainerSelection) -> Self {
        Self { topology, selection }
    }

    /// Resolve `spec` to its node and runtime container id.
    ///
    /// `namespace` overrides the current context's namespace.
    pub async fn locate(
        &self,
        spec: &TargetSpec,
        namespace: Option<&str>,
    ) -> Result<BridgeTarget, LocateError> {
        let (pod, node) = self.locate_node(spec, namespace).await?;

        let container = self.container_name(spec, &pod)?;
        let status = pod
            .container_statuses
            .iter()
            .find(|s| s.name == container)
            .ok_or_else(|| LocateError::ContainerNotFound {
                container: container.clone(),
                pod: pod.name.clone(),
            })?;

        let container_id = status
            .container_id
            .as_deref()
            .map(strip_engine_scheme)
            .unwrap_or_default();
        if container_id.is_empty() {
            return Err(LocateError::ContainerNotStarted {
                container,
                pod: pod.name,
            });
        }

        let target = BridgeTarget {
            namespace: pod.namespace,
            pod: pod.name,
            container,
            node: node.name,
            container_id: container_id.to_string(),
        };
        tracing::info!("Resolved target {}", target);
        Ok(target)
    }

    /// Resolve the pod named by `spec` and the node it is scheduled on
    pub async fn locate_node(
        &self,
        spec: &TargetSpec,
        namespace: Option<&str>,
    ) -> Result<(KubePod, KubeNode), LocateError> {
        let namespace = namespace.unwrap_or_else(|| self.topology.current_namespace());
        let pod_name = spec.pod();

        let pod = self
            .topology
            .get_pod(namespace, pod_name)
            .await?
            .ok_or_else(|| LocateError::PodNotFound {
                namespace: namespace.to_string(),
                pod: pod_name.to_string(),
            })?;

        let node_name = pod.node_name.clone().ok_or_else(|| LocateError::PodNotScheduled {
            namespace: namespace.to_string(),
            pod: pod_name.to_string(),
        })?;

        let node = self
            .topology
            .get_node(&node_name)
            .await?
            .ok_or_else(|| LocateError::NodeNotFound {
                node: node_name.clone(),
                pod: pod_name.to_string(),
            })?;

        tracing::debug!("Pod {}/{} runs on node {}", namespace, pod_name, node.name);
        Ok((pod, node))
    }

    fn container_name(&self, spec: &TargetSpec, pod: &KubePod) -> Result<String, LocateError> {
        if let Some(container) = spec.container() {
            return Ok(container.to_string());
        }

        match (self.selection, pod.containers.as_slice()) {
            (_, []) => Err(LocateError::NoContainers { pod: pod.name.clone() }),
            (ContainerSelection::RequireName, [only]) => Ok(only.clone()),
            (ContainerSelection::RequireName, _) => {
                Err(LocateError::ContainerRequired { pod: pod.name.clone() })
            }
            (ContainerSelection::FirstDeclared, [first, ..]) => Ok(first.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_containerd_scheme() {
        assert_eq!(strip_engine_scheme("containerd://deadbeef"), "deadbeef");
    }

    #[test]
    fn test_strip_other_schemes() {
        assert_eq!(strip_engine_scheme("docker://abc"), "abc");
        assert_eq!(strip_engine_scheme("cri-o://abc"), "abc");
    }

    #[test]
    fn test_strip_without_scheme_is_identity() {
        assert_eq!(strip_engine_scheme("deadbeef"), "deadbeef");
        assert_eq!(strip_engine_scheme("containerd://"), "");
    }

    #[test]
    fn test_bridge_target_display() {
        let target = BridgeTarget {
            namespace: "default".to_string(),
            pod: "web-0".to_string(),
            container: "app".to_string(),
            node: "k3d-worker-1".to_string(),
            container_id: "deadbeef".to_string(),
        };
        assert_eq!(
            target.to_string(),
            "default/web-0: app on node k3d-worker-1 (container deadbeef)"
        );
    }
}
