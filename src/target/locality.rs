//! k3d cluster detection
//!
//! The bridge execs into node containers on the local Docker engine, which
//! only works when the nodes themselves are k3d containers.

use crate::kubernetes::{ClusterTopology, KubeClientError, KubeNode};

/// Returns true if any node name starts with `prefix`
pub fn has_supported_node(nodes: &[KubeNode], prefix: &str) -> bool {
    nodes.iter().any(|node| node.name.starts_with(prefix))
}

/// Check whether the cluster behind `topology` is a k3d cluster.
///
/// Errors from listing nodes are propagated unchanged.
pub async fn is_supported_topology<T>(topology: &T, prefix: &str) -> Result<bool, KubeClientError>
where
    T: ClusterTopology + ?Sized,
{
    let nodes = topology.list_nodes().await?;
    let supported = has_supported_node(&nodes, prefix);
    tracing::debug!(
        "{} node(s) listed, supported topology (prefix {:?}): {}",
        nodes.len(),
        prefix,
        supported
    );
    Ok(supported)
}
