//! The root shell workflow
//!
//! check cluster -> choose target -> resolve pod/node/container -> build
//! runtime exec -> open the session on the node. Each stage needs the fresh
//! result of the previous one, so any failure ends the invocation.

use thiserror::Error;

use crate::config::{AppConfig, ConfigError};
use crate::kubernetes::{ClusterTopology, KubeClientError};
use crate::picker::{picker_entries, picker_title, PickerError, TargetPicker};
use crate::target::{
    is_supported_topology, BridgeTarget, IdentifierError, LocateError, TargetLocator, TargetSpec,
};
use crate::terminal::{BridgeError, RuntimeExec, SessionLauncher};

/// Category of a [`RootError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnsupportedTopology,
    NoTargetSelected,
    InvalidTarget,
    TargetNotFound,
    ContainerNotFound,
    BridgeFailure,
    Cluster,
    Config,
}

/// Errors that end a root shell invocation
#[derive(Debug, Error)]
pub enum RootError {
    #[error("Not a k3d cluster: no node name starts with {prefix:?}")]
    UnsupportedTopology { prefix: String },

    #[error("No target selected")]
    NoTargetSelected,

    #[error("Invalid target: {0}")]
    InvalidTarget(#[from] IdentifierError),

    #[error(transparent)]
    Locate(#[from] LocateError),

    #[error("Bridge to node {node} failed: {source}")]
    Bridge {
        node: String,
        #[source]
        source: BridgeError,
    },

    #[error(transparent)]
    Engine(BridgeError),

    #[error(transparent)]
    Cluster(#[from] KubeClientError),

    #[error(transparent)]
    Picker(#[from] PickerError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl RootError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RootError::UnsupportedTopology { .. } => ErrorKind::UnsupportedTopology,
            RootError::NoTargetSelected | RootError::Picker(_) => ErrorKind::NoTargetSelected,
            RootError::InvalidTarget(_) => ErrorKind::InvalidTarget,
            RootError::Locate(err) => match err {
                LocateError::PodNotFound { .. }
                | LocateError::PodNotScheduled { .. }
                | LocateError::NodeNotFound { .. } => ErrorKind::TargetNotFound,
                LocateError::NoContainers { .. }
                | LocateError::ContainerNotFound { .. }
                | LocateError::ContainerNotStarted { .. } => ErrorKind::ContainerNotFound,
                LocateError::ContainerRequired { .. } => ErrorKind::InvalidTarget,
                LocateError::Topology(_) => ErrorKind::Cluster,
            },
            RootError::Bridge { .. } | RootError::Engine(_) => ErrorKind::BridgeFailure,
            RootError::Cluster(_) => ErrorKind::Cluster,
            RootError::Config(_) => ErrorKind::Config,
        }
    }
}

/// What the operator asked for
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    /// `"<pod>"` or `"<pod>: <container>"`; None opens the picker
    pub target: Option<String>,
    /// Namespace override; None uses the current context's namespace
    pub namespace: Option<String>,
    /// Command to run; empty runs the default shell
    pub command: Vec<String>,
    /// Open the session on the pod's node instead of inside the container
    pub on_node: bool,
}

/// Runs root shell invocations against injected collaborators
pub struct RootShell<'a, T: ?Sized, L: ?Sized> {
    topology: &'a T,
    launcher: &'a L,
    config: &'a AppConfig,
}

impl<'a, T, L> RootShell<'a, T, L>
where
    T: ClusterTopology + ?Sized,
    L: SessionLauncher + ?Sized,
{
    pub fn new(topology: &'a T, launcher: &'a L, config: &'a AppConfig) -> Self {
        Self { topology, launcher, config }
    }

    /// Run one invocation to completion.
    ///
    /// Blocks for the lifetime of the remote session and returns the target
    /// it was opened on.
    pub async fn run(
        &self,
        invocation: &Invocation,
        picker: &dyn TargetPicker,
    ) -> Result<BridgeTarget, RootError> {
        self.ensure_supported_topology().await?;

        let namespace = invocation.namespace.as_deref();
        let identifier = match &invocation.target {
            Some(target) => target.clone(),
            None => self.select_target(namespace, picker).await?,
        };
        let spec = TargetSpec::parse(&identifier)?;

        let locator = TargetLocator::new(self.topology, self.config.target.container_selection);
        let runtime = RuntimeExec::new(&self.config.runtime);

        let (target, command) = if invocation.on_node {
            let (pod, node) = locator.locate_node(&spec, namespace).await?;
            let target = BridgeTarget {
                namespace: pod.namespace,
                pod: pod.name,
                container: spec.container().unwrap_or_default().to_string(),
                node: node.name,
                container_id: String::new(),
            };
            (target, runtime.build_node_command(&invocation.command))
        } else {
            let target = locator.locate(&spec, namespace).await?;
            let command = runtime.build_exec_command(&target.container_id, &invocation.command);
            (target, command)
        };

        if invocation.on_node {
            eprintln!("gaining root access into node: {}", target.node);
        } else {
            eprintln!("gaining root access into: {}: {}", target.pod, target.container);
        }
        tracing::debug!("Launching {:?} on node {}", command, target.node);

        self.launcher
            .open_interactive_session(&target.node, &command)
            .await
            .map_err(|source| RootError::Bridge {
                node: target.node.clone(),
                source,
            })?;

        Ok(target)
    }

    /// Fail with [`RootError::UnsupportedTopology`] unless the cluster is k3d
    pub async fn ensure_supported_topology(&self) -> Result<(), RootError> {
        let prefix = &self.config.cluster.node_prefix;
        if is_supported_topology(self.topology, prefix).await? {
            Ok(())
        } else {
            Err(RootError::UnsupportedTopology { prefix: prefix.clone() })
        }
    }

    async fn select_target(
        &self,
        namespace: Option<&str>,
        picker: &dyn TargetPicker,
    ) -> Result<String, RootError> {
        let namespace = namespace.unwrap_or_else(|| self.topology.current_namespace());
        let pods = self.topology.list_running_pods(namespace).await?;
        let entries = picker_entries(&pods);

        picker
            .pick(&picker_title(pods.len(), namespace), &entries)?
            .filter(|choice| !choice.trim().is_empty())
            .ok_or(RootError::NoTargetSelected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_errors_map_to_taxonomy() {
        let not_found = RootError::from(LocateError::PodNotFound {
            namespace: "default".to_string(),
            pod: "web-0".to_string(),
        });
        assert_eq!(not_found.kind(), ErrorKind::TargetNotFound);

        let unscheduled = RootError::from(LocateError::PodNotScheduled {
            namespace: "default".to_string(),
            pod: "web-0".to_string(),
        });
        assert_eq!(unscheduled.kind(), ErrorKind::TargetNotFound);

        let not_started = RootError::from(LocateError::ContainerNotStarted {
            container: "app".to_string(),
            pod: "web-0".to_string(),
        });
        assert_eq!(not_started.kind(), ErrorKind::ContainerNotFound);

        let required = RootError::from(LocateError::ContainerRequired {
            pod: "web-0".to_string(),
        });
        assert_eq!(required.kind(), ErrorKind::InvalidTarget);
    }

    #[test]
    fn test_bridge_error_names_node() {
        let err = RootError::Bridge {
            node: "k3d-dev-agent-0".to_string(),
            source: BridgeError::Detached,
        };
        assert_eq!(err.kind(), ErrorKind::BridgeFailure);
        assert!(err.to_string().contains("k3d-dev-agent-0"));
    }

    #[test]
    fn test_unsupported_topology_message() {
        let err = RootError::UnsupportedTopology { prefix: "k3d".to_string() };
        assert_eq!(err.kind(), ErrorKind::UnsupportedTopology);
        assert_eq!(err.to_string(), "Not a k3d cluster: no node name starts with \"k3d\"");
    }
}
