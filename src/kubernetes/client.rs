//! Kubernetes API client
//!
//! Wraps the kube crate to provide the read-only node and pod queries the
//! target resolution needs.

use std::path::PathBuf;
use async_trait::async_trait;
use kube::{
    api::{Api, ListParams},
    config::{KubeConfigOptions, Kubeconfig},
    Client, Config,
};
use k8s_openapi::api::core::v1::{Node, Pod};
use thiserror::Error;

use super::config::{KubeConfig, KubeConfigError};

#[derive(Debug, Error)]
pub enum KubeClientError {
    #[error("Kubernetes API error: {0}")]
    ClientError(#[from] kube::Error),
    #[error("Failed to load config: {0}")]
    ConfigError(#[from] kube::config::KubeconfigError),
    #[error(transparent)]
    Kubeconfig(#[from] KubeConfigError),
}

/// A container status reported by the kubelet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KubeContainerStatus {
    pub name: String,
    /// Runtime id including its engine scheme, e.g. `containerd://<id>`.
    /// None until the container has been created.
    pub container_id: Option<String>,
}

/// A Kubernetes pod
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KubePod {
    pub name: String,
    pub namespace: String,
    pub phase: String,
    /// Node the scheduler assigned the pod to
    pub node_name: Option<String>,
    /// Container names in declaration order
    pub containers: Vec<String>,
    pub container_statuses: Vec<KubeContainerStatus>,
}

impl KubePod {
    pub fn is_running(&self) -> bool {
        self.phase == "Running"
    }
}

/// A Kubernetes node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KubeNode {
    pub name: String,
}

/// Read-only view of the cluster used to resolve a root shell target.
///
/// `get_pod` and `get_node` return `Ok(None)` when the object does not exist;
/// every other failure is an error.
#[async_trait]
pub trait ClusterTopology: Send + Sync {
    async fn list_nodes(&self) -> Result<Vec<KubeNode>, KubeClientError>;

    async fn get_pod(&self, namespace: &str, name: &str) -> Result<Option<KubePod>, KubeClientError>;

    async fn get_node(&self, name: &str) -> Result<Option<KubeNode>, KubeClientError>;

    /// Pods in `namespace` whose phase is Running
    async fn list_running_pods(&self, namespace: &str) -> Result<Vec<KubePod>, KubeClientError>;

    /// Namespace of the operator's current context
    fn current_namespace(&self) -> &str;
}

/// How to build a [`KubeClient`]
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Explicit kubeconfig path; None merges `KUBECONFIG` or reads ~/.kube/config
    pub kubeconfig: Option<PathBuf>,
    /// Context to use instead of the current one
    pub context: Option<String>,
    /// Namespace used when the context does not set one
    pub fallback_namespace: String,
}

impl ClientOptions {
    /// Load the kubeconfig and work out the namespace of the selected
    /// context, falling back to `fallback_namespace`
    pub fn load_kubeconfig(&self) -> Result<(Kubeconfig, String), KubeConfigError> {
        let kubeconfig = KubeConfig::load(self.kubeconfig.as_deref())?;
        let namespace = kubeconfig
            .context_namespace(self.context.as_deref())?
            .unwrap_or(self.fallback_namespace.as_str())
            .to_string();
        Ok((kubeconfig.into_inner(), namespace))
    }
}

/// Kubernetes API client
pub struct KubeClient {
    client: Client,
    namespace: String,
}

impl KubeClient {
    /// Create a client from the kubeconfig described by `options`
    pub async fn new(options: &ClientOptions) -> Result<Self, KubeClientError> {
        let start = std::time::Instant::now();

        let (kubeconfig, namespace) = options.load_kubeconfig()?;
        let context = options
            .context
            .clone()
            .or_else(|| kubeconfig.current_context.clone());

        let config_options = KubeConfigOptions {
            context: options.context.clone(),
            ..Default::default()
        };
        let config = Config::from_custom_kubeconfig(kubeconfig, &config_options).await?;
        let client = Client::try_from(config)?;

        tracing::debug!(
            "K8s client (context {:?}, namespace {}) created in {:?}",
            context,
            namespace,
            start.elapsed()
        );

        Ok(Self { client, namespace })
    }

    /// Convert a k8s Pod to our KubePod type
    fn convert_pod(pod: Pod) -> KubePod {
        let name = pod.metadata.name.unwrap_or_default();
        let namespace = pod.metadata.namespace.unwrap_or_default();

        let (node_name, containers) = match pod.spec {
            Some(spec) => (
                spec.node_name.filter(|n| !n.is_empty()),
                spec.containers.into_iter().map(|c| c.name).collect(),
            ),
            None => (None, vec![]),
        };

        let (phase, container_statuses) = match pod.status {
            Some(status) => {
                let phase = status.phase.unwrap_or_else(|| "Unknown".to_string());
                let statuses = status.container_statuses.unwrap_or_default()
                    .into_iter()
                    .map(|c| KubeContainerStatus {
                        name: c.name,
                        container_id: c.container_id,
                    })
                    .collect();
                (phase, statuses)
            }
            None => ("Unknown".to_string(), vec![]),
        };

        KubePod {
            name,
            namespace,
            phase,
            node_name,
            containers,
            container_statuses,
        }
    }

    fn convert_node(node: Node) -> KubeNode {
        KubeNode {
            name: node.metadata.name.unwrap_or_default(),
        }
    }
}

#[async_trait]
impl ClusterTopology for KubeClient {
    async fn list_nodes(&self) -> Result<Vec<KubeNode>, KubeClientError> {
        let start = std::time::Instant::now();
        let nodes: Api<Node> = Api::all(self.client.clone());
        let list = nodes.list(&ListParams::default()).await?;
        tracing::debug!("list_nodes API call took {:?}", start.elapsed());

        Ok(list.items.into_iter().map(Self::convert_node).collect())
    }

    async fn get_pod(&self, namespace: &str, name: &str) -> Result<Option<KubePod>, KubeClientError> {
        let start = std::time::Instant::now();
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let pod = pods.get_opt(name).await?;
        tracing::debug!("get_pod({}/{}) API call took {:?}", namespace, name, start.elapsed());

        Ok(pod.map(Self::convert_pod))
    }

    async fn get_node(&self, name: &str) -> Result<Option<KubeNode>, KubeClientError> {
        let nodes: Api<Node> = Api::all(self.client.clone());
        let node = nodes.get_opt(name).await?;
        Ok(node.map(Self::convert_node))
    }

    async fn list_running_pods(&self, namespace: &str) -> Result<Vec<KubePod>, KubeClientError> {
        let start = std::time::Instant::now();
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let list = pods.list(&ListParams::default()).await?;
        tracing::debug!("list_pods({}) API call took {:?}", namespace, start.elapsed());

        Ok(list.items.into_iter()
            .map(Self::convert_pod)
            .filter(KubePod::is_running)
            .collect())
    }

    fn current_namespace(&self) -> &str {
        &self.namespace
    }
}
