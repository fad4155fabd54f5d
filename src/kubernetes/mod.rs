//! Kubernetes integration module
//!
//! Provides kubeconfig loading and the read-only cluster queries used to
//! resolve a pod to its node and runtime container.

pub mod config;
pub mod client;

pub use config::{KubeConfig, KubeConfigError};
pub use client::{
    ClientOptions, ClusterTopology, KubeClient, KubeClientError, KubeContainerStatus, KubeNode,
    KubePod,
};
