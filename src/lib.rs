pub mod app;
pub mod config;
pub mod kubernetes;
pub mod picker;
pub mod target;
pub mod terminal;

pub use app::{ErrorKind, Invocation, RootError, RootShell};
pub use config::AppConfig;
pub use kubernetes::{ClusterTopology, KubeClient};
pub use target::{BridgeTarget, TargetSpec};
pub use terminal::{DockerBridge, SessionLauncher};
