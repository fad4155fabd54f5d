//! Root shell targets
//!
//! Parsing operator identifiers, detecting a k3d cluster and resolving a pod
//! container to the node and runtime id the bridge needs.

pub mod identifier;
pub mod locality;
pub mod locator;

pub use identifier::{IdentifierError, TargetSpec};
pub use locality::{has_supported_node, is_supported_topology};
pub use locator::{strip_engine_scheme, BridgeTarget, LocateError, TargetLocator};
