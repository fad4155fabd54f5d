//! Target resolution tests
//!
//! Drive the locality check and the target locator against a fake cluster.


use k3droot::config::ContainerSelection;
use k3droot::kubernetes::KubeContainerStatus;
use k3droot::target::{is_supported_topology, LocateError, TargetLocator, TargetSpec};

use test_utils::*;

// ============================================================================
// Locality Tests
// ============================================================================

#[tokio::test]
async fn test_k3d_cluster_is_supported() {
    let cluster = create_k3d_cluster();
    assert!(is_supported_topology(&cluster, "k3d").await.unwrap());
    assert_eq!(cluster.calls(), vec!["list_nodes"]);
}

#[tokio::test]
async fn test_gke_cluster_is_not_supported() {
    let cluster = FakeTopology::new(
        &[
            "gke-cluster-default-pool-8f3e2a1b-abcd",
            "gke-cluster-default-pool-8f3e2a1b-efgh",
        ],
        vec![],
    );
    assert!(!is_supported_topology(&cluster, "k3d").await.unwrap());
}

#[tokio::test]
async fn test_mixed_node_order_does_not_matter() {
    for names in [
        ["k3d-server-0", "gke-node-1"],
        ["gke-node-1", "k3d-server-0"],
    ] {
        let cluster = FakeTopology::new(&names, vec![]);
        assert!(is_supported_topology(&cluster, "k3d").await.unwrap());
    }
}

#[tokio::test]
async fn test_node_list_failure_is_propagated() {
    let mut cluster = create_k3d_cluster();
    cluster.fail_list_nodes = true;
    assert!(is_supported_topology(&cluster, "k3d").await.is_err());
}

// ============================================================================
// Locator Success Tests
// ============================================================================

#[tokio::test]
async fn test_locate_strips_engine_scheme() {
    let cluster = create_k3d_cluster();
    let locator = TargetLocator::new(&cluster, ContainerSelection::FirstDeclared);

    let spec = TargetSpec::parse("web-0: app").unwrap();
    let target = locator.locate(&spec, None).await.unwrap();

    assert_eq!(target.node, "k3d-worker-1");
    assert_eq!(target.container_id, "deadbeef");
    assert_eq!(target.namespace, "default");
    assert_eq!(target.pod, "web-0");
    assert_eq!(target.container, "app");
}

#[tokio::test]
async fn test_bare_pod_matches_named_single_container() {
    let cluster = create_k3d_cluster();
    let locator = TargetLocator::new(&cluster, ContainerSelection::FirstDeclared);

    let bare = locator
        .locate(&TargetSpec::parse("web-0").unwrap(), None)
        .await
        .unwrap();
    let named = locator
        .locate(&TargetSpec::parse("web-0: app").unwrap(), None)
        .await
        .unwrap();

    assert_eq!(bare, named);
}

#[tokio::test]
async fn test_bare_pod_takes_first_declared_container() {
    let mut pod = create_test_pod(
        "api-0",
        "k3d-server-0",
        &[("api", "containerd://aaa"), ("envoy", "containerd://bbb")],
    );
    // Status order differs from declaration order
    pod.container_statuses.reverse();
    let cluster = FakeTopology::new(&["k3d-server-0"], vec![pod]);
    let locator = TargetLocator::new(&cluster, ContainerSelection::FirstDeclared);

    let target = locator
        .locate(&TargetSpec::parse("api-0").unwrap(), None)
        .await
        .unwrap();
    assert_eq!(target.container, "api");
    assert_eq!(target.container_id, "aaa");
}

#[tokio::test]
async fn test_locate_uses_current_namespace() {
    let mut pod = create_web_pod();
    pod.namespace = "shop".to_string();
    let cluster = FakeTopology::new(&["k3d-worker-1"], vec![pod]).with_namespace("shop");
    let locator = TargetLocator::new(&cluster, ContainerSelection::FirstDeclared);

    let target = locator
        .locate(&TargetSpec::parse("web-0").unwrap(), None)
        .await
        .unwrap();
    assert_eq!(target.namespace, "shop");
    assert!(cluster.calls().contains(&"get_pod shop/web-0".to_string()));
}

#[tokio::test]
async fn test_explicit_namespace_overrides_current() {
    let mut pod = create_web_pod();
    pod.namespace = "staging".to_string();
    let cluster = FakeTopology::new(&["k3d-worker-1"], vec![pod]);
    let locator = TargetLocator::new(&cluster, ContainerSelection::FirstDeclared);

    let target = locator
        .locate(&TargetSpec::parse("web-0: app").unwrap(), Some("staging"))
        .await
        .unwrap();
    assert_eq!(target.namespace, "staging");
    assert_eq!(
        cluster.calls(),
        vec!["get_pod staging/web-0", "get_node k3d-worker-1"]
    );
}

#[tokio::test]
async fn test_require_name_accepts_single_container_pod() {
    let cluster = create_k3d_cluster();
    let locator = TargetLocator::new(&cluster, ContainerSelection::RequireName);

    let target = locator
        .locate(&TargetSpec::parse("web-0").unwrap(), None)
        .await
        .unwrap();
    assert_eq!(target.container, "app");
}

// ============================================================================
// Locator Failure Tests
// ============================================================================

#[tokio::test]
async fn test_missing_pod_is_not_found() {
    let cluster = create_k3d_cluster();
    let locator = TargetLocator::new(&cluster, ContainerSelection::FirstDeclared);

    let err = locator
        .locate(&TargetSpec::parse("web-9: app").unwrap(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, LocateError::PodNotFound { ref pod, .. } if pod == "web-9"));
    assert_eq!(cluster.calls(), vec!["get_pod default/web-9"]);
}

#[tokio::test]
async fn test_unscheduled_pod_is_not_found() {
    let mut pod = create_web_pod();
    pod.node_name = None;
    pod.phase = "Pending".to_string();
    let cluster = FakeTopology::new(&["k3d-worker-1"], vec![pod]);
    let locator = TargetLocator::new(&cluster, ContainerSelection::FirstDeclared);

    let err = locator
        .locate(&TargetSpec::parse("web-0").unwrap(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, LocateError::PodNotScheduled { .. }));
}

#[tokio::test]
async fn test_missing_node_is_not_found() {
    let cluster = FakeTopology::new(&["k3d-server-0"], vec![create_web_pod()]);
    let locator = TargetLocator::new(&cluster, ContainerSelection::FirstDeclared);

    let err = locator
        .locate(&TargetSpec::parse("web-0").unwrap(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, LocateError::NodeNotFound { ref node, .. } if node == "k3d-worker-1"));
}

#[tokio::test]
async fn test_unknown_container_names_pod_and_container() {
    let cluster = create_k3d_cluster();
    let locator = TargetLocator::new(&cluster, ContainerSelection::FirstDeclared);

    for container in ["db", "App", "app2"] {
        let spec = TargetSpec::parse(&format!("web-0: {}", container)).unwrap();
        let err = locator.locate(&spec, None).await.unwrap_err();

        assert!(matches!(err, LocateError::ContainerNotFound { .. }));
        let message = err.to_string();
        assert!(message.contains("web-0"), "{}", message);
        assert!(message.contains(container), "{}", message);
    }
}

#[tokio::test]
async fn test_container_without_runtime_id_is_not_started() {
    let mut pod = create_web_pod();
    pod.container_statuses = vec![KubeContainerStatus {
        name: "app".to_string(),
        container_id: None,
    }];
    let cluster = FakeTopology::new(&["k3d-worker-1"], vec![pod]);
    let locator = TargetLocator::new(&cluster, ContainerSelection::FirstDeclared);

    let err = locator
        .locate(&TargetSpec::parse("web-0: app").unwrap(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, LocateError::ContainerNotStarted { .. }));
}

#[tokio::test]
async fn test_scheme_only_runtime_id_is_not_started() {
    let pod = create_test_pod("web-0", "k3d-worker-1", &[("app", "containerd://")]);
    let cluster = FakeTopology::new(&["k3d-worker-1"], vec![pod]);
    let locator = TargetLocator::new(&cluster, ContainerSelection::FirstDeclared);

    let err = locator
        .locate(&TargetSpec::parse("web-0: app").unwrap(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, LocateError::ContainerNotStarted { .. }));
}

#[tokio::test]
async fn test_declared_container_without_status_is_not_found() {
    let mut pod = create_web_pod();
    pod.container_statuses.clear();
    let cluster = FakeTopology::new(&["k3d-worker-1"], vec![pod]);
    let locator = TargetLocator::new(&cluster, ContainerSelection::FirstDeclared);

    let err = locator
        .locate(&TargetSpec::parse("web-0").unwrap(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, LocateError::ContainerNotFound { ref container, .. } if container == "app"));
}

#[tokio::test]
async fn test_require_name_rejects_bare_multi_container_pod() {
    let pod = create_test_pod(
        "api-0",
        "k3d-server-0",
        &[("api", "containerd://aaa"), ("envoy", "containerd://bbb")],
    );
    let cluster = FakeTopology::new(&["k3d-server-0"], vec![pod]);
    let locator = TargetLocator::new(&cluster, ContainerSelection::RequireName);

    let err = locator
        .locate(&TargetSpec::parse("api-0").unwrap(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, LocateError::ContainerRequired { .. }));
}

#[tokio::test]
async fn test_pod_without_containers() {
    let pod = create_test_pod("empty-0", "k3d-server-0", &[]);
    let cluster = FakeTopology::new(&["k3d-server-0"], vec![pod]);
    let locator = TargetLocator::new(&cluster, ContainerSelection::FirstDeclared);

    let err = locator
        .locate(&TargetSpec::parse("empty-0").unwrap(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, LocateError::NoContainers { .. }));
}
