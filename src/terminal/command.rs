//! Runtime exec command construction
//!
//! The command handed to the node container is `sh -c "<runtime> exec ..."`:
//! the outer shell runs on the k3d node, the runtime exec it starts enters
//! the pod container's namespaces as root.

use crate::config::RuntimeSettings;

/// Builds runtime exec commands for one runtime configuration
#[derive(Debug, Clone)]
pub struct RuntimeExec {
    binary: String,
    root: String,
    default_shell: String,
}

impl RuntimeExec {
    pub fn new(settings: &RuntimeSettings) -> Self {
        Self {
            binary: settings.binary.clone(),
            root: settings.root.clone(),
            default_shell: settings.default_shell.clone(),
        }
    }

    /// Command the node container runs to exec `inner` as UID 0 with a TTY
    /// inside runtime container `container_id`.
    ///
    /// An empty `inner` runs the default shell.
    pub fn build_exec_command(&self, container_id: &str, inner: &[String]) -> Vec<String> {
        let exec = format!(
            "{} --root {} exec -t -u 0 {} {}",
            self.binary,
            self.root,
            container_id,
            self.inner_command(inner)
        );
        vec!["sh".to_string(), "-c".to_string(), exec]
    }

    /// Command run directly on the node, without entering a container
    pub fn build_node_command(&self, inner: &[String]) -> Vec<String> {
        if inner.is_empty() {
            vec![self.default_shell.clone()]
        } else {
            inner.to_vec()
        }
    }

    fn inner_command(&self, inner: &[String]) -> String {
        if inner.is_empty() {
            self.default_shell.clone()
        } else {
            inner.join(" ")
        }
    }
}

impl Default for RuntimeExec {
    fn default() -> Self {
        Self::new(&RuntimeSettings::default())
    }
}
