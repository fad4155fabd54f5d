//! Kubeconfig loading
//!
//! Reads the kubeconfig the way kubectl does (an explicit file, or every
//! `KUBECONFIG` entry merged, or ~/.kube/config) and answers which namespace
//! a context points at.

use std::path::Path;

use kube::config::{Kubeconfig, KubeconfigError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KubeConfigError {
    #[error("Failed to load kubeconfig: {0}")]
    LoadError(#[from] KubeconfigError),
    #[error("Context not found: {0}")]
    ContextNotFound(String),
}

/// A loaded (possibly merged) kubeconfig
#[derive(Debug, Clone)]
pub struct KubeConfig {
    inner: Kubeconfig,
}

impl KubeConfig {
    /// Load `path` alone, or merge the `KUBECONFIG` list when None.
    ///
    /// Without `KUBECONFIG` this falls back to ~/.kube/config.
    pub fn load(path: Option<&Path>) -> Result<Self, KubeConfigError> {
        let inner = match path {
            Some(path) => Kubeconfig::read_from(path)?,
            None => Kubeconfig::read()?,
        };
        Ok(Self::from(inner))
    }

    /// Name of the current context, if one is set
    pub fn current_context(&self) -> Option<&str> {
        self.inner
            .current_context
            .as_deref()
            .filter(|name| !name.is_empty())
    }

    /// Namespace set by `context` (the current context when None).
    ///
    /// Ok(None) when the context sets no namespace or there is no current
    /// context at all.
    pub fn context_namespace(&self, context: Option<&str>) -> Result<Option<&str>, KubeConfigError> {
        let name = match context.or_else(|| self.current_context()) {
            Some(name) => name,
            None => return Ok(None),
        };

        let named = self
            .inner
            .contexts
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| KubeConfigError::ContextNotFound(name.to_string()))?;

        Ok(named
            .context
            .as_ref()
            .and_then(|ctx| ctx.namespace.as_deref())
            .filter(|ns| !ns.is_empty()))
    }

    pub fn into_inner(self) -> Kubeconfig {
        self.inner
    }
}

impl From<Kubeconfig> for KubeConfig {
    fn from(inner: Kubeconfig) -> Self {
        Self { inner }
    }
}
