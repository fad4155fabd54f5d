//! Target identifiers
//!
//! An operator names a target either as a bare pod name or as
//! `"<pod>: <container>"`, the same format the picker displays.

use std::fmt;
use thiserror::Error;

/// Separator between pod and container in a compound identifier
pub const SEPARATOR: &str = ": ";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("empty target identifier")]
    Empty,

    #[error("missing pod name in {0:?}; expected \"<pod>: <container>\"")]
    MissingPod(String),

    #[error("missing container name in {0:?}; expected \"<pod>: <container>\"")]
    MissingContainer(String),

    #[error("malformed target {0:?}; separate pod and container with \": \" (colon and space)")]
    MalformedSeparator(String),

    #[error("ambiguous target {0:?}; it contains more than one \": \" separator")]
    Ambiguous(String),

    #[error("invalid name {name:?} in target {input:?}; names cannot contain whitespace")]
    InvalidName { input: String, name: String },
}

/// A parsed target: a pod, optionally narrowed to one of its containers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSpec {
    /// Bare pod name; the container is chosen by the locator
    Pod { pod: String },
    /// Explicit pod and container
    PodContainer { pod: String, container: String },
}

impl TargetSpec {
    /// Parse an operator-supplied identifier.
    ///
    /// Splits on the first `": "`. Anything that does not split cleanly into
    /// two non-empty names is rejected.
    pub fn parse(input: &str) -> Result<Self, IdentifierError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(IdentifierError::Empty);
        }

        let Some((pod, container)) = trimmed.split_once(SEPARATOR) else {
            // "web-0:" once the trailing space has been trimmed away
            if trimmed.ends_with(':') && trimmed.matches(':').count() == 1 {
                return Err(IdentifierError::MissingContainer(input.to_string()));
            }
            if trimmed.contains(':') {
                return Err(IdentifierError::MalformedSeparator(input.to_string()));
            }
            validate_name(input, trimmed)?;
            return Ok(TargetSpec::Pod { pod: trimmed.to_string() });
        };

        if container.contains(SEPARATOR) {
            return Err(IdentifierError::Ambiguous(input.to_string()));
        }

        let pod = pod.trim();
        let container = container.trim();
        if pod.is_empty() {
            return Err(IdentifierError::MissingPod(input.to_string()));
        }
        if pod.contains(':') || container.contains(':') {
            return Err(IdentifierError::MalformedSeparator(input.to_string()));
        }
        validate_name(input, pod)?;
        validate_name(input, container)?;

        Ok(TargetSpec::PodContainer {
            pod: pod.to_string(),
            container: container.to_string(),
        })
    }

    pub fn pod(&self) -> &str {
        match self {
            TargetSpec::Pod { pod } | TargetSpec::PodContainer { pod, .. } => pod,
        }
    }

    pub fn container(&self) -> Option<&str> {
        match self {
            TargetSpec::Pod { .. } => None,
            TargetSpec::PodContainer { container, .. } => Some(container),
        }
    }
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetSpec::Pod { pod } => write!(f, "{}", pod),
            TargetSpec::PodContainer { pod, container } => {
                write!(f, "{}{}{}", pod, SEPARATOR, container)
            }
        }
    }
}

fn validate_name(input: &str, name: &str) -> Result<(), IdentifierError> {
    if name.chars().any(char::is_whitespace) {
        return Err(IdentifierError::InvalidName {
            input: input.to_string(),
            name: name.to_string(),
        });
    }
    Ok(())
}
