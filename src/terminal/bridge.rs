//! Interactive sessions on k3d node containers
//!
//! Runs a command in a node container through the Docker Engine API with a
//! TTY attached and the operator's terminal wired straight through, the way
//! `docker exec -ti <node> ...` does.

use async_trait::async_trait;
use bollard::exec::{CreateExecOptions, ResizeExecOptions, StartExecOptions, StartExecResults};
use bollard::Docker;
use futures::StreamExt;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::raw_mode::RawModeGuard;

/// Seconds before a Docker API request times out
const DOCKER_TIMEOUT_SECS: u64 = 120;

/// Errors that can occur while bridging into a node
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Docker engine unavailable at {endpoint}: {source}")]
    EngineUnavailable {
        endpoint: String,
        #[source]
        source: bollard::errors::Error,
    },

    #[error("Node container {0} not found on the Docker engine")]
    NodeNotFound(String),

    #[error("Node container {node} is not running: {message}")]
    NodeNotRunning { node: String, message: String },

    #[error("Exec failed: {0}")]
    ExecFailed(#[from] bollard::errors::Error),

    #[error("Exec started detached; no terminal to attach")]
    Detached,

    #[error("Terminal I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Opens interactive sessions on cluster nodes
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    /// Run `command` on node `node` with the operator's terminal attached.
    ///
    /// Returns once the remote command exits.
    async fn open_interactive_session(&self, node: &str, command: &[String]) -> BridgeResult<()>;
}

/// Terminal size for the remote TTY
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TerminalSize {
    pub cols: u16,
    pub rows: u16,
}

impl TerminalSize {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self { cols, rows }
    }

    /// Size of the operator's terminal, if there is one
    pub fn current() -> Option<Self> {
        crossterm::terminal::size()
            .ok()
            .filter(|(cols, rows)| *cols > 0 && *rows > 0)
            .map(|(cols, rows)| Self::new(cols, rows))
    }
}

impl From<TerminalSize> for ResizeExecOptions {
    fn from(size: TerminalSize) -> Self {
        ResizeExecOptions {
            width: size.cols,
            height: size.rows,
        }
    }
}

/// Session launcher backed by the local Docker engine.
///
/// k3d runs every node as a Docker container named after the node, so the
/// node name is the exec target.
pub struct DockerBridge {
    docker: Docker,
    endpoint: String,
}

impl DockerBridge {
    /// Connect to the Docker engine.
    ///
    /// `endpoint` accepts `unix://` sockets and `tcp://`/`http://` addresses;
    /// None uses `DOCKER_HOST` or the platform default socket.
    pub fn connect(endpoint: Option<&str>) -> BridgeResult<Self> {
        let describe = endpoint.unwrap_or("local defaults").to_string();
        let result = match endpoint {
            Some(ep) if ep.starts_with("unix://") || ep.starts_with("npipe://") => {
                Docker::connect_with_socket(ep, DOCKER_TIMEOUT_SECS, bollard::API_DEFAULT_VERSION)
            }
            Some(ep) => {
                Docker::connect_with_http(ep, DOCKER_TIMEOUT_SECS, bollard::API_DEFAULT_VERSION)
            }
            None => Docker::connect_with_local_defaults(),
        };

        let docker = result.map_err(|source| BridgeError::EngineUnavailable {
            endpoint: describe.clone(),
            source,
        })?;
        Ok(Self { docker, endpoint: describe })
    }

    async fn resize(&self, exec_id: &str, size: TerminalSize) {
        if let Err(e) = self.docker.resize_exec(exec_id, size.into()).await {
            tracing::debug!("Resize of exec {} failed: {}", exec_id, e);
        }
    }

    fn map_create_error(node: &str, err: bollard::errors::Error) -> BridgeError {
        match err {
            bollard::errors::Error::DockerResponseServerError { status_code: 404, .. } => {
                BridgeError::NodeNotFound(node.to_string())
            }
            bollard::errors::Error::DockerResponseServerError { status_code: 409, message } => {
                BridgeError::NodeNotRunning { node: node.to_string(), message }
            }
            other => BridgeError::ExecFailed(other),
        }
    }
}

#[async_trait]
impl SessionLauncher for DockerBridge {
    async fn open_interactive_session(&self, node: &str, command: &[String]) -> BridgeResult<()> {
        self.docker.ping().await.map_err(|source| BridgeError::EngineUnavailable {
            endpoint: self.endpoint.clone(),
            source,
        })?;

        let exec_config = CreateExecOptions {
            cmd: Some(command.to_vec()),
            attach_stdin: Some(true),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            tty: Some(true),
            ..Default::default()
        };
        let exec = self
            .docker
            .create_exec(node, exec_config)
            .await
            .map_err(|e| Self::map_create_error(node, e))?;
        tracing::debug!("Created exec {} on node {}: {:?}", exec.id, node, command);

        let start_options = StartExecOptions {
            detach: false,
            tty: true,
            ..Default::default()
        };
        let StartExecResults::Attached { mut output, mut input } =
            self.docker.start_exec(&exec.id, Some(start_options)).await?
        else {
            return Err(BridgeError::Detached);
        };

        if let Some(size) = TerminalSize::current() {
            self.resize(&exec.id, size).await;
        }
        let (stop_resize, stop_rx) = oneshot::channel();
        let resize_task = spawn_resize_watcher(self.docker.clone(), exec.id.clone(), stop_rx);

        // Nothing may log to stderr while the terminal is raw
        let raw_mode = RawModeGuard::enable()?;

        // Operator keystrokes -> remote TTY
        let stdin_task = tokio::spawn(async move {
            let mut stdin = tokio::io::stdin();
            let mut buf = vec![0u8; 4096];
            loop {
                match stdin.read(&mut buf).await {
                    Ok(0) => break, // EOF
                    Ok(n) => {
                        if input.write_all(&buf[..n]).await.is_err() {
                            break;
                        }
                        let _ = input.flush().await;
                    }
                    Err(_) => break,
                }
            }
        });

        // Remote TTY -> operator terminal, until the remote side closes
        let mut stdout = tokio::io::stdout();
        let mut stderr = tokio::io::stderr();
        let mut result = Ok(());
        while let Some(chunk) = output.next().await {
            match chunk {
                Ok(bollard::container::LogOutput::StdErr { message }) => {
                    stderr.write_all(&message).await?;
                    stderr.flush().await?;
                }
                Ok(log) => {
                    stdout.write_all(&log.into_bytes()).await?;
                    stdout.flush().await?;
                }
                Err(e) => {
                    result = Err(BridgeError::ExecFailed(e));
                    break;
                }
            }
        }

        stdin_task.abort();
        let _ = stop_resize.send(());
        drop(raw_mode);

        if let Some(task) = resize_task {
            if let Ok(failed) = task.await {
                if failed > 0 {
                    tracing::debug!("{} resize(s) of exec {} failed", failed, exec.id);
                }
            }
        }

        match self.docker.inspect_exec(&exec.id).await {
            Ok(inspect) => {
                tracing::debug!("Exec {} on node {} exited with {:?}", exec.id, node, inspect.exit_code)
            }
            Err(e) => tracing::debug!("Failed to inspect exec {}: {}", exec.id, e),
        }

        tracing::info!("Session on node {} ended", node);
        result
    }
}

/// Follow window size changes of the operator's terminal until `stop` fires.
///
/// Failed resizes are counted, not logged; the task runs while the terminal
/// is raw.
#[cfg(unix)]
fn spawn_resize_watcher(
    docker: Docker,
    exec_id: String,
    mut stop: oneshot::Receiver<()>,
) -> Option<JoinHandle<usize>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut winch = match signal(SignalKind::window_change()) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!("Cannot watch terminal size changes: {}", e);
            return None;
        }
    };

    Some(tokio::spawn(async move {
        let mut failed = 0;
        loop {
            tokio::select! {
                _ = &mut stop => break,
                received = winch.recv() => {
                    if received.is_none() {
                        break;
                    }
                    if let Some(size) = TerminalSize::current() {
                        if docker.resize_exec(&exec_id, size.into()).await.is_err() {
                            failed += 1;
                        }
                    }
                }
            }
        }
        failed
    }))
}

#[cfg(not(unix))]
fn spawn_resize_watcher(
    _docker: Docker,
    _exec_id: String,
    _stop: oneshot::Receiver<()>,
) -> Option<JoinHandle<usize>> {
    None
}
