pub mod bridge;
pub mod command;
pub mod raw_mode;

pub use bridge::{BridgeError, BridgeResult, DockerBridge, SessionLauncher, TerminalSize};
pub use command::RuntimeExec;
pub use raw_mode::RawModeGuard;
