use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::tty::IsTty;

/// Puts the operator's terminal into raw mode while alive.
///
/// Keystrokes (Ctrl-C, arrows, tab completion) must reach the remote TTY
/// untouched. Nothing happens when stdin is not a terminal.
pub struct RawModeGuard {
    enabled: bool,
}

impl RawModeGuard {
    pub fn enable() -> std::io::Result<Self> {
        if !std::io::stdin().is_tty() {
            tracing::debug!("stdin is not a terminal, leaving terminal mode untouched");
            return Ok(Self { enabled: false });
        }
        enable_raw_mode()?;
        Ok(Self { enabled: true })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if self.enabled {
            if let Err(e) = disable_raw_mode() {
                tracing::warn!("Failed to restore terminal mode: {}", e);
            }
        }
    }
}
