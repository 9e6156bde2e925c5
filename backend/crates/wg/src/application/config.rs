//! Application Configuration

use std::time::Duration;

/// WireGuard provisioning configuration
#[derive(Debug, Clone)]
pub struct WgConfig {
    /// Path to the `wg` binary
    pub wg_bin: String,
    /// Interface the peers are applied to
    pub interface: String,
    /// Prefix privileged subcommands with sudo (NOPASSWD rule scoped to
    /// the wg binary); key generation runs unprivileged either way
    pub use_sudo: bool,
    /// Hard ceiling on any one control-surface invocation. The child is
    /// killed when it fires, so a wedged `wg` cannot hang a worker.
    pub command_timeout: Duration,
    /// Label applied when the operator leaves it blank
    pub default_label: String,
    /// Allowed-IPs applied when the operator leaves it blank
    pub default_allowed_ips: String,
    /// How many times allocate+insert retries when the address unique
    /// constraint fires under concurrent creation
    pub allocation_attempts: u32,
}

impl Default for WgConfig {
    fn default() -> Self {
        Self {
            wg_bin: "/usr/bin/wg".to_string(),
            interface: "wg0".to_string(),
            use_sudo: true,
            command_timeout: Duration::from_secs(5),
            default_label: "Device".to_string(),
            default_allowed_ips: "0.0.0.0/0, ::/0".to_string(),
            allocation_attempts: 3,
        }
    }
}

impl WgConfig {
    /// Create config for development (no sudo, wg on PATH)
    pub fn development() -> Self {
        Self {
            wg_bin: "wg".to_string(),
            use_sudo: false,
            ..Default::default()
        }
    }
}
