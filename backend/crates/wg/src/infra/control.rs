//! WireGuard Control Adapter
//!
//! Thin wrapper around the `wg` command-line control surface. Privileged
//! subcommands (`show`, `set`) go through sudo when configured; the key
//! primitives (`genkey`, `pubkey`) never do. Every invocation runs under
//! a hard timeout with `kill_on_drop`, so a wedged external process is
//! killed instead of hanging the calling worker.

use std::process::Stdio;
use std::sync::Arc;
use std::time::Instant;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use zeroize::Zeroizing;

use crate::application::config::WgConfig;
use crate::domain::repository::{Keypair, PeerControl};
use crate::error::{WgError, WgResult};

/// Control adapter talking to the `wg` binary
#[derive(Clone)]
pub struct WgControl {
    config: Arc<WgConfig>,
}

impl WgControl {
    pub fn new(config: Arc<WgConfig>) -> Self {
        Self { config }
    }

    /// Run one `wg` invocation and capture its stdout.
    ///
    /// Non-zero exit becomes [`WgError::ControlSurface`] carrying the
    /// combined stderr/stdout; exceeding the configured timeout kills the
    /// child and becomes [`WgError::ControlTimeout`].
    async fn run(
        &self,
        privileged: bool,
        args: &[&str],
        stdin_data: Option<&str>,
    ) -> WgResult<String> {
        let mut cmd = if privileged && self.config.use_sudo {
            let mut c = Command::new("sudo");
            c.arg(&self.config.wg_bin);
            c
        } else {
            Command::new(&self.config.wg_bin)
        };

        cmd.args(args)
            .stdin(if stdin_data.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let start = Instant::now();

        let mut child = cmd
            .spawn()
            .map_err(|e| WgError::ControlSurface(format!("failed to spawn wg: {e}")))?;

        if let Some(data) = stdin_data {
            if let Some(mut stdin) = child.stdin.take() {
                // Best-effort write; a closed stdin surfaces as a bad exit
                let _ = stdin.write_all(data.as_bytes()).await;
                drop(stdin);
            }
        }

        let output = match tokio::time::timeout(
            self.config.command_timeout,
            child.wait_with_output(),
        )
        .await
        {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(WgError::ControlSurface(format!("wg I/O error: {e}"))),
            Err(_elapsed) => {
                // The child is dropped here and killed via kill_on_drop
                return Err(WgError::ControlTimeout {
                    elapsed_ms: start.elapsed().as_millis() as u64,
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let diagnostic = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            return Err(WgError::ControlSurface(format!(
                "wg {} exited with {}: {}",
                args.first().copied().unwrap_or(""),
                output.status,
                diagnostic
            )));
        }

        Ok(stdout)
    }
}

impl PeerControl for WgControl {
    async fn generate_keypair(&self) -> WgResult<Keypair> {
        let private_key = Zeroizing::new(self.run(false, &["genkey"], None).await?.trim().to_string());
        let public_key = self
            .run(false, &["pubkey"], Some(private_key.as_str()))
            .await?
            .trim()
            .to_string();

        Ok(Keypair {
            private_key,
            public_key,
        })
    }

    async fn add_peer(
        &self,
        public_key: &str,
        allowed_ips: &str,
        keepalive: Option<u16>,
    ) -> WgResult<()> {
        let keepalive_s;
        let mut args = vec![
            "set",
            self.config.interface.as_str(),
            "peer",
            public_key,
            "allowed-ips",
            allowed_ips,
        ];
        if let Some(secs) = keepalive {
            keepalive_s = secs.to_string();
            args.push("persistent-keepalive");
            args.push(&keepalive_s);
        }

        self.run(true, &args, None).await?;
        Ok(())
    }

    async fn remove_peer(&self, public_key: &str) -> WgResult<()> {
        self.run(
            true,
            &[
                "set",
                self.config.interface.as_str(),
                "peer",
                public_key,
                "remove",
            ],
            None,
        )
        .await?;
        Ok(())
    }

    async fn status_text(&self) -> WgResult<String> {
        self.run(true, &["show"], None).await
    }
}
