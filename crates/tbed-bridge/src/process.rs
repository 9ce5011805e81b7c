//! Process-backed native host.
//!
//! Spawns the executable named by the application's manifest and talks to it
//! over its stdin/stdout, the way the mail client launches native
//! applications: `<path> <manifest file> <extension id>`.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tbed_protocol::MAX_INBOUND_LEN;
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, info, warn};

use crate::error::{ChannelError, ChannelResult};
use crate::manifest::ManifestRegistry;
use crate::transport::{NativeHost, NativePort, StdioPort};

/// How long a native application may take to exit once its stdin is closed.
const EXIT_GRACE: Duration = Duration::from_millis(500);

/// A [`NativeHost`] that runs native applications as child processes.
#[derive(Debug, Clone)]
pub struct ProcessHost {
    registry: ManifestRegistry,
    extension_id: String,
    max_inbound: u32,
}

impl ProcessHost {
    /// Create a host resolving manifests through `registry` on behalf of
    /// `extension_id`.
    #[must_use]
    pub fn new(registry: ManifestRegistry, extension_id: impl Into<String>) -> Self {
        Self {
            registry,
            extension_id: extension_id.into(),
            max_inbound: MAX_INBOUND_LEN,
        }
    }

    /// Set the inbound frame ceiling for spawned ports.
    #[must_use]
    pub fn with_max_inbound(mut self, max_inbound: u32) -> Self {
        self.max_inbound = max_inbound;
        self
    }

    /// The manifest registry in use.
    #[must_use]
    pub fn registry(&self) -> &ManifestRegistry {
        &self.registry
    }
}

#[async_trait]
impl NativeHost for ProcessHost {
    async fn connect(&self, application: &str) -> ChannelResult<Box<dyn NativePort>> {
        let resolved = self
            .registry
            .resolve(application, &self.extension_id)
            .await?;
        let program = resolved.manifest.path.clone();

        debug!(
            application,
            program = %program.display(),
            manifest = %resolved.file.display(),
            "Spawning native application"
        );

        let mut child = Command::new(&program)
            .arg(&resolved.file)
            .arg(&self.extension_id)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => ChannelError::ExecutableMissing(program.clone()),
                std::io::ErrorKind::PermissionDenied => {
                    ChannelError::PermissionDenied(program.clone())
                },
                _ => ChannelError::Connection(format!("{}: {e}", program.display())),
            })?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.start_kill();
            return Err(ChannelError::Connection(
                "native application stdio was not captured".to_owned(),
            ));
        };

        info!(application, pid = child.id(), "Native application started");
        Ok(Box::new(ChildPort {
            port: StdioPort::new(stdout, stdin).with_max_inbound(self.max_inbound),
            child,
        }))
    }
}

/// A [`StdioPort`] that also owns the child process.
struct ChildPort {
    port: StdioPort<ChildStdout, ChildStdin>,
    child: Child,
}

#[async_trait]
impl NativePort for ChildPort {
    async fn post(&mut self, text: &str) -> ChannelResult<()> {
        self.port.post(text).await
    }

    async fn next_message(&mut self) -> Option<ChannelResult<String>> {
        self.port.next_message().await
    }

    async fn close(&mut self) -> ChannelResult<()> {
        // Closing stdin is the native application's signal to exit.
        let shutdown = self.port.close().await;
        if let Err(e) = &shutdown {
            debug!(error = %e, "Failed to close native application stdin");
        }

        let status = match tokio::time::timeout(EXIT_GRACE, self.child.wait()).await {
            Ok(status) => status?,
            Err(_) => {
                // Nobody reads its stdout any more; a child still writing would block forever.
                warn!(pid = self.child.id(), "Native application still running, killing it");
                self.child.start_kill()?;
                self.child.wait().await?
            },
        };
        if status.success() {
            debug!(%status, "Native application exited");
        } else {
            warn!(%status, "Native application exited with failure");
        }
        shutdown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::HostManifest;

    fn registry_with(dir: &std::path::Path, manifest: &HostManifest) -> ManifestRegistry {
        std::fs::write(
            dir.join(format!("{}.json", manifest.name)),
            serde_json::to_vec(manifest).unwrap(),
        )
        .unwrap();
        ManifestRegistry::new(vec![dir.to_path_buf()])
    }

    #[tokio::test]
    async fn test_missing_executable() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = HostManifest::stdio("tbed", dir.path().join("does-not-exist"))
            .allow_extension("tbed@tbed-rs");
        let host = ProcessHost::new(registry_with(dir.path(), &manifest), "tbed@tbed-rs");

        assert!(matches!(
            host.connect("tbed").await,
            Err(ChannelError::ExecutableMissing(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_not_executable_is_permission_denied() {
        let dir = tempfile::tempdir().unwrap();
        let program = dir.path().join("host.sh");
        std::fs::write(&program, "#!/bin/sh\n").unwrap();
        let manifest = HostManifest::stdio("tbed", &program).allow_extension("tbed@tbed-rs");
        let host = ProcessHost::new(registry_with(dir.path(), &manifest), "tbed@tbed-rs");

        assert!(matches!(
            host.connect("tbed").await,
            Err(ChannelError::PermissionDenied(_))
        ));
    }

    #[tokio::test]
    async fn test_unregistered_application() {
        let dir = tempfile::tempdir().unwrap();
        let host = ProcessHost::new(
            ManifestRegistry::new(vec![dir.path().to_path_buf()]),
            "tbed@tbed-rs",
        );
        assert!(matches!(
            host.connect("tbed").await,
            Err(ChannelError::NotRegistered { .. })
        ));
    }
}
