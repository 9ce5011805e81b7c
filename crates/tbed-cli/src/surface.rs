//! Files as compose targets.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use colored::Colorize;
use tbed_bridge::{ComposeDetails, ComposeSurface, ComposeTarget, ComposeWindow, SurfaceError, SurfaceResult};

/// A [`ComposeSurface`] whose targets are file paths.
///
/// A file counts as plain text when its contents are valid UTF-8.
#[derive(Debug, Default)]
pub(crate) struct FileSurface;

impl FileSurface {
    /// The target naming `path`.
    pub(crate) fn target(path: &Path) -> ComposeTarget {
        ComposeTarget::new(path.display().to_string())
    }

    fn path(target: &ComposeTarget) -> PathBuf {
        PathBuf::from(target.as_str())
    }
}

fn io_error(target: &ComposeTarget, err: std::io::Error) -> SurfaceError {
    if err.kind() == std::io::ErrorKind::NotFound {
        SurfaceError::NotFound(target.clone())
    } else {
        SurfaceError::Io(err)
    }
}

#[async_trait]
impl ComposeSurface for FileSurface {
    async fn get_plain_text_body(&self, target: &ComposeTarget) -> SurfaceResult<ComposeDetails> {
        let bytes = tokio::fs::read(Self::path(target))
            .await
            .map_err(|e| io_error(target, e))?;
        Ok(match String::from_utf8(bytes) {
            Ok(text) => ComposeDetails::plain(text),
            Err(_) => ComposeDetails::rich(String::new()),
        })
    }

    async fn set_plain_text_body(&self, target: &ComposeTarget, body: &str) -> SurfaceResult<()> {
        tokio::fs::write(Self::path(target), body)
            .await
            .map_err(|e| io_error(target, e))
    }

    async fn focused_window(&self) -> SurfaceResult<Option<ComposeWindow>> {
        Ok(None)
    }

    fn show_error(&self, target: Option<&ComposeTarget>, message: &str) {
        match target {
            Some(target) => eprintln!("{} {target}: {message}", "error:".red().bold()),
            None => eprintln!("{} {message}", "error:".red().bold()),
        }
    }
}
