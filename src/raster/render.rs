//! Page rasterisation: screenshot a rendered HTML page to PNG.
//!
//! ## Blocking renders
//!
//! The browser is an external process and a render can take seconds when
//! MathJax has to typeset. [`TableRenderer::render`] is a blocking call; the
//! rasteriser runs it on `tokio::task::spawn_blocking` so the Tokio worker
//! threads keep serving the other tables of a batch.

use crate::config::{BrowserCommand, RasterConfig};
use crate::error::Html2LatexError;
use crate::raster::prepare::file_url;
use std::path::Path;
use std::process::Command;
use std::time::Duration;
use tracing::{debug, info};

/// Turns an HTML page on disk into a PNG.
pub trait TableRenderer: Send + Sync {
    /// Render `page` to `output`, giving scripts `wait` to finish first.
    fn render(&self, page: &Path, output: &Path, wait: Duration) -> Result<(), Html2LatexError>;
}

/// Renders by running a headless browser subprocess.
#[derive(Debug, Clone)]
pub struct HeadlessBrowser {
    command: BrowserCommand,
    /// `(width, height)` of the browser viewport.
    viewport: (u32, u32),
}

impl HeadlessBrowser {
    pub fn new(command: BrowserCommand, viewport: (u32, u32)) -> Self {
        Self { command, viewport }
    }

    pub fn from_config(config: &RasterConfig) -> Self {
        Self::new(
            config.browser.clone(),
            (config.page_width_px, config.page_height_px),
        )
    }
}

impl TableRenderer for HeadlessBrowser {
    fn render(&self, page: &Path, output: &Path, wait: Duration) -> Result<(), Html2LatexError> {
        let url = file_url(page);
        let args = self
            .command
            .expand(&url, output, wait.as_millis() as u64, self.viewport);
        debug!("{} {}", self.command.program, args.join(" "));

        let result = Command::new(&self.command.program)
            .args(&args)
            .output()
            .map_err(|e| Html2LatexError::RenderFailed {
                detail: format!("could not start '{}': {e}", self.command.program),
            })?;

        if !result.status.success() {
            return Err(Html2LatexError::BrowserFailed {
                program: self.command.program.clone(),
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        if !output.is_file() {
            return Err(Html2LatexError::RenderFailed {
                detail: format!(
                    "'{}' exited cleanly but wrote no image to {}",
                    self.command.program,
                    output.display()
                ),
            });
        }

        info!("Rendered {} → {}", url, output.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn browser(program: &str, args: &[&str]) -> HeadlessBrowser {
        HeadlessBrowser::new(
            BrowserCommand {
                program: program.into(),
                args: args.iter().map(|s| s.to_string()).collect(),
            },
            (800, 600),
        )
    }

    #[test]
    fn missing_program_is_a_render_failure() {
        let err = browser("html2latex-no-such-browser", &[])
            .render(Path::new("/tmp/p.html"), Path::new("/tmp/p.png"), Duration::ZERO)
            .unwrap_err();
        assert!(matches!(err, Html2LatexError::RenderFailed { .. }), "got: {err}");
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_reported_with_stderr() {
        let err = browser("sh", &["-c", "echo boom >&2; exit 3"])
            .render(Path::new("/tmp/p.html"), Path::new("/tmp/p.png"), Duration::ZERO)
            .unwrap_err();
        match err {
            Html2LatexError::BrowserFailed { stderr, .. } => assert_eq!(stderr, "boom"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn clean_exit_without_image_is_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("never.png");
        let err = browser("true", &[])
            .render(Path::new("/tmp/p.html"), &output, Duration::ZERO)
            .unwrap_err();
        assert!(err.to_string().contains("wrote no image"), "got: {err}");
    }

    #[cfg(unix)]
    #[test]
    fn placeholders_reach_the_process() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.png");
        browser(
            "sh",
            &["-c", "printf %s \"$1 $2\" > \"$0\"", "{output}", "{wait_ms}", "{height}"],
        )
        .render(Path::new("/tmp/p.html"), &output, Duration::from_secs(2))
        .unwrap();
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "2000 600");
    }
}
